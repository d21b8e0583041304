//! Raw tabular payload decoding
//!
//! The engine returns a header row followed by data rows; every cell may be
//! absent. Decoding zips each data row against the header by position.

use std::sync::Arc;

use crate::types::{RawRow, Record, ResultSet};

/// Decode a raw payload into records.
///
/// - zero rows, or a header alone, yields no records
/// - an absent header cell becomes the column name `""`
/// - an absent data cell, or one past the end of a short row, decodes to null
/// - cells beyond the header width are dropped
pub fn decode_rows(raw: &[RawRow]) -> ResultSet {
    let Some((header, data)) = raw.split_first() else {
        return ResultSet::empty();
    };

    let columns: Arc<[String]> = header
        .iter()
        .map(|cell| cell.clone().unwrap_or_default())
        .collect();

    let rows = data
        .iter()
        .map(|row| {
            let values = (0..columns.len())
                .map(|idx| row.get(idx).cloned().flatten())
                .collect();
            Record::new(columns.clone(), values)
        })
        .collect();

    ResultSet::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[Option<&str>]) -> RawRow {
        cells.iter().map(|c| c.map(String::from)).collect()
    }

    #[test]
    fn test_empty_payload_yields_no_records() {
        let result = decode_rows(&[]);
        assert!(result.is_empty());
        assert!(result.columns().is_empty());
    }

    #[test]
    fn test_header_only_yields_no_records() {
        let result = decode_rows(&[row(&[Some("day"), Some("revenue")])]);
        assert!(result.is_empty());
        assert_eq!(result.columns(), ["day", "revenue"]);
    }

    #[test]
    fn test_record_count_is_rows_minus_header() {
        for n in 2..8 {
            let raw: Vec<RawRow> = (0..n).map(|i| row(&[Some(i.to_string().as_str())])).collect();
            assert_eq!(decode_rows(&raw).len(), n - 1);
        }
    }

    #[test]
    fn test_cells_are_kept_verbatim() {
        let raw = vec![
            row(&[Some("day"), Some("revenue")]),
            row(&[Some("2024-01-01"), Some("100.50")]),
            row(&[Some(" padded "), Some("")]),
        ];
        let result = decode_rows(&raw);

        assert_eq!(result.rows()[0].get("revenue"), Some(Some("100.50")));
        assert_eq!(result.rows()[1].get("day"), Some(Some(" padded ")));
        assert_eq!(result.rows()[1].get("revenue"), Some(Some("")));
    }

    #[test]
    fn test_absent_cells_decode_to_null() {
        let raw = vec![
            row(&[Some("day"), Some("revenue")]),
            row(&[Some("2024-01-02"), None]),
        ];
        let result = decode_rows(&raw);

        assert_eq!(result.rows()[0].get("revenue"), Some(None));
    }

    #[test]
    fn test_short_rows_are_null_filled() {
        let raw = vec![
            row(&[Some("a"), Some("b"), Some("c")]),
            row(&[Some("1")]),
            row(&[]),
        ];
        let result = decode_rows(&raw);

        assert_eq!(result.len(), 2);
        assert_eq!(
            result.rows()[0].values(),
            &[Some("1".to_string()), None, None]
        );
        assert_eq!(result.rows()[1].values(), &[None, None, None]);
    }

    #[test]
    fn test_extra_cells_beyond_header_are_dropped() {
        let raw = vec![row(&[Some("a")]), row(&[Some("1"), Some("2")])];
        let result = decode_rows(&raw);

        assert_eq!(result.rows()[0].values(), &[Some("1".to_string())]);
    }

    #[test]
    fn test_absent_header_cell_becomes_empty_name() {
        let raw = vec![row(&[Some("a"), None]), row(&[Some("1"), Some("2")])];
        let result = decode_rows(&raw);

        assert_eq!(result.columns(), ["a", ""]);
        assert_eq!(result.rows()[0].get(""), Some(Some("2")));
    }

    #[test]
    fn test_duplicate_header_names_keep_positional_values() {
        let raw = vec![
            row(&[Some("x"), Some("x")]),
            row(&[Some("left"), Some("right")]),
        ];
        let result = decode_rows(&raw);

        assert_eq!(result.columns(), ["x", "x"]);
        assert_eq!(
            result.rows()[0].values(),
            &[Some("left".to_string()), Some("right".to_string())]
        );
    }

    #[test]
    fn test_row_order_is_preserved() {
        let raw = vec![
            row(&[Some("n")]),
            row(&[Some("3")]),
            row(&[Some("1")]),
            row(&[Some("2")]),
        ];
        let order: Vec<_> = decode_rows(&raw)
            .iter()
            .map(|r| r.get("n").flatten().unwrap().to_string())
            .collect();

        assert_eq!(order, ["3", "1", "2"]);
    }
}
