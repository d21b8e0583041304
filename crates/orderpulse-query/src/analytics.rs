//! Canned analytics statements scoped to one ETL run

/// Dashboard queries over the cleaned orders table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsQuery {
    /// Revenue per day, oldest first
    DailyRevenue,
    /// Ten best-selling products by units
    TopProducts,
    /// Orders per day, oldest first
    OrderCount,
}

impl AnalyticsQuery {
    pub const ALL: [AnalyticsQuery; 3] = [
        AnalyticsQuery::DailyRevenue,
        AnalyticsQuery::TopProducts,
        AnalyticsQuery::OrderCount,
    ];

    /// Stable identifier used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsQuery::DailyRevenue => "daily_revenue",
            AnalyticsQuery::TopProducts => "top_products",
            AnalyticsQuery::OrderCount => "order_count",
        }
    }

    /// Render the statement for `table`, restricted to rows of `run_id`
    pub fn sql(&self, table: &str, run_id: &str) -> String {
        let run = quote_literal(run_id);
        match self {
            AnalyticsQuery::DailyRevenue => format!(
                "SELECT\n    date(from_iso8601_timestamp(orderDate)) AS day,\n    SUM(totalAmount) AS revenue\nFROM {table}\nWHERE runId = {run}\nGROUP BY 1\nORDER BY 1 ASC"
            ),
            AnalyticsQuery::TopProducts => format!(
                "SELECT\n    productName,\n    SUM(qty) AS units\nFROM {table}\nWHERE runId = {run}\nGROUP BY productName\nORDER BY units DESC\nLIMIT 10"
            ),
            AnalyticsQuery::OrderCount => format!(
                "SELECT\n    date(from_iso8601_timestamp(orderDate)) AS day,\n    COUNT(*) AS orders\nFROM {table}\nWHERE runId = {run}\nGROUP BY 1\nORDER BY 1 ASC"
            ),
        }
    }
}

/// Quote `value` as a SQL string literal, doubling embedded single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
