//! The API endpoints URIs.

/// The root of every sale endpoint.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for listing the sales in a month.
pub const LIST_TRANSACTIONS: &str = "/api/transactions/";
/// The route that replaces the database contents with the seed feed.
pub const INITIALIZE_DB: &str = "/api/transactions/initialize-db";
/// The route for the summary statistics of a month.
pub const STATISTICS: &str = "/api/transactions/statistics";
/// The route for the price band counts of a month.
pub const BAR_CHART: &str = "/api/transactions/bar-chart";
/// The route for the per category counts of a month.
pub const PIE_CHART: &str = "/api/transactions/pie-chart";
/// The route for the statistics and both charts of a month in one response.
pub const COMBINED_DATA: &str = "/api/transactions/combined-data";
