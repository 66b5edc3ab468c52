//! A single report that combines the statistics and both charts for a month.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    month::{Month, MonthQuery},
};

use super::{
    bar_chart::{PriceBand, get_bar_chart},
    pie_chart::{CategoryCount, get_pie_chart},
    report::ReportState,
    statistics::{Statistics, get_statistics},
};

const COMBINED_FAILURE_MESSAGE: &str = "Failed to fetch combined data. Please try again later.";

/// The statistics, bar chart and pie chart for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedReport {
    /// See [get_statistics].
    pub statistics: Statistics,
    /// See [get_bar_chart].
    pub bar_chart_data: Vec<PriceBand>,
    /// See [get_pie_chart].
    pub pie_chart_data: Vec<CategoryCount>,
}

/// Build every report for `month` of `reference_year`.
///
/// The reports are read through the same connection so they describe the
/// same data. If any report fails the whole call fails.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_combined_report(
    month: Month,
    reference_year: i32,
    connection: &Connection,
) -> Result<CombinedReport, Error> {
    Ok(CombinedReport {
        statistics: get_statistics(month, reference_year, connection)?,
        bar_chart_data: get_bar_chart(month, reference_year, connection)?,
        pie_chart_data: get_pie_chart(month, reference_year, connection)?,
    })
}

/// Get every report for the month given in the query string.
///
/// Unlike the individual report endpoints, the month must be spelled out in
/// full, e.g. "february" but not "feb".
pub async fn get_combined_report_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<MonthQuery>,
) -> Response {
    let result = Month::parse_full_name(query.month.as_deref()).and_then(|month| {
        tracing::debug!("building combined report for {}", month.name());
        let connection = state.lock_connection()?;
        get_combined_report(month, state.reference_year, &connection)
    });

    match result {
        Ok(report) => Json(report).into_response(),
        Err(error) => error.into_json_response(COMBINED_FAILURE_MESSAGE),
    }
}
