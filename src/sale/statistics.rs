//! Summary statistics for the sales made in a month.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, named_params};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    month::{Month, MonthQuery, MonthSpan},
};

use super::{core::read_count, report::ReportState};

const STATISTICS_FAILURE_MESSAGE: &str = "Failed to retrieve statistics. Please try again later.";

/// Totals for the sales in a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// The sum of the prices of every sale in the month, sold or not.
    pub total_amount: f64,
    /// The number of sales that were sold.
    pub total_items: u64,
    /// The number of sales that were not sold.
    pub total_not_sold: u64,
}

/// Compute the [Statistics] for `month` in `reference_year`.
///
/// A month without any sales produces zeros.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_statistics(
    month: Month,
    reference_year: i32,
    connection: &Connection,
) -> Result<Statistics, Error> {
    let span = MonthSpan::in_year(month, reference_year)?;

    connection
        .prepare(
            "SELECT COALESCE(SUM(price), 0.0), \
            COALESCE(SUM(CASE WHEN sold = 1 THEN 1 ELSE 0 END), 0), \
            COALESCE(SUM(CASE WHEN sold = 0 THEN 1 ELSE 0 END), 0) \
            FROM sale WHERE date_of_sale BETWEEN :start AND :end",
        )?
        .query_row(
            named_params! {
                ":start": span.start_millis(),
                ":end": span.end_millis(),
            },
            |row| {
                Ok(Statistics {
                    total_amount: row.get(0)?,
                    total_items: read_count(row, 1)?,
                    total_not_sold: read_count(row, 2)?,
                })
            },
        )
        .map_err(|error| error.into())
}

/// Get the sale statistics for the month given in the query string.
pub async fn get_statistics_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<MonthQuery>,
) -> Response {
    let result = Month::parse(query.month.as_deref()).and_then(|month| {
        let connection = state.lock_connection()?;
        get_statistics(month, state.reference_year, &connection)
    });

    match result {
        Ok(statistics) => Json(statistics).into_response(),
        Err(error) => error.into_json_response(STATISTICS_FAILURE_MESSAGE),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        body::to_bytes,
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        db::initialize,
        month::{Month, MonthQuery},
        sale::{NewSale, insert_sales, report::ReportState},
    };

    use super::{Statistics, get_statistics, get_statistics_endpoint};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_sale(price: f64, sold: bool, date_of_sale: OffsetDateTime) -> NewSale {
        NewSale {
            title: "Thing".to_owned(),
            description: None,
            price,
            category: "home".to_owned(),
            date_of_sale,
            sold,
            image: "https://example.com/thing.jpg".to_owned(),
        }
    }

    fn february() -> Month {
        Month::parse(Some("February")).unwrap()
    }

    #[test]
    fn empty_month_is_all_zeros() {
        let conn = get_test_connection();

        let got = get_statistics(february(), 2022, &conn).unwrap();

        assert_eq!(
            got,
            Statistics {
                total_amount: 0.0,
                total_items: 0,
                total_not_sold: 0
            }
        );
    }

    #[test]
    fn totals_are_consistent_with_matching_sales() {
        let conn = get_test_connection();
        let sales = [
            new_sale(10.5, true, datetime!(2022-02-01 00:00:00 UTC)),
            new_sale(20.0, false, datetime!(2022-02-14 08:00:00 UTC)),
            new_sale(30.25, true, datetime!(2022-02-28 23:59:59.999 UTC)),
            // Outside of February 2022.
            new_sale(1000.0, true, datetime!(2022-01-31 23:59:59.999 UTC)),
            new_sale(1000.0, true, datetime!(2022-03-01 00:00:00 UTC)),
            new_sale(1000.0, false, datetime!(2021-02-14 00:00:00 UTC)),
        ];
        insert_sales(&sales, &conn).unwrap();

        let got = get_statistics(february(), 2022, &conn).unwrap();

        assert_eq!(got.total_amount, 60.75);
        assert_eq!(got.total_items, 2);
        assert_eq!(got.total_not_sold, 1);
        assert_eq!(got.total_items + got.total_not_sold, 3);
    }

    #[test]
    fn reference_year_selects_which_year_is_reported() {
        let conn = get_test_connection();
        insert_sales(
            &[new_sale(5.0, true, datetime!(2021-02-14 00:00:00 UTC))],
            &conn,
        )
        .unwrap();

        assert_eq!(get_statistics(february(), 2022, &conn).unwrap().total_items, 0);
        assert_eq!(get_statistics(february(), 2021, &conn).unwrap().total_items, 1);
    }

    #[tokio::test]
    async fn endpoint_rejects_non_alphabetic_month() {
        let state = ReportState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            reference_year: 2022,
        };

        let response = get_statistics_endpoint(
            State(state),
            Query(MonthQuery {
                month: Some("13".to_owned()),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["error"],
            "Invalid month parameter. Please provide a valid month name."
        );
    }
}
