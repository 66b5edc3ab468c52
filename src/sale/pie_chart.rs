//! Number of sales per category in a month.

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

const PIE_CHART_FAILURE_MESSAGE: &str = "Failed to retrieve pie chart data. Please try again later.";

/// The number of sales in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// The category name.
    pub category: String,
    /// The number of sales in the category.
    pub count: u64,
}

/// Count the sales made in `month` of `reference_year` per category.
///
/// Categories without sales in the month are omitted. Results are ordered by
/// category name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_pie_chart(
    month: Month,
    reference_year: i32,
    connection: &Connection,
) -> Result<Vec<CategoryCount>, Error> {
    let span = MonthSpan::in_year(month, reference_year)?;

    connection
        .prepare(
            "SELECT category, COUNT(*) FROM sale \
            WHERE date_of_sale BETWEEN :start AND :end \
            GROUP BY category \
            ORDER BY category ASC",
        )?
        .query_map(
            named_params! {
                ":start": span.start_millis(),
                ":end": span.end_millis(),
            },
            |row| {
                Ok(CategoryCount {
                    category: row.get(0)?,
                    count: read_count(row, 1)?,
                })
            },
        )?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Get the per category sale counts for the month given in the query string.
pub async fn get_pie_chart_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<MonthQuery>,
) -> Response {
    let result = Month::parse(query.month.as_deref()).and_then(|month| {
        let connection = state.lock_connection()?;
        get_pie_chart(month, state.reference_year, &connection)
    });

    match result {
        Ok(categories) => Json(categories).into_response(),
        Err(error) => error.into_json_response(PIE_CHART_FAILURE_MESSAGE),
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        month::Month,
        sale::{NewSale, insert_sales},
    };

    use super::{CategoryCount, get_pie_chart};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_sale(category: &str) -> NewSale {
        NewSale {
            title: "Thing".to_owned(),
            description: None,
            price: 12.0,
            category: category.to_owned(),
            date_of_sale: datetime!(2022-09-03 09:15:00 UTC),
            sold: false,
            image: "https://example.com/thing.jpg".to_owned(),
        }
    }

    #[test]
    fn groups_by_category() {
        let conn = get_test_connection();
        let mut october = new_sale("jewelery");
        october.date_of_sale = datetime!(2022-10-01 00:00:00 UTC);
        insert_sales(
            &[
                new_sale("men's clothing"),
                new_sale("electronics"),
                new_sale("men's clothing"),
                new_sale("electronics"),
                new_sale("electronics"),
                october,
            ],
            &conn,
        )
        .unwrap();

        let got = get_pie_chart(Month::parse(Some("Sep")).unwrap(), 2022, &conn).unwrap();

        assert_eq!(
            got,
            [
                CategoryCount {
                    category: "electronics".to_owned(),
                    count: 3
                },
                CategoryCount {
                    category: "men's clothing".to_owned(),
                    count: 2
                },
            ]
        );
        assert_eq!(got.iter().map(|c| c.count).sum::<u64>(), 5);
    }

    #[test]
    fn empty_month_has_no_categories() {
        let conn = get_test_connection();
        insert_sales(&[new_sale("electronics")], &conn).unwrap();

        let got = get_pie_chart(Month::parse(Some("August")).unwrap(), 2022, &conn).unwrap();

        assert!(got.is_empty());
    }
}
