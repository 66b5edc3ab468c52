//! Counts of the sales made in a month, bucketed into fixed price bands.

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

const BAR_CHART_FAILURE_MESSAGE: &str = "Failed to retrieve bar chart data. Please try again later.";

/// The number of price bands in the chart.
pub const BAND_COUNT: usize = 10;

/// The inclusive upper price bound of every band except the last, which is unbounded.
const BAND_UPPER_BOUNDS: [f64; BAND_COUNT - 1] =
    [100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 900.0];

/// The labels of the price bands, in ascending order of price.
pub const BAND_LABELS: [&str; BAND_COUNT] = [
    "0 - 100",
    "101 - 200",
    "201 - 300",
    "301 - 400",
    "401 - 500",
    "501 - 600",
    "601 - 700",
    "701 - 800",
    "801 - 900",
    "901 - above",
];

/// The number of sales in one price band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    /// The label of the band, e.g. "101 - 200".
    pub range: String,
    /// The number of sales with a price in the band.
    pub count: u64,
}

/// The index into [BAND_LABELS] of the band that contains `price`.
///
/// The first band is `[0, 100]`, each following band covers the next 100
/// above its predecessor's upper bound and the last band is everything above
/// 900. Whole number prices therefore land in the band their label names.
pub fn band_index(price: f64) -> usize {
    BAND_UPPER_BOUNDS
        .iter()
        .position(|&upper| price <= upper)
        .unwrap_or(BAND_COUNT - 1)
}

/// The SQL expression that computes [band_index] for the `price` column.
fn band_index_sql() -> String {
    let mut sql = String::from("CASE");

    for (index, upper) in BAND_UPPER_BOUNDS.iter().enumerate() {
        sql.push_str(&format!(" WHEN price <= {upper:.1} THEN {index}"));
    }

    sql.push_str(&format!(" ELSE {} END", BAND_COUNT - 1));
    sql
}

/// Check a band index computed by [band_index_sql].
fn band_from_sql(band: i64) -> Result<usize, rusqlite::Error> {
    usize::try_from(band)
        .ok()
        .filter(|&index| index < BAND_COUNT)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(0, band))
}

/// Count the sales made in `month` of `reference_year` in each price band.
///
/// Every band is present in the result, in ascending order, even when it has
/// no sales. All counts come from a single query so the result either
/// succeeds as a whole or fails.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_bar_chart(
    month: Month,
    reference_year: i32,
    connection: &Connection,
) -> Result<Vec<PriceBand>, Error> {
    let span = MonthSpan::in_year(month, reference_year)?;

    let mut statement = connection.prepare(&format!(
        "SELECT {} AS band, COUNT(*) \
        FROM sale \
        WHERE date_of_sale BETWEEN :start AND :end \
        GROUP BY band",
        band_index_sql()
    ))?;

    let rows = statement.query_map(
        named_params! {
            ":start": span.start_millis(),
            ":end": span.end_millis(),
        },
        |row| Ok((band_from_sql(row.get(0)?)?, read_count(row, 1)?)),
    )?;

    let mut counts = [0u64; BAND_COUNT];
    for row in rows {
        let (band, count) = row?;
        counts[band] += count;
    }

    Ok(BAND_LABELS
        .iter()
        .zip(counts)
        .map(|(label, count)| PriceBand {
            range: (*label).to_owned(),
            count,
        })
        .collect())
}

/// Get the price band counts for the month given in the query string.
pub async fn get_bar_chart_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<MonthQuery>,
) -> Response {
    let result = Month::parse(query.month.as_deref()).and_then(|month| {
        let connection = state.lock_connection()?;
        get_bar_chart(month, state.reference_year, &connection)
    });

    match result {
        Ok(bands) => Json(bands).into_response(),
        Err(error) => error.into_json_response(BAR_CHART_FAILURE_MESSAGE),
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

    use super::{
        BAND_COUNT, BAND_LABELS, band_from_sql, band_index, band_index_sql, get_bar_chart,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_sale(price: f64) -> NewSale {
        NewSale {
            title: format!("Item costing {price}"),
            description: None,
            price,
            category: "home".to_owned(),
            date_of_sale: datetime!(2022-06-15 12:00:00 UTC),
            sold: true,
            image: "https://example.com/item.jpg".to_owned(),
        }
    }

    fn june() -> Month {
        Month::parse(Some("June")).unwrap()
    }

    #[test]
    fn band_index_matches_labels_for_whole_prices() {
        assert_eq!(band_index(0.0), 0);
        assert_eq!(band_index(100.0), 0);
        assert_eq!(band_index(101.0), 1);
        assert_eq!(band_index(200.0), 1);
        assert_eq!(band_index(201.0), 2);
        assert_eq!(band_index(900.0), 8);
        assert_eq!(band_index(901.0), 9);
        assert_eq!(band_index(1_000_000.0), 9);
    }

    #[test]
    fn band_index_places_fractional_prices_in_exactly_one_band() {
        assert_eq!(band_index(100.5), 1);
        assert_eq!(band_index(200.01), 2);
        assert_eq!(band_index(900.5), 9);
    }

    #[test]
    fn band_from_sql_rejects_out_of_range_indices() {
        assert_eq!(band_from_sql(0).unwrap(), 0);
        assert_eq!(band_from_sql(9).unwrap(), 9);
        assert!(matches!(
            band_from_sql(10),
            Err(rusqlite::Error::IntegralValueOutOfRange(0, 10))
        ));
        assert!(matches!(
            band_from_sql(-1),
            Err(rusqlite::Error::IntegralValueOutOfRange(0, -1))
        ));
    }

    #[test]
    fn band_sql_lists_bounds_in_order() {
        assert_eq!(
            band_index_sql(),
            "CASE WHEN price <= 100.0 THEN 0 WHEN price <= 200.0 THEN 1 \
            WHEN price <= 300.0 THEN 2 WHEN price <= 400.0 THEN 3 \
            WHEN price <= 500.0 THEN 4 WHEN price <= 600.0 THEN 5 \
            WHEN price <= 700.0 THEN 6 WHEN price <= 800.0 THEN 7 \
            WHEN price <= 900.0 THEN 8 ELSE 9 END"
        );
    }

    #[test]
    fn empty_month_has_every_band_with_zero() {
        let conn = get_test_connection();

        let got = get_bar_chart(june(), 2022, &conn).unwrap();

        assert_eq!(got.len(), BAND_COUNT);
        for (band, label) in got.iter().zip(BAND_LABELS) {
            assert_eq!(band.range, label);
            assert_eq!(band.count, 0);
        }
    }

    #[test]
    fn counts_each_sale_in_its_band() {
        let conn = get_test_connection();
        let prices = [
            0.0, 99.99, 100.0, 100.5, 150.0, 200.0, 329.85, 499.0, 901.0, 2500.0,
        ];
        let sales: Vec<_> = prices.iter().copied().map(new_sale).collect();
        insert_sales(&sales, &conn).unwrap();

        let got = get_bar_chart(june(), 2022, &conn).unwrap();

        let counts: Vec<u64> = got.iter().map(|band| band.count).collect();
        assert_eq!(counts, [3, 3, 0, 1, 1, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn query_agrees_with_band_index() {
        let conn = get_test_connection();
        let prices: Vec<f64> = (0..=1000).map(|i| i as f64 * 1.37).collect();
        let sales: Vec<_> = prices.iter().copied().map(new_sale).collect();
        insert_sales(&sales, &conn).unwrap();

        let got = get_bar_chart(june(), 2022, &conn).unwrap();

        let mut want = [0u64; BAND_COUNT];
        for price in prices {
            want[band_index(price)] += 1;
        }
        let counts: Vec<u64> = got.iter().map(|band| band.count).collect();
        assert_eq!(counts, want);
        assert_eq!(counts.iter().sum::<u64>(), sales.len() as u64);
    }

    #[test]
    fn ignores_sales_outside_the_month() {
        let conn = get_test_connection();
        let mut may = new_sale(50.0);
        may.date_of_sale = datetime!(2022-05-31 23:59:59.999 UTC);
        let mut last_year = new_sale(50.0);
        last_year.date_of_sale = datetime!(2021-06-15 12:00:00 UTC);
        insert_sales(&[may, last_year, new_sale(50.0)], &conn).unwrap();

        let got = get_bar_chart(june(), 2022, &conn).unwrap();

        assert_eq!(got[0].count, 1);
    }
}
