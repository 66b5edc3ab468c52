//! Paginated, searchable listing of the sales made in a month.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, named_params};
use serde::Deserialize;

use crate::{
    AppState, Error,
    month::Month,
    pagination::{Pagination, PaginationConfig},
};

use super::core::{SALE_COLUMNS, Sale, fold_case, map_sale_row};

const LIST_FAILURE_MESSAGE: &str = "Failed to list transactions. Please try again later.";

/// The state needed to list sales.
#[derive(Debug, Clone)]
pub struct ListSalesState {
    /// The database connection for reading sales.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The defaults for paging results.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListSalesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The raw query parameters for the sales listing.
///
/// Values are kept as strings so that malformed numbers produce the same JSON
/// error as out of range numbers.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSalesQuery {
    /// The name of the month to list sales for.
    pub month: Option<String>,
    /// Free text to match against the title, description or price.
    pub search: Option<String>,
    /// The one-based page number.
    pub page: Option<String>,
    /// The number of sales per page.
    pub per_page: Option<String>,
}

/// A validated listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleFilter {
    /// Sales made in this month of any year are included.
    pub month: Month,
    /// Text that the title or description must contain, ignoring case.
    ///
    /// If the text is a number, sales with exactly that price also match.
    pub search: String,
    /// Which page of the matching sales to return.
    pub pagination: Pagination,
}

impl SaleFilter {
    /// Validate the raw query parameters.
    ///
    /// # Errors
    /// Returns [Error::InvalidPage], [Error::InvalidPerPage] or
    /// [Error::InvalidMonth] for the first parameter that is invalid.
    pub fn from_query(query: ListSalesQuery, config: &PaginationConfig) -> Result<Self, Error> {
        let pagination =
            Pagination::from_query(query.page.as_deref(), query.per_page.as_deref(), config)?;
        let month = Month::parse(query.month.as_deref())?;

        Ok(Self {
            month,
            search: query.search.unwrap_or_default(),
            pagination,
        })
    }
}

/// Get one page of the sales matching `filter`, in the order they were stored.
///
/// # Errors
/// This function will return a:
/// - [Error::NoSalesFound] if the requested page is empty,
/// - or [Error::SqlError] if there is some SQL error.
pub fn list_sales(filter: &SaleFilter, connection: &Connection) -> Result<Vec<Sale>, Error> {
    let pattern = format!("%{}%", escape_like(&fold_case(&filter.search)));
    let price = filter
        .search
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite());
    let limit = i64::try_from(filter.pagination.limit()).unwrap_or(i64::MAX);
    let offset = i64::try_from(filter.pagination.offset()).unwrap_or(i64::MAX);

    let query = format!(
        "SELECT {SALE_COLUMNS} FROM sale \
        WHERE CAST(strftime('%m', date_of_sale / 1000.0, 'unixepoch') AS INTEGER) = :month \
        AND (title_folded LIKE :pattern ESCAPE '\\' \
            OR description_folded LIKE :pattern ESCAPE '\\' \
            OR (:price IS NOT NULL AND price = :price)) \
        ORDER BY id ASC \
        LIMIT :limit OFFSET :offset"
    );

    let sales = connection
        .prepare(&query)?
        .query_map(
            named_params! {
                ":month": filter.month.number(),
                ":pattern": pattern,
                ":price": price,
                ":limit": limit,
                ":offset": offset,
            },
            map_sale_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    if sales.is_empty() {
        return Err(Error::NoSalesFound);
    }

    Ok(sales)
}

/// Escape the LIKE wildcards in `text` so that it is matched literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// List the sales for a month, optionally filtered by a search term.
pub async fn get_sales_endpoint(
    State(state): State<ListSalesState>,
    Query(query): Query<ListSalesQuery>,
) -> Response {
    let result = SaleFilter::from_query(query, &state.pagination_config).and_then(|filter| {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        list_sales(&filter, &connection)
    });

    match result {
        Ok(sales) => Json(sales).into_response(),
        Err(error) => error.into_json_response(LIST_FAILURE_MESSAGE),
    }
}
