//! Defines the core data model and database queries for sale records.

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::SaleId, month::to_unix_millis};

// ============================================================================
// MODELS
// ============================================================================

/// A product listing together with when, and whether, it was sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// The ID of the sale.
    pub id: SaleId,
    /// The name of the product.
    pub title: String,
    /// A longer description of the product.
    pub description: Option<String>,
    /// The price the product was listed at.
    pub price: f64,
    /// The product category, e.g. "electronics".
    pub category: String,
    /// When the sale took place.
    #[serde(with = "time::serde::rfc3339")]
    pub date_of_sale: OffsetDateTime,
    /// Whether the product was sold.
    pub sold: bool,
    /// A URL to an image of the product.
    pub image: String,
}

/// A sale that has not been written to the database yet.
///
/// Use [NewSale::validate] (or [insert_sales], which calls it) to check the
/// record before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    /// The name of the product. Must not be empty.
    pub title: String,
    /// A longer description of the product.
    pub description: Option<String>,
    /// The listed price. Must be finite and not negative.
    pub price: f64,
    /// The product category. Must not be empty.
    pub category: String,
    /// When the sale took place.
    pub date_of_sale: OffsetDateTime,
    /// Whether the product was sold.
    pub sold: bool,
    /// A URL to an image of the product. Must not be empty.
    pub image: String,
}

impl NewSale {
    /// Check that the required fields are populated.
    ///
    /// # Errors
    /// Returns [Error::InvalidSale] naming the first field that is invalid.
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidSale("title must not be empty".to_owned()));
        }

        if self.category.trim().is_empty() {
            return Err(Error::InvalidSale(format!(
                "category of \"{}\" must not be empty",
                self.title
            )));
        }

        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::InvalidSale(format!(
                "price of \"{}\" must be a non-negative number, got {}",
                self.title, self.price
            )));
        }

        if self.image.trim().is_empty() {
            return Err(Error::InvalidSale(format!(
                "image of \"{}\" must not be empty",
                self.title
            )));
        }

        Ok(())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the sale table in the database.
///
/// `date_of_sale` is stored as milliseconds since the Unix epoch (UTC).
/// `title_folded` and `description_folded` hold the lowercased title and
/// description for case-insensitive search, see [fold_case].
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_sale_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS sale (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL CHECK (length(trim(title)) > 0),
                description TEXT,
                price REAL NOT NULL CHECK (price >= 0),
                category TEXT NOT NULL CHECK (length(trim(category)) > 0),
                date_of_sale INTEGER NOT NULL,
                sold INTEGER NOT NULL CHECK (sold IN (0, 1)),
                image TEXT NOT NULL CHECK (length(trim(image)) > 0),
                title_folded TEXT NOT NULL DEFAULT '',
                description_folded TEXT
                )",
        (),
    )?;

    // Used by the month based report queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_sale_date_of_sale ON sale(date_of_sale);",
        (),
    )?;

    Ok(())
}

/// Insert `sales` into the database.
///
/// Every sale is validated before anything is written.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidSale] if any sale fails validation,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_sales(sales: &[NewSale], connection: &Connection) -> Result<usize, Error> {
    for sale in sales {
        sale.validate()?;
    }

    let mut statement = connection.prepare(
        "INSERT INTO sale (title, description, price, category, date_of_sale, sold, image,
            title_folded, description_folded)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;

    let mut inserted = 0;
    for sale in sales {
        inserted += statement.execute((
            &sale.title,
            &sale.description,
            sale.price,
            &sale.category,
            to_unix_millis(sale.date_of_sale),
            sale.sold,
            &sale.image,
            fold_case(&sale.title),
            sale.description.as_deref().map(fold_case),
        ))?;
    }

    Ok(inserted)
}

/// Delete every sale in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn delete_all_sales(connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM sale", ())
        .map_err(|error| error.into())
}

/// Get the total number of sales in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_sales(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM sale;", [], |row| read_count(row, 0))
        .map_err(|error| error.into())
}

/// The columns expected by [map_sale_row], in order.
pub const SALE_COLUMNS: &str = "id, title, description, price, category, date_of_sale, sold, image";

/// Map a database row to a [Sale].
///
/// The row must contain the columns listed in [SALE_COLUMNS].
pub fn map_sale_row(row: &Row) -> Result<Sale, rusqlite::Error> {
    let date_of_sale_millis: i64 = row.get(5)?;
    let date_of_sale = from_unix_millis(date_of_sale_millis).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Integer, Box::new(error))
    })?;

    Ok(Sale {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category: row.get(4)?,
        date_of_sale,
        sold: row.get(6)?,
        image: row.get(7)?,
    })
}

/// Lowercase `text` for case-insensitive matching.
///
/// SQLite's `LIKE` only ignores case for ASCII letters, so text is folded in
/// Rust where every Unicode letter has a lowercase mapping.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Read a non-negative integer column, such as a `COUNT(*)`, as a [u64].
pub(crate) fn read_count(row: &Row, index: usize) -> Result<u64, rusqlite::Error> {
    let count: i64 = row.get(index)?;

    u64::try_from(count).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}

/// Convert milliseconds since the Unix epoch to a UTC timestamp.
pub fn from_unix_millis(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
}

// ============================================================================
// TESTS
// ============================================================================
