//! Seeding the database from the remote JSON feed of sales.
//!
//! The feed is a JSON array of sale objects. Each element is normalized before
//! it is stored: unparseable sale dates are replaced with the current time and
//! missing images with a placeholder URL. Seeding replaces the contents of the
//! database, it never adds to them.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Transaction as SqlTransaction};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::{
        BorrowedFormatItem,
        well_known::{Rfc2822, Rfc3339},
    },
    macros::format_description,
};

use crate::{
    AppState, Error,
    sale::{NewSale, delete_all_sales, from_unix_millis, insert_sales},
};

/// The feed used to seed the database when no other URL is configured.
pub const DEFAULT_SEED_URL: &str = "https://s3.amazonaws.com/roxiler.com/product_transaction.json";

/// The image URL given to sales that do not have one.
pub const DEFAULT_IMAGE_URL: &str = "https://default-image-url.com/default.jpg";

const SEED_FAILURE_MESSAGE: &str = "Failed to initialize database. Please try again later.";

const DATE_TIME_FORMATS: [&[BorrowedFormatItem]; 3] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"),
    format_description!("[year]/[month]/[day] [hour]:[minute]:[second][optional [.[subsecond]]]"),
];

const DATE_FORMATS: [&[BorrowedFormatItem]; 4] = [
    format_description!("[year]-[month]-[day]"),
    format_description!("[year]/[month]/[day]"),
    format_description!("[month repr:long case_sensitive:false] [day padding:none], [year]"),
    format_description!("[month repr:short case_sensitive:false] [day padding:none], [year]"),
];

/// A sale as it appears in the seed feed.
///
/// Fields that the feed carries but the database does not store, such as the
/// feed's own `id`, are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSale {
    /// The name of the product.
    pub title: String,
    /// A longer description of the product.
    #[serde(default)]
    pub description: Option<String>,
    /// The listed price. The feed may give it as a number or a numeric string.
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
    /// The product category.
    pub category: String,
    /// The sale date in whatever form the feed provides it.
    #[serde(default)]
    pub date_of_sale: Option<Value>,
    /// Whether the product was sold.
    pub sold: bool,
    /// A URL to an image of the product.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(price) => Ok(price),
        NumberOrText::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|error| de::Error::custom(format!("invalid price {text:?}: {error}"))),
    }
}

/// Parse a sale date from the feed.
///
/// Accepts:
/// - RFC 3339 and RFC 2822 timestamps,
/// - date-times without an offset, separated by `T` or a space, with `-` or `/`
///   between the date parts (read as UTC),
/// - plain dates such as "2022-02-15", "2022/02/15" or "February 15, 2022"
///   (midnight UTC),
/// - numbers of milliseconds since the Unix epoch.
///
/// The result is converted to UTC. Returns `None` if `value` is not a date in
/// any of those forms.
pub fn parse_date_of_sale(value: &Value) -> Option<OffsetDateTime> {
    let date_time = match value {
        Value::String(text) => parse_date_text(text.trim())?,
        Value::Number(number) => from_unix_millis(number.as_i64()?).ok()?,
        _ => return None,
    };

    Some(date_time.to_offset(UtcOffset::UTC))
}

fn parse_date_text(text: &str) -> Option<OffsetDateTime> {
    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(date_time);
    }

    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc2822) {
        return Some(date_time);
    }

    if let Some(date_time) = DATE_TIME_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(text, format).ok())
    {
        return Some(date_time.assume_utc());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| Date::parse(text, format).ok())
        .map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
}

/// Convert a feed record into a sale that can be stored.
///
/// A sale date that cannot be parsed is replaced with `now`, and a missing or
/// empty image URL is replaced with [DEFAULT_IMAGE_URL].
pub fn normalize(raw: RawSale, now: OffsetDateTime) -> NewSale {
    let date_of_sale = match raw.date_of_sale.as_ref().and_then(parse_date_of_sale) {
        Some(date_of_sale) => date_of_sale,
        None => {
            tracing::debug!(
                "replacing invalid sale date {:?} of \"{}\" with the current time",
                raw.date_of_sale,
                raw.title
            );
            now
        }
    };

    let image = raw
        .image
        .filter(|image| !image.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_owned());

    NewSale {
        title: raw.title,
        description: raw.description,
        price: raw.price,
        category: raw.category,
        date_of_sale,
        sold: raw.sold,
        image,
    }
}

/// Fetch the raw sales from the feed at `url`.
///
/// # Errors
/// Returns [Error::SeedFetch] if the request fails, the server responds with
/// an error status, or the body is not a JSON array of sales.
pub async fn fetch_raw_sales(client: &reqwest::Client, url: &str) -> Result<Vec<RawSale>, Error> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(Error::SeedFetch(format!(
            "{url} responded with status {}",
            response.status()
        )));
    }

    let sales = response.json::<Vec<RawSale>>().await?;

    Ok(sales)
}

/// Replace every sale in the database with `sales`.
///
/// The delete and the inserts happen in one SQL transaction, so if any sale
/// is rejected the previous contents are kept.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidSale] if any sale fails validation,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn replace_sales(sales: &[NewSale], connection: &Connection) -> Result<usize, Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Immediate)?;

    let deleted = delete_all_sales(&transaction)?;
    let inserted = insert_sales(sales, &transaction)?;

    transaction.commit()?;

    tracing::info!("Replaced {deleted} sales with {inserted} sales from the seed feed.");

    Ok(inserted)
}

/// The state needed to seed the database.
#[derive(Debug, Clone)]
pub struct SeedState {
    /// The database connection to write sales to.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The client used to fetch the feed.
    pub http_client: reqwest::Client,
    /// The URL of the feed.
    pub seed_url: String,
}

impl FromRef<AppState> for SeedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            http_client: state.http_client.clone(),
            seed_url: state.seed_url.clone(),
        }
    }
}

/// The response body for a successful seed.
#[derive(Debug, Serialize, Deserialize)]
pub struct SeedResponse {
    /// A message confirming the database was seeded.
    pub message: String,
}

/// Fetch the seed feed and replace the sales in the database with it.
pub async fn initialize_db_endpoint(State(state): State<SeedState>) -> Response {
    match seed_database(&state).await {
        Ok(_) => Json(SeedResponse {
            message: "Database initialized with seed data".to_owned(),
        })
        .into_response(),
        Err(error) => error.into_json_response(SEED_FAILURE_MESSAGE),
    }
}

async fn seed_database(state: &SeedState) -> Result<usize, Error> {
    let raw_sales = fetch_raw_sales(&state.http_client, &state.seed_url).await?;
    tracing::info!("Fetched {} sales from {}", raw_sales.len(), state.seed_url);

    let now = OffsetDateTime::now_utc();
    let sales: Vec<NewSale> = raw_sales
        .into_iter()
        .map(|raw| normalize(raw, now))
        .collect();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    replace_sales(&sales, &connection)
}
