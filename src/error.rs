//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The message sent to the client when an unexpected error occurs and no
/// operation specific message was given.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The month query parameter was missing, not alphabetic, or not the name
    /// of a month.
    #[error("Invalid month parameter. Please provide a valid month name.")]
    InvalidMonth,

    /// The page query parameter was not a positive integer.
    #[error("Invalid page number. Page number must be a positive integer.")]
    InvalidPage,

    /// The perPage query parameter was not a positive integer.
    #[error("Invalid perPage value. Items per page must be a positive integer.")]
    InvalidPerPage,

    /// A list query matched no sales on the requested page.
    #[error("No transactions found for the given criteria.")]
    NoSalesFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("The requested resource could not be found.")]
    NotFound,

    /// A sale failed validation before being written to the database.
    ///
    /// The string describes which field was invalid and should only be logged.
    #[error("invalid sale record: {0}")]
    InvalidSale(String),

    /// The seed feed could not be fetched or decoded.
    #[error("could not fetch seed data: {0}")]
    SeedFetch(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::SeedFetch(value.to_string())
    }
}

/// The JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// A human readable description of what went wrong.
    pub error: String,
}

impl Error {
    /// The status code the client should receive for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidMonth | Error::InvalidPage | Error::InvalidPerPage => {
                StatusCode::BAD_REQUEST
            }
            Error::NoSalesFound | Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidSale(_)
            | Error::SeedFetch(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error into a JSON response.
    ///
    /// Client errors keep their own message. Any other error is logged and
    /// replaced with `failure_message` so that internal details never reach
    /// the client.
    pub fn into_json_response(self, failure_message: &str) -> Response {
        let status_code = self.status_code();

        let message = if status_code.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
            failure_message.to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(ErrorBody { error: message })).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_json_response(GENERIC_FAILURE_MESSAGE)
    }
}
