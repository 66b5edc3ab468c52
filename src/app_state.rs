//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{pagination::PaginationConfig, seed::DEFAULT_SEED_URL};

/// The year that the report endpoints resolve month names against.
pub const DEFAULT_REFERENCE_YEAR: i32 = 2022;

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The config that controls how to page sale listings.
    pub pagination_config: PaginationConfig,

    /// The client used to fetch the seed feed.
    pub http_client: reqwest::Client,

    /// The URL of the JSON feed used to seed the database.
    pub seed_url: String,

    /// The year that statistics and charts are computed for.
    pub reference_year: i32,
}

impl AppState {
    /// Create a new [AppState] around an initialized database connection.
    ///
    /// The connection is expected to have been opened with [crate::open_db].
    pub fn new(db_connection: Connection) -> Self {
        Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            pagination_config: PaginationConfig::default(),
            http_client: reqwest::Client::new(),
            seed_url: DEFAULT_SEED_URL.to_owned(),
            reference_year: DEFAULT_REFERENCE_YEAR,
        }
    }

    /// Set the URL of the seed feed.
    pub fn with_seed_url(mut self, seed_url: impl Into<String>) -> Self {
        self.seed_url = seed_url.into();
        self
    }

    /// Set the year that statistics and charts are computed for.
    pub fn with_reference_year(mut self, reference_year: i32) -> Self {
        self.reference_year = reference_year;
        self
    }

    /// Set the pagination defaults.
    pub fn with_pagination_config(mut self, pagination_config: PaginationConfig) -> Self {
        self.pagination_config = pagination_config;
        self
    }
}
