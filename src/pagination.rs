//! This modules defines the common functionality for paging data.

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of sales to return per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// A validated, one-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// The page number, starting at 1.
    pub page: u64,
    /// The maximum number of items on a page.
    pub per_page: u64,
}

impl Pagination {
    /// Build a page request from the raw `page` and `perPage` query values,
    /// falling back to the defaults in `config` when a value is absent.
    ///
    /// # Errors
    /// Returns [Error::InvalidPage] or [Error::InvalidPerPage] if the
    /// corresponding value is not an integer greater than zero.
    pub fn from_query(
        page: Option<&str>,
        per_page: Option<&str>,
        config: &PaginationConfig,
    ) -> Result<Self, Error> {
        let page = parse_positive(page, config.default_page).ok_or(Error::InvalidPage)?;
        let per_page =
            parse_positive(per_page, config.default_page_size).ok_or(Error::InvalidPerPage)?;

        Ok(Self { page, per_page })
    }

    /// The number of items to skip before the start of this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// The maximum number of items on this page.
    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

fn parse_positive(value: Option<&str>, default: u64) -> Option<u64> {
    match value {
        None => Some(default),
        Some(text) => text.trim().parse::<u64>().ok().filter(|&number| number >= 1),
    }
}
