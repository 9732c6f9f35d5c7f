//! HTTP request handlers.
//!
//! List endpoints answer with `{data, count}` and, when paged,
//! `limit` and `offset`. Lookups that find nothing answer 404.

pub mod admin;
pub mod cage;
pub mod classification;
pub mod health;
pub mod inc;
pub mod nsn;
pub mod search;

use publog_service::{Limits, Page};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A list of results.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    /// The results.
    pub data: Vec<T>,
    /// Number of results returned.
    pub count: usize,
    /// The limit applied, for paged endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// The offset applied, for paged endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl<T> ListResponse<T> {
    /// An unpaged list.
    #[must_use]
    pub fn new(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
            limit: None,
            offset: None,
        }
    }

    /// A paged list.
    #[must_use]
    pub fn paged(data: Vec<T>, page: Page) -> Self {
        Self {
            limit: Some(page.limit),
            offset: Some(page.offset),
            ..Self::new(data)
        }
    }
}

/// `limit` and `offset` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Results per page.
    pub limit: Option<i64>,
    /// Results to skip.
    #[serde(default)]
    pub offset: i64,
}

impl PageQuery {
    /// The requested page, with the configured default limit.
    #[must_use]
    pub fn page(&self, limits: &Limits) -> Page {
        Page::new(self.limit.unwrap_or(limits.default_page_size), self.offset)
    }
}

/// A required free-text query with an optional limit.
#[derive(Debug, Deserialize)]
pub struct TermQuery {
    /// Search text.
    pub q: String,
    /// Results to return.
    pub limit: Option<i64>,
    /// Results to skip.
    #[serde(default)]
    pub offset: i64,
}

impl TermQuery {
    /// The trimmed search text.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BadRequest` if it is blank.
    pub fn term(&self) -> Result<String, ApiError> {
        let term = self.q.trim();
        if term.is_empty() {
            return Err(ApiError::BadRequest("q must not be empty".to_string()));
        }
        Ok(term.to_string())
    }

    /// The requested page, with the configured default limit.
    #[must_use]
    pub fn page(&self, limits: &Limits) -> Page {
        Page::new(self.limit.unwrap_or(limits.default_page_size), self.offset)
    }
}
