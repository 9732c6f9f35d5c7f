//! Item Name Code (INC) queries over `V_H6_NAME_INC`.

use std::sync::Arc;

use publog_store::{Store, Value};

use crate::config::Limits;
use crate::error::Result;
use crate::matching::{exact_code, like_pattern};
use crate::records::IncRecord;
use crate::types::Page;

const GET_BY_CODE: &str = "SELECT * FROM V_H6_NAME_INC WHERE INC = ? LIMIT 1";

const SEARCH: &str = "SELECT * FROM V_H6_NAME_INC \
     WHERE UPPER(FIIG_TITLE) LIKE ? OR UPPER(DEFINITION) LIKE ? OR UPPER(INC) LIKE ? \
     ORDER BY FIIG_TITLE LIMIT ?";

const LIST_ALL: &str = "SELECT * FROM V_H6_NAME_INC ORDER BY FIIG_TITLE LIMIT ?";

/// Item name lookups and searches.
pub struct ItemNameService<S: Store> {
    store: Arc<S>,
    limits: Limits,
}

impl<S: Store> ItemNameService<S> {
    /// Create a new item name service.
    #[must_use]
    pub fn new(store: Arc<S>, limits: Limits) -> Self {
        Self { store, limits }
    }

    /// Look up one item name by code.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    pub fn get_by_code(&self, code: &str) -> Result<Option<IncRecord>> {
        let rows = self.store.query(GET_BY_CODE, &[exact_code(code)])?;
        Ok(rows.into_iter().next().map(IncRecord::from))
    }

    /// Item names whose title, definition, or code contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an out-of-range limit, or
    /// `ServiceError::Store` if the query fails.
    pub fn search(&self, term: &str, limit: i64) -> Result<Vec<IncRecord>> {
        let page = Page::first(limit).validate(self.limits.max_search_results)?;
        let pattern = like_pattern(term);
        let rows = self.store.query(
            SEARCH,
            &[
                pattern.clone(),
                pattern.clone(),
                pattern,
                Value::Integer(page.limit),
            ],
        )?;
        Ok(rows.into_iter().map(IncRecord::from).collect())
    }

    /// The first `limit` item names by title.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an out-of-range limit, or
    /// `ServiceError::Store` if the query fails.
    pub fn list_all(&self, limit: i64) -> Result<Vec<IncRecord>> {
        let page = Page::first(limit).validate(self.limits.max_search_results)?;
        let rows = self.store.query(LIST_ALL, &[Value::Integer(page.limit)])?;
        Ok(rows.into_iter().map(IncRecord::from).collect())
    }
}
