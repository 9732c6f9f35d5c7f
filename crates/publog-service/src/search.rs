//! Fan-out search across every domain.
//!
//! Each category runs on its own: a failing category is logged and comes
//! back empty while the others still return results.

use std::sync::Arc;

use publog_store::Store;
use serde::Serialize;

use crate::cage::CageService;
use crate::classification::ClassificationService;
use crate::config::Limits;
use crate::error::Result;
use crate::item_name::ItemNameService;
use crate::records::{CageRecord, FscRecord, IncRecord, NsnRecord};
use crate::stock_number::StockNumberService;
use crate::types::Page;

/// Results of a unified search, one list per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    /// Matching contractors.
    pub contractor: Vec<CageRecord>,
    /// Matching supply classes.
    pub classification: Vec<FscRecord>,
    /// Matching stock numbers.
    pub stock_number: Vec<NsnRecord>,
    /// Matching item names.
    pub item_name: Vec<IncRecord>,
}

impl SearchResults {
    /// Total number of results across categories.
    #[must_use]
    pub fn total(&self) -> usize {
        self.contractor.len()
            + self.classification.len()
            + self.stock_number.len()
            + self.item_name.len()
    }
}

/// Runs one term against all four domains.
pub struct SearchAggregator<S: Store> {
    cage: CageService<S>,
    classification: ClassificationService<S>,
    stock_number: StockNumberService<S>,
    item_name: ItemNameService<S>,
    limits: Limits,
}

impl<S: Store> SearchAggregator<S> {
    /// Create an aggregator over a shared store.
    #[must_use]
    pub fn new(store: Arc<S>, limits: Limits) -> Self {
        Self {
            cage: CageService::new(Arc::clone(&store), limits),
            classification: ClassificationService::new(Arc::clone(&store), limits),
            stock_number: StockNumberService::new(Arc::clone(&store), limits),
            item_name: ItemNameService::new(store, limits),
            limits,
        }
    }

    /// Search every category for `term`, keeping at most `limit` results in
    /// each.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` if `limit` is out of range.
    /// Category failures never surface here.
    pub fn search_all(&self, term: &str, limit: i64) -> Result<SearchResults> {
        let page = Page::first(limit).validate(self.limits.max_search_results)?;

        let contractor = isolate("contractor", || self.cage.search(term, page));
        let mut classification = isolate("classification", || self.classification.search(term));
        classification.truncate(usize::try_from(page.limit).unwrap_or(usize::MAX));
        let stock_number = isolate("stock_number", || {
            self.stock_number.search(term, None, page)
        });
        let item_name = isolate("item_name", || self.item_name.search(term, page.limit));

        let results = SearchResults {
            contractor,
            classification,
            stock_number,
            item_name,
        };
        tracing::debug!(term, total = results.total(), "Unified search complete");
        Ok(results)
    }
}

fn isolate<T>(category: &str, search: impl FnOnce() -> Result<Vec<T>>) -> Vec<T> {
    search().unwrap_or_else(|e| {
        tracing::error!(category, error = %e, "Search category failed");
        Vec::new()
    })
}
