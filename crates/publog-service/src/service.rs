//! Service facade wiring every component over one shared store.

use std::sync::Arc;

use publog_core::Catalog;
use publog_store::Store;

use crate::cage::CageService;
use crate::classification::ClassificationService;
use crate::config::ServiceConfig;
use crate::indexer::IndexManager;
use crate::item_name::ItemNameService;
use crate::search::SearchAggregator;
use crate::stock_number::StockNumberService;

/// The index manager and every query service, sharing one store handle.
pub struct PublogService<S: Store> {
    config: ServiceConfig,
    indexer: IndexManager<S>,
    cage: CageService<S>,
    classification: ClassificationService<S>,
    stock_number: StockNumberService<S>,
    item_name: ItemNameService<S>,
    search: SearchAggregator<S>,
}

impl<S: Store> PublogService<S> {
    /// Wire the services over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, catalog: Arc<Catalog>, config: ServiceConfig) -> Self {
        let limits = config.limits();
        Self {
            indexer: IndexManager::new(Arc::clone(&store), catalog, config.csv_options()),
            cage: CageService::new(Arc::clone(&store), limits),
            classification: ClassificationService::new(Arc::clone(&store), limits),
            stock_number: StockNumberService::new(Arc::clone(&store), limits),
            item_name: ItemNameService::new(Arc::clone(&store), limits),
            search: SearchAggregator::new(store, limits),
            config,
        }
    }

    /// The configuration the services were built with.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Dataset loading and store introspection.
    #[must_use]
    pub const fn indexer(&self) -> &IndexManager<S> {
        &self.indexer
    }

    /// Contractor queries.
    #[must_use]
    pub const fn cage(&self) -> &CageService<S> {
        &self.cage
    }

    /// Supply class and group queries.
    #[must_use]
    pub const fn classification(&self) -> &ClassificationService<S> {
        &self.classification
    }

    /// Stock number queries.
    #[must_use]
    pub const fn stock_number(&self) -> &StockNumberService<S> {
        &self.stock_number
    }

    /// Item name queries.
    #[must_use]
    pub const fn item_name(&self) -> &ItemNameService<S> {
        &self.item_name
    }

    /// Fan-out search.
    #[must_use]
    pub const fn search(&self) -> &SearchAggregator<S> {
        &self.search
    }
}
