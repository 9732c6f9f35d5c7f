//! Index manager and domain query services for the PubLog dataset service.
//!
//! This crate holds the business logic: turning catalog datasets into
//! queryable relations, and answering contractor, supply class, stock number,
//! and item name queries over them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Gateway (HTTP)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      PublogService                          │
//! │  ┌──────────────┐ ┌──────────────────┐ ┌────────────────┐   │
//! │  │ IndexManager │ │  Domain services │ │ SearchAggreg.  │   │
//! │  │ (load/index) │ │ CAGE FSC NSN INC │ │ (fan-out)      │   │
//! │  └──────────────┘ └──────────────────┘ └────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!               │                              │
//!               ▼                              ▼
//!        ┌──────────────┐               ┌──────────────┐
//!        │   Catalog    │               │    Store     │
//!        │ (static)     │               │  (SQLite)    │
//!        └──────────────┘               └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use publog_core::Catalog;
//! use publog_service::{PublogService, ServiceConfig};
//! use publog_store::SqliteStore;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::default();
//! let store = SqliteStore::shared(&config.db_path)?;
//! let catalog = Arc::new(Catalog::publog(&config.data_dir));
//! let service = PublogService::new(store, catalog, config);
//!
//! let report = service.indexer().initialize(false, true);
//! println!("{} of {} tables loaded", report.indexed, report.total);
//!
//! if let Some(contractor) = service.cage().get_by_code("1ABC2")? {
//!     println!("{:?}", contractor.company);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Relation Lifecycle
//!
//! Relations move `Absent → Loading → Loaded`. A failed first load returns
//! to `Absent`; a failed forced reload returns to `Loaded` with the previous
//! contents. See the [`lifecycle`] module.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cage;
pub mod classification;
pub mod config;
pub mod error;
pub mod indexer;
pub mod item_name;
pub mod lifecycle;
pub mod matching;
pub mod records;
pub mod search;
pub mod service;
pub mod stock_number;
pub mod types;

#[cfg(test)]
mod testing;

pub use cage::CageService;
pub use classification::ClassificationService;
pub use config::{Limits, ServiceConfig};
pub use error::{Result, ServiceError};
pub use indexer::{IndexManager, SEARCH_INDEXES};
pub use item_name::ItemNameService;
pub use lifecycle::RelationState;
pub use matching::ClassCode;
pub use records::{
    CageRecord, CageStats, FscRecord, FsgRecord, GroupCount, IncRecord, NsnRecord, NsnSource,
};
pub use search::{SearchAggregator, SearchResults};
pub use service::PublogService;
pub use stock_number::StockNumberService;
pub use types::{
    IndexReport, InitializeReport, LoadOutcome, LoadReport, LoadResult, LocationFilter, Page,
    SkippedIndex,
};

// Re-export commonly used types from dependencies for convenience
pub use publog_core::{Catalog, Tier};
pub use publog_store::{DatabaseStats, Row, TableInfo, Value};
