//! Core types for the PubLog dataset service.
//!
//! This crate provides the foundational pieces shared by the store, the
//! service layer, and the gateway:
//!
//! - **Catalog**: the static registry of known flat-file datasets, their
//!   categories, and the priority/large load tiers
//! - **Domain codes**: strongly-typed CAGE, FSG, and NIIN codes
//! - **Error types**: catalog construction and code parsing errors
//!
//! # Example
//!
//! ```
//! use publog_core::{Catalog, Tier, tables};
//!
//! let catalog = Catalog::publog("/srv/publog/Data");
//!
//! let cage = catalog.get(tables::P_CAGE).unwrap();
//! assert!(cage.source_path.ends_with("CAGE/P_CAGE.CSV"));
//! assert_eq!(catalog.tier_of(tables::P_CAGE), Some(Tier::Priority));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod codes;
pub mod error;

pub use catalog::{tables, Catalog, CatalogEntry, Category, Tier};
pub use codes::{CageCode, CodeError, FsgCode, Niin};
pub use error::CatalogError;
