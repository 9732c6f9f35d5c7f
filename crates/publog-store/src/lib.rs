//! Embedded `SQLite` storage layer for the PubLog dataset service.
//!
//! This crate turns flat CSV files into queryable relations and runs
//! parameterized statements against them.
//!
//! # Architecture
//!
//! - [`Store`]: the storage trait the service layer is written against
//! - [`SqliteStore`]: the single-connection `SQLite` implementation
//! - [`ingest`]: CSV reading with sampled column type inference
//! - [`schema`]: identifier validation and statement text
//!
//! A relation is always created or replaced wholesale inside one transaction,
//! so readers never observe a partially loaded table.
//!
//! # Example
//!
//! ```no_run
//! use publog_store::{CsvOptions, SqliteStore, Store, Value};
//! use std::path::Path;
//!
//! let store = SqliteStore::open("/tmp/publog_index.sqlite").unwrap();
//! store
//!     .load_csv("V_H2_FSC", Path::new("Data/H_SERIES/V_H2_FSC.CSV"), &CsvOptions::default())
//!     .unwrap();
//!
//! let rows = store
//!     .query("SELECT * FROM V_H2_FSC WHERE FSC = ?", &[Value::Integer(5820)])
//!     .unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ingest;
pub mod schema;
pub mod sqlite;
pub mod types;

use std::path::Path;

pub use error::{Result, StoreError};
pub use ingest::{CsvOptions, CsvSource};
pub use sqlite::SqliteStore;
pub use types::{
    ColumnInfo, ColumnType, DatabaseStats, IngestSummary, Row, TableInfo, TableRows, Value,
};

/// The storage trait defining all database operations.
///
/// Relation names are matched case-insensitively. Statement values are always
/// bound positionally; identifiers are never taken from caller input.
pub trait Store: Send + Sync {
    // =========================================================================
    // Metadata
    // =========================================================================

    /// Check whether a relation with this name exists.
    ///
    /// Metadata failures are logged and reported as `false`.
    fn is_indexed(&self, name: &str) -> bool;

    /// Names of all materialized relations.
    ///
    /// Metadata failures are logged and reported as an empty list.
    fn list_indexed(&self) -> Vec<String>;

    /// Describe a relation's columns and row count.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the relation does not exist.
    fn describe(&self, name: &str) -> Result<TableInfo>;

    /// Count the rows of a relation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the relation does not exist.
    fn row_count(&self, name: &str) -> Result<u64>;

    /// Size of the backing file in bytes, 0 if there is none.
    fn file_size(&self) -> u64;

    /// Summarize every relation in the store, largest first.
    ///
    /// Relations whose row count fails are logged and left out.
    fn database_stats(&self) -> DatabaseStats {
        let mut tables = Vec::new();
        for table in self.list_indexed() {
            match self.row_count(&table) {
                Ok(rows) => tables.push(TableRows { table, rows }),
                Err(e) => tracing::warn!(table = %table, error = %e, "Failed to count rows"),
            }
        }
        tables.sort_by(|a, b| b.rows.cmp(&a.rows).then_with(|| a.table.cmp(&b.table)));
        DatabaseStats {
            table_count: tables.len(),
            total_rows: tables.iter().map(|t| t.rows).sum(),
            tables,
            file_size_bytes: self.file_size(),
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Run a parameterized statement and collect its rows.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` with the engine's message on failure.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a statement and return the first column of its first row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` with the engine's message on failure.
    fn query_scalar(&self, sql: &str, params: &[Value]) -> Result<Option<Value>> {
        Ok(self
            .query(sql, params)?
            .into_iter()
            .next()
            .and_then(|row| row.values().first().cloned()))
    }

    // =========================================================================
    // Relation Lifecycle
    // =========================================================================

    /// Create or replace a relation from a CSV file.
    ///
    /// The replace is atomic: on failure the previous relation, or its
    /// absence, is preserved.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read,
    /// `StoreError::Csv` if it has no header, or `StoreError::Query` if the
    /// engine rejects the write.
    fn load_csv(&self, name: &str, path: &Path, options: &CsvOptions) -> Result<IngestSummary>;

    /// Drop a relation. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the statement.
    fn drop_table(&self, name: &str) -> Result<bool>;

    /// Create a secondary index over `table.column` if it does not exist.
    /// Returns the index name.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the relation or column is missing.
    fn create_index(&self, table: &str, column: &str) -> Result<String>;
}
