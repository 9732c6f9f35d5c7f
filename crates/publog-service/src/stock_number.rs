//! Stock number (NSN/NIIN) queries.
//!
//! `P_FLIS_NSN` carries item names and classes and is tried first. `FLISV`
//! covers more stock numbers with fewer fields and backs up key lookups when
//! the primary relation is missing or has no match. Text search needs the
//! primary relation's item names and does not fall back.

use std::sync::Arc;

use publog_core::{tables, Niin};
use publog_store::{Row, Store, Value};

use crate::config::Limits;
use crate::error::Result;
use crate::matching::{like_pattern, ClassCode};
use crate::records::{NsnRecord, NsnSource};
use crate::types::Page;

const PRIMARY_BY_NIIN: &str = "SELECT * FROM P_FLIS_NSN WHERE NIIN = ? LIMIT 1";

const FALLBACK_BY_NIIN: &str = "SELECT * FROM FLISV WHERE NIIN = ? LIMIT 1";

const MANAGEMENT: &str = "SELECT * FROM V_FLIS_MANAGEMENT WHERE NIIN = ?";

const CHARACTERISTICS: &str = "SELECT * FROM V_CHARACTERISTICS WHERE NIIN = ?";

/// Stock number lookups and searches.
pub struct StockNumberService<S: Store> {
    store: Arc<S>,
    limits: Limits,
}

impl<S: Store> StockNumberService<S> {
    /// Create a new stock number service.
    #[must_use]
    pub fn new(store: Arc<S>, limits: Limits) -> Self {
        Self { store, limits }
    }

    /// Look up one stock number by NIIN or full NSN.
    ///
    /// Tries the primary relation first, then the fallback, skipping either
    /// one that is not loaded.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` if the key is not a NIIN or
    /// NSN, or `ServiceError::Store` if a query fails.
    pub fn get_by_key(&self, key: &str) -> Result<Option<NsnRecord>> {
        let niin: Niin = key.parse()?;
        let param = [Value::from(niin.as_str())];

        for (table, sql, source) in [
            (tables::P_FLIS_NSN, PRIMARY_BY_NIIN, NsnSource::Primary),
            (tables::FLISV, FALLBACK_BY_NIIN, NsnSource::Fallback),
        ] {
            if !self.store.is_indexed(table) {
                tracing::debug!(table, "Skipping unloaded stock number relation");
                continue;
            }
            if let Some(row) = self.store.query(sql, &param)?.into_iter().next() {
                return Ok(Some(NsnRecord::from_row(row, source)));
            }
        }
        Ok(None)
    }

    /// Stock numbers whose NIIN or item name contains `term`, optionally
    /// restricted to one class. An empty term applies no text condition.
    ///
    /// Returns an empty list, and logs a warning, if the primary relation is
    /// not loaded.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an out-of-range page, or
    /// `ServiceError::Store` if the query fails.
    pub fn search(&self, term: &str, fsc: Option<&str>, page: Page) -> Result<Vec<NsnRecord>> {
        let page = page.validate(self.limits.max_search_results)?;
        if !self.primary_loaded() {
            tracing::warn!(table = tables::P_FLIS_NSN, "Relation not loaded, cannot search");
            return Ok(Vec::new());
        }

        let mut conditions = Vec::new();
        let mut params = Vec::new();
        if !term.trim().is_empty() {
            let pattern = like_pattern(term);
            conditions.push("(NIIN LIKE ? OR UPPER(ITEM_NAME) LIKE ?)");
            params.push(pattern.clone());
            params.push(pattern);
        }
        if let Some(code) = fsc.map(str::trim).filter(|c| !c.is_empty()) {
            let (condition, value) = ClassCode::parse(code).condition();
            conditions.push(condition);
            params.push(value);
        }
        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };
        params.push(Value::Integer(page.limit));
        params.push(Value::Integer(page.offset));

        let sql = format!("SELECT * FROM P_FLIS_NSN WHERE {where_clause} LIMIT ? OFFSET ?");
        let rows = self.store.query(&sql, &params)?;
        Ok(Self::primary_records(rows))
    }

    /// Stock numbers in one class. Empty if the primary relation is not
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an out-of-range page, or
    /// `ServiceError::Store` if the query fails.
    pub fn by_classification(&self, code: &str, page: Page) -> Result<Vec<NsnRecord>> {
        let page = page.validate(self.limits.max_search_results)?;
        if !self.primary_loaded() {
            tracing::warn!(table = tables::P_FLIS_NSN, "Relation not loaded, cannot list by class");
            return Ok(Vec::new());
        }
        let (condition, value) = ClassCode::parse(code).condition();
        let sql = format!("SELECT * FROM P_FLIS_NSN WHERE {condition} LIMIT ? OFFSET ?");
        let rows = self.store.query(
            &sql,
            &[value, Value::Integer(page.limit), Value::Integer(page.offset)],
        )?;
        Ok(Self::primary_records(rows))
    }

    /// Management records for a stock number. Empty if never loaded.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for a malformed key, or
    /// `ServiceError::Store` if the query fails.
    pub fn management_data(&self, key: &str) -> Result<Vec<Row>> {
        self.auxiliary(tables::V_FLIS_MANAGEMENT, MANAGEMENT, key)
    }

    /// Characteristic records for a stock number. Empty if never loaded.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for a malformed key, or
    /// `ServiceError::Store` if the query fails.
    pub fn characteristics(&self, key: &str) -> Result<Vec<Row>> {
        self.auxiliary(tables::V_CHARACTERISTICS, CHARACTERISTICS, key)
    }

    fn auxiliary(&self, table: &str, sql: &str, key: &str) -> Result<Vec<Row>> {
        let niin: Niin = key.parse()?;
        if !self.store.is_indexed(table) {
            tracing::debug!(table, "Auxiliary relation not loaded");
            return Ok(Vec::new());
        }
        Ok(self.store.query(sql, &[Value::from(niin.as_str())])?)
    }

    fn primary_loaded(&self) -> bool {
        self.store.is_indexed(tables::P_FLIS_NSN)
    }

    fn primary_records(rows: Vec<Row>) -> Vec<NsnRecord> {
        rows.into_iter()
            .map(|row| NsnRecord::from_row(row, NsnSource::Primary))
            .collect()
    }
}
