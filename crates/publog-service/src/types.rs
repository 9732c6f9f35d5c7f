//! Request and report types for service operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// A window over an ordered result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Maximum number of records, `1..=max_search_results`.
    pub limit: i64,
    /// Records to skip, never negative.
    #[serde(default)]
    pub offset: i64,
}

impl Page {
    /// Create a page.
    #[must_use]
    pub const fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// The first `limit` records.
    #[must_use]
    pub const fn first(limit: i64) -> Self {
        Self { limit, offset: 0 }
    }

    /// Check the page against the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` if `limit` is outside
    /// `1..=max` or `offset` is negative.
    pub fn validate(self, max: i64) -> Result<Self> {
        if self.limit < 1 || self.limit > max {
            return Err(ServiceError::InvalidArgument(format!(
                "limit must be between 1 and {max}, got {}",
                self.limit
            )));
        }
        if self.offset < 0 {
            return Err(ServiceError::InvalidArgument(format!(
                "offset must not be negative, got {}",
                self.offset
            )));
        }
        Ok(self)
    }
}

/// Filters for a contractor location search. Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFilter {
    /// State or province, matched exactly.
    #[serde(default)]
    pub state: Option<String>,
    /// City, matched as a substring.
    #[serde(default)]
    pub city: Option<String>,
    /// Country, matched as a substring.
    #[serde(default)]
    pub country: Option<String>,
}

impl LocationFilter {
    /// Returns true if no filter is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.state, &self.city, &self.country]
            .iter()
            .all(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// What happened when a single table was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// The relation was created or replaced.
    Loaded {
        /// Rows written.
        rows: u64,
        /// Malformed rows dropped.
        skipped_rows: u64,
    },
    /// The relation already existed and no reload was forced.
    AlreadyLoaded,
    /// The source file does not exist.
    SourceMissing {
        /// The path that was checked.
        path: String,
    },
    /// The engine failed during materialization.
    Failed {
        /// The underlying error message.
        message: String,
    },
}

impl LoadOutcome {
    /// Returns true if the relation is queryable after this outcome.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Loaded { .. } | Self::AlreadyLoaded)
    }
}

/// Result of loading one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadResult {
    /// Logical table name.
    pub logical_name: String,
    /// Whether the table is loaded afterwards.
    pub success: bool,
    /// Details.
    pub outcome: LoadOutcome,
}

impl LoadResult {
    /// Create a result, deriving `success` from the outcome.
    #[must_use]
    pub fn new(logical_name: impl Into<String>, outcome: LoadOutcome) -> Self {
        Self {
            logical_name: logical_name.into(),
            success: outcome.is_success(),
            outcome,
        }
    }
}

/// Per-table results of a load sweep, in attempt order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Tables attempted.
    pub attempted: usize,
    /// Tables loaded afterwards.
    pub succeeded: usize,
    /// One result per table.
    pub results: Vec<LoadResult>,
    /// When the sweep started.
    pub started_at: DateTime<Utc>,
    /// When the sweep finished.
    pub finished_at: DateTime<Utc>,
}

impl LoadReport {
    /// Start an empty report.
    #[must_use]
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            attempted: 0,
            succeeded: 0,
            results: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Record a result. A name already in the report is ignored.
    ///
    /// Returns whether the result was recorded.
    pub fn push(&mut self, result: LoadResult) -> bool {
        if self.contains(&result.logical_name) {
            return false;
        }
        self.attempted += 1;
        if result.success {
            self.succeeded += 1;
        }
        self.results.push(result);
        true
    }

    /// Returns true if the report already holds a result for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The result for `name`, if recorded.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LoadResult> {
        self.results
            .iter()
            .find(|r| r.logical_name.eq_ignore_ascii_case(name))
    }

    /// Returns true if at least one table failed.
    #[must_use]
    pub const fn is_partial_failure(&self) -> bool {
        self.succeeded < self.attempted
    }

    /// Stamp the finish time.
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

/// A secondary index that could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedIndex {
    /// Relation name.
    pub table: String,
    /// Column name.
    pub column: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of an index build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// `(table, column)` pairs that now have an index.
    pub created: Vec<(String, String)>,
    /// Pairs that were skipped.
    pub skipped: Vec<SkippedIndex>,
}

/// Outcome of a full initialization: a load sweep followed by index builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitializeReport {
    /// True if every attempted table loaded.
    pub success: bool,
    /// Tables loaded.
    pub indexed: usize,
    /// Tables attempted.
    pub total: usize,
    /// The load sweep.
    pub load: LoadReport,
    /// The index build pass.
    pub indexes: IndexReport,
}
