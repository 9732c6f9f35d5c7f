//! Index manager: materializes catalog datasets and builds search indexes.
//!
//! Loads and sweeps are serialized by a single mutex. A caller that arrives
//! while a sweep runs blocks until it finishes, then sees the new state, so
//! re-triggering a sweep is harmless. Names being loaded are tracked so
//! [`IndexManager::relation_state`] can report `Loading`. Introspection does
//! not take the sweep lock.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use publog_core::{tables, Catalog, Tier};
use publog_store::{CsvOptions, DatabaseStats, Store, TableInfo};

use crate::error::{Result, ServiceError};
use crate::lifecycle::{self, RelationState};
use crate::types::{
    IndexReport, InitializeReport, LoadOutcome, LoadReport, LoadResult, SkippedIndex,
};

/// Columns indexed after a load, per relation.
pub const SEARCH_INDEXES: &[(&str, &[&str])] = &[
    (
        tables::P_CAGE,
        &["CAGE_CODE", "COMPANY", "CITY", "STATE_PROVINCE"],
    ),
    (tables::V_H2_FSC, &["FSC", "FSC_TITLE"]),
    (tables::V_H2_FSG, &["FSC", "FSG_TITLE"]),
    (tables::V_H6_NAME_INC, &["INC", "FIIG_TITLE"]),
    (tables::V_FLIS_IDENTIFICATION, &["NIIN", "FSC", "ITEM_NAME"]),
    (tables::P_FLIS_NSN, &["NIIN", "FSC"]),
    (tables::FLISV, &["NIIN", "FSC"]),
];

/// Loads catalog datasets into the store.
pub struct IndexManager<S: Store> {
    store: Arc<S>,
    catalog: Arc<Catalog>,
    options: CsvOptions,
    sweep: Mutex<()>,
    loading: RwLock<HashSet<String>>,
}

impl<S: Store> IndexManager<S> {
    /// Create a new index manager.
    #[must_use]
    pub fn new(store: Arc<S>, catalog: Arc<Catalog>, options: CsvOptions) -> Self {
        Self {
            store,
            catalog,
            options,
            sweep: Mutex::new(()),
            loading: RwLock::new(HashSet::new()),
        }
    }

    /// The catalog this manager loads from.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load one relation from an explicit source file.
    ///
    /// Never fails: every outcome, including engine errors, is reported in
    /// the returned [`LoadResult`].
    pub fn load_one(&self, name: &str, source_path: &Path, force: bool) -> LoadResult {
        let _sweep = self.sweep.lock();
        self.load_locked(name, source_path, force)
    }

    /// Load one catalog entry by logical name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::UnknownTable` if the name is not in the catalog.
    pub fn load_table(&self, name: &str, force: bool) -> Result<LoadResult> {
        let entry = self
            .catalog
            .get(name)
            .ok_or_else(|| ServiceError::UnknownTable(name.to_string()))?;
        let _sweep = self.sweep.lock();
        Ok(self.load_locked(&entry.logical_name, &entry.source_path, force))
    }

    /// Load every member of a tier, in tier order.
    pub fn load_tier(&self, tier: Tier, force: bool) -> LoadReport {
        let _sweep = self.sweep.lock();
        self.tier_locked(tier, force)
    }

    /// Load the priority tier, then the large tier, then every other entry in
    /// catalog order. Each name is attempted once.
    pub fn load_all(&self, force: bool) -> LoadReport {
        let _sweep = self.sweep.lock();
        self.all_locked(force)
    }

    /// Build the search indexes for every loaded relation.
    ///
    /// Failures are recorded as skipped and logged, never raised.
    pub fn build_indexes(&self) -> IndexReport {
        let _sweep = self.sweep.lock();
        self.indexes_locked()
    }

    /// Run a load sweep followed by an index build.
    pub fn initialize(&self, force: bool, priority_only: bool) -> InitializeReport {
        let _sweep = self.sweep.lock();
        tracing::info!(force, priority_only, "Initializing dataset store");

        let load = if priority_only {
            self.tier_locked(Tier::Priority, force)
        } else {
            self.all_locked(force)
        };
        let indexes = self.indexes_locked();

        InitializeReport {
            success: !load.is_partial_failure(),
            indexed: load.succeeded,
            total: load.attempted,
            load,
            indexes,
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Current lifecycle state of a relation.
    #[must_use]
    pub fn relation_state(&self, name: &str) -> RelationState {
        if self.loading.read().contains(&name.to_ascii_uppercase()) {
            RelationState::Loading
        } else if self.store.is_indexed(name) {
            RelationState::Loaded
        } else {
            RelationState::Absent
        }
    }

    /// Row counts for every relation in the store.
    #[must_use]
    pub fn database_stats(&self) -> DatabaseStats {
        self.store.database_stats()
    }

    /// Columns and row count of one relation.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` wrapping `StoreError::NotFound` if the
    /// relation does not exist.
    pub fn describe(&self, name: &str) -> Result<TableInfo> {
        Ok(self.store.describe(name)?)
    }

    /// Names of every relation in the store.
    #[must_use]
    pub fn list_tables(&self) -> Vec<String> {
        self.store.list_indexed()
    }

    // =========================================================================
    // Internals (caller holds the sweep lock)
    // =========================================================================

    fn load_locked(&self, name: &str, path: &Path, force: bool) -> LoadResult {
        if !path.is_file() {
            tracing::warn!(table = %name, path = %path.display(), "Source file not found");
            return LoadResult::new(
                name,
                LoadOutcome::SourceMissing {
                    path: path.display().to_string(),
                },
            );
        }

        let before = self.stored_state(name);
        if lifecycle::is_queryable(before) && !force {
            tracing::info!(table = %name, "Already loaded");
            return LoadResult::new(name, LoadOutcome::AlreadyLoaded);
        }

        let _loading = LoadingGuard::enter(&self.loading, name);
        transition(name, before, RelationState::Loading);
        tracing::info!(
            table = %name,
            size_mb = size_mb(path),
            reload = before == RelationState::Loaded,
            "Loading table"
        );

        match self.store.load_csv(name, path, &self.options) {
            Ok(summary) => {
                transition(name, RelationState::Loading, RelationState::Loaded);
                tracing::info!(
                    table = %name,
                    rows = summary.rows,
                    skipped_rows = summary.skipped_rows,
                    "Loaded table"
                );
                LoadResult::new(
                    name,
                    LoadOutcome::Loaded {
                        rows: summary.rows,
                        skipped_rows: summary.skipped_rows,
                    },
                )
            }
            Err(e) => {
                let after = self.stored_state(name);
                transition(name, RelationState::Loading, after);
                tracing::error!(table = %name, error = %e, kept = %after, "Failed to load table");
                LoadResult::new(
                    name,
                    LoadOutcome::Failed {
                        message: e.to_string(),
                    },
                )
            }
        }
    }

    fn tier_locked(&self, tier: Tier, force: bool) -> LoadReport {
        let mut report = LoadReport::start();
        for entry in self.catalog.tier(tier) {
            report.push(self.load_locked(&entry.logical_name, &entry.source_path, force));
        }
        let report = report.finish();
        log_sweep(tier.as_str(), &report);
        report
    }

    fn all_locked(&self, force: bool) -> LoadReport {
        let mut report = LoadReport::start();
        let ordered = self
            .catalog
            .tier(Tier::Priority)
            .into_iter()
            .chain(self.catalog.tier(Tier::Large))
            .chain(self.catalog.untiered());
        for entry in ordered {
            if report.contains(&entry.logical_name) {
                continue;
            }
            report.push(self.load_locked(&entry.logical_name, &entry.source_path, force));
        }
        let report = report.finish();
        log_sweep("all", &report);
        report
    }

    fn indexes_locked(&self) -> IndexReport {
        let mut report = IndexReport::default();
        for &(table, columns) in SEARCH_INDEXES {
            if !self.store.is_indexed(table) {
                tracing::debug!(table, "Not loaded, skipping indexes");
                continue;
            }
            for &column in columns {
                match self.store.create_index(table, column) {
                    Ok(index) => {
                        tracing::debug!(table, column, index = %index, "Index ready");
                        report.created.push((table.to_string(), column.to_string()));
                    }
                    Err(e) => {
                        tracing::warn!(table, column, error = %e, "Skipping index");
                        report.skipped.push(SkippedIndex {
                            table: table.to_string(),
                            column: column.to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
        tracing::info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Index build complete"
        );
        report
    }

    fn stored_state(&self, name: &str) -> RelationState {
        if self.store.is_indexed(name) {
            RelationState::Loaded
        } else {
            RelationState::Absent
        }
    }
}

fn transition(name: &str, from: RelationState, to: RelationState) {
    match lifecycle::validate_transition(name, from, to) {
        Ok(state) => {
            tracing::debug!(table = %name, from = %from, to = %state, "Relation state change");
        }
        Err(e) => tracing::warn!(error = %e, "Unexpected relation state change"),
    }
}

/// Marks a name as loading for as long as it lives.
struct LoadingGuard<'a> {
    loading: &'a RwLock<HashSet<String>>,
    key: String,
}

impl<'a> LoadingGuard<'a> {
    fn enter(loading: &'a RwLock<HashSet<String>>, name: &str) -> Self {
        let key = name.to_ascii_uppercase();
        loading.write().insert(key.clone());
        Self { loading, key }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading.write().remove(&self.key);
    }
}

#[allow(clippy::cast_precision_loss)]
fn size_mb(path: &Path) -> f64 {
    std::fs::metadata(path).map_or(0.0, |m| m.len() as f64 / (1024.0 * 1024.0))
}

fn log_sweep(sweep: &str, report: &LoadReport) {
    if report.is_partial_failure() {
        tracing::warn!(
            sweep,
            attempted = report.attempted,
            succeeded = report.succeeded,
            "Load sweep finished with failures"
        );
    } else {
        tracing::info!(
            sweep,
            attempted = report.attempted,
            succeeded = report.succeeded,
            "Load sweep complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use publog_core::{CatalogEntry, Category};
    use publog_store::SqliteStore;
    use std::fs;
    use tempfile::TempDir;

    const CAGE_CSV: &str = "CAGE_CODE,COMPANY,CITY,STATE_PROVINCE\n1ABC2,ACME,DAYTON,OH\n";
    const FSC_CSV: &str = "FSC,FSC_TITLE\n5820,RADIO\n5905,RESISTORS\n";

    fn create_test_manager(dir: &TempDir) -> IndexManager<SqliteStore> {
        fs::write(dir.path().join("P_CAGE.CSV"), CAGE_CSV).unwrap();
        fs::write(dir.path().join("V_H2_FSC.CSV"), FSC_CSV).unwrap();
        fs::write(dir.path().join("V_H6_NAME_INC.CSV"), "INC,FIIG_TITLE\n00077,VALVE\n").unwrap();

        let entry = |name: &str, category| {
            CatalogEntry::new(name, dir.path().join(format!("{name}.CSV")), category)
        };
        let catalog = Catalog::new(
            vec![
                entry(tables::V_H6_NAME_INC, Category::Identification),
                entry(tables::P_FLIS_NSN, Category::Identification),
                entry(tables::V_H2_FSC, Category::HSeries),
                entry(tables::P_CAGE, Category::Cage),
            ],
            vec![tables::P_CAGE.to_string()],
            vec![tables::V_H2_FSC.to_string()],
        )
        .unwrap();

        IndexManager::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Arc::new(catalog),
            CsvOptions::default(),
        )
    }

    #[test]
    fn load_one_is_idempotent_without_force() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        let path = dir.path().join("P_CAGE.CSV");

        let first = manager.load_one(tables::P_CAGE, &path, false);
        assert!(first.success);
        assert!(matches!(first.outcome, LoadOutcome::Loaded { rows: 1, .. }));

        fs::write(&path, format!("{CAGE_CSV}3DEF4,BOLT,COLUMBUS,OH\n")).unwrap();
        let second = manager.load_one(tables::P_CAGE, &path, false);
        assert!(second.success);
        assert_eq!(second.outcome, LoadOutcome::AlreadyLoaded);
        assert_eq!(manager.describe(tables::P_CAGE).unwrap().row_count, 1);
    }

    #[test]
    fn load_one_force_replaces_rows() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        let path = dir.path().join("P_CAGE.CSV");
        manager.load_one(tables::P_CAGE, &path, false);

        let replacement = dir.path().join("P_CAGE_NEW.CSV");
        fs::write(
            &replacement,
            "CAGE_CODE,COMPANY,CITY,STATE_PROVINCE\n\
             3DEF4,BOLT,COLUMBUS,OH\n\
             5GHI6,NUT,AKRON,OH\n",
        )
        .unwrap();
        let result = manager.load_one(tables::P_CAGE, &replacement, true);
        assert!(matches!(result.outcome, LoadOutcome::Loaded { rows: 2, .. }));

        let info = manager.describe(tables::P_CAGE).unwrap();
        assert_eq!(info.row_count, 2);
        assert_eq!(manager.relation_state(tables::P_CAGE), RelationState::Loaded);
    }

    #[test]
    fn load_one_missing_source_keeps_previous_relation() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        manager.load_one(tables::P_CAGE, &dir.path().join("P_CAGE.CSV"), false);

        let missing = dir.path().join("NOT_THERE.CSV");
        let result = manager.load_one(tables::P_CAGE, &missing, true);
        assert!(!result.success);
        assert!(matches!(result.outcome, LoadOutcome::SourceMissing { .. }));

        assert_eq!(manager.relation_state(tables::P_CAGE), RelationState::Loaded);
        assert_eq!(manager.describe(tables::P_CAGE).unwrap().row_count, 1);
    }

    #[test]
    fn unknown_table_is_an_error() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        assert!(matches!(
            manager.load_table("NOPE", false),
            Err(ServiceError::UnknownTable(_))
        ));
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        let result = manager.load_table(tables::P_FLIS_NSN, false).unwrap();
        assert!(!result.success);
        assert!(matches!(result.outcome, LoadOutcome::SourceMissing { .. }));
        assert_eq!(manager.relation_state(tables::P_FLIS_NSN), RelationState::Absent);
    }

    #[test]
    fn second_load_is_already_loaded() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        let first = manager.load_table(tables::P_CAGE, false).unwrap();
        assert_eq!(
            first.outcome,
            LoadOutcome::Loaded {
                rows: 1,
                skipped_rows: 0
            }
        );
        let second = manager.load_table("p_cage", false).unwrap();
        assert!(second.success);
        assert_eq!(second.outcome, LoadOutcome::AlreadyLoaded);
        assert_eq!(manager.relation_state(tables::P_CAGE), RelationState::Loaded);
    }

    #[test]
    fn forced_load_replaces_rows() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        manager.load_table(tables::V_H2_FSC, false).unwrap();

        fs::write(dir.path().join("V_H2_FSC.CSV"), "FSC,FSC_TITLE\n1005,GUNS\n").unwrap();
        let result = manager.load_table(tables::V_H2_FSC, true).unwrap();
        assert_eq!(
            result.outcome,
            LoadOutcome::Loaded {
                rows: 1,
                skipped_rows: 0
            }
        );
        assert_eq!(manager.describe(tables::V_H2_FSC).unwrap().row_count, 1);
    }

    #[test]
    fn failed_reload_keeps_previous_relation() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        manager.load_table(tables::V_H2_FSC, false).unwrap();

        fs::write(dir.path().join("V_H2_FSC.CSV"), "").unwrap();
        let result = manager.load_table(tables::V_H2_FSC, true).unwrap();
        assert!(!result.success);
        assert!(matches!(result.outcome, LoadOutcome::Failed { .. }));
        assert_eq!(manager.relation_state(tables::V_H2_FSC), RelationState::Loaded);
        assert_eq!(manager.describe(tables::V_H2_FSC).unwrap().row_count, 2);
    }

    #[test]
    fn load_all_follows_tier_order() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        let report = manager.load_all(false);
        let names: Vec<&str> = report
            .results
            .iter()
            .map(|r| r.logical_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                tables::P_CAGE,
                tables::V_H2_FSC,
                tables::V_H6_NAME_INC,
                tables::P_FLIS_NSN
            ]
        );
        assert_eq!(report.attempted, 4);
        assert_eq!(report.succeeded, 3);
        assert!(report.is_partial_failure());
    }

    #[test]
    fn load_tier_only_touches_members() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        let report = manager.load_tier(Tier::Large, false);
        assert_eq!(report.attempted, 1);
        assert_eq!(manager.list_tables(), vec![tables::V_H2_FSC.to_string()]);
    }

    #[test]
    fn indexes_only_for_loaded_relations() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        manager.load_table(tables::V_H2_FSC, false).unwrap();
        let report = manager.build_indexes();
        assert_eq!(
            report.created,
            vec![
                (tables::V_H2_FSC.to_string(), "FSC".to_string()),
                (tables::V_H2_FSC.to_string(), "FSC_TITLE".to_string()),
            ]
        );
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn missing_index_columns_are_skipped() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        fs::write(dir.path().join("P_CAGE.CSV"), "CAGE_CODE,COMPANY\n1ABC2,ACME\n").unwrap();
        manager.load_table(tables::P_CAGE, false).unwrap();

        let report = manager.build_indexes();
        assert_eq!(report.created.len(), 2);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(skipped, vec!["CITY", "STATE_PROVINCE"]);

        // Idempotent.
        assert_eq!(manager.build_indexes().created.len(), 2);
    }

    #[test]
    fn initialize_priority_only() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        let report = manager.initialize(false, true);
        assert!(report.success);
        assert_eq!(report.total, 1);
        assert_eq!(report.indexed, 1);
        assert_eq!(report.indexes.created.len(), 4);
        assert_eq!(manager.relation_state(tables::V_H2_FSC), RelationState::Absent);
    }

    #[test]
    fn initialize_everything() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(&dir);
        let report = manager.initialize(false, false);
        assert!(!report.success);
        assert_eq!(report.total, 4);
        assert_eq!(report.indexed, 3);

        let stats = manager.database_stats();
        assert_eq!(stats.table_count, 3);
        assert_eq!(stats.total_rows, 4);
    }
}
