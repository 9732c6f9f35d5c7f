//! Shared fixtures for unit tests.

use publog_store::{CsvOptions, SqliteStore, Store};

/// Materialize `csv` as relation `name`.
pub(crate) fn load(store: &SqliteStore, name: &str, csv: &str) {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join(format!("{name}.CSV"));
    std::fs::write(&path, csv).unwrap();
    store
        .load_csv(name, &path, &CsvOptions::default())
        .unwrap();
}
