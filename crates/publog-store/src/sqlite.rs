//! `SQLite` storage implementation.
//!
//! This module provides the `SqliteStore` implementation of the `Store` trait.
//!
//! A file-backed store holds two connections to the same database in WAL
//! mode: a writer for loads, drops, and index builds, and a reader for
//! everything else. Readers see the last committed snapshot, so queries keep
//! answering from the old relation while a replacement is being ingested.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::ingest::{CsvOptions, CsvSource};
use crate::schema::{self, quote_ident, validate_ident};
use crate::types::{ColumnInfo, IngestSummary, Row, TableInfo, Value};
use crate::Store;

type Registry = Mutex<HashMap<PathBuf, Weak<SqliteStore>>>;

static SHARED: OnceLock<Registry> = OnceLock::new();

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite-backed storage implementation.
///
/// Writes are serialized on the writer's lock and reads on the reader's; a
/// read never waits for a write. In-memory stores have a single connection
/// that serves both.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Option<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open or create a database file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let writer = Connection::open(path)?;
        Self::configure(&writer);
        let reader = Connection::open(path)?;
        Self::configure(&reader);
        tracing::debug!(path = %path.display(), "Opened store");
        Ok(Self {
            writer: Mutex::new(writer),
            reader: Some(Mutex::new(reader)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn);
        Ok(Self {
            writer: Mutex::new(conn),
            reader: None,
            path: None,
        })
    }

    /// Return the process-wide handle for `path`, opening it on first use.
    ///
    /// Repeated calls with the same path return the same `Arc` for as long as
    /// any clone of it is alive.
    ///
    /// # Errors
    ///
    /// Returns an error if the database has to be opened and that fails.
    pub fn shared<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let key = path.as_ref().to_path_buf();
        let mut registry = SHARED.get_or_init(Registry::default).lock();
        if let Some(store) = registry.get(&key).and_then(Weak::upgrade) {
            return Ok(store);
        }
        let store = Arc::new(Self::open(&key)?);
        registry.insert(key, Arc::downgrade(&store));
        Ok(store)
    }

    /// Path of the database file, `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configure(conn: &Connection) {
        if let Err(e) =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        {
            tracing::warn!(error = %e, "Failed to enable WAL journal");
        }
        if let Err(e) = conn.pragma_update(None, "temp_store", "MEMORY") {
            tracing::warn!(error = %e, "Failed to set temp_store");
        }
        if let Err(e) = conn.pragma_update(None, "cache_size", -65_536) {
            tracing::warn!(error = %e, "Failed to set cache_size");
        }
        if let Err(e) = conn.busy_timeout(BUSY_TIMEOUT) {
            tracing::warn!(error = %e, "Failed to set busy timeout");
        }
    }

    /// Connection for statements that only read.
    fn read(&self) -> MutexGuard<'_, Connection> {
        self.reader.as_ref().unwrap_or(&self.writer).lock()
    }

    /// Connection for statements that change the database.
    fn write(&self) -> MutexGuard<'_, Connection> {
        self.writer.lock()
    }

    /// Replace relation `name` with the rows of `source` in one transaction.
    fn ingest<R: io::Read>(
        &self,
        name: &str,
        mut source: CsvSource<R>,
    ) -> Result<IngestSummary> {
        let columns = source.columns().to_vec();

        let mut conn = self.write();
        let tx = conn.transaction()?;
        let existing: Option<String> = tx
            .query_row(schema::RESOLVE_TABLE, params![name], |row| row.get(0))
            .optional()?;
        if let Some(existing) = existing {
            tx.execute(&format!("DROP TABLE {}", quote_ident(&existing)), [])?;
        }
        tx.execute(&schema::create_table(name, &columns), [])?;

        let mut rows = 0u64;
        {
            let mut insert = tx.prepare(&schema::insert_row(name, columns.len()))?;
            while let Some(values) = source.next_row()? {
                insert.execute(params_from_iter(values.iter()))?;
                rows += 1;
            }
        }
        tx.commit()?;

        Ok(IngestSummary {
            rows,
            skipped_rows: source.skipped_rows(),
            coerced_cells: source.coerced_cells(),
            columns,
        })
    }

    /// Resolve `name` case-insensitively to the stored relation name.
    fn resolve(conn: &Connection, name: &str) -> Result<String> {
        conn.query_row(schema::RESOLVE_TABLE, params![name], |row| row.get(0))
            .optional()?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn count_rows(conn: &Connection, canonical: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(canonical));
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn columns(conn: &Connection, canonical: &str) -> Result<Vec<ColumnInfo>> {
        let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map(params![canonical], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

impl Store for SqliteStore {
    fn is_indexed(&self, name: &str) -> bool {
        let conn = self.read();
        match conn.query_row(schema::TABLE_EXISTS, params![name], |row| row.get::<_, i64>(0)) {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::warn!(table = %name, error = %e, "Failed to check relation");
                false
            }
        }
    }

    fn list_indexed(&self) -> Vec<String> {
        let conn = self.read();
        let names = conn.prepare(schema::LIST_TABLES).and_then(|mut stmt| {
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>();
            names
        });
        match names {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list relations");
                Vec::new()
            }
        }
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let conn = self.read();
        let mut stmt = conn.prepare(sql)?;
        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(out)
    }

    fn describe(&self, name: &str) -> Result<TableInfo> {
        let conn = self.read();
        let table_name = Self::resolve(&conn, name)?;
        let row_count = Self::count_rows(&conn, &table_name)?;
        let columns = Self::columns(&conn, &table_name)?;
        Ok(TableInfo {
            table_name,
            row_count,
            columns,
        })
    }

    fn row_count(&self, name: &str) -> Result<u64> {
        let conn = self.read();
        let canonical = Self::resolve(&conn, name)?;
        Self::count_rows(&conn, &canonical)
    }

    fn drop_table(&self, name: &str) -> Result<bool> {
        let conn = self.write();
        let canonical = match Self::resolve(&conn, name) {
            Ok(canonical) => canonical,
            Err(StoreError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        conn.execute(&format!("DROP TABLE {}", quote_ident(&canonical)), [])?;
        tracing::info!(table = %canonical, "Dropped relation");
        Ok(true)
    }

    fn create_index(&self, table: &str, column: &str) -> Result<String> {
        validate_ident(table)?;
        let conn = self.write();
        let canonical = Self::resolve(&conn, table)?;
        let column = Self::columns(&conn, &canonical)?
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(column))
            .map(|c| c.name)
            .ok_or_else(|| StoreError::NotFound(format!("{table}.{column}")))?;

        let index = schema::index_name(&canonical, &column);
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&index),
            quote_ident(&canonical),
            quote_ident(&column)
        );
        conn.execute(&sql, [])?;
        Ok(index)
    }

    fn load_csv(&self, name: &str, path: &Path, options: &CsvOptions) -> Result<IngestSummary> {
        validate_ident(name)?;
        let source = CsvSource::open(path, options)?;
        let summary = self.ingest(name, source)?;
        if summary.skipped_rows > 0 {
            tracing::warn!(table = %name, skipped = summary.skipped_rows, "Skipped malformed rows");
        }
        if summary.coerced_cells > 0 {
            tracing::warn!(
                table = %name,
                cells = summary.coerced_cells,
                "Stored out-of-type values as text"
            );
        }
        Ok(summary)
    }

    fn file_size(&self) -> u64 {
        let Some(path) = self.path.as_deref() else {
            return 0;
        };
        let mut wal = path.as_os_str().to_owned();
        wal.push("-wal");
        [path, Path::new(&wal)]
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::mpsc;
    use std::thread;
    use tempfile::TempDir;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_and_query() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        let path = write_csv(&dir, "fsc.csv", "FSC,FSC_TITLE\n5820,RADIO\n5821,TELEPHONE\n");

        let summary = store.load_csv("V_H2_FSC", &path, &CsvOptions::default()).unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.skipped_rows, 0);

        assert!(store.is_indexed("V_H2_FSC"));
        assert!(store.is_indexed("v_h2_fsc"));
        assert_eq!(store.list_indexed(), vec!["V_H2_FSC".to_string()]);

        let rows = store
            .query(
                "SELECT * FROM V_H2_FSC WHERE FSC = ?",
                &[Value::Integer(5821)],
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns(), ["FSC", "FSC_TITLE"]);
        assert_eq!(rows[0].text("FSC_TITLE").as_deref(), Some("TELEPHONE"));
    }

    #[test]
    fn query_scalar_first_cell() {
        let store = create_test_store();
        let value = store.query_scalar("SELECT 1 + ?", &[Value::Integer(41)]).unwrap();
        assert_eq!(value, Some(Value::Integer(42)));
        let none = store
            .query_scalar("SELECT 1 WHERE 0", &[])
            .unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn query_error_is_reported() {
        let store = create_test_store();
        let err = store.query("SELECT * FROM MISSING", &[]).unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn reload_replaces_rows() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        let path = write_csv(&dir, "a.csv", "ID\n1\n2\n3\n");
        store.load_csv("T", &path, &CsvOptions::default()).unwrap();
        store.load_csv("T", &path, &CsvOptions::default()).unwrap();
        assert_eq!(store.row_count("T").unwrap(), 3);
    }

    #[test]
    fn failed_load_keeps_previous_relation() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        let good = write_csv(&dir, "good.csv", "ID\n1\n2\n");
        store.load_csv("T", &good, &CsvOptions::default()).unwrap();

        let missing = dir.path().join("missing.csv");
        let err = store.load_csv("T", &missing, &CsvOptions::default());
        assert!(matches!(err, Err(StoreError::Io(_))));

        let empty = write_csv(&dir, "empty.csv", "");
        assert!(store.load_csv("T", &empty, &CsvOptions::default()).is_err());

        assert_eq!(store.row_count("T").unwrap(), 2);
    }

    #[test]
    fn describe_reports_columns() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        let path = write_csv(&dir, "cage.csv", "CAGE_CODE,COMPANY,EMPLOYEES\n1ABC2,ACME,12\n");
        store.load_csv("P_CAGE", &path, &CsvOptions::default()).unwrap();

        let info = store.describe("p_cage").unwrap();
        assert_eq!(info.table_name, "P_CAGE");
        assert_eq!(info.row_count, 1);
        let columns: Vec<(&str, &str)> = info
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type.as_str()))
            .collect();
        assert_eq!(
            columns,
            vec![
                ("CAGE_CODE", "TEXT"),
                ("COMPANY", "TEXT"),
                ("EMPLOYEES", "INTEGER")
            ]
        );
    }

    #[test]
    fn describe_unknown_is_not_found() {
        let store = create_test_store();
        assert!(store.describe("NOPE").unwrap_err().is_not_found());
        assert!(store.describe("x\"; DROP TABLE y; --").unwrap_err().is_not_found());
    }

    #[test]
    fn create_index_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        let path = write_csv(&dir, "cage.csv", "CAGE_CODE,COMPANY\n1ABC2,ACME\n");
        store.load_csv("P_CAGE", &path, &CsvOptions::default()).unwrap();

        let name = store.create_index("P_CAGE", "cage_code").unwrap();
        assert_eq!(name, "idx_p_cage_cage_code");
        assert_eq!(store.create_index("P_CAGE", "CAGE_CODE").unwrap(), name);

        assert!(store.create_index("P_CAGE", "NOPE").unwrap_err().is_not_found());
        assert!(store.create_index("MISSING", "X").unwrap_err().is_not_found());
    }

    #[test]
    fn drop_table_reports_existence() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        let path = write_csv(&dir, "a.csv", "ID\n1\n");
        store.load_csv("T", &path, &CsvOptions::default()).unwrap();
        assert!(store.drop_table("t").unwrap());
        assert!(!store.drop_table("T").unwrap());
        assert!(!store.is_indexed("T"));
    }

    #[test]
    fn database_stats_sorted_by_rows() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("db.sqlite")).unwrap();
        let small = write_csv(&dir, "s.csv", "ID\n1\n");
        let big = write_csv(&dir, "b.csv", "ID\n1\n2\n3\n");
        store.load_csv("SMALL", &small, &CsvOptions::default()).unwrap();
        store.load_csv("BIG", &big, &CsvOptions::default()).unwrap();

        let stats = store.database_stats();
        assert_eq!(stats.table_count, 2);
        assert_eq!(stats.total_rows, 4);
        assert_eq!(stats.tables[0].table, "BIG");
        assert!(stats.file_size_bytes > 0);
    }

    #[test]
    fn shared_returns_same_handle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.sqlite");
        let a = SqliteStore::shared(&path).unwrap();
        let b = SqliteStore::shared(&path).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.path(), Some(path.as_path()));
    }

    /// Serves `head`, then signals `waiting` and blocks until `release`.
    struct GatedInput {
        head: io::Cursor<Vec<u8>>,
        waiting: mpsc::Sender<()>,
        release: mpsc::Receiver<()>,
        released: bool,
    }

    impl io::Read for GatedInput {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = io::Read::read(&mut self.head, buf)?;
            if n > 0 || self.released {
                return Ok(n);
            }
            let _ = self.waiting.send(());
            let _ = self.release.recv();
            self.released = true;
            Ok(0)
        }
    }

    #[test]
    fn reads_are_not_blocked_by_a_load() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path().join("db.sqlite")).unwrap());
        let fsc = write_csv(&dir, "fsc.csv", "FSC,FSC_TITLE\n5820,RADIO\n");
        store.load_csv("V_H2_FSC", &fsc, &CsvOptions::default()).unwrap();
        let nsn = write_csv(&dir, "nsn.csv", "NIIN\n001234567\n");
        store.load_csv("P_FLIS_NSN", &nsn, &CsvOptions::default()).unwrap();

        let (waiting_tx, waiting_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let loader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let input = GatedInput {
                    head: io::Cursor::new(b"NIIN\n001\n002\n003\n".to_vec()),
                    waiting: waiting_tx,
                    release: release_rx,
                    released: false,
                };
                let source =
                    CsvSource::from_reader(input, &CsvOptions::with_sample_size(1)).unwrap();
                store.ingest("P_FLIS_NSN", source)
            })
        };

        // The loader now holds an open write transaction.
        waiting_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let titles = store
                    .query("SELECT FSC_TITLE FROM V_H2_FSC", &[])
                    .map(|rows| rows.len());
                let old_rows = store.row_count("P_FLIS_NSN");
                let indexed = store.is_indexed("P_FLIS_NSN");
                let _ = done_tx.send((titles, old_rows, indexed));
            })
        };
        let reads = done_rx.recv_timeout(Duration::from_secs(10));
        release_tx.send(()).unwrap();

        let (titles, old_rows, indexed) = reads.expect("read waited on the load");
        assert_eq!(titles.unwrap(), 1);
        assert_eq!(old_rows.unwrap(), 1);
        assert!(indexed);
        reader.join().unwrap();

        let summary = loader.join().unwrap().unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(store.row_count("P_FLIS_NSN").unwrap(), 3);
    }

    #[test]
    fn loads_pipe_delimited_files() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        let path = write_csv(
            &dir,
            "nsn.txt",
            "NIIN|FSC|ITEM_NAME\n001234567|5820|RADIO SET\n",
        );
        store.load_csv("P_FLIS_NSN", &path, &CsvOptions::default()).unwrap();

        let info = store.describe("P_FLIS_NSN").unwrap();
        assert_eq!(info.columns.len(), 3);
        let rows = store
            .query(
                "SELECT ITEM_NAME FROM P_FLIS_NSN WHERE NIIN = ?",
                &[Value::from("001234567")],
            )
            .unwrap();
        assert_eq!(rows[0].text("ITEM_NAME").as_deref(), Some("RADIO SET"));
    }

    #[test]
    fn similar_column_names_get_separate_indexes() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        let path = write_csv(&dir, "a.csv", "ITEM NAME,ITEM_NAME\nA,B\n");
        store.load_csv("T", &path, &CsvOptions::default()).unwrap();

        let spaced = store.create_index("T", "ITEM NAME").unwrap();
        let plain = store.create_index("T", "ITEM_NAME").unwrap();
        assert_ne!(spaced, plain);
        let count = store
            .query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'T'",
                &[],
            )
            .unwrap();
        assert_eq!(count, Some(Value::Integer(2)));
    }

    #[test]
    fn load_rejects_invalid_names() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        let path = write_csv(&dir, "a.csv", "ID\n1\n");
        let err = store.load_csv("bad name", &path, &CsvOptions::default());
        assert!(matches!(err, Err(StoreError::InvalidIdentifier(_))));
    }
}
