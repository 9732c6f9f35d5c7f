//! Identifier handling and statement text for the engine catalog.
//!
//! Relation and column names are the only parts of a statement that are ever
//! spliced into SQL text. They come from the static catalog or from the
//! engine's own metadata, and are always validated and double-quoted here.

use crate::error::{Result, StoreError};
use crate::types::ColumnType;

/// Case-insensitive existence check against the engine catalog.
pub const TABLE_EXISTS: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND UPPER(name) = UPPER(?1)";

/// Resolve a user-supplied name to the stored relation name.
pub const RESOLVE_TABLE: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND UPPER(name) = UPPER(?1) LIMIT 1";

/// All materialized relations, engine-internal tables excluded.
pub const LIST_TABLES: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

/// Validate that `name` is a plain identifier.
///
/// # Errors
///
/// Returns `StoreError::InvalidIdentifier` for empty names or names with
/// characters outside `[A-Za-z0-9_]`.
pub fn validate_ident(name: &str) -> Result<&str> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Double-quote an identifier, escaping embedded quotes.
///
/// Ingested column headers can contain arbitrary characters, so column names
/// go through this rather than [`validate_ident`].
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Name of the secondary index over `table.column`.
///
/// Characters outside `[A-Za-z0-9_]` become `_`. When that changes the
/// column name, a short digest of the raw name is appended so `ITEM NAME`
/// and `ITEM_NAME` get distinct indexes.
#[must_use]
pub fn index_name(table: &str, column: &str) -> String {
    let sanitized: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let name = if sanitized == column {
        format!("idx_{table}_{column}")
    } else {
        let digest = blake3::hash(column.as_bytes());
        format!(
            "idx_{table}_{sanitized}_{}",
            hex::encode(&digest.as_bytes()[..4])
        )
    };
    name.to_ascii_lowercase()
}

/// `CREATE TABLE` for an ingested relation.
#[must_use]
pub fn create_table(table: &str, columns: &[(String, ColumnType)]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.sql_name()))
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(table), defs.join(", "))
}

/// Positional `INSERT` for an ingested relation.
#[must_use]
pub fn insert_row(table: &str, width: usize) -> String {
    let placeholders = vec!["?"; width].join(", ");
    format!("INSERT INTO {} VALUES ({placeholders})", quote_ident(table))
}
