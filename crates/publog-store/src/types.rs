//! Value, row, and metadata types returned by the store.

use std::fmt;
use std::sync::Arc;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A typed scalar held in a relation cell or bound as a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Text.
    Text(String),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// Absent value.
    Null,
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text payload, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as an integer, parsing numeric text.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Render the value as text; `None` for null.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Null => f.write_str("NULL"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Self::Float(x) => ToSqlOutput::Borrowed(ValueRef::Real(*x)),
            Self::Null => ToSqlOutput::Borrowed(ValueRef::Null),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(x) => Self::Float(x),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Self::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        })
    }
}

/// One result row: column names in declared order with their values.
///
/// Rows from the same statement share a single column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row. `values` must be parallel to `columns`.
    #[must_use]
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column names in declared order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in declared order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value by column name. Exact matches win over
    /// case-insensitive ones.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(column))
            })?;
        self.values.get(idx)
    }

    /// The value of `column` rendered as text, if present and not null.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(Value::to_text)
    }

    /// The value of `column` as an integer, if present and numeric.
    #[must_use]
    pub fn integer(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    /// Iterate over `(column, value)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Storage type assigned to an ingested column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Decimal numbers.
    Real,
    /// Anything else.
    Text,
}

impl ColumnType {
    /// The declared type used in `CREATE TABLE`.
    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }
}

/// Column metadata reported by [`Store::describe`](crate::Store::describe).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared engine type.
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Relation metadata reported by [`Store::describe`](crate::Store::describe).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    /// Relation name as stored by the engine.
    pub table_name: String,
    /// Number of rows.
    pub row_count: u64,
    /// Columns in declared order.
    pub columns: Vec<ColumnInfo>,
}

/// Row count of one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRows {
    /// Relation name.
    pub table: String,
    /// Number of rows.
    pub rows: u64,
}

/// Snapshot of what the store currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    /// Number of materialized relations.
    pub table_count: usize,
    /// Sum of row counts over all relations.
    pub total_rows: u64,
    /// Per-relation row counts, largest first.
    pub tables: Vec<TableRows>,
    /// Size of the database file in bytes (0 for in-memory stores).
    pub file_size_bytes: u64,
}

/// Outcome of a successful CSV ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Rows written to the relation.
    pub rows: u64,
    /// Malformed rows that were dropped.
    pub skipped_rows: u64,
    /// Cells stored as text because they did not fit the inferred type.
    pub coerced_cells: u64,
    /// Inferred column layout.
    pub columns: Vec<(String, ColumnType)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        let columns: Arc<[String]> = vec!["FSC".to_string(), "FSC_TITLE".to_string()].into();
        Row::new(columns, vec![Value::Integer(5820), Value::from("RADIO")])
    }

    #[test]
    fn row_lookup_by_name() {
        let row = row();
        assert_eq!(row.get("FSC"), Some(&Value::Integer(5820)));
        assert_eq!(row.get("fsc_title"), Some(&Value::from("RADIO")));
        assert_eq!(row.get("MISSING"), None);
        assert_eq!(row.integer("FSC"), Some(5820));
        assert_eq!(row.text("FSC"), Some("5820".to_string()));
    }

    #[test]
    fn row_serializes_as_ordered_map() {
        let json = serde_json::to_string(&row()).unwrap();
        assert_eq!(json, r#"{"FSC":5820,"FSC_TITLE":"RADIO"}"#);
    }

    #[test]
    fn value_numeric_coercions() {
        assert_eq!(Value::from("  42 ").as_i64(), Some(42));
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::Float(3.5).as_i64(), None);
        assert_eq!(Value::from("abc").as_i64(), None);
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::from(Option::<i64>::None), Value::Null);
    }

    #[test]
    fn null_serializes_as_json_null() {
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
    }
}
