//! Typed domain records mapped from store rows.
//!
//! Each record pulls out the key fields its domain is queried by and keeps
//! the full source row alongside, since the datasets carry many more columns
//! than any one service interprets.

use publog_store::{Row, Value};
use serde::Serialize;

fn text(row: &Row, column: &str) -> Option<String> {
    row.text(column).filter(|s| !s.is_empty())
}

/// A contractor record from `P_CAGE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CageRecord {
    /// Five-character CAGE code.
    pub cage_code: String,
    /// Company name.
    pub company: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State or province.
    pub state_province: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// CAGE status code.
    pub status: Option<String>,
    /// The full source row.
    pub fields: Row,
}

impl From<Row> for CageRecord {
    fn from(row: Row) -> Self {
        Self {
            cage_code: text(&row, "CAGE_CODE").unwrap_or_default(),
            company: text(&row, "COMPANY"),
            city: text(&row, "CITY"),
            state_province: text(&row, "STATE_PROVINCE"),
            country: text(&row, "COUNTRY"),
            status: text(&row, "CAGE_STATUS"),
            fields: row,
        }
    }
}

/// A Federal Supply Class record from `V_H2_FSC`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FscRecord {
    /// Class code as stored.
    pub fsc: String,
    /// Class title.
    pub title: Option<String>,
    /// The full source row.
    pub fields: Row,
}

impl From<Row> for FscRecord {
    fn from(row: Row) -> Self {
        Self {
            fsc: text(&row, "FSC").unwrap_or_default(),
            title: text(&row, "FSC_TITLE"),
            fields: row,
        }
    }
}

/// A Federal Supply Group derived from class codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FsgRecord {
    /// Two-digit group code (`class div 100`).
    pub fsg: i64,
    /// Group title.
    pub title: Option<String>,
}

impl From<Row> for FsgRecord {
    fn from(row: Row) -> Self {
        Self {
            fsg: row.integer("FSG").unwrap_or_default(),
            title: text(&row, "FSG_TITLE"),
        }
    }
}

/// Which relation a stock number record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NsnSource {
    /// `P_FLIS_NSN`, with item names and classes.
    Primary,
    /// `FLISV`, broader coverage with fewer fields.
    Fallback,
}

/// A stock number record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NsnRecord {
    /// Nine-digit NIIN.
    pub niin: String,
    /// Class code, if the source carries one.
    pub fsc: Option<String>,
    /// Item name, if the source carries one.
    pub item_name: Option<String>,
    /// Source relation.
    pub source: NsnSource,
    /// The full source row.
    pub fields: Row,
}

impl NsnRecord {
    /// Map a row from the given source relation.
    #[must_use]
    pub fn from_row(row: Row, source: NsnSource) -> Self {
        // NIINs ingested as integers lose their leading zeros.
        let niin = match row.get("NIIN") {
            Some(Value::Integer(n)) => format!("{n:09}"),
            Some(v) => v.to_text().unwrap_or_default(),
            None => String::new(),
        };
        Self {
            niin,
            fsc: text(&row, "FSC"),
            item_name: text(&row, "ITEM_NAME"),
            source,
            fields: row,
        }
    }
}

/// An Item Name Code record from `V_H6_NAME_INC`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncRecord {
    /// Item name code.
    pub inc: String,
    /// Approved item name.
    pub title: Option<String>,
    /// Definition text.
    pub definition: Option<String>,
    /// The full source row.
    pub fields: Row,
}

impl From<Row> for IncRecord {
    fn from(row: Row) -> Self {
        Self {
            inc: text(&row, "INC").unwrap_or_default(),
            title: text(&row, "FIIG_TITLE"),
            definition: text(&row, "DEFINITION"),
            fields: row,
        }
    }
}

/// A count of rows sharing one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    /// The grouped value; `None` for null.
    pub value: Option<String>,
    /// Number of rows.
    pub count: u64,
}

impl GroupCount {
    pub(crate) fn from_row(row: &Row, column: &str) -> Self {
        Self {
            value: row.text(column),
            count: row
                .integer("count")
                .and_then(|c| u64::try_from(c).ok())
                .unwrap_or(0),
        }
    }
}

/// Summary statistics over the contractor relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CageStats {
    /// Total contractor records.
    pub total_records: u64,
    /// Record counts by CAGE status, largest first.
    pub by_status: Vec<GroupCount>,
    /// The ten most common countries.
    pub top_countries: Vec<GroupCount>,
}
