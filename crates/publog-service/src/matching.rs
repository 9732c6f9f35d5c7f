//! Shared query-shaping rules.
//!
//! Free text is matched as an upper-cased `%term%` pattern, codes by exact
//! equality after upper-casing, and class codes numerically when they parse
//! as integers with a text-cast fallback otherwise.

use publog_store::Value;
use serde::{Deserialize, Serialize};

/// Case-insensitive substring pattern for `UPPER(col) LIKE ?`.
#[must_use]
pub fn like_pattern(term: &str) -> Value {
    Value::Text(format!("%{}%", term.trim().to_uppercase()))
}

/// Canonical form of an exact-match code.
#[must_use]
pub fn exact_code(code: &str) -> Value {
    Value::Text(code.trim().to_uppercase())
}

/// A class code as given by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassCode {
    /// Compared numerically.
    Numeric(i64),
    /// Compared against the code cast to text.
    Text(String),
}

impl ClassCode {
    /// Parse a string, preferring the numeric form.
    #[must_use]
    pub fn parse(code: &str) -> Self {
        let code = code.trim();
        code.parse()
            .map_or_else(|_| Self::Text(code.to_string()), Self::Numeric)
    }

    /// SQL condition over the `FSC` column and the value to bind for it.
    #[must_use]
    pub fn condition(&self) -> (&'static str, Value) {
        match self {
            Self::Numeric(n) => ("FSC = ?", Value::Integer(*n)),
            Self::Text(s) => ("CAST(FSC AS TEXT) = ?", Value::Text(s.clone())),
        }
    }
}

impl From<i64> for ClassCode {
    fn from(code: i64) -> Self {
        Self::Numeric(code)
    }
}

impl From<&str> for ClassCode {
    fn from(code: &str) -> Self {
        Self::parse(code)
    }
}
