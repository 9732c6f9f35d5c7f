//! Domain code types for the PubLog datasets.
//!
//! These wrap the handful of codes that callers look records up by. Parsing
//! normalizes case and punctuation so that the query layer only ever sees
//! canonical values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing a domain code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    /// The code has the wrong number of characters.
    #[error("invalid length: expected {expected}, got {got}")]
    InvalidLength {
        /// Expected number of characters.
        expected: usize,
        /// Actual number of characters.
        got: usize,
    },

    /// The code contains a character outside its alphabet.
    #[error("invalid character {0:?}")]
    InvalidCharacter(char),
}

fn check_len(s: &str, expected: usize) -> Result<(), CodeError> {
    let got = s.chars().count();
    if got == expected {
        Ok(())
    } else {
        Err(CodeError::InvalidLength { expected, got })
    }
}

fn check_digits(s: &str) -> Result<(), CodeError> {
    match s.chars().find(|c| !c.is_ascii_digit()) {
        Some(c) => Err(CodeError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

/// A five-character Commercial and Government Entity code.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CageCode(String);

impl CageCode {
    /// Return the canonical upper-case code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CageCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        check_len(&code, 5)?;
        if let Some(c) = code.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(CodeError::InvalidCharacter(c));
        }
        Ok(Self(code))
    }
}

impl fmt::Debug for CageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CageCode({})", self.0)
    }
}

impl fmt::Display for CageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CageCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CageCode> for String {
    fn from(code: CageCode) -> Self {
        code.0
    }
}

/// A two-digit Federal Supply Group code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FsgCode(u8);

impl FsgCode {
    /// Return the numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// The half-open range of class codes in this group.
    #[must_use]
    pub const fn class_range(self) -> (u16, u16) {
        let start = self.0 as u16 * 100;
        (start, start + 100)
    }
}

impl FromStr for FsgCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.len() > 2 {
            return Err(CodeError::InvalidLength {
                expected: 2,
                got: s.chars().count(),
            });
        }
        check_digits(s)?;
        s.parse()
            .map(Self)
            .map_err(|_| CodeError::InvalidLength { expected: 2, got: s.len() })
    }
}

impl fmt::Debug for FsgCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FsgCode({:02})", self.0)
    }
}

impl fmt::Display for FsgCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl TryFrom<String> for FsgCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FsgCode> for String {
    fn from(code: FsgCode) -> Self {
        code.to_string()
    }
}

/// A nine-digit National Item Identification Number.
///
/// Parsing also accepts a full thirteen-digit National Stock Number (the
/// four-digit class followed by the NIIN), with or without dashes.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Niin(String);

impl Niin {
    /// Return the nine-digit string, leading zeros included.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Niin {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.trim().chars().filter(|&c| c != '-').collect();
        check_digits(&digits)?;
        match digits.len() {
            9 => Ok(Self(digits)),
            13 => Ok(Self(digits[4..].to_string())),
            got => Err(CodeError::InvalidLength { expected: 9, got }),
        }
    }
}

impl fmt::Debug for Niin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Niin({})", self.0)
    }
}

impl fmt::Display for Niin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Niin {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Niin> for String {
    fn from(niin: Niin) -> Self {
        niin.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cage_code_normalizes_case() {
        let code: CageCode = " 1abc2 ".parse().unwrap();
        assert_eq!(code.as_str(), "1ABC2");
        assert_eq!(code.to_string(), "1ABC2");
    }

    #[test]
    fn cage_code_rejects_bad_input() {
        assert_eq!(
            "ABC".parse::<CageCode>(),
            Err(CodeError::InvalidLength { expected: 5, got: 3 })
        );
        assert_eq!(
            "AB-12".parse::<CageCode>(),
            Err(CodeError::InvalidCharacter('-'))
        );
    }

    #[test]
    fn fsg_keeps_leading_zero_in_display() {
        let fsg: FsgCode = "1".parse().unwrap();
        assert_eq!(fsg.value(), 1);
        assert_eq!(fsg.to_string(), "01");
        assert_eq!(fsg.class_range(), (100, 200));
    }

    #[test]
    fn fsg_class_range() {
        let fsg: FsgCode = "58".parse().unwrap();
        assert_eq!(fsg.class_range(), (5800, 5900));
        assert!("5A".parse::<FsgCode>().is_err());
        assert!("123".parse::<FsgCode>().is_err());
    }

    #[test]
    fn niin_accepts_nsn_forms() {
        let plain: Niin = "001234567".parse().unwrap();
        let nsn: Niin = "5820-00-123-4567".parse().unwrap();
        let packed: Niin = "5820001234567".parse().unwrap();
        assert_eq!(plain.as_str(), "001234567");
        assert_eq!(nsn, plain);
        assert_eq!(packed, plain);
    }

    #[test]
    fn niin_rejects_bad_input() {
        assert!(matches!(
            "12345".parse::<Niin>(),
            Err(CodeError::InvalidLength { expected: 9, got: 5 })
        ));
        assert_eq!(
            "00123456X".parse::<Niin>(),
            Err(CodeError::InvalidCharacter('X'))
        );
    }

    #[test]
    fn codes_serde_roundtrip_as_strings() {
        let fsg: FsgCode = "05".parse().unwrap();
        let json = serde_json::to_string(&fsg).unwrap();
        assert_eq!(json, "\"05\"");
        let parsed: FsgCode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, fsg);

        let bad: Result<CageCode, _> = serde_json::from_str("\"TOO-LONG\"");
        assert!(bad.is_err());
    }
}
