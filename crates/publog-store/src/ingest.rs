//! CSV reading with sampled column type inference.
//!
//! A [`CsvSource`] reads the header, buffers the first `sample_size` records
//! to decide a [`ColumnType`] per column, then yields converted rows: first
//! the buffered sample, then the remainder of the file. Malformed records are
//! skipped and counted rather than failing the whole ingest.
//!
//! Unless a delimiter is configured, it is detected from the header line:
//! whichever of `,` `|` `\t` `;` occurs most often outside quotes.

use std::collections::{HashSet, VecDeque};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::types::{ColumnType, Value};

/// Options controlling how a CSV file is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Number of leading records inspected for type inference.
    #[serde(default = "CsvOptions::default_sample_size")]
    pub sample_size: usize,

    /// Field delimiter; detected from the header line when `None`.
    #[serde(default)]
    pub delimiter: Option<u8>,
}

impl CsvOptions {
    const fn default_sample_size() -> usize {
        10_000
    }

    /// Options with the given sample size and a detected delimiter.
    #[must_use]
    pub fn with_sample_size(sample_size: usize) -> Self {
        Self {
            sample_size,
            ..Self::default()
        }
    }
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            sample_size: Self::default_sample_size(),
            delimiter: None,
        }
    }
}

/// Lexical class of a single raw cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Empty,
    Integer,
    Decimal,
    Other,
}

fn classify(raw: &str) -> Lexeme {
    let s = raw.trim();
    if s.is_empty() {
        return Lexeme::Empty;
    }
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());

    // Leading zeros carry meaning in codes like NIINs, keep those as text.
    if int_part.len() > 1 && int_part.starts_with('0') {
        return Lexeme::Other;
    }
    match frac_part {
        None if digits(int_part) && s.parse::<i64>().is_ok() => Lexeme::Integer,
        Some(frac) if digits(int_part) && digits(frac) => Lexeme::Decimal,
        _ => Lexeme::Other,
    }
}

/// Running inference state for one column.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnSample {
    non_empty: usize,
    text: bool,
    decimal: bool,
}

impl ColumnSample {
    fn observe(&mut self, raw: &str) {
        match classify(raw) {
            Lexeme::Empty => return,
            Lexeme::Integer => {}
            Lexeme::Decimal => self.decimal = true,
            Lexeme::Other => self.text = true,
        }
        self.non_empty += 1;
    }

    fn column_type(self) -> ColumnType {
        if self.non_empty == 0 || self.text {
            ColumnType::Text
        } else if self.decimal {
            ColumnType::Real
        } else {
            ColumnType::Integer
        }
    }
}

/// Turn raw header cells into unique, non-empty column names.
///
/// Engine identifiers compare case-insensitively, so uniqueness does too.
fn normalize_headers(raw: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(raw.len());
    for (i, header) in raw.iter().enumerate() {
        let trimmed = header.trim().trim_start_matches('\u{feff}').trim();
        let base = if trimmed.is_empty() {
            format!("column_{}", i + 1)
        } else {
            trimmed.to_string()
        };
        let mut name = base.clone();
        let mut n = 2;
        while seen.contains(&name.to_ascii_uppercase()) {
            name = format!("{base}_{n}");
            n += 1;
        }
        seen.insert(name.to_ascii_uppercase());
        names.push(name);
    }
    names
}

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [u8; 4] = [b',', b'|', b'\t', b';'];

/// Bytes read ahead to find the header line.
const SNIFF_CAPACITY: usize = 64 * 1024;

/// Pick the candidate delimiter occurring most often in `line` outside
/// double quotes. Falls back to `,`.
fn detect_delimiter(line: &[u8]) -> u8 {
    let mut counts = [0usize; DELIMITERS.len()];
    let mut quoted = false;
    for &b in line {
        match b {
            b'"' => quoted = !quoted,
            b'\n' if !quoted => break,
            _ if !quoted => {
                if let Some(i) = DELIMITERS.iter().position(|&d| d == b) {
                    counts[i] += 1;
                }
            }
            _ => {}
        }
    }
    DELIMITERS
        .iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .fold(None, |best: Option<(u8, usize)>, (&d, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((d, n)),
        })
        .map_or(b',', |(d, _)| d)
}

fn decode(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

/// A CSV file opened for ingest.
pub struct CsvSource<R> {
    reader: csv::Reader<BufReader<R>>,
    columns: Vec<(String, ColumnType)>,
    pending: VecDeque<Vec<String>>,
    record: ByteRecord,
    skipped_rows: u64,
    coerced_cells: u64,
}

impl CsvSource<File> {
    /// Open `path` and infer its schema.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read, or
    /// `StoreError::Csv` if it has no header row.
    pub fn open(path: &Path, options: &CsvOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, options)
    }
}

impl<R: io::Read> CsvSource<R> {
    /// Wrap an arbitrary reader and infer its schema.
    ///
    /// # Errors
    ///
    /// Same as [`CsvSource::open`].
    pub fn from_reader(input: R, options: &CsvOptions) -> Result<Self> {
        let mut input = BufReader::with_capacity(SNIFF_CAPACITY, input);
        let delimiter = match options.delimiter {
            Some(delimiter) => delimiter,
            None => {
                let delimiter = detect_delimiter(input.fill_buf()?);
                tracing::debug!(
                    delimiter = %char::from(delimiter).escape_default(),
                    "Detected delimiter"
                );
                delimiter
            }
        };
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers = decode(reader.byte_headers()?);
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(StoreError::Csv("missing header row".to_string()));
        }
        let names = normalize_headers(&headers);

        let mut source = Self {
            reader,
            columns: Vec::new(),
            pending: VecDeque::new(),
            record: ByteRecord::new(),
            skipped_rows: 0,
            coerced_cells: 0,
        };

        let width = names.len();
        let mut samples = vec![ColumnSample::default(); width];
        while source.pending.len() < options.sample_size {
            let Some(fields) = source.next_record(width)? else {
                break;
            };
            for (sample, raw) in samples.iter_mut().zip(&fields) {
                sample.observe(raw);
            }
            source.pending.push_back(fields);
        }

        source.columns = names
            .into_iter()
            .zip(samples.into_iter().map(ColumnSample::column_type))
            .collect();
        Ok(source)
    }

    /// Inferred columns in file order.
    #[must_use]
    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    /// Malformed records skipped so far.
    #[must_use]
    pub const fn skipped_rows(&self) -> u64 {
        self.skipped_rows
    }

    /// Cells kept as text despite a numeric column type, so far.
    #[must_use]
    pub const fn coerced_cells(&self) -> u64 {
        self.coerced_cells
    }

    /// Read the next well-formed record as raw strings.
    fn next_record(&mut self, width: usize) -> Result<Option<Vec<String>>> {
        loop {
            match self.reader.read_byte_record(&mut self.record) {
                Ok(false) => return Ok(None),
                Ok(true) if self.record.len() == width => {
                    return Ok(Some(decode(&self.record)));
                }
                Ok(true) => {
                    self.skipped_rows += 1;
                    tracing::debug!(
                        line = self.record.position().map_or(0, csv::Position::line),
                        expected = width,
                        got = self.record.len(),
                        "Skipping record with wrong field count"
                    );
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    self.skipped_rows += 1;
                    tracing::debug!(error = %e, "Skipping malformed record");
                }
            }
        }
    }

    /// Next converted row, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if reading the underlying file fails.
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        let fields = match self.pending.pop_front() {
            Some(fields) => fields,
            None => match self.next_record(self.columns.len())? {
                Some(fields) => fields,
                None => return Ok(None),
            },
        };

        let mut row = Vec::with_capacity(fields.len());
        for ((_, ty), raw) in self.columns.iter().zip(fields) {
            let (value, coerced) = convert(raw, *ty);
            if coerced {
                self.coerced_cells += 1;
            }
            row.push(value);
        }
        Ok(Some(row))
    }
}

/// Convert a raw cell to the column's type. The flag is set when a non-empty
/// cell had to be kept as text.
fn convert(raw: String, ty: ColumnType) -> (Value, bool) {
    let lexeme = classify(&raw);
    match (ty, lexeme) {
        (_, Lexeme::Empty) => (Value::Null, false),
        (ColumnType::Text, _) => (Value::Text(raw), false),
        (ColumnType::Integer, Lexeme::Integer) => match raw.trim().parse() {
            Ok(i) => (Value::Integer(i), false),
            Err(_) => (Value::Text(raw), true),
        },
        (ColumnType::Real, Lexeme::Integer | Lexeme::Decimal) => match raw.trim().parse() {
            Ok(x) => (Value::Float(x), false),
            Err(_) => (Value::Text(raw), true),
        },
        _ => (Value::Text(raw), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(data: &str) -> CsvSource<&[u8]> {
        CsvSource::from_reader(data.as_bytes(), &CsvOptions::default()).unwrap()
    }

    fn drain<R: io::Read>(src: &mut CsvSource<R>) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        while let Some(row) = src.next_row().unwrap() {
            rows.push(row);
        }
        rows
    }

    #[test]
    fn classify_cells() {
        assert_eq!(classify(""), Lexeme::Empty);
        assert_eq!(classify("  "), Lexeme::Empty);
        assert_eq!(classify("5820"), Lexeme::Integer);
        assert_eq!(classify("-12"), Lexeme::Integer);
        assert_eq!(classify("0"), Lexeme::Integer);
        assert_eq!(classify("0.25"), Lexeme::Decimal);
        assert_eq!(classify("3.5"), Lexeme::Decimal);
        assert_eq!(classify("001234567"), Lexeme::Other);
        assert_eq!(classify("1ABC2"), Lexeme::Other);
        assert_eq!(classify("1."), Lexeme::Other);
        assert_eq!(classify("99999999999999999999"), Lexeme::Other);
    }

    #[test]
    fn infers_column_types() {
        let src = source("FSC,PRICE,NIIN,TITLE\n5820,1.5,001234567,RADIO\n5821,2,001234568,\n");
        let types: Vec<ColumnType> = src.columns().iter().map(|(_, t)| *t).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Integer,
                ColumnType::Real,
                ColumnType::Text,
                ColumnType::Text
            ]
        );
    }

    #[test]
    fn converts_values_and_nulls() {
        let mut src = source("FSC,TITLE\n5820,RADIO\n5821,\n");
        let rows = drain(&mut src);
        assert_eq!(rows[0], vec![Value::Integer(5820), Value::from("RADIO")]);
        assert_eq!(rows[1], vec![Value::Integer(5821), Value::Null]);
    }

    #[test]
    fn values_past_sample_are_kept_as_text() {
        let options = CsvOptions::with_sample_size(2);
        let data = "CODE\n1\n2\nABC\n4\n";
        let mut src = CsvSource::from_reader(data.as_bytes(), &options).unwrap();
        assert_eq!(src.columns()[0].1, ColumnType::Integer);
        let rows = drain(&mut src);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2], vec![Value::from("ABC")]);
        assert_eq!(src.coerced_cells(), 1);
    }

    #[test]
    fn skips_rows_with_wrong_width() {
        let mut src = source("A,B\n1,2\n3\n4,5,6\n7,8\n");
        let rows = drain(&mut src);
        assert_eq!(rows.len(), 2);
        assert_eq!(src.skipped_rows(), 2);
    }

    #[test]
    fn disambiguates_headers() {
        let src = source("NAME,name,,NAME\nA,B,C,D\n");
        let names: Vec<&str> = src.columns().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["NAME", "name_2", "column_3", "NAME_3"]);
    }

    #[test]
    fn quoted_fields_with_commas() {
        let mut src = source("ID,NAME\n1,\"ACME, INC \"\"WEST\"\"\"\n");
        let rows = drain(&mut src);
        assert_eq!(rows[0][1], Value::from("ACME, INC \"WEST\""));
    }

    #[test]
    fn detects_delimiter_from_header() {
        assert_eq!(detect_delimiter(b"A,B,C\n1|2|3\n"), b',');
        assert_eq!(detect_delimiter(b"NIIN|FSC|ITEM_NAME\n"), b'|');
        assert_eq!(detect_delimiter(b"NIIN\tFSC\n"), b'\t');
        assert_eq!(detect_delimiter(b"\"A,B\";C\n"), b';');
        assert_eq!(detect_delimiter(b"SINGLE\n"), b',');
    }

    #[test]
    fn reads_pipe_delimited_files() {
        let data = "NIIN|FSC|ITEM_NAME\n\
                    001234567|5820|RADIO SET\n\
                    001234568|5905|\"RESISTOR, FIXED\"\n";
        let mut src = source(data);
        let names: Vec<&str> = src.columns().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["NIIN", "FSC", "ITEM_NAME"]);
        let rows = drain(&mut src);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], Value::Integer(5905));
        assert_eq!(rows[1][2], Value::from("RESISTOR, FIXED"));
    }

    #[test]
    fn configured_delimiter_wins() {
        let options = CsvOptions {
            delimiter: Some(b','),
            ..CsvOptions::default()
        };
        let src = CsvSource::from_reader("A|B\n1|2\n".as_bytes(), &options).unwrap();
        assert_eq!(src.columns().len(), 1);
    }

    #[test]
    fn empty_input_has_no_header() {
        let result = CsvSource::from_reader("".as_bytes(), &CsvOptions::default());
        assert!(matches!(result, Err(StoreError::Csv(_))));
    }
}
