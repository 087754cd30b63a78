//! CSV import codec for Roster.
//!
//! Converts rows of an employee export into normalized
//! [`roster_core`] records. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use roster_import::{ImportRow, parse_str};
//!
//! let csv = "Name,LinkedInURL,CurrentCompany\nJane Doe,https://linkedin.com/in/jdoe,Acme\n";
//! for row in parse_str(csv).unwrap() {
//!   match row.unwrap() {
//!     ImportRow::Accepted(e) => println!("{} at {}", e.record.name, e.employer.name),
//!     ImportRow::Skipped(s) => println!("row {} skipped: {}", s.row, s.reason),
//!   }
//! }
//! ```

pub mod error;
mod parse;

use std::{fmt, fs::File, io::Read, path::Path};

pub use error::{Error, Result};
use roster_core::{company::NewCompany, employee::EmployeeRecord};
use serde::Serialize;

// ─── Public types ────────────────────────────────────────────────────────────

/// A row that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedEmployee {
  /// 1-based data row number (the header is row 0).
  pub row:      usize,
  pub record:   EmployeeRecord,
  /// The employer to resolve before the record is persisted.
  pub employer: NewCompany,
}

/// Why a row was not imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  MissingName,
  MissingCurrentCompany,
  MissingProfileUrl,
  /// The employer name could not be resolved to a company.
  UnresolvedCompany,
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::MissingName => "missing Name",
      Self::MissingCurrentCompany => "missing CurrentCompany",
      Self::MissingProfileUrl => "missing LinkedInURL",
      Self::UnresolvedCompany => "could not resolve company",
    })
  }
}

/// A recorded skip: which row, who it was (when known), and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skip {
  pub row:    usize,
  pub name:   Option<String>,
  pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportRow {
  Accepted(ImportedEmployee),
  Skipped(Skip),
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Data rows of a CSV document, read one record at a time.
///
/// Each item is the row's [`ImportRow`], or `Err(…)` for a malformed record;
/// iteration continues past errors until the input is exhausted.
pub struct Rows<R> {
  reader:  csv::Reader<R>,
  headers: csv::StringRecord,
  record:  csv::StringRecord,
  row:     usize,
}

impl<R: Read> Iterator for Rows<R> {
  type Item = Result<ImportRow>;

  fn next(&mut self) -> Option<Self::Item> {
    self.row += 1;
    match self.reader.read_record(&mut self.record) {
      Ok(false) => None,
      Ok(true) => Some(
        self
          .record
          .deserialize::<parse::RawRow>(Some(&self.headers))
          .map(|raw| raw.normalize(self.row))
          .map_err(Error::from),
      ),
      Err(e) => Some(Err(e.into())),
    }
  }
}

/// Start reading a CSV document. Fails only when the header line cannot be
/// read.
pub fn parse_reader<R: Read>(input: R) -> Result<Rows<R>> {
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(input);
  let headers = reader.headers()?.clone();
  Ok(Rows { reader, headers, record: csv::StringRecord::new(), row: 0 })
}

pub fn parse_str(input: &str) -> Result<Rows<&[u8]>> {
  parse_reader(input.as_bytes())
}

pub fn parse_path(path: impl AsRef<Path>) -> Result<Rows<File>> {
  parse_reader(File::open(path)?)
}
