//! Extractors Crate
//!
//! Turns uploaded contact lists into structured records. Parsing and
//! validation are pure: no storage access, no side effects beyond reading the
//! supplied bytes, so every step can be unit tested directly.
//!
//! # Pipeline
//!
//! - [`ListFormat::from_file_name`] picks a parser from the file extension
//! - [`parse_list`] yields header-keyed rows lazily
//! - [`validate_rows`] splits rows into accepted contacts and rejections
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::{parse_list, validate_rows, ListFormat};
//!
//! let format = ListFormat::from_file_name("leads.csv")?;
//! let rows = parse_list(std::io::Cursor::new(bytes), format)?
//!     .collect::<Result<Vec<_>, _>>()?;
//! let report = validate_rows(rows);
//! ```

pub mod contact_list;

pub use contact_list::{
    parse_list, validate_row, validate_rows, CsvParser, ListFormat, RawRow, RowReader,
    SpreadsheetParser, ValidationReport,
};
