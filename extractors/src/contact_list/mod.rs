mod csv_parser;
mod spreadsheet;
mod validator;

pub use csv_parser::CsvParser;
pub use spreadsheet::SpreadsheetParser;
pub use validator::{
    validate_row, validate_rows, ValidationReport, FIRST_NAME_FIELD, NOTES_FIELD, PHONE_FIELD,
};

use csv_parser::DelimitedRows;
use shared_types::ListError;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// One parsed row, keyed by column header. Values are raw strings; columns
/// missing from a short row are absent from the map.
pub type RawRow = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    /// `.csv`
    DelimitedText,
    /// `.xlsx` / `.xls`
    Spreadsheet,
}

impl ListFormat {
    /// Recognition is by extension only. Anything other than csv, xlsx or xls
    /// is refused before any bytes are read.
    pub fn from_file_name(file_name: &str) -> Result<Self, ListError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(ListFormat::DelimitedText),
            "xlsx" | "xls" => Ok(ListFormat::Spreadsheet),
            "" => Err(ListError::UnsupportedFormat(file_name.to_string())),
            _ => Err(ListError::UnsupportedFormat(format!(".{}", extension))),
        }
    }
}

/// Finite, single-pass sequence of rows from an uploaded list.
///
/// Delimited text is decoded row by row as the iterator advances. Spreadsheets
/// are zip packages and have to be unpacked before the first row is known, so
/// their rows are decoded up front and any corruption surfaces from
/// [`parse_list`] itself.
pub struct RowReader {
    source: RowSource,
}

enum RowSource {
    Delimited(DelimitedRows),
    Sheet(std::vec::IntoIter<RawRow>),
}

impl RowReader {
    fn delimited(rows: DelimitedRows) -> Self {
        Self {
            source: RowSource::Delimited(rows),
        }
    }

    fn sheet(rows: Vec<RawRow>) -> Self {
        Self {
            source: RowSource::Sheet(rows.into_iter()),
        }
    }
}

impl Iterator for RowReader {
    type Item = Result<RawRow, ListError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            RowSource::Delimited(rows) => rows.next(),
            RowSource::Sheet(rows) => rows.next().map(Ok),
        }
    }
}

pub fn parse_list<R: Read + Send + 'static>(
    input: R,
    format: ListFormat,
) -> Result<RowReader, ListError> {
    match format {
        ListFormat::DelimitedText => CsvParser::new().rows(input),
        ListFormat::Spreadsheet => SpreadsheetParser::new().rows(input),
    }
}
