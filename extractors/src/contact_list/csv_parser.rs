use csv::{ReaderBuilder, StringRecordsIntoIter};
use shared_types::ListError;
use std::collections::HashMap;
use std::io::Read;

use super::{RawRow, RowReader};

pub struct CsvParser {
    delimiter: u8,
}

impl CsvParser {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// First record is the header; every later record maps positionally onto
    /// it. Short rows simply lack the trailing keys and extra fields past the
    /// last header are dropped.
    pub fn rows<R: Read + Send + 'static>(&self, input: R) -> Result<RowReader, ListError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(Box::new(input) as Box<dyn Read + Send>);

        let headers = reader
            .headers()
            .map_err(|e| ListError::MalformedInput(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        Ok(RowReader::delimited(DelimitedRows {
            headers,
            records: reader.into_records(),
            failed: false,
        }))
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct DelimitedRows {
    headers: Vec<String>,
    records: StringRecordsIntoIter<Box<dyn Read + Send>>,
    failed: bool,
}

impl Iterator for DelimitedRows {
    type Item = Result<RawRow, ListError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.records.next()? {
            Ok(record) => {
                let mut map = HashMap::new();
                for (i, field) in record.iter().enumerate() {
                    match self.headers.get(i) {
                        Some(header) if !header.is_empty() => {
                            map.insert(header.clone(), field.to_string());
                        }
                        _ => {}
                    }
                }
                Some(Ok(map))
            }
            Err(e) => {
                // Stop after the first decode error; the upload is rejected anyway.
                self.failed = true;
                let message = match e.position() {
                    Some(pos) => format!("line {}: {}", pos.line(), e),
                    None => e.to_string(),
                };
                Some(Err(ListError::MalformedInput(message)))
            }
        }
    }
}
