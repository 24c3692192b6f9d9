use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use shared_types::ListError;
use std::collections::HashMap;
use std::io::{Cursor, Read};

use super::{RawRow, RowReader};

/// Maximum decompressed bytes to read from a single zip entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Columns A through XFD
const MAX_COLUMNS: usize = 16_384;
/// Compound File Binary header used by pre-2007 `.xls` workbooks.
const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

type Archive = zip::ZipArchive<Cursor<Vec<u8>>>;

/// Reads the first worksheet of an OOXML workbook. Row one is the header.
pub struct SpreadsheetParser {
    max_entry_bytes: u64,
}

struct CellState {
    column: usize,
    kind: Option<String>,
    raw: String,
}

impl SpreadsheetParser {
    pub fn new() -> Self {
        Self {
            max_entry_bytes: MAX_XML_ENTRY_BYTES,
        }
    }

    pub fn rows<R: Read>(&self, mut input: R) -> Result<RowReader, ListError> {
        let mut bytes = Vec::new();
        input
            .read_to_end(&mut bytes)
            .map_err(|e| ListError::MalformedInput(format!("Failed to read spreadsheet: {}", e)))?;

        let grid = self.read_first_sheet(bytes)?;
        Ok(RowReader::sheet(rows_from_grid(grid)))
    }

    fn read_first_sheet(&self, bytes: Vec<u8>) -> Result<Vec<Vec<(usize, String)>>, ListError> {
        if bytes.starts_with(&OLE_SIGNATURE) {
            return Err(ListError::MalformedInput(
                "legacy binary .xls workbooks are not supported; re-save the file as .xlsx or .csv"
                    .to_string(),
            ));
        }

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ListError::MalformedInput(format!("not a valid spreadsheet: {}", e)))?;

        let shared_strings = match self.read_entry(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => read_shared_strings(&xml)?,
            None => Vec::new(),
        };

        let sheet_path = self.first_sheet_path(&mut archive)?;
        let sheet_xml = self.read_entry(&mut archive, &sheet_path)?.ok_or_else(|| {
            ListError::MalformedInput(format!("worksheet {} is missing", sheet_path))
        })?;

        read_sheet_cells(&sheet_xml, &shared_strings)
    }

    fn read_entry(&self, archive: &mut Archive, name: &str) -> Result<Option<Vec<u8>>, ListError> {
        let file = match archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(ListError::MalformedInput(format!(
                    "Failed to open {}: {}",
                    name, e
                )))
            }
        };

        let mut out = Vec::new();
        file.take(self.max_entry_bytes + 1)
            .read_to_end(&mut out)
            .map_err(|e| ListError::MalformedInput(format!("Failed to read {}: {}", name, e)))?;

        if out.len() as u64 > self.max_entry_bytes {
            return Err(ListError::MalformedInput(format!(
                "{} exceeds the {} byte limit",
                name, self.max_entry_bytes
            )));
        }

        Ok(Some(out))
    }

    /// Resolves the first `<sheet>` in workbook order through the workbook
    /// relationships. Packages without usable relationships fall back to the
    /// lowest-numbered worksheet part.
    fn first_sheet_path(&self, archive: &mut Archive) -> Result<String, ListError> {
        let from_workbook = match (
            self.read_entry(archive, "xl/workbook.xml")?,
            self.read_entry(archive, "xl/_rels/workbook.xml.rels")?,
        ) {
            (Some(workbook), Some(rels)) => {
                let target = first_sheet_rel_id(&workbook)?
                    .map(|rel_id| relationship_target(&rels, &rel_id))
                    .transpose()?
                    .flatten();
                target.map(|t| match t.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{}", t),
                })
            }
            _ => None,
        };

        if let Some(path) = from_workbook {
            if archive.file_names().any(|n| n == path) {
                return Ok(path);
            }
        }

        let mut sheets: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
            .map(|s| s.to_string())
            .collect();
        sheets.sort_by_key(|name| {
            name.trim_start_matches("xl/worksheets/sheet")
                .trim_end_matches(".xml")
                .parse::<u32>()
                .unwrap_or(u32::MAX)
        });

        sheets
            .into_iter()
            .next()
            .ok_or_else(|| ListError::MalformedInput("workbook contains no worksheets".to_string()))
    }
}

impl Default for SpreadsheetParser {
    fn default() -> Self {
        Self::new()
    }
}

fn xml_error(e: quick_xml::Error) -> ListError {
    ListError::MalformedInput(format!("invalid spreadsheet XML: {}", e))
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn first_sheet_rel_id(workbook_xml: &[u8]) -> Result<Option<String>, ListError> {
    let mut reader = Reader::from_reader(workbook_xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                return Ok(attribute(&e, b"id"));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

fn relationship_target(rels_xml: &[u8], rel_id: &str) -> Result<Option<String>, ListError> {
    let mut reader = Reader::from_reader(rels_xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attribute(&e, b"Id").as_deref() == Some(rel_id) {
                    return Ok(attribute(&e, b"Target"));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Each `<si>` becomes one string; rich-text runs are concatenated and
/// phonetic hints (`<rPh>`) are skipped.
fn read_shared_strings(xml: &[u8]) -> Result<Vec<String>, ListError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" if current.is_some() && !in_phonetic => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(te) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&te.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                b"si" => {
                    if let Some(s) = current.take() {
                        strings.push(s);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Zero-based column index of a cell reference such as `C12`. References past
/// the last worksheet column (XFD) are malformed.
fn column_index(reference: &str) -> Result<Option<usize>, ListError> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return Ok(None);
    }

    let mut number = 0usize;
    for b in letters {
        number = number * 26 + (b - b'A' + 1) as usize;
        if number > MAX_COLUMNS {
            return Err(ListError::MalformedInput(format!(
                "cell reference {} is beyond the last worksheet column",
                reference
            )));
        }
    }
    Ok(Some(number - 1))
}

fn resolve_cell(cell: CellState, shared_strings: &[String]) -> Result<String, ListError> {
    match cell.kind.as_deref() {
        Some("s") => {
            let index: usize = cell.raw.trim().parse().map_err(|_| {
                ListError::MalformedInput(format!("invalid shared string index '{}'", cell.raw))
            })?;
            shared_strings.get(index).cloned().ok_or_else(|| {
                ListError::MalformedInput(format!("shared string index {} out of range", index))
            })
        }
        Some("b") => Ok(if cell.raw.trim() == "1" { "TRUE" } else { "FALSE" }.to_string()),
        _ => Ok(cell.raw),
    }
}

/// Returns rows in document order as `(column, value)` pairs. Cells without
/// a value element come back as empty strings.
fn read_sheet_cells(
    xml: &[u8],
    shared_strings: &[String],
) -> Result<Vec<Vec<(usize, String)>>, ListError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut rows = Vec::new();
    let mut current_row: Option<Vec<(usize, String)>> = None;
    let mut cell: Option<CellState> = None;
    let mut capture = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => current_row = Some(Vec::new()),
                b"c" => {
                    let next_column = current_row
                        .as_ref()
                        .and_then(|r| r.last())
                        .map(|(col, _)| col + 1)
                        .unwrap_or(0);
                    let column = attribute(&e, b"r")
                        .map(|r| column_index(&r))
                        .transpose()?
                        .flatten()
                        .unwrap_or(next_column);
                    cell = Some(CellState {
                        column,
                        kind: attribute(&e, b"t"),
                        raw: String::new(),
                    });
                }
                b"v" | b"t" if cell.is_some() => capture = true,
                _ => {}
            },
            Event::Text(te) if capture => {
                if let Some(c) = cell.as_mut() {
                    c.raw.push_str(&te.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    if let Some(c) = cell.take() {
                        let column = c.column;
                        let value = resolve_cell(c, shared_strings)?;
                        if let Some(row) = current_row.as_mut() {
                            row.push((column, value));
                        }
                    }
                }
                b"row" => {
                    if let Some(row) = current_row.take() {
                        rows.push(row);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

/// First non-blank row is the header; later non-blank rows are keyed by it.
fn rows_from_grid(grid: Vec<Vec<(usize, String)>>) -> Vec<RawRow> {
    let mut non_blank = grid
        .into_iter()
        .filter(|row| row.iter().any(|(_, v)| !v.trim().is_empty()));

    let headers: HashMap<usize, String> = match non_blank.next() {
        Some(header_row) => header_row
            .into_iter()
            .map(|(col, name)| (col, name.trim().to_string()))
            .filter(|(_, name)| !name.is_empty())
            .collect(),
        None => return Vec::new(),
    };

    non_blank
        .map(|row| {
            row.into_iter()
                .filter_map(|(col, value)| headers.get(&col).map(|h| (h.clone(), value)))
                .collect()
        })
        .collect()
}
