use shared_types::{NewContact, RowRejection};

use super::RawRow;

pub const FIRST_NAME_FIELD: &str = "FirstName";
pub const PHONE_FIELD: &str = "Phone";
pub const NOTES_FIELD: &str = "Notes";

/// Data rows start after the header line and are numbered from one.
const HEADER_OFFSET: u64 = 2;

/// Every input row lands in exactly one of the two lists, in input order.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub accepted: Vec<NewContact>,
    pub rejections: Vec<RowRejection>,
}

impl ValidationReport {
    pub fn total_rows(&self) -> usize {
        self.accepted.len() + self.rejections.len()
    }
}

pub fn validate_rows<I>(rows: I) -> ValidationReport
where
    I: IntoIterator<Item = RawRow>,
{
    let mut report = ValidationReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        match validate_row(&row) {
            Ok(contact) => report.accepted.push(contact),
            Err(errors) => report.rejections.push(RowRejection {
                row: index as u64 + HEADER_OFFSET,
                errors,
            }),
        }
    }

    report
}

/// FirstName and Phone must be non-empty after trimming. Notes are kept
/// verbatim, defaulting to an empty string.
pub fn validate_row(row: &RawRow) -> Result<NewContact, Vec<String>> {
    let first_name = required_field(row, FIRST_NAME_FIELD);
    let phone = required_field(row, PHONE_FIELD);

    match (first_name, phone) {
        (Some(first_name), Some(phone)) => Ok(NewContact {
            first_name,
            phone,
            notes: row.get(NOTES_FIELD).cloned().unwrap_or_default(),
        }),
        (first_name, phone) => {
            let mut errors = Vec::new();
            if first_name.is_none() {
                errors.push(format!("{} is required", FIRST_NAME_FIELD));
            }
            if phone.is_none() {
                errors.push(format!("{} is required", PHONE_FIELD));
            }
            Err(errors)
        }
    }
}

fn required_field(row: &RawRow, field: &str) -> Option<String> {
    row.get(field)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
