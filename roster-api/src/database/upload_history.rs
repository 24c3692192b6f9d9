use crate::database::AsyncDbConnection;
use anyhow::{bail, Result};
use rusqlite::{params, OptionalExtension};
use shared_types::{UploadAttempt, UploadStatus};

const UPLOAD_SELECT: &str = "SELECT id, file_name, file_size, record_count, uploaded_by, status,
        error_message, processing_time_ms, created_at, completed_at
     FROM upload_history";

fn row_to_upload(row: &rusqlite::Row<'_>) -> rusqlite::Result<UploadAttempt> {
    let status_str: String = row.get(5)?;
    Ok(UploadAttempt {
        id: row.get(0)?,
        file_name: row.get(1)?,
        file_size: row.get(2)?,
        record_count: row.get(3)?,
        uploaded_by: row.get(4)?,
        status: UploadStatus::parse(&status_str).unwrap_or(UploadStatus::Pending),
        error_message: row.get(6)?,
        processing_time_ms: row.get(7)?,
        created_at: row.get(8)?,
        completed_at: row.get(9)?,
    })
}

/// Opens a pending attempt and returns its id
pub async fn create(
    conn: AsyncDbConnection,
    file_name: &str,
    file_size: i64,
    uploaded_by: Option<&str>,
) -> Result<i64> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let id: i64 = conn.query_row(
        "INSERT INTO upload_history (file_name, file_size, record_count, uploaded_by, status, created_at)
         VALUES (?, ?, 0, ?, 'pending', ?)
         RETURNING id",
        params![file_name, file_size, uploaded_by, now],
        |row| row.get(0),
    )?;

    Ok(id)
}

/// Moves a pending attempt to its terminal status. An attempt is finalized
/// exactly once; finalizing again is an error.
pub async fn finalize(
    conn: AsyncDbConnection,
    id: i64,
    status: UploadStatus,
    record_count: i64,
    error_message: Option<&str>,
    processing_time_ms: i64,
) -> Result<()> {
    if status == UploadStatus::Pending {
        bail!("Upload {} cannot be finalized as pending", id);
    }

    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let changed = conn.execute(
        "UPDATE upload_history
         SET status = ?, record_count = ?, error_message = ?, processing_time_ms = ?, completed_at = ?
         WHERE id = ? AND status = 'pending'",
        params![
            status.as_str(),
            record_count,
            error_message,
            processing_time_ms,
            now,
            id
        ],
    )?;

    if changed == 0 {
        bail!("Upload {} is not pending", id);
    }

    Ok(())
}

pub async fn get_upload(conn: AsyncDbConnection, id: i64) -> Result<Option<UploadAttempt>> {
    let conn = conn.lock().await?;

    let upload = conn
        .query_row(&format!("{} WHERE id = ?", UPLOAD_SELECT), [id], row_to_upload)
        .optional()?;

    Ok(upload)
}

/// Most recent attempts first
pub async fn list_uploads(conn: AsyncDbConnection, limit: u32) -> Result<Vec<UploadAttempt>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY created_at DESC, id DESC LIMIT ?",
        UPLOAD_SELECT
    ))?;
    let uploads = stmt
        .query_map([limit], row_to_upload)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(uploads)
}
