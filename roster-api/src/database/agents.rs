use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use shared_types::{Agent, AgentStatus};

const AGENT_SELECT: &str =
    "SELECT id, name, email, mobile, status, contact_count, created_at, updated_at FROM agents";

fn row_to_agent(row: &rusqlite::Row<'_>) -> rusqlite::Result<Agent> {
    let status_str: String = row.get(4)?;
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        mobile: row.get(3)?,
        status: AgentStatus::parse(&status_str).unwrap_or_default(),
        contact_count: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Emails are stored trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn insert_agent(
    conn: AsyncDbConnection,
    name: &str,
    email: &str,
    mobile: &str,
) -> Result<Agent> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let id: i64 = conn.query_row(
        "INSERT INTO agents (name, email, mobile, status, contact_count, created_at, updated_at)
         VALUES (?, ?, ?, 'active', 0, ?, ?)
         RETURNING id",
        params![name.trim(), normalize_email(email), mobile.trim(), now, now],
        |row| row.get(0),
    )?;

    let agent = conn.query_row(&format!("{} WHERE id = ?", AGENT_SELECT), [id], row_to_agent)?;

    Ok(agent)
}

pub async fn get_agent(conn: AsyncDbConnection, id: i64) -> Result<Option<Agent>> {
    let conn = conn.lock().await?;

    let agent = conn
        .query_row(&format!("{} WHERE id = ?", AGENT_SELECT), [id], row_to_agent)
        .optional()?;

    Ok(agent)
}

/// True when another agent already uses `email`
pub async fn email_taken(
    conn: AsyncDbConnection,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let conn = conn.lock().await?;

    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM agents WHERE email = ? AND id != COALESCE(?, -1)",
        params![normalize_email(email), exclude_id],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

/// Every agent, newest first
pub async fn list_agents(conn: AsyncDbConnection) -> Result<Vec<Agent>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!("{} ORDER BY created_at DESC, id DESC", AGENT_SELECT))?;
    let agents = stmt
        .query_map([], row_to_agent)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(agents)
}

/// Active agents in id order. Distribution depends on this order being stable.
pub async fn list_active(conn: AsyncDbConnection) -> Result<Vec<Agent>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!(
        "{} WHERE status = 'active' ORDER BY id",
        AGENT_SELECT
    ))?;
    let agents = stmt
        .query_map([], row_to_agent)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(agents)
}

pub async fn list_agent_ids(conn: AsyncDbConnection) -> Result<Vec<i64>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare("SELECT id FROM agents ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;

    Ok(ids)
}

pub async fn update_agent(
    conn: AsyncDbConnection,
    id: i64,
    name: &str,
    email: &str,
    mobile: &str,
    status: AgentStatus,
) -> Result<bool> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let changed = conn.execute(
        "UPDATE agents SET name = ?, email = ?, mobile = ?, status = ?, updated_at = ? WHERE id = ?",
        params![
            name.trim(),
            normalize_email(email),
            mobile.trim(),
            status.as_str(),
            now,
            id
        ],
    )?;

    Ok(changed > 0)
}

/// Nulls every contact reference to the agent and removes it, in one
/// transaction. Returns false when the agent does not exist.
pub async fn delete_agent(conn: AsyncDbConnection, id: i64) -> Result<bool> {
    let mut conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE contacts SET assigned_agent_id = NULL, updated_at = ? WHERE assigned_agent_id = ?",
        params![now, id],
    )?;
    let changed = tx.execute("DELETE FROM agents WHERE id = ?", [id])?;
    tx.commit()?;

    Ok(changed > 0)
}

pub async fn set_contact_count(conn: AsyncDbConnection, id: i64, count: i64) -> Result<()> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "UPDATE agents SET contact_count = ?, updated_at = ? WHERE id = ?",
        params![count, now, id],
    )?;

    Ok(())
}

/// (total, active, inactive)
pub async fn count_by_status(conn: AsyncDbConnection) -> Result<(u64, u64, u64)> {
    let conn = conn.lock().await?;

    let (total, active): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0)
         FROM agents",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok((total as u64, active as u64, (total - active) as u64))
}
