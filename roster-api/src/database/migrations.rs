use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS agents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR NOT NULL,
            email VARCHAR NOT NULL UNIQUE,
            mobile VARCHAR NOT NULL,
            status VARCHAR NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
            contact_count BIGINT NOT NULL DEFAULT 0,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    // assigned_agent_id is a lookup key only; deleting an agent nulls it.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name VARCHAR NOT NULL,
            phone VARCHAR NOT NULL,
            notes VARCHAR NOT NULL DEFAULT '',
            status VARCHAR NOT NULL DEFAULT 'new' CHECK (status IN ('new', 'contacted', 'converted', 'rejected')),
            assigned_agent_id INTEGER REFERENCES agents (id) ON DELETE SET NULL,
            last_contacted_at BIGINT,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS upload_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name VARCHAR NOT NULL,
            file_size BIGINT NOT NULL,
            record_count BIGINT NOT NULL DEFAULT 0,
            uploaded_by VARCHAR,
            status VARCHAR NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'success', 'failed')),
            error_message VARCHAR,
            processing_time_ms BIGINT,
            created_at BIGINT NOT NULL,
            completed_at BIGINT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_assigned_agent
            ON contacts(assigned_agent_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_status
            ON contacts(status)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_upload_history_created
            ON upload_history(created_at)",
        [],
    )?;

    Ok(())
}
