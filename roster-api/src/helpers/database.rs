use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ApiConfig;
use crate::database::Database;

/// Returns the path to the roster database
///
/// A `[database] path` in the config wins. Otherwise the file lives in the
/// platform data directory:
///
/// - **macOS**: `~/Library/Application Support/roster/db.sqlite3`
/// - **Linux**: `~/.local/share/roster/db.sqlite3`
/// - **Windows**: `%LOCALAPPDATA%\roster\db.sqlite3`
pub fn get_db_path(config: &ApiConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = config.database_path() {
        return Ok(path);
    }

    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("roster").join("db.sqlite3"))
}

/// Opens the database, creating and migrating it if needed. Existing data is kept.
pub fn initialize_database(config: &ApiConfig) -> anyhow::Result<Arc<Database>> {
    let db_path = get_db_path(config)?;
    let db = Database::new(&db_path)?;
    tracing::info!("Database initialized at: {}", db_path.display());
    Ok(Arc::new(db))
}
