// Persistence layer — strike counters and the moderation audit log.
//
// Two backends sit behind the Database trait: a whole-document JSON file
// (the `{actions, users, groups}` layout, readable by hand) and SQLite via
// rusqlite with the "bundled" feature. The path's extension picks one:
// `*.json` uses the document store, anything else uses SQLite.

pub mod json;
pub mod models;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use traits::Database;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
#[cfg(feature = "sqlite")]
use anyhow::Context;
use tracing::info;

/// Whether `path` selects the JSON document backend.
pub fn is_json_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Open (or create) the store at `path`, choosing the backend by extension.
pub async fn open(path: &str) -> Result<Arc<dyn Database>> {
    if is_json_path(path) {
        info!(path, "Using JSON document store");
        return Ok(Arc::new(json::JsonDatabase::open(path).await?));
    }

    open_fallback(path)
}

#[cfg(feature = "sqlite")]
fn open_fallback(path: &str) -> Result<Arc<dyn Database>> {
    info!(path, "Using SQLite store");
    open_sqlite(path)
}

#[cfg(not(feature = "sqlite"))]
fn open_fallback(path: &str) -> Result<Arc<dyn Database>> {
    anyhow::bail!(
        "{path} is not a .json file and the 'sqlite' feature is not compiled in.\n\
         Use a .json path or rebuild with: cargo build --features sqlite"
    )
}

/// Open (or create) a SQLite database, run migrations, and wrap it.
#[cfg(feature = "sqlite")]
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    Ok(Arc::new(initialize_sqlite(db_path)?))
}

/// Create parent directories, open the file, and create tables.
#[cfg(feature = "sqlite")]
pub fn initialize_sqlite(db_path: &str) -> Result<sqlite::SqliteDatabase> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = rusqlite::Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    // WAL lets the dashboard process read while the bot writes
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(sqlite::SqliteDatabase::new(conn))
}
