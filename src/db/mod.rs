// Database layer: reference SQLite query layer for the policy engine.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever VEIL_DB_PATH points
// (defaults to ./veil.db). Listing queries alias their tables the way the
// rules expect (u/ui, p/pi, c/ci).

pub mod queries;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database and create the schema.
///
/// Called by `veil init` and by tests that want a file-backed database.
pub fn initialize(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("veil-init-{}", std::process::id()));
        let path = dir.join("nested").join("veil.db");
        let path_str = path.to_string_lossy().to_string();

        let conn = initialize(&path_str).unwrap();
        assert!(path.exists());
        assert_eq!(schema::table_count(&conn).unwrap(), 9);

        // Running it again on an existing file is fine
        drop(conn);
        initialize(&path_str).unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
