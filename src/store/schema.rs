//! SQLite schema and store handle.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// The four collection tables. Column names follow the source API's casing
/// except for `Department.display_name`, which the readers standardized on.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS Department (
    department_id INTEGER PRIMARY KEY,
    display_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS Objects (
    department_id INTEGER NOT NULL,
    object_id INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS Art (
    object_id INTEGER PRIMARY KEY,
    isHighlight INTEGER,
    accessionYear TEXT,
    isPublicDomain INTEGER,
    primaryImage TEXT,
    objectName TEXT,
    title TEXT NOT NULL,
    culture TEXT,
    period TEXT,
    dynasty TEXT,
    reign TEXT,
    portfolio TEXT,
    artistAlphaSort TEXT,
    objectBeginDate TEXT,
    objectEndDate TEXT,
    medium TEXT,
    height REAL,
    width REAL,
    length REAL,
    creditLine TEXT,
    city TEXT,
    state TEXT,
    county TEXT,
    country TEXT,
    region TEXT,
    subregion TEXT,
    excavation TEXT,
    classification TEXT,
    isOnView INTEGER
);

CREATE TABLE IF NOT EXISTS Artists (
    artistWikidata_URL TEXT,
    artistName TEXT,
    artistAlphaSort TEXT PRIMARY KEY,
    artistNationality TEXT,
    artistBeginDate TEXT,
    artistEndDate TEXT
);
";

/// Handle to one collection store. The loader methods are the only write
/// path; readers get shared references.
pub struct CollectionStore {
    pub(crate) conn: Connection,
}

impl CollectionStore {
    /// Open or create a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open store: {}", path.display()))?;
        conn.execute_batch(SCHEMA)
            .context("failed to create collection tables")?;

        Ok(Self { conn })
    }

    /// In-memory store, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory store")?;
        conn.execute_batch(SCHEMA)
            .context("failed to create collection tables")?;
        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.db");
        let store = CollectionStore::open(&path).unwrap();

        let count: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('Department', 'Objects', 'Art', 'Artists')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.db");
        {
            let store = CollectionStore::open(&path).unwrap();
            store
                .conn
                .execute(
                    "INSERT INTO Department (department_id, display_name) VALUES (1, 'Test')",
                    [],
                )
                .unwrap();
        }

        let store = CollectionStore::open(&path).unwrap();
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM Department", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
