//! Schema migrations for the Shelfmark SQLite database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// Safe to call on every startup.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Enable WAL and foreign keys (always, not versioned)
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Initial schema: folders, bookmarks, favicons")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Add position and is_open to pre-ordering databases")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: Create all core tables.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS folders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            parent_id INTEGER,
            is_open BOOLEAN NOT NULL DEFAULT 0,
            position INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (parent_id) REFERENCES folders(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS bookmarks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            folder_id INTEGER,
            position INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (folder_id) REFERENCES folders(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS favicons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_type TEXT NOT NULL,
            favicon BLOB,
            bookmark_id INTEGER,
            FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id) ON DELETE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS bookmark_idx ON favicons(bookmark_id);
        ",
    )
}

/// V2: Databases created before ordering existed lack `position` (and possibly
/// `is_open`). Add the columns and renumber every sibling group densely.
///
/// Older databases that do carry `position` still hold gaps and duplicates
/// (positions were `COUNT(*)` at insert time and never compacted on delete),
/// so the renumbering runs for every table regardless.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    if !has_column(conn, "folders", "is_open") {
        conn.execute_batch("ALTER TABLE folders ADD COLUMN is_open BOOLEAN NOT NULL DEFAULT 0;")?;
    }
    for (table, parent_column) in [("folders", "parent_id"), ("bookmarks", "folder_id")] {
        if !has_column(conn, table, "position") {
            conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN position INTEGER;"))?;
        }
        backfill_positions(conn, table, parent_column)?;
    }
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_folders_parent ON folders(parent_id, position);
         CREATE INDEX IF NOT EXISTS idx_bookmarks_folder ON bookmarks(folder_id, position);",
    )
}

fn has_column(conn: &Connection, table: &str, column: &str) -> bool {
    conn.prepare(&format!("SELECT {column} FROM {table} LIMIT 0")).is_ok()
}

/// Renumbers every sibling group as `0..n-1`. Rows that already carry a position
/// keep their relative order; rows without one go last, by id.
fn backfill_positions(conn: &Connection, table: &str, parent_column: &str) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&format!(
        "UPDATE {table} SET position = (
             SELECT ranked.rn FROM (
                 SELECT id, ROW_NUMBER() OVER (
                     PARTITION BY {parent_column}
                     ORDER BY COALESCE(position, 9223372036854775807), id
                 ) - 1 AS rn
                 FROM {table}
             ) AS ranked
             WHERE ranked.id = {table}.id
         );"
    ))
}
