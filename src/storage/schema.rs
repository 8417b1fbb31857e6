//! Database schema definitions.

use rusqlite::{Connection, OptionalExtension, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the issues database.
pub const SCHEMA_SQL: &str = r"
    -- Issues table
    -- seq preserves insertion order; id is the client-visible identifier.
    CREATE TABLE IF NOT EXISTS issues (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        project TEXT NOT NULL,
        issue_title TEXT NOT NULL,
        issue_text TEXT NOT NULL,
        created_by TEXT NOT NULL,
        assigned_to TEXT NOT NULL DEFAULT '',
        status_text TEXT NOT NULL DEFAULT '',
        open INTEGER NOT NULL DEFAULT 1,
        created_on TEXT NOT NULL,
        updated_on TEXT NOT NULL,
        CHECK (length(id) = 24),
        CHECK (length(project) >= 1),
        CHECK (length(issue_title) >= 1),
        CHECK (length(issue_text) >= 1),
        CHECK (length(created_by) >= 1),
        CHECK (open IN (0, 1)),
        CHECK (created_on <= updated_on)
    );

    CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project, seq);
    CREATE INDEX IF NOT EXISTS idx_issues_created_on ON issues(created_on);
    CREATE INDEX IF NOT EXISTS idx_issues_updated_on ON issues(updated_on);

    -- id, project and created_on are set once at insert.
    CREATE TRIGGER IF NOT EXISTS issues_immutable_columns
    BEFORE UPDATE OF id, project, created_on ON issues
    WHEN NEW.id IS NOT OLD.id
      OR NEW.project IS NOT OLD.project
      OR NEW.created_on IS NOT OLD.created_on
    BEGIN
        SELECT RAISE(ABORT, 'id, project and created_on are immutable');
    END;

    -- Metadata
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Apply the schema to the database.
///
/// Idempotent: every statement uses `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    record_schema_version(conn)?;

    // Set journal mode to WAL for concurrency
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}

/// Stored schema version, if one was recorded.
///
/// # Errors
///
/// Returns an error if the metadata table cannot be read.
pub fn schema_version(conn: &Connection) -> Result<Option<i32>> {
    conn.query_row(
        "SELECT value FROM metadata WHERE key = 'schema_version'",
        [],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map(|value| value.and_then(|v| v.parse().ok()))
}

fn record_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', ?)",
        [CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}
