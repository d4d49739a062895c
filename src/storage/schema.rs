//! Database schema definitions
//!
//! This module contains the SQL schema for the linkstash database.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Locally stored links: a local identifier paired with a remote alias
CREATE TABLE IF NOT EXISTS links (
    id TEXT PRIMARY KEY,
    server_id TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// Safe to call on an already-initialized database: all statements use
/// IF NOT EXISTS.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
