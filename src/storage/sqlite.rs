//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the LinkStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{LinkStore, StoreError, StoreResult};
use crate::storage::LinkRecord;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Maps SQLite constraint violations (the UNIQUE index on server_id) to
/// the dedicated duplicate error
fn map_save_error(error: rusqlite::Error) -> StoreError {
    match &error {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::DuplicateServerId
        }
        _ => StoreError::PersistenceFailed(error),
    }
}

impl LinkStore for SqliteStore {
    fn save(&mut self, record: &LinkRecord) -> StoreResult<()> {
        let existing_by_id: Option<String> = self
            .conn
            .query_row(
                "SELECT server_id FROM links WHERE id = ?1",
                params![record.id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        // Re-saving with a known id updates in place
        if existing_by_id.is_some() {
            self.conn
                .execute(
                    "UPDATE links SET server_id = ?1 WHERE id = ?2",
                    params![record.server_id, record.id.to_string()],
                )
                .map_err(map_save_error)?;
            return Ok(());
        }

        if self.fetch_by_server_id(&record.server_id)?.is_some() {
            return Err(StoreError::DuplicateServerId);
        }

        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO links (id, server_id, created_at) VALUES (?1, ?2, ?3)",
                params![record.id.to_string(), record.server_id, now],
            )
            .map_err(map_save_error)?;

        Ok(())
    }

    fn load_all(&self) -> StoreResult<Vec<LinkRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, server_id FROM links ORDER BY created_at, server_id")?;

        let records = stmt
            .query_map([], |row| {
                let id_text: String = row.get(0)?;
                let id = Uuid::parse_str(&id_text).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(LinkRecord {
                    id,
                    server_id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn delete(&mut self, server_id: &str) -> StoreResult<()> {
        let affected = self.conn.execute(
            "DELETE FROM links WHERE server_id = ?1",
            params![server_id],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    fn fetch_by_server_id(&self, server_id: &str) -> StoreResult<Option<LinkRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, server_id FROM links WHERE server_id = ?1",
                params![server_id],
                |row| {
                    let id_text: String = row.get(0)?;
                    let id = Uuid::parse_str(&id_text).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    Ok(LinkRecord {
                        id,
                        server_id: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }
}
