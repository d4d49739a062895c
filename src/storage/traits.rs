//! Storage trait and error types

use crate::storage::LinkRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate server ID")]
    DuplicateServerId,

    #[error("link not found")]
    NotFound,

    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for link record storage backends
///
/// Implementations must keep `server_id` unique across all stored records.
/// Callers may invoke the store from concurrent tasks; mutations are
/// serialized by wrapping the store in a mutex, never by the pipeline.
pub trait LinkStore {
    /// Saves a record, updating in place when a record with the same `id`
    /// already exists
    ///
    /// # Errors
    ///
    /// * `DuplicateServerId` - another record (different `id`) already holds
    ///   this `server_id`
    /// * `PersistenceFailed` - the underlying database failed
    fn save(&mut self, record: &LinkRecord) -> StoreResult<()>;

    /// Loads all stored records
    fn load_all(&self) -> StoreResult<Vec<LinkRecord>>;

    /// Deletes the record holding the given `server_id`
    ///
    /// # Errors
    ///
    /// * `NotFound` - no record holds this `server_id`
    /// * `PersistenceFailed` - the underlying database failed
    fn delete(&mut self, server_id: &str) -> StoreResult<()>;

    /// Looks up a record by its `server_id`
    fn fetch_by_server_id(&self, server_id: &str) -> StoreResult<Option<LinkRecord>>;
}
