//! Storage module for persisting link records
//!
//! This module handles the local record store: a SQLite table of
//! `(id, server_id)` pairs behind the [`LinkStore`] trait. The trait keeps
//! the pipeline and CLI independent of the concrete backend.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{LinkStore, StoreError, StoreResult};

use crate::LinkError;
use std::path::Path;
use uuid::Uuid;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> Result<SqliteStore, LinkError> {
    Ok(SqliteStore::new(path)?)
}

/// A locally persisted pointer to a remote alias.
///
/// Identity is the `(id, server_id)` pair; `server_id` is unique across all
/// stored records. The record carries no display data: titles and icons are
/// recomputed per enrichment pass and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkRecord {
    /// Opaque local identifier
    pub id: Uuid,
    /// Alias assigned by the remote shortening service
    pub server_id: String,
}

impl LinkRecord {
    /// Creates a record with a freshly generated local identifier
    pub fn new(server_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id: server_id.into(),
        }
    }
}
