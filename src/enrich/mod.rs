//! Enrichment module
//!
//! This module turns the set of locally stored link records into a live
//! stream of progressively-enriched snapshots. Each record is resolved
//! against the shortening service, then its title and favicon are fetched
//! concurrently; the consumer sees a partial snapshot as soon as the target
//! URL is known and a final snapshot once the metadata settles.

mod pipeline;

pub use pipeline::EnrichmentPipeline;

use crate::storage::{LinkRecord, StoreError};
use image::DynamicImage;
use thiserror::Error;

/// Canonical placeholder icon name used when no favicon can be decoded
pub const PLACEHOLDER_ICON: &str = "globe";

/// Errors terminating the enrichment stream
///
/// Per-record failures never surface here: the stream only fails when the
/// initial bulk load from the store fails.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Other(String),
}

/// Icon resolved for a link
#[derive(Debug, Clone)]
pub enum LinkIcon {
    /// A named placeholder glyph (see [`PLACEHOLDER_ICON`])
    Placeholder(&'static str),
    /// A favicon decoded from fetched bytes
    Image(DynamicImage),
}

impl LinkIcon {
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// A transient, display-ready view of a stored link
///
/// Produced fresh per enrichment pass and never persisted. A partial
/// snapshot carries no title or icon; a final snapshot always carries both.
#[derive(Debug, Clone)]
pub struct EnrichedLink {
    /// The stored record this snapshot describes
    pub record: LinkRecord,
    /// The target URL the alias resolves to
    pub url: String,
    /// Display title: the fetched page title, falling back to the URL
    pub title: Option<String>,
    /// Display icon: decoded favicon or placeholder
    pub icon: Option<LinkIcon>,
}

/// One emission of the enrichment stream
#[derive(Debug, Clone)]
pub enum Snapshot {
    /// Emitted as soon as the alias resolves: URL only, no metadata
    Partial(EnrichedLink),
    /// Emitted once title and icon have settled
    Final(EnrichedLink),
}

impl Snapshot {
    /// Borrows the enriched link inside either variant
    pub fn link(&self) -> &EnrichedLink {
        match self {
            Self::Partial(link) | Self::Final(link) => link,
        }
    }

    /// Consumes the snapshot, returning the enriched link
    pub fn into_link(self) -> EnrichedLink {
        match self {
            Self::Partial(link) | Self::Final(link) => link,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}
