//! Error types for the editor core
//!
//! Only `EditorError` ever reaches a caller. `FetchError` and `MalformedMarkup`
//! are recovered where they occur (placeholder image, degraded parse) and are
//! surfaced through callbacks and parse reports instead.

use crate::models::AttachmentId;
use thiserror::Error;

/// Errors returned by document and editor operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// Out-of-bounds selection, or a boundary inside a surrogate pair.
    /// Callers passing these have a bug; nothing recovers from it at runtime.
    #[error("invalid range {start}+{length} for document of length {len}")]
    InvalidRange {
        start: usize,
        length: usize,
        len: usize,
    },

    #[error("unknown formatting identifier: {0}")]
    UnknownIdentifier(String),

    #[error("attachment {0} not found")]
    UnknownAttachment(AttachmentId),

    #[error("renderers cannot be registered after the first layout pass")]
    RegistryFrozen,

    #[error("editor is read-only")]
    ReadOnly,

    #[error("not available while editing HTML source")]
    SourceMode,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Attachment image fetch/decode failure
///
/// Never propagated to the caller of an image request: the pipeline swaps in
/// the broken-image placeholder and fires the failure callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("no image fetcher configured for {0}")]
    NoFetcher(String),

    #[error("no background spawner available")]
    NoSpawner,
}

/// A recovered HTML parse anomaly
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed markup at byte {position}: {message}")]
pub struct MalformedMarkup {
    pub position: usize,
    pub message: String,
}
