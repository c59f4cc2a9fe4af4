//! Storage error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Encoded object bytes do not follow the `<kind> <len>\0<payload>` layout.
    #[error("invalid object format: {0}")]
    InvalidFormat(String),

    /// A tree entry ended before its mode, name, or digest was complete.
    #[error("truncated tree entry at byte {offset}: {reason}")]
    TruncatedEntry {
        /// Offset into the tree payload where the entry broke off.
        offset: usize,
        /// What was missing.
        reason: &'static str,
    },

    /// The compressor could not produce output.
    #[error("compression failed: {0}")]
    CompressionFailure(String),

    /// Stored bytes are not a valid compressed stream.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject {
        /// Digest of the unreadable object, when known.
        id: String,
        /// Decompressor diagnostic.
        reason: String,
    },

    /// No object is stored under the digest.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// A digest was not 40 hex characters (or 20 raw bytes).
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    /// A reference could not be read or resolved.
    #[error("invalid reference: {0}")]
    InvalidRef(String),

    /// The directory has no metadata directory.
    #[error("not a repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// The repository configuration file could not be parsed or written.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
