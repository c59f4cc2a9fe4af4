//! Git protocol error types.

use thiserror::Error;

/// Errors that can occur during negotiation with a remote.
#[derive(Debug, Error)]
pub enum GitError {
    /// Invalid pkt-line format.
    #[error("invalid pkt-line: {0}")]
    InvalidPktLine(String),

    /// The server did not answer with a smart-protocol advertisement.
    #[error("dumb protocol not supported (content type {content_type:?})")]
    ProtocolMismatch {
        /// Content type the server declared.
        content_type: String,
    },

    /// A ref advertisement line could not be parsed.
    #[error("invalid ref advertisement: {0}")]
    InvalidAdvertisement(String),

    /// The advertisement contained no HEAD line.
    #[error("no HEAD commit found in refs")]
    NoHeadFound,

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    RemoteRejected {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The server reported a fatal error on the side-band error channel.
    #[error("remote error: {0}")]
    Remote(String),

    /// Fewer than 12 bytes followed the bundle marker.
    #[error("bundle too short: {len} bytes")]
    BundleTooShort {
        /// Bytes available from the marker onward.
        len: usize,
    },

    /// The bundle header had the wrong marker or an unsupported version.
    #[error("invalid bundle header: {0}")]
    InvalidBundleHeader(String),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
