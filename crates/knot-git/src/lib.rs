//! Smart HTTP negotiation for Knot.
//!
//! This crate discovers a remote's refs over the pkt-line protocol,
//! requests a full bundle for the default branch, and validates the
//! bundle header. Bundle entries are handed back undecoded.

mod advertisement;
mod bundle;
mod client;
mod error;
mod pktline;
mod request;
mod sideband;
mod transport;

pub use advertisement::{RefAdvertisement, BRANCH_PREFIX};
pub use bundle::{Bundle, BUNDLE_SIGNATURE, BUNDLE_VERSION};
pub use client::{ClientConfig, Negotiation, NegotiationState, RemoteClient, UPLOAD_SERVICE};
pub use error::GitError;
pub use pktline::{parse as parse_pkt_lines, PktLine, PktLineReader, PktLineWriter, MAX_PKT_LEN};
pub use request::{UploadRequest, DEFAULT_CAPABILITIES};
pub use sideband::demultiplex;
pub use transport::{HttpResponse, HttpTransport, Transport};

/// Result type for git protocol operations.
pub type Result<T> = std::result::Result<T, GitError>;
