//! Upload-pack request construction.

use crate::pktline::PktLineWriter;
use crate::Result;
use knot_storage::ObjectId;

/// Capabilities sent with every want line.
pub const DEFAULT_CAPABILITIES: &str = concat!(
    "multi_ack_detailed side-band-64k thin-pack no-progress include-tag ofs-delta agent=knot/",
    env!("CARGO_PKG_VERSION")
);

/// A full-fetch request: one want, no haves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Commit to fetch.
    pub want: ObjectId,
    /// Space-separated capability list.
    pub capabilities: String,
}

impl UploadRequest {
    /// Creates a request for `want` with the default capabilities.
    pub fn new(want: ObjectId) -> Self {
        Self {
            want,
            capabilities: DEFAULT_CAPABILITIES.to_string(),
        }
    }

    /// Replaces the capability list.
    pub fn with_capabilities(mut self, capabilities: impl Into<String>) -> Self {
        self.capabilities = capabilities.into();
        self
    }

    /// Encodes the request body: want line, flush, `done`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = PktLineWriter::new(Vec::new());
        let want = if self.capabilities.is_empty() {
            format!("want {}", self.want)
        } else {
            format!("want {} {}", self.want, self.capabilities)
        };
        writer.write_line(&want)?;
        writer.flush_pkt()?;
        writer.write_line("done")?;
        Ok(writer.into_inner())
    }
}
