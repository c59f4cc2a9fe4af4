//! Side-band demultiplexing of upload-pack responses.
//!
//! With `side-band-64k` the server wraps its output in pkt-lines whose first
//! byte names a channel: 1 carries pack data, 2 progress text, 3 a fatal
//! error. Acknowledgement lines (`NAK`, `ACK ...`) precede the banded data.

use crate::pktline::PktLineReader;
use crate::{GitError, Result};

/// Pack data channel.
pub const CHANNEL_DATA: u8 = 1;
/// Progress channel.
pub const CHANNEL_PROGRESS: u8 = 2;
/// Fatal error channel.
pub const CHANNEL_ERROR: u8 = 3;

/// Extracts channel 1 data from a side-band framed response.
///
/// Returns `Ok(None)` when the body is not side-band framed, in which case
/// the caller should use it unchanged.
pub fn demultiplex(body: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut reader = PktLineReader::new(body);
    let mut data = Vec::new();
    let mut banded = false;

    loop {
        let pkt = match reader.read() {
            Ok(Some(pkt)) => pkt,
            Ok(None) => break,
            // A raw pack after the acknowledgements is not pkt-line framed.
            Err(_) if !banded => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(payload) = pkt.data() else {
            continue;
        };

        match payload.split_first() {
            Some((&CHANNEL_DATA, rest)) => {
                banded = true;
                data.extend_from_slice(rest);
            }
            Some((&CHANNEL_PROGRESS, rest)) => {
                banded = true;
                let text = String::from_utf8_lossy(rest);
                tracing::warn!(progress = %text.trim_end(), "remote");
            }
            Some((&CHANNEL_ERROR, rest)) => {
                let text = String::from_utf8_lossy(rest);
                return Err(GitError::Remote(text.trim_end().to_string()));
            }
            _ => {
                let text = String::from_utf8_lossy(payload);
                tracing::debug!(line = %text.trim_end(), "upload-pack status");
            }
        }
    }

    Ok(banded.then_some(data))
}
