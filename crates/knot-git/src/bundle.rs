//! Bundle header validation.
//!
//! A bundle starts with a 12-byte header: the `PACK` signature, a big-endian
//! version, and a big-endian object count. Entries are not decoded here.

use crate::{GitError, Result};
use bytes::Bytes;

/// Bundle signature.
pub const BUNDLE_SIGNATURE: &[u8; 4] = b"PACK";

/// The only supported bundle version.
pub const BUNDLE_VERSION: u32 = 2;

/// Size of the bundle header.
pub const HEADER_LEN: usize = 12;

/// A validated, undecoded bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    version: u32,
    object_count: u32,
    data: Bytes,
}

impl Bundle {
    /// Locates the bundle in a response body and validates its header.
    ///
    /// Anything before the signature is discarded. A body without a
    /// signature is validated from its first byte.
    pub fn locate(body: &[u8]) -> Result<Self> {
        let start = body
            .windows(BUNDLE_SIGNATURE.len())
            .position(|w| w == BUNDLE_SIGNATURE)
            .unwrap_or(0);
        if start > 0 {
            tracing::debug!(skipped = start, "discarded bytes before bundle");
        }
        Self::parse(Bytes::copy_from_slice(&body[start..]))
    }

    /// Validates a bundle that starts at the first byte of `data`.
    pub fn parse(data: Bytes) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(GitError::BundleTooShort { len: data.len() });
        }
        if &data[..4] != BUNDLE_SIGNATURE {
            return Err(GitError::InvalidBundleHeader(format!(
                "bad signature {}",
                hex::encode(&data[..4])
            )));
        }
        let version = be_u32(&data[4..8]);
        if version != BUNDLE_VERSION {
            return Err(GitError::InvalidBundleHeader(format!(
                "unsupported version {version} (header {})",
                hex::encode(&data[..HEADER_LEN])
            )));
        }
        let object_count = be_u32(&data[8..12]);

        Ok(Self {
            version,
            object_count,
            data,
        })
    }

    /// Returns the header version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the object count announced in the header.
    pub fn object_count(&self) -> u32 {
        self.object_count
    }

    /// Returns the full bundle, header included.
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    /// Returns the undecoded bytes after the header.
    pub fn entries(&self) -> Bytes {
        self.data.slice(HEADER_LEN..)
    }

    /// Returns the total bundle size.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the bundle holds nothing beyond its header.
    pub fn is_empty(&self) -> bool {
        self.data.len() == HEADER_LEN
    }
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: validation never panics on arbitrary bodies
        #[test]
        fn prop_locate_no_panic(data in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = Bundle::locate(&data);
        }

        /// Property: any count in a v2 header is reported unchanged
        #[test]
        fn prop_count_preserved(
            count in any::<u32>(),
            tail in prop::collection::vec(any::<u8>(), 0..32)
        ) {
            let mut data = BUNDLE_SIGNATURE.to_vec();
            data.extend_from_slice(&2u32.to_be_bytes());
            data.extend_from_slice(&count.to_be_bytes());
            data.extend_from_slice(&tail);
            let bundle = Bundle::locate(&data).unwrap();
            prop_assert_eq!(bundle.object_count(), count);
        }
    }
}
