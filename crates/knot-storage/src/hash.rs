//! Digest computation.

use crate::ObjectId;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Which bytes an object's identity is derived from.
///
/// `Compressed` hashes the zlib output written to disk. Two stores with
/// different compression levels will therefore disagree on identities, and
/// neither agrees with a peer that hashes the canonical encoding. Use
/// `Canonical` when digests must match such a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestStrategy {
    /// SHA-1 of the compressed on-disk bytes.
    #[default]
    Compressed,
    /// SHA-1 of `header + payload` before compression.
    Canonical,
}

impl DigestStrategy {
    /// Computes the identity of an object given both of its forms.
    pub fn digest(self, encoded: &[u8], compressed: &[u8]) -> ObjectId {
        match self {
            Self::Compressed => sha1_digest(compressed),
            Self::Canonical => sha1_digest(encoded),
        }
    }
}

/// Computes the SHA-1 of `data`.
pub fn sha1_digest(data: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&result);
    ObjectId::from_bytes(bytes)
}
