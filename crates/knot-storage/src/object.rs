//! Object identifiers, kinds, and the canonical `<kind> <len>\0<payload>` codec.

use crate::{Result, StorageError};
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

/// A 20-byte SHA-1 object identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// Length of a raw identifier in bytes.
    pub const LEN: usize = 20;

    /// Creates an ObjectId from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an ObjectId from a slice that must be exactly 20 bytes long.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; 20] = slice.try_into().map_err(|_| {
            StorageError::InvalidObjectId(format!("expected 20 bytes, got {}", slice.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Creates an ObjectId from a hex string.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != 40 {
            return Err(StorageError::InvalidObjectId(format!(
                "expected 40 hex characters, got {} in {:?}",
                hex.len(),
                hex
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex, &mut bytes)
            .map_err(|e| StorageError::InvalidObjectId(format!("{hex:?}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for ObjectId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// File content.
    Blob,
    /// Directory listing.
    Tree,
    /// Commit object.
    Commit,
}

impl ObjectType {
    /// Returns the string representation used in object headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// Parses an object type from a header string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            _ => Err(StorageError::InvalidFormat(format!(
                "unknown object type: {s:?}"
            ))),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An object kind together with its raw (unencoded, uncompressed) payload.
///
/// Identity is not carried here: the digest depends on how the store is
/// configured, so it is assigned by [`crate::ObjectStore`] on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitObject {
    /// The type of object.
    pub object_type: ObjectType,
    /// The raw object payload.
    pub data: Bytes,
}

impl GitObject {
    /// Creates a new object.
    pub fn new(object_type: ObjectType, data: impl Into<Bytes>) -> Self {
        Self {
            object_type,
            data: data.into(),
        }
    }

    /// Creates a blob object from file content.
    pub fn blob(content: impl Into<Bytes>) -> Self {
        Self::new(ObjectType::Blob, content)
    }

    /// Returns the size of the payload.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Serializes to `"<kind> <len>\0" + payload`.
    pub fn encode(&self) -> Vec<u8> {
        let header = format!("{} {}\0", self.object_type.as_str(), self.data.len());
        let mut encoded = Vec::with_capacity(header.len() + self.data.len());
        encoded.extend_from_slice(header.as_bytes());
        encoded.extend_from_slice(&self.data);
        encoded
    }

    /// Parses the canonical serialized form.
    ///
    /// The declared length must match the number of bytes following the
    /// header exactly.
    pub fn decode(encoded: &[u8]) -> Result<Self> {
        let null_pos = encoded.iter().position(|&b| b == 0).ok_or_else(|| {
            StorageError::InvalidFormat("missing null byte after header".to_string())
        })?;

        let header = std::str::from_utf8(&encoded[..null_pos])
            .map_err(|_| StorageError::InvalidFormat("header is not UTF-8".to_string()))?;
        let (kind, size) = header
            .split_once(' ')
            .ok_or_else(|| StorageError::InvalidFormat(format!("invalid header: {header:?}")))?;

        let object_type = ObjectType::parse(kind)?;
        if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StorageError::InvalidFormat(format!("invalid size: {size:?}")));
        }
        let declared: usize = size
            .parse()
            .map_err(|_| StorageError::InvalidFormat(format!("invalid size: {size:?}")))?;

        let payload = &encoded[null_pos + 1..];
        if declared != payload.len() {
            return Err(StorageError::InvalidFormat(format!(
                "{kind} declares {declared} bytes but carries {}",
                payload.len()
            )));
        }

        Ok(Self::new(object_type, Bytes::copy_from_slice(payload)))
    }
}
