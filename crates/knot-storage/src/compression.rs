//! Zlib compression of encoded objects.
//!
//! Every object is compressed before it reaches disk and decompressed in
//! full on read; objects are small enough that streaming is not needed here.

use crate::{Result, StorageError};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Compression level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression
    None,
    /// Fast compression (lower ratio)
    Fast,
    /// Default compression (balanced)
    #[default]
    Default,
    /// Best compression (slower, higher ratio)
    Best,
}

impl CompressionLevel {
    /// Converts to flate2 compression level.
    pub fn to_flate2(self) -> flate2::Compression {
        match self {
            CompressionLevel::None => flate2::Compression::none(),
            CompressionLevel::Fast => flate2::Compression::fast(),
            CompressionLevel::Default => flate2::Compression::default(),
            CompressionLevel::Best => flate2::Compression::best(),
        }
    }
}

/// Symmetric zlib compressor.
///
/// Output is deterministic for a given level, which matters because the
/// default digest strategy hashes the compressed bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compressor {
    level: CompressionLevel,
}

impl Compressor {
    /// Creates a compressor with the given level.
    pub fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    /// Returns the configured level.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compresses `data` into a complete zlib stream.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level.to_flate2());
        encoder
            .write_all(data)
            .map_err(|e| StorageError::CompressionFailure(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| StorageError::CompressionFailure(e.to_string()))
    }

    /// Decompresses a zlib stream, draining it fully into memory.
    ///
    /// `id` is only used to label the error.
    pub fn decompress(&self, id: &str, compressed: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(compressed);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| StorageError::CorruptObject {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(decompressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_level_default() {
        assert_eq!(CompressionLevel::default(), CompressionLevel::Default);
    }

    #[test]
    fn test_compress_roundtrip_all_levels() {
        let data = b"blob 13\0Hello, World!".repeat(20);
        for level in [
            CompressionLevel::None,
            CompressionLevel::Fast,
            CompressionLevel::Default,
            CompressionLevel::Best,
        ] {
            let compressor = Compressor::new(level);
            let compressed = compressor.compress(&data).unwrap();
            assert_eq!(compressor.decompress("test", &compressed).unwrap(), data);
        }
    }

    #[test]
    fn test_compress_is_deterministic() {
        let compressor = Compressor::default();
        let a = compressor.compress(b"same input").unwrap();
        let b = compressor.compress(b"same input").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_compress_empty() {
        let compressor = Compressor::default();
        let compressed = compressor.compress(b"").unwrap();
        assert!(!compressed.is_empty());
        assert!(compressor.decompress("empty", &compressed).unwrap().is_empty());
    }

    #[test]
    fn test_decompress_garbage() {
        let compressor = Compressor::default();
        let result = compressor.decompress("deadbeef", b"definitely not zlib");
        match result {
            Err(StorageError::CorruptObject { id, .. }) => assert_eq!(id, "deadbeef"),
            other => panic!("expected CorruptObject, got {other:?}"),
        }
    }

    #[test]
    fn test_decompress_truncated_stream() {
        let compressor = Compressor::default();
        let compressed = compressor.compress(&[7u8; 4096]).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        assert!(compressor.decompress("half", truncated).is_err());
    }

    #[test]
    fn test_level_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: CompressionLevel,
        }
        let parsed: Wrapper = toml::from_str("level = \"best\"").unwrap();
        assert_eq!(parsed.level, CompressionLevel::Best);
    }
}
