//! Filesystem object store.
//!
//! Objects live under `<objects>/<first two hex chars>/<remaining 38>` as
//! compressed `header + payload` bytes. Files are written once and never
//! modified; a second write of the same digest is skipped.

use crate::config::CoreConfig;
use crate::{
    Commit, CompressionLevel, Compressor, DigestStrategy, GitObject, ObjectId, Result,
    StorageError, Tree,
};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Content-addressed object store rooted at an explicit directory.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
    compressor: Compressor,
    strategy: DigestStrategy,
}

impl ObjectStore {
    /// Opens a store rooted at `root` with default compression and digest
    /// settings. The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, &CoreConfig::default())
    }

    /// Opens a store with explicit settings.
    pub fn with_config(root: impl Into<PathBuf>, config: &CoreConfig) -> Self {
        Self {
            root: root.into(),
            compressor: Compressor::new(config.compression),
            strategy: config.digest,
        }
    }

    /// Returns the objects directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configured compression level.
    pub fn compression(&self) -> CompressionLevel {
        self.compressor.level()
    }

    /// Returns the configured digest strategy.
    pub fn digest_strategy(&self) -> DigestStrategy {
        self.strategy
    }

    /// Path of the file holding `id`.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    /// Checks if an object exists.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).is_file()
    }

    /// Stores compressed bytes under `id`.
    ///
    /// The bytes are written to a temporary file in the target directory and
    /// renamed into place, so a concurrent reader sees either nothing or the
    /// complete object. Writing an id that already exists does nothing.
    pub fn put(&self, id: &ObjectId, compressed: &[u8]) -> Result<()> {
        let path = self.object_path(id);
        if path.is_file() {
            tracing::debug!(id = %id, "Object already stored");
            return Ok(());
        }

        let dir = path
            .parent()
            .ok_or_else(|| StorageError::InvalidObjectId(id.to_hex()))?;
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(compressed)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;

        tracing::debug!(id = %id, bytes = compressed.len(), "Stored object");
        Ok(())
    }

    /// Reads the compressed bytes stored under `id`.
    pub fn get(&self, id: &ObjectId) -> Result<Vec<u8>> {
        match std::fs::read(self.object_path(id)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound(id.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Encodes and compresses an object, returning its id and the bytes that
    /// would be stored, without touching disk.
    pub fn hash_object(&self, object: &GitObject) -> Result<(ObjectId, Vec<u8>)> {
        let encoded = object.encode();
        let compressed = self.compressor.compress(&encoded)?;
        let id = self.strategy.digest(&encoded, &compressed);
        Ok((id, compressed))
    }

    /// Encodes, compresses, and stores an object.
    pub fn write_object(&self, object: &GitObject) -> Result<ObjectId> {
        let (id, compressed) = self.hash_object(object)?;
        self.put(&id, &compressed)?;
        Ok(id)
    }

    /// Loads, decompresses, and decodes the object stored under `id`.
    pub fn read_object(&self, id: &ObjectId) -> Result<GitObject> {
        let compressed = self.get(id)?;
        let encoded = self.compressor.decompress(&id.to_hex(), &compressed)?;
        GitObject::decode(&encoded)
    }

    /// Reads a file as a blob, storing it when `write` is set.
    pub fn hash_file(&self, path: &Path, write: bool) -> Result<ObjectId> {
        let object = GitObject::blob(std::fs::read(path)?);
        if write {
            self.write_object(&object)
        } else {
            Ok(self.hash_object(&object)?.0)
        }
    }

    /// Reads and parses a tree.
    pub fn read_tree(&self, id: &ObjectId) -> Result<Tree> {
        Tree::from_object(&self.read_object(id)?)
    }

    /// Reads and parses a commit.
    pub fn read_commit(&self, id: &ObjectId) -> Result<Commit> {
        Commit::from_object(&self.read_object(id)?)
    }
}
