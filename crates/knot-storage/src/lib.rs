//! Object storage for Knot.
//!
//! This crate provides content-addressed storage for objects (blobs,
//! trees, commits) on the filesystem, directory snapshots, and reference
//! management.

mod commit;
mod compression;
mod config;
mod error;
mod hash;
mod object;
mod refs;
mod repo;
mod snapshot;
mod store;
mod tree;

pub use commit::{Commit, CommitWriter, Signature};
pub use compression::{CompressionLevel, Compressor};
pub use config::{CoreConfig, RepoConfig, UserConfig};
pub use error::StorageError;
pub use hash::{sha1_digest, DigestStrategy};
pub use object::{GitObject, ObjectId, ObjectType};
pub use refs::{RefStore, Reference};
pub use repo::{History, Repository, DEFAULT_BRANCH, META_DIR};
pub use snapshot::TreeBuilder;
pub use store::ObjectStore;
pub use tree::{FileMode, Tree, TreeEntry};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
