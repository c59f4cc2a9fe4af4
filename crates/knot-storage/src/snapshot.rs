//! Directory snapshots.
//!
//! [`TreeBuilder`] turns a directory into blob and tree objects. The walk
//! is depth-first with an explicit stack of open directories, so deep trees
//! do not grow the native call stack.

use crate::{FileMode, GitObject, ObjectId, ObjectStore, Result, Tree, TreeEntry};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A directory whose files are stored and whose subdirectories are still
/// being walked.
struct Frame {
    name: String,
    entries: Vec<TreeEntry>,
    subdirs: Vec<(String, PathBuf)>,
}

/// Writes a directory and everything beneath it into an object store.
pub struct TreeBuilder<'a> {
    store: &'a ObjectStore,
    skip: Vec<OsString>,
}

impl<'a> TreeBuilder<'a> {
    /// Creates a builder writing into `store`.
    pub fn new(store: &'a ObjectStore) -> Self {
        Self {
            store,
            skip: Vec::new(),
        }
    }

    /// Skips entries with this name at every level (the metadata directory).
    pub fn skip(mut self, name: impl Into<OsString>) -> Self {
        self.skip.push(name.into());
        self
    }

    /// Snapshots `root` and returns the id of its tree.
    ///
    /// Regular files become `100644` blobs, directories become `040000`
    /// subtrees, and anything else (symlinks, sockets, devices) is skipped.
    /// The first error aborts the walk; objects already written stay in the
    /// store unreferenced.
    pub fn build(&self, root: &Path) -> Result<ObjectId> {
        let mut current = self.open(root, String::new())?;
        let mut parents: Vec<Frame> = Vec::new();

        loop {
            if let Some((name, path)) = current.subdirs.pop() {
                let child = self.open(&path, name)?;
                parents.push(std::mem::replace(&mut current, child));
                continue;
            }

            let tree = Tree::new(std::mem::take(&mut current.entries));
            let id = self.store.write_object(&tree.to_object())?;
            tracing::debug!(
                id = %id,
                entries = tree.entries().len(),
                name = %current.name,
                "Wrote tree"
            );

            match parents.pop() {
                Some(mut parent) => {
                    let name = std::mem::take(&mut current.name);
                    parent
                        .entries
                        .push(TreeEntry::new(FileMode::Directory, name, id));
                    current = parent;
                }
                None => return Ok(id),
            }
        }
    }

    /// Lists a directory, storing its regular files as blobs immediately and
    /// queueing its subdirectories.
    fn open(&self, dir: &Path, name: String) -> Result<Frame> {
        let mut entries = Vec::new();
        let mut subdirs = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            if self.skip.contains(&file_name) {
                continue;
            }
            let Some(entry_name) = file_name.to_str().map(str::to_string) else {
                tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                subdirs.push((entry_name, entry.path()));
            } else if file_type.is_file() {
                let blob = GitObject::blob(std::fs::read(entry.path())?);
                let id = self.store.write_object(&blob)?;
                entries.push(TreeEntry::new(FileMode::Regular, entry_name, id));
            } else {
                tracing::debug!(path = %entry.path().display(), "Skipping special file");
            }
        }

        // Popped from the back, so reverse order visits subdirectories by name.
        subdirs.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(Frame {
            name,
            entries,
            subdirs,
        })
    }
}
