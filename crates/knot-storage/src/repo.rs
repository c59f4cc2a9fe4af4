//! Repositories: a working directory plus its metadata directory.

use crate::{
    Commit, CommitWriter, ObjectId, ObjectStore, RefStore, RepoConfig, Result, StorageError,
    TreeBuilder,
};
use std::path::{Path, PathBuf};

/// Name of the metadata directory inside a working directory.
pub const META_DIR: &str = ".git";

/// Branch `HEAD` points at after `init`.
pub const DEFAULT_BRANCH: &str = "refs/heads/main";

const CONFIG_FILE: &str = "config.toml";

/// A repository rooted at an explicit path.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    meta: PathBuf,
    config: RepoConfig,
    objects: ObjectStore,
    refs: RefStore,
}

impl Repository {
    /// Creates the metadata skeleton (`objects/`, `refs/heads/`, `HEAD`) in
    /// `root`. Re-running on an existing repository keeps its `HEAD`.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let meta = root.join(META_DIR);

        std::fs::create_dir_all(meta.join("objects"))?;
        std::fs::create_dir_all(meta.join("refs").join("heads"))?;

        let refs = RefStore::new(&meta);
        if refs.get("HEAD")?.is_none() {
            refs.set_symbolic("HEAD", DEFAULT_BRANCH)?;
        }

        tracing::info!(path = %meta.display(), "Initialized repository");
        Self::open(root)
    }

    /// Opens an existing repository.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let meta = root.join(META_DIR);
        if !meta.is_dir() {
            return Err(StorageError::NotARepository(root));
        }

        let config = RepoConfig::load(&meta.join(CONFIG_FILE))?;
        let objects = ObjectStore::with_config(meta.join("objects"), &config.core);
        let refs = RefStore::new(&meta);

        Ok(Self {
            root,
            meta,
            config,
            objects,
            refs,
        })
    }

    /// Returns the working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the metadata directory.
    pub fn meta_dir(&self) -> &Path {
        &self.meta
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Returns the object store.
    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// Returns the reference store.
    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// Snapshots the working directory, excluding the metadata directory.
    pub fn write_tree(&self) -> Result<ObjectId> {
        TreeBuilder::new(&self.objects)
            .skip(META_DIR)
            .build(&self.root)
    }

    /// Writes a commit signed with the configured identity.
    pub fn commit_tree(
        &self,
        tree: &ObjectId,
        parent: Option<&ObjectId>,
        message: &str,
    ) -> Result<ObjectId> {
        let user = &self.config.user;
        CommitWriter::new(&self.objects, &user.name, &user.email).write(tree, parent, message)
    }

    /// Snapshots the working directory, commits it on top of `HEAD`, and
    /// advances the current branch (or `HEAD` itself when detached).
    pub fn commit(&self, message: &str) -> Result<ObjectId> {
        let tree = self.write_tree()?;
        let parent = self.refs.resolve_head()?;
        let id = self.commit_tree(&tree, parent.as_ref(), message)?;

        match self.refs.current_branch()? {
            Some(branch) => self.refs.set(&format!("refs/heads/{branch}"), id)?,
            None => self.refs.set("HEAD", id)?,
        }
        Ok(id)
    }

    /// Walks first-parent history starting at `start`.
    pub fn log(&self, start: ObjectId) -> History<'_> {
        History {
            store: &self.objects,
            next: Some(start),
        }
    }
}

/// Iterator over a commit and its ancestors, newest first.
pub struct History<'a> {
    store: &'a ObjectStore,
    next: Option<ObjectId>,
}

impl Iterator for History<'_> {
    type Item = Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match self.store.read_commit(&id) {
            Ok(commit) => {
                self.next = commit.parent;
                Some(Ok((id, commit)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
