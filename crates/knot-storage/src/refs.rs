//! On-disk reference management.
//!
//! `HEAD` holds `ref: refs/heads/<branch>\n` (or a bare digest when
//! detached); branch files under `refs/heads/` hold a hex digest and a
//! trailing newline.

use crate::{ObjectId, Result, StorageError};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Maximum number of symbolic hops followed when resolving a ref.
const MAX_SYMREF_DEPTH: usize = 5;

/// A reference (branch or symbolic ref).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Direct reference to an object.
    Direct(ObjectId),
    /// Symbolic reference (e.g., HEAD -> refs/heads/main).
    Symbolic(String),
}

impl Reference {
    /// Parses the contents of a ref file.
    pub fn parse(contents: &str) -> Result<Self> {
        let contents = contents.trim_end();
        match contents.strip_prefix("ref: ") {
            Some(target) => Ok(Self::Symbolic(target.trim().to_string())),
            None => Ok(Self::Direct(ObjectId::from_hex(contents)?)),
        }
    }

    /// Returns the file contents for this reference.
    pub fn to_file_contents(&self) -> String {
        match self {
            Self::Direct(id) => format!("{}\n", id),
            Self::Symbolic(target) => format!("ref: {}\n", target),
        }
    }

    /// Returns the object ID if this is a direct reference.
    pub fn as_direct(&self) -> Option<ObjectId> {
        match self {
            Self::Direct(id) => Some(*id),
            Self::Symbolic(_) => None,
        }
    }
}

/// Reference store backed by the metadata directory.
#[derive(Debug, Clone)]
pub struct RefStore {
    root: PathBuf,
}

impl RefStore {
    /// Creates a reference store rooted at the metadata directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn ref_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let well_formed = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(StorageError::InvalidRef(format!("bad ref name: {name:?}")));
        }
        Ok(self.root.join(relative))
    }

    /// Reads a reference, returning `None` if it does not exist.
    pub fn get(&self, name: &str) -> Result<Option<Reference>> {
        match std::fs::read_to_string(self.ref_path(name)?) {
            Ok(contents) => Reference::parse(&contents).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, reference: &Reference) -> Result<()> {
        let path = self.ref_path(name)?;
        let dir = path
            .parent()
            .ok_or_else(|| StorageError::InvalidRef(name.to_string()))?;
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(reference.to_file_contents().as_bytes())?;
        tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }

    /// Sets a reference to point to an object.
    pub fn set(&self, name: &str, target: ObjectId) -> Result<()> {
        tracing::debug!(name = %name, target = %target, "Updating ref");
        self.write(name, &Reference::Direct(target))
    }

    /// Sets a symbolic reference.
    pub fn set_symbolic(&self, name: &str, target: &str) -> Result<()> {
        self.ref_path(target)?;
        self.write(name, &Reference::Symbolic(target.to_string()))
    }

    /// Follows symbolic refs to an object id. Returns `None` when the chain
    /// ends at a ref that does not exist yet (an unborn branch).
    pub fn resolve(&self, name: &str) -> Result<Option<ObjectId>> {
        let mut current = name.to_string();
        for _ in 0..=MAX_SYMREF_DEPTH {
            match self.get(&current)? {
                None => return Ok(None),
                Some(Reference::Direct(id)) => return Ok(Some(id)),
                Some(Reference::Symbolic(target)) => current = target,
            }
        }
        Err(StorageError::InvalidRef(format!(
            "{name}: symbolic refs nested deeper than {MAX_SYMREF_DEPTH}"
        )))
    }

    /// Reads `HEAD`, which must exist.
    pub fn head(&self) -> Result<Reference> {
        self.get("HEAD")?
            .ok_or_else(|| StorageError::InvalidRef("HEAD is missing".to_string()))
    }

    /// Resolves `HEAD` to a commit, or `None` on an unborn branch.
    pub fn resolve_head(&self) -> Result<Option<ObjectId>> {
        self.resolve("HEAD")
    }

    /// Gets the current branch name (if HEAD is symbolic).
    pub fn current_branch(&self) -> Result<Option<String>> {
        Ok(match self.head()? {
            Reference::Symbolic(target) => {
                target.strip_prefix("refs/heads/").map(|s| s.to_string())
            }
            Reference::Direct(_) => None,
        })
    }
}
