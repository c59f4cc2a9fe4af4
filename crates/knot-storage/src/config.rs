//! Repository configuration.
//!
//! Loaded from `<meta>/config.toml`; every field has a default so a missing
//! file or section is not an error.

use crate::{CompressionLevel, DigestStrategy, Result, StorageError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Object encoding settings.
    pub core: CoreConfig,
    /// Identity recorded in commits.
    pub user: UserConfig,
}

/// Object encoding settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Zlib level for stored objects.
    pub compression: CompressionLevel,
    /// Which bytes object identities are hashed from.
    pub digest: DigestStrategy,
}

/// Identity recorded as author and committer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UserConfig {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: "Knot User".to_string(),
            email: "knot@localhost".to_string(),
        }
    }
}

impl RepoConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| StorageError::Config(e.to_string()))
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text =
            toml::to_string_pretty(self).map_err(|e| StorageError::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
