//! Tree objects: sorted `mode SP name NUL digest` entry lists.

use crate::{GitObject, ObjectId, ObjectType, Result, StorageError};
use std::fmt;

/// Mode of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Regular file (`100644`).
    Regular,
    /// Executable file (`100755`).
    Executable,
    /// Symbolic link (`120000`).
    Symlink,
    /// Subdirectory (`040000`).
    Directory,
}

impl FileMode {
    /// Returns the mode string written into tree entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "100644",
            Self::Executable => "100755",
            Self::Symlink => "120000",
            Self::Directory => "040000",
        }
    }

    /// Parses a mode string. Both `040000` and the unpadded `40000` name a
    /// directory.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "100644" => Ok(Self::Regular),
            "100755" => Ok(Self::Executable),
            "120000" => Ok(Self::Symlink),
            "040000" | "40000" => Ok(Self::Directory),
            _ => Err(StorageError::InvalidFormat(format!("unknown file mode: {s:?}"))),
        }
    }

    /// Kind of object an entry with this mode points at.
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Directory => ObjectType::Tree,
            _ => ObjectType::Blob,
        }
    }
}

/// A single entry in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Entry mode.
    pub mode: FileMode,
    /// File or directory name, without separators.
    pub name: String,
    /// Digest of the child object.
    pub id: ObjectId,
}

impl TreeEntry {
    /// Creates a tree entry.
    pub fn new(mode: FileMode, name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            id,
        }
    }
}

impl fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}\t{}",
            self.mode.as_str(),
            self.mode.object_type(),
            self.id,
            self.name
        )
    }
}

/// A directory snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Creates a tree, sorting entries byte-wise by name so that logically
    /// identical directories always serialize identically.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Self { entries }
    }

    /// Returns the entries in serialization order.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Returns true if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the entry list (without the object header).
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::new();
        for entry in &self.entries {
            data.extend_from_slice(entry.mode.as_str().as_bytes());
            data.push(b' ');
            data.extend_from_slice(entry.name.as_bytes());
            data.push(0);
            data.extend_from_slice(entry.id.as_bytes());
        }
        data
    }

    /// Parses an entry list. Entries keep the order they were stored in.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            let rest = &data[pos..];

            let space = rest
                .iter()
                .position(|&b| b == b' ')
                .ok_or(StorageError::TruncatedEntry {
                    offset: pos,
                    reason: "no space after mode",
                })?;
            let mode = std::str::from_utf8(&rest[..space])
                .map_err(|_| StorageError::InvalidFormat("mode is not UTF-8".to_string()))?;
            let mode = FileMode::parse(mode)?;

            let name_start = space + 1;
            let name_len = rest[name_start..]
                .iter()
                .position(|&b| b == 0)
                .ok_or(StorageError::TruncatedEntry {
                    offset: pos + name_start,
                    reason: "no null byte after name",
                })?;
            let name = std::str::from_utf8(&rest[name_start..name_start + name_len])
                .map_err(|_| StorageError::InvalidFormat("entry name is not UTF-8".to_string()))?;

            let id_start = name_start + name_len + 1;
            if rest.len() < id_start + ObjectId::LEN {
                return Err(StorageError::TruncatedEntry {
                    offset: pos + id_start,
                    reason: "fewer than 20 digest bytes",
                });
            }
            let id = ObjectId::from_slice(&rest[id_start..id_start + ObjectId::LEN])?;

            entries.push(TreeEntry::new(mode, name, id));
            pos += id_start + ObjectId::LEN;
        }

        Ok(Self { entries })
    }

    /// Wraps the encoded entries as a tree object.
    pub fn to_object(&self) -> GitObject {
        GitObject::new(ObjectType::Tree, self.encode())
    }

    /// Parses a tree from a decoded object, checking its kind.
    pub fn from_object(object: &GitObject) -> Result<Self> {
        if object.object_type != ObjectType::Tree {
            return Err(StorageError::InvalidFormat(format!(
                "expected tree, found {}",
                object.object_type
            )));
        }
        Self::decode(&object.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> ObjectId {
        ObjectId::from_bytes([byte; 20])
    }

    #[test]
    fn test_mode_roundtrip() {
        for mode in [
            FileMode::Regular,
            FileMode::Executable,
            FileMode::Symlink,
            FileMode::Directory,
        ] {
            assert_eq!(FileMode::parse(mode.as_str()).unwrap(), mode);
        }
        assert_eq!(FileMode::parse("40000").unwrap(), FileMode::Directory);
        assert!(FileMode::parse("100600").is_err());
    }

    #[test]
    fn test_encode_layout() {
        let tree = Tree::new(vec![TreeEntry::new(FileMode::Regular, "a.txt", id(1))]);
        let mut expected = b"100644 a.txt\0".to_vec();
        expected.extend_from_slice(&[1u8; 20]);
        assert_eq!(tree.encode(), expected);
    }

    #[test]
    fn test_sort_is_bytewise() {
        let tree = Tree::new(vec![
            TreeEntry::new(FileMode::Regular, "b", id(2)),
            TreeEntry::new(FileMode::Regular, "B", id(3)),
            TreeEntry::new(FileMode::Directory, "a", id(1)),
        ]);
        let names: Vec<&str> = tree.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "a", "b"]);
    }

    #[test]
    fn test_enumeration_order_independent() {
        let entries = vec![
            TreeEntry::new(FileMode::Regular, "zeta", id(1)),
            TreeEntry::new(FileMode::Directory, "alpha", id(2)),
            TreeEntry::new(FileMode::Regular, "mid", id(3)),
        ];
        let mut reversed = entries.clone();
        reversed.reverse();
        assert_eq!(Tree::new(entries).encode(), Tree::new(reversed).encode());
    }

    #[test]
    fn test_decode_roundtrip() {
        let tree = Tree::new(vec![
            TreeEntry::new(FileMode::Regular, "a.txt", id(1)),
            TreeEntry::new(FileMode::Directory, "sub", id(2)),
        ]);
        assert_eq!(Tree::decode(&tree.encode()).unwrap(), tree);
    }

    #[test]
    fn test_decode_empty() {
        assert!(Tree::decode(b"").unwrap().is_empty());
    }

    #[test]
    fn test_decode_short_digest() {
        let mut data = b"100644 a.txt\0".to_vec();
        data.extend_from_slice(&[1u8; 19]);
        match Tree::decode(&data) {
            Err(StorageError::TruncatedEntry { offset, .. }) => assert_eq!(offset, 13),
            other => panic!("expected TruncatedEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_space() {
        assert!(matches!(
            Tree::decode(b"100644"),
            Err(StorageError::TruncatedEntry { offset: 0, .. })
        ));
    }

    #[test]
    fn test_decode_missing_nul() {
        assert!(matches!(
            Tree::decode(b"100644 name-without-terminator"),
            Err(StorageError::TruncatedEntry { .. })
        ));
    }

    #[test]
    fn test_from_object_checks_kind() {
        let blob = GitObject::blob(b"not a tree".to_vec());
        assert!(Tree::from_object(&blob).is_err());
    }

    #[test]
    fn test_entry_display() {
        let entry = TreeEntry::new(FileMode::Directory, "sub", id(0));
        assert_eq!(
            entry.to_string(),
            format!("040000 tree {}\tsub", "0".repeat(40))
        );
    }
}
