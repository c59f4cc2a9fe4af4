//! Commit objects and the commit writer.

use crate::{GitObject, ObjectId, ObjectStore, ObjectType, Result, StorageError};
use chrono::{Local, Offset};
use std::fmt;

/// An author or committer line: `Name <email> <unix-seconds> <±HHMM>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Offset from UTC in minutes.
    pub offset_minutes: i32,
}

impl Signature {
    /// Creates a signature stamped with the current wall-clock time and the
    /// local UTC offset.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            name: name.into(),
            email: email.into(),
            timestamp: now.timestamp(),
            offset_minutes: now.offset().fix().local_minus_utc() / 60,
        }
    }

    /// Formats the offset as `±HHMM`.
    pub fn offset_string(&self) -> String {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let minutes = self.offset_minutes.unsigned_abs();
        format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
    }

    /// Parses a signature line value.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || StorageError::InvalidFormat(format!("invalid signature: {s:?}"));

        let open = s.find('<').ok_or_else(invalid)?;
        let close = s[open..].find('>').map(|i| open + i).ok_or_else(invalid)?;
        let name = s[..open].trim_end().to_string();
        let email = s[open + 1..close].to_string();

        let mut when = s[close + 1..].split_whitespace();
        let timestamp: i64 = when
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(invalid)?;
        let offset = when.next().ok_or_else(invalid)?;
        let offset_minutes = parse_offset(offset).ok_or_else(invalid)?;

        Ok(Self {
            name,
            email,
            timestamp,
            offset_minutes,
        })
    }
}

fn parse_offset(s: &str) -> Option<i32> {
    let (sign, digits) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp,
            self.offset_string()
        )
    }
}

/// A commit: one tree, at most one parent, and a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// Previous commit; `None` for the root of a lineage.
    pub parent: Option<ObjectId>,
    /// Author identity.
    pub author: Signature,
    /// Committer identity.
    pub committer: Signature,
    /// Free-text message, without the trailing newline added on encode.
    pub message: String,
}

impl Commit {
    /// Serializes the commit payload in fixed header order.
    pub fn encode(&self) -> Vec<u8> {
        let mut content = format!("tree {}\n", self.tree);
        if let Some(parent) = &self.parent {
            content.push_str(&format!("parent {}\n", parent));
        }
        content.push_str(&format!("author {}\n", self.author));
        content.push_str(&format!("committer {}\n", self.committer));
        content.push('\n');
        content.push_str(&self.message);
        content.push('\n');
        content.into_bytes()
    }

    /// Wraps the payload as a commit object.
    pub fn to_object(&self) -> GitObject {
        GitObject::new(ObjectType::Commit, self.encode())
    }

    /// Parses a commit payload. Unknown headers are ignored; a second
    /// `parent` line is rejected since merges are not representable.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| StorageError::InvalidFormat("commit is not UTF-8".to_string()))?;
        let (headers, body) = text
            .split_once("\n\n")
            .ok_or_else(|| StorageError::InvalidFormat("commit has no message".to_string()))?;

        let mut tree = None;
        let mut parent = None;
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            match key {
                "tree" => tree = Some(ObjectId::from_hex(value)?),
                "parent" => {
                    if parent.replace(ObjectId::from_hex(value)?).is_some() {
                        return Err(StorageError::InvalidFormat(
                            "commit has more than one parent".to_string(),
                        ));
                    }
                }
                "author" => author = Some(Signature::parse(value)?),
                "committer" => committer = Some(Signature::parse(value)?),
                _ => {}
            }
        }

        let missing = |field: &str| StorageError::InvalidFormat(format!("commit missing {field}"));
        Ok(Self {
            tree: tree.ok_or_else(|| missing("tree"))?,
            parent,
            author: author.ok_or_else(|| missing("author"))?,
            committer: committer.ok_or_else(|| missing("committer"))?,
            message: body.strip_suffix('\n').unwrap_or(body).to_string(),
        })
    }

    /// Parses a commit from a decoded object, checking its kind.
    pub fn from_object(object: &GitObject) -> Result<Self> {
        if object.object_type != ObjectType::Commit {
            return Err(StorageError::InvalidFormat(format!(
                "expected commit, found {}",
                object.object_type
            )));
        }
        Self::parse(&object.data)
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Writes commit objects into a store under a fixed identity.
///
/// The tree and parent are not checked for existence.
pub struct CommitWriter<'a> {
    store: &'a ObjectStore,
    name: String,
    email: String,
}

impl<'a> CommitWriter<'a> {
    /// Creates a writer that signs commits as `name <email>`.
    pub fn new(store: &'a ObjectStore, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Builds, stores, and returns the id of a new commit. Author and
    /// committer share one signature stamped at call time.
    pub fn write(
        &self,
        tree: &ObjectId,
        parent: Option<&ObjectId>,
        message: &str,
    ) -> Result<ObjectId> {
        let signature = Signature::now(&self.name, &self.email);
        let commit = Commit {
            tree: *tree,
            parent: parent.copied(),
            author: signature.clone(),
            committer: signature,
            message: message.to_string(),
        };
        let id = self.store.write_object(&commit.to_object())?;
        tracing::info!(id = %id, tree = %tree, parent = ?parent, "Wrote commit");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature() -> Signature {
        Signature {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            timestamp: 1_234_567_890,
            offset_minutes: -330,
        }
    }

    #[test]
    fn test_signature_format() {
        assert_eq!(
            signature().to_string(),
            "Alice <alice@example.com> 1234567890 -0530"
        );
    }

    #[test]
    fn test_signature_parse_roundtrip() {
        let sig = signature();
        assert_eq!(Signature::parse(&sig.to_string()).unwrap(), sig);
    }

    #[test]
    fn test_signature_parse_invalid() {
        assert!(Signature::parse("no email 123 +0000").is_err());
        assert!(Signature::parse("A <a@b> notanumber +0000").is_err());
        assert!(Signature::parse("A <a@b> 123 0000").is_err());
        assert!(Signature::parse("A <a@b> 123 +00").is_err());
    }

    #[test]
    fn test_offset_string() {
        let mut sig = signature();
        sig.offset_minutes = 0;
        assert_eq!(sig.offset_string(), "+0000");
        sig.offset_minutes = 345;
        assert_eq!(sig.offset_string(), "+0545");
    }

    #[test]
    fn test_signature_now_has_offset() {
        let sig = Signature::now("Bob", "bob@example.com");
        assert!(sig.timestamp > 0);
        let offset = sig.offset_string();
        assert_eq!(offset.len(), 5);
        assert!(offset.starts_with('+') || offset.starts_with('-'));
    }

    #[test]
    fn test_commit_encode_root() {
        let commit = Commit {
            tree: ObjectId::from_bytes([1u8; 20]),
            parent: None,
            author: signature(),
            committer: signature(),
            message: "init".to_string(),
        };
        let text = String::from_utf8(commit.encode()).unwrap();
        assert!(text.starts_with(&format!("tree {}\nauthor ", "01".repeat(20))));
        assert!(!text.contains("parent"));
        assert!(text.ends_with("\n\ninit\n"));
    }

    #[test]
    fn test_commit_parse_roundtrip() {
        let commit = Commit {
            tree: ObjectId::from_bytes([1u8; 20]),
            parent: Some(ObjectId::from_bytes([2u8; 20])),
            author: signature(),
            committer: signature(),
            message: "second\n\nwith body".to_string(),
        };
        let parsed = Commit::parse(&commit.encode()).unwrap();
        assert_eq!(parsed, commit);
        assert_eq!(parsed.summary(), "second");
    }

    #[test]
    fn test_commit_parse_rejects_merge() {
        let tree = "01".repeat(20);
        let text = format!(
            "tree {tree}\nparent {p1}\nparent {p2}\nauthor {s}\ncommitter {s}\n\nmerge\n",
            p1 = "02".repeat(20),
            p2 = "03".repeat(20),
            s = signature()
        );
        assert!(Commit::parse(text.as_bytes()).is_err());
    }

    #[test]
    fn test_commit_parse_missing_tree() {
        let text = format!("author {s}\ncommitter {s}\n\nmsg\n", s = signature());
        assert!(Commit::parse(text.as_bytes()).is_err());
    }

    #[test]
    fn test_from_object_checks_kind() {
        assert!(Commit::from_object(&GitObject::blob(b"x".to_vec())).is_err());
    }
}
