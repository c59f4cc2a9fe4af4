//! Ref advertisement parsing.
//!
//! The discovery response lists one ref per pkt-line as `<hex> <name>`. The
//! first ref line carries the server capabilities after a NUL byte, among
//! them `symref=HEAD:<branch>` naming the default branch.

use crate::pktline::{self, PktLine};
use crate::{GitError, Result};
use knot_storage::ObjectId;
use std::collections::BTreeMap;

/// Namespace of branch refs.
pub const BRANCH_PREFIX: &str = "refs/heads/";

const SYMREF_HEAD: &str = "symref=HEAD:";

/// Refs advertised by a remote for one negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefAdvertisement {
    /// Branch refs by full name.
    pub refs: BTreeMap<String, ObjectId>,
    /// Branch `HEAD` points at, when the server announced it.
    pub default_branch: Option<String>,
    /// Commit to fetch: the default branch's commit when it is advertised,
    /// otherwise the bare `HEAD` commit.
    pub head: ObjectId,
    /// Digest listed on the `HEAD` line itself, which may be stale.
    pub advertised_head: ObjectId,
    /// Capabilities from the first ref line.
    pub capabilities: Vec<String>,
}

impl RefAdvertisement {
    /// Parses a raw discovery response body.
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        Self::parse(&pktline::parse(body)?)
    }

    /// Parses advertisement packets.
    pub fn parse(packets: &[PktLine]) -> Result<Self> {
        let mut refs = BTreeMap::new();
        let mut default_branch = None;
        let mut head = None;
        let mut capabilities = Vec::new();

        for pkt in packets {
            let Some(data) = pkt.data() else {
                continue;
            };
            let line = String::from_utf8_lossy(data);
            let line = line.trim_end_matches('\n');

            if line.starts_with("# service=") {
                continue;
            }

            let (ref_part, caps) = match line.split_once('\0') {
                Some((ref_part, caps)) => (ref_part, Some(caps)),
                None => (line, None),
            };
            if let Some(caps) = caps {
                capabilities = caps.split_whitespace().map(str::to_string).collect();
            }

            let Some((digest, name)) = ref_part.split_once(' ') else {
                continue;
            };
            let name = name.trim();

            if name == "HEAD" {
                head = Some(parse_id(digest, line)?);
                if let Some(branch) = find_symref(line) {
                    default_branch = Some(branch.to_string());
                }
            }
            if name.starts_with(BRANCH_PREFIX) {
                refs.insert(name.to_string(), parse_id(digest, line)?);
            }
        }

        let advertised_head = head.ok_or(GitError::NoHeadFound)?;
        let mut head = advertised_head;

        // The symref is authoritative over the bare HEAD line.
        if let Some(branch_id) = default_branch.as_ref().and_then(|b| refs.get(b)) {
            if *branch_id != head {
                tracing::debug!(
                    head = %head,
                    branch = %branch_id,
                    "HEAD disagrees with its symref target"
                );
            }
            head = *branch_id;
        }

        Ok(Self {
            refs,
            default_branch,
            head,
            advertised_head,
            capabilities,
        })
    }

    /// Returns true if the server advertised `capability` (with or without
    /// a `=value` suffix).
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c == capability || c.split_once('=').map(|(k, _)| k) == Some(capability))
    }
}

fn parse_id(digest: &str, line: &str) -> Result<ObjectId> {
    ObjectId::from_hex(digest)
        .map_err(|e| GitError::InvalidAdvertisement(format!("{e} in line {line:?}")))
}

/// Extracts the target of `symref=HEAD:<target>`, which runs to the next
/// space or the end of the line.
fn find_symref(line: &str) -> Option<&str> {
    let start = line.find(SYMREF_HEAD)? + SYMREF_HEAD.len();
    let rest = &line[start..];
    let end = rest.find(' ').unwrap_or(rest.len());
    let target = rest[..end].trim();
    (!target.is_empty()).then_some(target)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: arbitrary advertisement bodies never panic the parser
        #[test]
        fn prop_advertisement_no_panic(data in prop::collection::vec(any::<u8>(), 0..512)) {
            let _ = RefAdvertisement::from_bytes(&data);
        }
    }
}
