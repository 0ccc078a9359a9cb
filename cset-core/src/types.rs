//! Shared value types for the changeset log.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::REVISION_LEN;

/// A 12-character changeset identifier (a prefix of an upstream hash).
///
/// Always exactly `REVISION_LEN` characters once constructed via
/// [`Revision::from_node`] or [`Revision::new`]; both truncate longer
/// upstream node hashes the same way the source does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Revision(String);

impl Revision {
    /// Build a revision from an already-short identifier. Panics in
    /// debug builds if the length is wrong; callers that parse
    /// untrusted upstream JSON should go through [`Revision::from_node`].
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        debug_assert_eq!(id.len(), REVISION_LEN, "revision must be {REVISION_LEN} chars");
        Self(id)
    }

    /// Truncate a full upstream node hash to the canonical prefix length.
    pub fn from_node(node: &str) -> Self {
        let cut = node
            .char_indices()
            .nth(REVISION_LEN)
            .map(|(i, _)| i)
            .unwrap_or(node.len());
        Self(node[..cut].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Revision> for String {
    fn from(r: Revision) -> String {
        r.0
    }
}

/// Sentinel timestamp meaning "permanent; retention governed by count,
/// not age".
pub const PERMANENT_TIMESTAMP: i64 = -1;

/// One row of the changeset log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsetRow {
    pub revnum: i64,
    pub revision: Revision,
    pub timestamp: i64,
}

impl CsetRow {
    pub fn is_permanent(&self) -> bool {
        self.timestamp == PERMANENT_TIMESTAMP
    }
}

/// Direction a range fill proceeds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillDirection {
    Forward,
    Backward,
}

impl FillDirection {
    pub fn label(self) -> &'static str {
        match self {
            FillDirection::Forward => "forward",
            FillDirection::Backward => "backward",
        }
    }

    pub fn is_forward(self) -> bool {
        matches!(self, FillDirection::Forward)
    }
}

/// The stopping condition for a range fill: either a known boundary
/// changeset, or a simple count of new ids to collect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillBoundary {
    Revision(Revision),
    Count(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_node_truncates() {
        let r = Revision::from_node("abcdef0123456789abcdef");
        assert_eq!(r.as_str(), "abcdef012345");
    }

    #[test]
    fn from_node_keeps_short_ids() {
        let r = Revision::from_node("abcdef012345");
        assert_eq!(r.as_str(), "abcdef012345");
    }
}
