//! # cset-fetch
//!
//! The Changelog Fetcher (C1): pages through the upstream json-log
//! changelog starting at a given changeset id (or the symbolic `tip`),
//! yielding changeset ids in newest-first order.

pub mod fake;
mod http;

pub use http::HgChangelogFetcher;

use cset_core::{CsetResult, Revision};

/// The symbolic cursor meaning "start from the newest changeset".
pub const TIP_CURSOR: &str = "tip";

/// One page of the upstream changelog: changeset ids in newest-first
/// order, where `entries[0]` corresponds to the cursor the page was
/// fetched with, and `entries.last()` is the continuation cursor for
/// the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogPage {
    pub entries: Vec<Revision>,
}

impl ChangelogPage {
    pub fn next_cursor(&self) -> Option<&Revision> {
        self.entries.last()
    }
}

/// Contract C1 exposes to the range filler and the tip worker.
/// Failures after a bounded retry are fatal to the calling operation
/// and must propagate; partial pages are not tolerated.
pub trait ChangelogSource: Send + Sync {
    fn fetch_page(&self, cursor: &str) -> CsetResult<ChangelogPage>;
}
