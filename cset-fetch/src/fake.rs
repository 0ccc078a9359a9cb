//! An in-memory [`ChangelogSource`] fixture for exercising the range
//! filler and workers without a network round trip.

use std::sync::Mutex;

use cset_core::{CsetError, CsetResult, Revision};

use crate::{ChangelogPage, ChangelogSource, TIP_CURSOR};

/// Replays a fixed newest-first history, paging it out in chunks the
/// way the real upstream does (each page's last entry overlaps the
/// next page's first entry).
pub struct FakeChangelogSource {
    /// Newest-first list of every known revision, including `tip`.
    history: Vec<Revision>,
    page_size: usize,
    calls: Mutex<Vec<String>>,
}

impl FakeChangelogSource {
    pub fn new(history_newest_first: Vec<Revision>, page_size: usize) -> Self {
        Self {
            history: history_newest_first,
            page_size: page_size.max(2),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn position_of(&self, cursor: &str) -> Option<usize> {
        if cursor == TIP_CURSOR {
            return Some(0);
        }
        self.history.iter().position(|r| r.as_str() == cursor)
    }
}

impl ChangelogSource for FakeChangelogSource {
    fn fetch_page(&self, cursor: &str) -> CsetResult<ChangelogPage> {
        self.calls.lock().unwrap().push(cursor.to_string());
        let start = self
            .position_of(cursor)
            .ok_or_else(|| CsetError::FetchFailed(format!("unknown cursor {cursor}")))?;
        let end = (start + self.page_size).min(self.history.len());
        if start >= end {
            return Err(CsetError::FetchFailed("paged past end of history".to_string()));
        }
        Ok(ChangelogPage {
            entries: self.history[start..end].to_vec(),
        })
    }
}
