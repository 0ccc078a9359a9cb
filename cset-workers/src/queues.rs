//! The two in-memory, mutex-guarded work queues shared between the
//! facade and the backfill/deleter workers. Unbounded by contract — a
//! simple mutex-guarded `Vec` suffices; lock-free queues are not
//! required (see the design notes on concurrent queues).

use std::sync::Mutex;

use cset_core::Revision;

/// One pending "extend the log backward to include this changeset"
/// demand. `stamp` controls whether the filled-in rows get a wall-time
/// timestamp (backfill-originated rows participate in retention
/// immediately) or the permanent sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillRequest {
    pub target: Revision,
    pub stamp: bool,
}

#[derive(Default)]
pub struct BackfillQueue {
    items: Mutex<Vec<BackfillRequest>>,
}

impl BackfillQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appended duplicatively and idempotently by callers; consumers
    /// are expected to skip already-resident targets rather than rely
    /// on the queue itself deduplicating.
    pub fn push(&self, target: Revision, stamp: bool) {
        self.items.lock().unwrap().push(BackfillRequest { target, stamp });
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    /// Snapshot the current queue contents without clearing it.
    pub fn snapshot(&self) -> Vec<BackfillRequest> {
        self.items.lock().unwrap().clone()
    }

    /// Remove exactly the given requests (by value) from the queue,
    /// leaving anything appended concurrently since the snapshot.
    pub fn remove_processed(&self, processed: &[BackfillRequest]) {
        let mut items = self.items.lock().unwrap();
        for p in processed {
            if let Some(pos) = items.iter().position(|i| i == p) {
                items.remove(pos);
            }
        }
    }
}

/// One scheduled deletion boundary: "delete everything with revnum <=
/// this revision's revnum".
#[derive(Default)]
pub struct DeletionQueue {
    items: Mutex<Vec<Revision>>,
}

impl DeletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, boundary: Revision) {
        self.items.lock().unwrap().push(boundary);
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Revision> {
        self.items.lock().unwrap().clone()
    }

    pub fn remove_processed(&self, processed: &[Revision]) {
        let mut items = self.items.lock().unwrap();
        for p in processed {
            if let Some(pos) = items.iter().position(|i| i == p) {
                items.remove(pos);
            }
        }
    }
}
