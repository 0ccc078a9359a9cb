//! Shared state referenced by all four workers and the query facade:
//! the store, the fetcher, the two work queues, the `at_tip` flag, and
//! the working mutex that serializes every mutation of the log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use cset_core::traits::{FrontierAdvancer, NullFrontierAdvancer};
use cset_core::CsetConfig;
use cset_fetch::ChangelogSource;
use cset_store::CsetStore;

use crate::queues::{BackfillQueue, DeletionQueue};

/// The single shared resource blob described in the concurrency model:
/// one SQL connection (serialized inside `CsetStore` itself) and one
/// in-process state blob holding the two work queues and `at_tip`.
pub struct CsetCore {
    pub store: Arc<CsetStore>,
    pub fetcher: Arc<dyn ChangelogSource>,
    pub frontier: Arc<dyn FrontierAdvancer>,
    pub config: CsetConfig,
    pub backfill_queue: BackfillQueue,
    pub deletion_queue: DeletionQueue,
    working_mutex: Mutex<()>,
    at_tip: AtomicBool,
}

impl CsetCore {
    pub fn new(store: Arc<CsetStore>, fetcher: Arc<dyn ChangelogSource>, config: CsetConfig) -> Self {
        Self {
            store,
            fetcher,
            frontier: Arc::new(NullFrontierAdvancer),
            config,
            backfill_queue: BackfillQueue::new(),
            deletion_queue: DeletionQueue::new(),
            working_mutex: Mutex::new(()),
            at_tip: AtomicBool::new(false),
        }
    }

    pub fn with_frontier_advancer(mut self, frontier: Arc<dyn FrontierAdvancer>) -> Self {
        self.frontier = frontier;
        self
    }

    /// Held for the entire duration of any mutation of the log's
    /// contents or numbering. Every worker acquires this before its
    /// insert/maintenance/deletion critical section.
    pub fn lock_working(&self) -> MutexGuard<'_, ()> {
        self.working_mutex.lock().expect("working mutex poisoned")
    }

    pub fn is_at_tip(&self) -> bool {
        self.at_tip.load(Ordering::SeqCst)
    }

    pub fn set_at_tip(&self, value: bool) {
        self.at_tip.store(value, Ordering::SeqCst);
    }
}
