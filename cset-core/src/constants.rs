//! Tuning constants mirrored from the upstream implementation.

use std::time::Duration;

/// Changesets collected/inserted per batch transaction.
pub const SQL_CSET_BATCH_SIZE: usize = 500;

/// Tip worker cadence.
pub const CSET_TIP_WAIT_TIME: Duration = Duration::from_secs(300);

/// Backfill worker cadence.
pub const CSET_BACKFILL_WAIT_TIME: Duration = Duration::from_secs(60);

/// Maintenance worker cadence.
pub const CSET_MAINTENANCE_WAIT_TIME: Duration = Duration::from_secs(1800);

/// Deleter worker cadence.
pub const CSET_DELETION_WAIT_TIME: Duration = Duration::from_secs(60);

/// Poll interval while waiting for `latestFileMod` frontiers to advance.
pub const TUID_EXISTENCE_WAIT_TIME: Duration = Duration::from_secs(60);

/// Bounded retry policy for changelog fetches: 3 attempts, 5s apart.
pub const RETRY_TIMES: u32 = 3;
pub const RETRY_SLEEP: Duration = Duration::from_secs(5);

/// Newest rows exempt from age-based retention, as an i64 (matches
/// revnum arithmetic throughout the store and workers).
pub const MIN_PERMANENT: i64 = 1000;

/// Non-permanent rows retained before the oldest overflow into the
/// deletion schedule.
pub const MAX_NONPERMANENT: i64 = 20000;

/// Length of a changeset identifier (a hex hash prefix).
pub const REVISION_LEN: usize = 12;
