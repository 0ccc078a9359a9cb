//! The Maintenance Worker (C6): enforces the permanent/non-permanent
//! partition, stamps freshly-aged rows, and schedules deletion.

use cset_core::constants::{CSET_MAINTENANCE_WAIT_TIME, TUID_EXISTENCE_WAIT_TIME};
use cset_core::{CsetResult, Revision, PERMANENT_TIMESTAMP};

use crate::control::StopSignal;
use crate::core::CsetCore;

/// Runs the maintenance worker's loop until `stop` is signalled.
pub fn run(core: &CsetCore, stop: &StopSignal) {
    loop {
        if stop.is_stopped() {
            return;
        }
        if !core.config.maintenance_enabled() || !core.deletion_queue.is_empty() {
            if stop.sleep(CSET_MAINTENANCE_WAIT_TIME) {
                return;
            }
            continue;
        }

        if let Err(e) = tick(core, stop) {
            tracing::warn!(error = %e, "maintenance worker iteration failed, retrying next tick");
        }

        if stop.sleep(CSET_MAINTENANCE_WAIT_TIME) {
            return;
        }
    }
}

fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// One iteration of the 7-step algorithm.
pub fn tick(core: &CsetCore, stop: &StopSignal) -> CsetResult<()> {
    let _guard = core.lock_working();

    let rows = core.store.all_rows_ascending()?;
    let n = rows.len() as i64;
    let min_permanent = core.config.effective_min_permanent();
    let max_nonpermanent = core.config.effective_max_nonpermanent();

    let mut updates: Vec<(Revision, i64)> = Vec::new();
    let now = now_secs();

    for (position_from_oldest, row) in rows.iter().enumerate() {
        let position_from_newest = n - 1 - position_from_oldest as i64;

        if position_from_newest < min_permanent {
            if row.timestamp != PERMANENT_TIMESTAMP {
                updates.push((row.revision.clone(), PERMANENT_TIMESTAMP));
            }
        } else if row.timestamp == PERMANENT_TIMESTAMP {
            updates.push((row.revision.clone(), now));
        }
    }

    // Overflow is measured among the non-permanent rows only: the
    // newest `min_permanent` rows are exempt from this count entirely.
    let overflow_count = (n - min_permanent) - max_nonpermanent;
    let about_to_be_retired: Vec<Revision> = if overflow_count > 0 {
        rows[..overflow_count as usize]
            .iter()
            .map(|r| r.revision.clone())
            .collect()
    } else {
        Vec::new()
    };
    let overflow_cut = about_to_be_retired.last().cloned();

    if core.config.frontier_advance_enabled() {
        advance_retiring_frontiers(core, &about_to_be_retired, stop)?;
    }

    if !updates.is_empty() {
        core.store.update_timestamps(&updates)?;
    }

    if let Some(cut) = overflow_cut {
        core.deletion_queue.push(cut);
    }

    Ok(())
}

/// Optional step: for each about-to-retire revision with `latestFileMod`
/// rows, ask the external frontier service to move those files forward
/// and wait until it has, so deletion never orphans in-flight per-file
/// state.
fn advance_retiring_frontiers(core: &CsetCore, retiring: &[Revision], stop: &StopSignal) -> CsetResult<()> {
    let stale = core.store.latest_file_mod_revisions_with_frontiers(retiring)?;
    if stale.is_empty() {
        return Ok(());
    }

    let newest = match core.store.tip()? {
        Some(row) => row.revision,
        None => return Ok(()),
    };

    for revision in &stale {
        let files = core.store.latest_file_mod_files_pointing_at(revision)?;
        if files.is_empty() {
            continue;
        }
        core.frontier.advance_frontier(&files, &newest)?;

        loop {
            let still_stale = core
                .store
                .latest_file_mod_revisions_with_frontiers(std::slice::from_ref(revision))?;
            if still_stale.is_empty() {
                break;
            }
            if stop.sleep(TUID_EXISTENCE_WAIT_TIME) {
                return Ok(());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cset_core::traits::FrontierAdvancer;
    use cset_core::{CsetConfig, CsetRow};
    use cset_fetch::fake::FakeChangelogSource;
    use cset_store::CsetStore;
    use std::sync::{Arc, Mutex};

    fn rev(s: &str) -> Revision {
        Revision::new(s)
    }

    fn row(revnum: i64, revision: &str, timestamp: i64) -> CsetRow {
        CsetRow {
            revnum,
            revision: Revision::new(revision),
            timestamp,
        }
    }

    fn config_with(min_permanent: i64, max_nonpermanent: i64, frontier_advance: bool) -> CsetConfig {
        CsetConfig {
            min_permanent: Some(min_permanent),
            max_nonpermanent: Some(max_nonpermanent),
            update_very_old_frontiers: Some(frontier_advance),
            ..CsetConfig::default()
        }
    }

    fn six_row_store() -> Arc<CsetStore> {
        let store = CsetStore::open_in_memory().unwrap();
        store
            .insert_batch_and_compact(&[
                row(0, "aaaaaaaaaaaa", -1),
                row(1, "bbbbbbbbbbbb", -1),
                row(2, "cccccccccccc", -1),
                row(3, "dddddddddddd", -1),
                row(4, "eeeeeeeeeeee", -1),
                row(5, "ffffffffffff", -1),
            ])
            .unwrap();
        Arc::new(store)
    }

    /// `MIN_PERMANENT = 2`, `MAX_NONPERMANENT = 3`, six rows all
    /// starting permanent: the newest 2 stay permanent, the next 3 get
    /// stamped with wall time, and the oldest row is scheduled onto the
    /// deletion queue.
    #[test]
    fn tick_stamps_aged_rows_and_schedules_the_overflow_for_deletion() {
        let store = six_row_store();
        let source = Arc::new(FakeChangelogSource::new(vec![rev("zzzzzzzzzzzz")], 2));
        let core = CsetCore::new(store, source, config_with(2, 3, false));
        let (_handle, stop) = crate::control::stop_channel();

        tick(&core, &stop).unwrap();

        let rows = core.store.all_rows_ascending().unwrap();
        assert_eq!(rows.len(), 6);

        // Newest 2 (eee, fff) are exempt.
        assert_eq!(rows[4].revision, rev("eeeeeeeeeeee"));
        assert_eq!(rows[4].timestamp, PERMANENT_TIMESTAMP);
        assert_eq!(rows[5].revision, rev("ffffffffffff"));
        assert_eq!(rows[5].timestamp, PERMANENT_TIMESTAMP);

        // Next 3 (bbb, ccc, ddd) just aged out of the permanent window.
        for r in &rows[1..4] {
            assert_ne!(r.timestamp, PERMANENT_TIMESTAMP);
        }

        // Oldest row (aaa) is the one row beyond MAX_NONPERMANENT=3
        // non-permanent rows and is scheduled for deletion.
        assert!(!core.deletion_queue.is_empty());
        assert_eq!(core.deletion_queue.snapshot(), vec![rev("aaaaaaaaaaaa")]);
    }

    #[test]
    fn tick_is_a_noop_below_both_thresholds() {
        let store = Arc::new(CsetStore::open_in_memory().unwrap());
        store
            .insert_batch_and_compact(&[row(0, "aaaaaaaaaaaa", -1), row(1, "bbbbbbbbbbbb", -1)])
            .unwrap();
        let source = Arc::new(FakeChangelogSource::new(vec![rev("zzzzzzzzzzzz")], 2));
        let core = CsetCore::new(store, source, config_with(10, 10, false));
        let (_handle, stop) = crate::control::stop_channel();

        tick(&core, &stop).unwrap();

        let rows = core.store.all_rows_ascending().unwrap();
        assert!(rows.iter().all(|r| r.timestamp == PERMANENT_TIMESTAMP));
        assert!(core.deletion_queue.is_empty());
    }

    /// Clears the local `latestFileMod` row it's asked to advance,
    /// simulating the external frontier service having moved the
    /// file's pointer off the retiring revision.
    struct RecordingFrontierAdvancer {
        store: Arc<CsetStore>,
        seen_files: Mutex<Vec<Vec<String>>>,
    }

    impl FrontierAdvancer for RecordingFrontierAdvancer {
        fn advance_frontier(&self, files: &[String], new_revision: &Revision) -> CsetResult<()> {
            self.seen_files.lock().unwrap().push(files.to_vec());
            let _ = new_revision;
            self.store.delete_latest_file_mod(&[rev("aaaaaaaaaaaa")])?;
            Ok(())
        }
    }

    /// With `UPDATE_VERY_OLD_FRONTIERS` enabled, the frontier-advance
    /// step must run over the about-to-be-retired (overflow) rows, not
    /// the rows that merely aged out of the permanent window this
    /// cycle. `bbb` ages out this cycle but is nowhere near overflow
    /// and must not trigger a frontier advance; only `aaa` (the
    /// overflow row, which owns `x.rs`) should.
    #[test]
    fn frontier_advance_runs_on_the_overflow_set_not_the_newly_aged_set() {
        let store = six_row_store();
        store
            .with_conn(|conn| {
                conn.execute_batch(
                    "INSERT INTO latestFileMod (file, revision) VALUES ('x.rs', 'aaaaaaaaaaaa');
                     INSERT INTO latestFileMod (file, revision) VALUES ('y.rs', 'bbbbbbbbbbbb');",
                )?;
                Ok(())
            })
            .unwrap();

        let source = Arc::new(FakeChangelogSource::new(vec![rev("zzzzzzzzzzzz")], 2));
        let advancer = Arc::new(RecordingFrontierAdvancer {
            store: store.clone(),
            seen_files: Mutex::new(Vec::new()),
        });
        let core = CsetCore::new(store, source, config_with(2, 3, true)).with_frontier_advancer(advancer.clone());
        let (_handle, stop) = crate::control::stop_channel();

        tick(&core, &stop).unwrap();

        let seen = advancer.seen_files.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], vec!["x.rs".to_string()]);
    }
}
