//! The Deleter Worker (C7): drains the deletion queue scheduled by
//! maintenance, cascading each boundary through `latestFileMod`,
//! `annotations`, and the cset log itself.

use cset_core::constants::CSET_DELETION_WAIT_TIME;
use cset_core::{CsetResult, Revision};

use crate::control::StopSignal;
use crate::core::CsetCore;

/// Runs the deleter worker's loop until `stop` is signalled.
pub fn run(core: &CsetCore, stop: &StopSignal) {
    loop {
        if stop.is_stopped() {
            return;
        }
        if !core.config.deletion_enabled() || core.deletion_queue.is_empty() {
            if stop.sleep(CSET_DELETION_WAIT_TIME) {
                return;
            }
            continue;
        }

        if let Err(e) = tick(core) {
            tracing::warn!(error = %e, "deleter worker iteration failed, retrying next tick");
        }

        if stop.sleep(CSET_DELETION_WAIT_TIME) {
            return;
        }
    }
}

/// One iteration: for each scheduled boundary, cascade-delete every
/// row at or below its revnum, then compact.
pub fn tick(core: &CsetCore) -> CsetResult<()> {
    let _guard = core.lock_working();

    let boundaries = core.deletion_queue.snapshot();
    let mut processed: Vec<Revision> = Vec::new();

    for boundary in &boundaries {
        let cut_revnum = match core.store.lookup_by_rev(boundary)? {
            Some(revnum) => revnum,
            None => {
                processed.push(boundary.clone());
                continue;
            }
        };

        let revs_to_delete: Vec<Revision> = core
            .store
            .range(i64::MIN, cut_revnum)?
            .into_iter()
            .map(|row| row.revision)
            .collect();

        if !revs_to_delete.is_empty() {
            core.store.delete_latest_file_mod(&revs_to_delete)?;
            core.store.delete_annotations(&revs_to_delete)?;
            core.store.delete_by_revs(&revs_to_delete)?;
            core.store.compact()?;
        }

        processed.push(boundary.clone());
    }

    core.deletion_queue.remove_processed(&processed);
    Ok(())
}
