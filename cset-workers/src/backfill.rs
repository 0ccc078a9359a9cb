//! The Backfill Worker (C5): drains queued "extend backward to this
//! changeset" demands raised by the query facade.

use cset_core::constants::CSET_BACKFILL_WAIT_TIME;
use cset_core::{CsetResult, FillBoundary, FillDirection};

use crate::control::StopSignal;
use crate::core::CsetCore;
use crate::filler::fill;
use crate::queues::BackfillRequest;

/// Runs the backfill worker's loop until `stop` is signalled.
pub fn run(core: &CsetCore, stop: &StopSignal) {
    loop {
        if stop.is_stopped() {
            return;
        }
        if !core.config.backfilling_enabled() || core.backfill_queue.is_empty() {
            if stop.sleep(CSET_BACKFILL_WAIT_TIME) {
                return;
            }
            continue;
        }

        if let Err(e) = tick(core) {
            tracing::warn!(error = %e, "backfill worker iteration failed, retrying next tick");
        }

        if stop.sleep(CSET_BACKFILL_WAIT_TIME) {
            return;
        }
    }
}

/// One iteration: snapshot the queue, fill backward from the current
/// tail to each still-unresolved target, then drop the entries that
/// were actually processed.
pub fn tick(core: &CsetCore) -> CsetResult<()> {
    let _guard = core.lock_working();

    let requests = core.backfill_queue.snapshot();
    let mut processed: Vec<BackfillRequest> = Vec::new();

    for request in &requests {
        if core.store.lookup_by_rev(&request.target)?.is_some() {
            processed.push(request.clone());
            continue;
        }

        let tail = match core.store.tail()? {
            Some(row) => row,
            None => continue,
        };

        fill(
            core.fetcher.as_ref(),
            &core.store,
            FillBoundary::Revision(request.target.clone()),
            tail.revision.as_str(),
            request.stamp,
            FillDirection::Backward,
        )?;

        processed.push(request.clone());
    }

    core.backfill_queue.remove_processed(&processed);
    Ok(())
}
