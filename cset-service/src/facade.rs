//! The Query Facade (C8): the one public entry point callers outside
//! the worker fleet use, resolving missing endpoints on demand rather
//! than failing the query.

use cset_core::constants::CSET_BACKFILL_WAIT_TIME;
use cset_core::{CsetError, CsetResult, CsetRow, Revision};
use cset_workers::control::StopSignal;
use cset_workers::core::CsetCore;
use cset_workers::tip;

/// `range_of(rev_a, rev_b)`: returns every row between the two
/// changesets, inclusive, ordered ascending by revnum. Transparently
/// extends the log (synchronously for the tip, by queueing for the
/// backfill worker otherwise) when either endpoint isn't resident yet.
pub fn range_of(
    core: &CsetCore,
    stop: &StopSignal,
    rev_a: &Revision,
    rev_b: &Revision,
) -> CsetResult<Vec<CsetRow>> {
    let mut revnum_a = core.store.lookup_by_rev(rev_a)?;

    if revnum_a.is_none() {
        tip::tick(core)?;
        revnum_a = core.store.lookup_by_rev(rev_a)?;
    }

    if revnum_a.is_none() {
        core.backfill_queue.push(rev_a.clone(), true);
        revnum_a = Some(wait_for(core, stop, rev_a)?);
    }

    let mut revnum_b = core.store.lookup_by_rev(rev_b)?;
    if revnum_b.is_none() {
        core.backfill_queue.push(rev_b.clone(), true);
        revnum_b = Some(wait_for(core, stop, rev_b)?);
    }

    let a = revnum_a.expect("resolved above");
    let b = revnum_b.expect("resolved above");
    core.store.range(a.min(b), a.max(b))
}

/// Blocks, polling at the backfill worker's cadence, until `revision`
/// resolves to a revnum. The backfill worker is expected to be running
/// concurrently and draining the queue this call just pushed onto.
fn wait_for(core: &CsetCore, stop: &StopSignal, revision: &Revision) -> CsetResult<i64> {
    loop {
        if let Some(revnum) = core.store.lookup_by_rev(revision)? {
            return Ok(revnum);
        }
        if stop.sleep(CSET_BACKFILL_WAIT_TIME) {
            return Err(CsetError::ShuttingDown(revision.to_string()));
        }
    }
}
