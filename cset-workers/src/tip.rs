//! The Tip Worker (C4): periodically extends the log forward to the
//! remote tip.

use cset_core::constants::{CSET_TIP_WAIT_TIME, MIN_PERMANENT};
use cset_core::{CsetResult, FillBoundary, FillDirection};
use cset_fetch::TIP_CURSOR;

use crate::control::StopSignal;
use crate::core::CsetCore;
use crate::filler::fill;

/// Runs the tip worker's loop until `stop` is signalled.
pub fn run(core: &CsetCore, stop: &StopSignal) {
    loop {
        if stop.is_stopped() {
            return;
        }
        if !core.config.tipfilling_enabled() {
            if stop.sleep(CSET_TIP_WAIT_TIME) {
                return;
            }
            continue;
        }

        match tick(core) {
            Ok(updated) => {
                if updated {
                    tracing::info!("tip worker extended the log");
                }
            }
            Err(e) => tracing::warn!(error = %e, "tip worker iteration failed, retrying next tick"),
        }

        if stop.sleep(CSET_TIP_WAIT_TIME) {
            return;
        }
    }
}

/// One iteration of the tip worker's 7-step algorithm. Returns `Ok(true)`
/// if the log was extended.
pub fn tick(core: &CsetCore) -> CsetResult<bool> {
    let page = core.fetcher.fetch_page(TIP_CURSOR)?;
    let first_remote = page.entries[0].clone();
    let known = core.store.tip()?;

    if known.as_ref().map(|r| &r.revision) == Some(&first_remote) {
        return Ok(false);
    }

    let _guard = core.lock_working();
    core.set_at_tip(false);

    let boundary = match &known {
        Some(row) => FillBoundary::Revision(row.revision.clone()),
        None => FillBoundary::Count(MIN_PERMANENT as usize),
    };

    fill(
        core.fetcher.as_ref(),
        &core.store,
        boundary,
        TIP_CURSOR,
        false,
        FillDirection::Forward,
    )?;

    core.set_at_tip(true);
    Ok(true)
}
