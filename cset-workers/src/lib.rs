//! # cset-workers
//!
//! The four background workers that cooperate over a [`CsetCore`]: the
//! tip, backfill, maintenance, and deleter workers (C4-C7), plus the
//! range filler (C3) they all call into and the cooperative-cancellation
//! primitive (`StopHandle`/`StopSignal`) that governs their lifetime.

pub mod backfill;
pub mod control;
pub mod core;
pub mod deleter;
pub mod filler;
pub mod maintenance;
pub mod queues;
pub mod tip;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cset_core::{CsetResult, FillBoundary, FillDirection};
use cset_fetch::TIP_CURSOR;

use control::{stop_channel, StopHandle, StopSignal};
use core::CsetCore;
use filler::fill;

/// A running fleet of the four background workers. Dropping or calling
/// [`WorkerFleet::shutdown`] signals every worker to stop at its next
/// cooperative checkpoint and waits for all four threads to exit.
pub struct WorkerFleet {
    stop: Option<StopHandle>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerFleet {
    pub fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            stop.stop();
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Fills the log to at least `MIN_PERMANENT` rows if it is empty, then
/// spawns the four workers, each on its own thread, sharing `core`.
///
/// This mirrors the upstream cache's construction-time bootstrap: a
/// fresh cache has no rows to serve queries from until the initial
/// window is populated, so bootstrapping happens synchronously before
/// the background workers (which assume a non-empty log for most of
/// their bookkeeping) ever run.
pub fn bootstrap_and_spawn(core: Arc<CsetCore>) -> CsetResult<WorkerFleet> {
    bootstrap(&core)?;

    let (stop, signal) = stop_channel();
    let handles = spawn_workers(core, signal);

    Ok(WorkerFleet {
        stop: Some(stop),
        handles,
    })
}

fn bootstrap(core: &Arc<CsetCore>) -> CsetResult<()> {
    if core.store.tip()?.is_some() {
        return Ok(());
    }

    let _guard = core.lock_working();
    if core.store.tip()?.is_some() {
        return Ok(());
    }

    let min_permanent = core.config.effective_min_permanent();
    fill(
        core.fetcher.as_ref(),
        &core.store,
        FillBoundary::Count(min_permanent as usize),
        TIP_CURSOR,
        false,
        FillDirection::Forward,
    )?;
    Ok(())
}

/// Spawns the four worker threads against an already-bootstrapped
/// `core`, sharing one `StopSignal` clone per thread.
pub fn spawn_workers(core: Arc<CsetCore>, signal: StopSignal) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(4);

    handles.push(spawn_one(core.clone(), signal.clone(), "cset-tip", tip::run));
    handles.push(spawn_one(core.clone(), signal.clone(), "cset-backfill", backfill::run));
    handles.push(spawn_one(core.clone(), signal.clone(), "cset-maintenance", maintenance::run));
    handles.push(spawn_one(core, signal, "cset-deleter", deleter::run));

    handles
}

fn spawn_one(
    core: Arc<CsetCore>,
    signal: StopSignal,
    name: &'static str,
    run: fn(&CsetCore, &StopSignal),
) -> JoinHandle<()> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || run(&core, &signal))
        .expect("failed to spawn worker thread")
}
