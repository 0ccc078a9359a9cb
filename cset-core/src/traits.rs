//! Narrow capability interfaces used at component seams.
//!
//! The core and the external TUID/frontier service would otherwise hold
//! references to each other (the core schedules deletions only after
//! frontiers have advanced; the frontier service needs the core's
//! notion of "current newest revision"). Rather than construct both
//! sides through an outer assembly that wires them together after
//! construction, the core depends only on the narrow capability it
//! actually needs from the other side.

use crate::errors::CsetResult;
use crate::types::Revision;

/// The single operation the maintenance worker needs from the external
/// TUID service when `update_very_old_frontiers` is enabled: move a
/// file's `latestFileMod` pointer forward to `new_revision`.
pub trait FrontierAdvancer: Send + Sync {
    fn advance_frontier(&self, files: &[String], new_revision: &Revision) -> CsetResult<()>;
}

/// A no-op advancer used when the optional frontier-advance step is
/// disabled or when no external service is wired in.
pub struct NullFrontierAdvancer;

impl FrontierAdvancer for NullFrontierAdvancer {
    fn advance_frontier(&self, _files: &[String], _new_revision: &Revision) -> CsetResult<()> {
        Ok(())
    }
}
