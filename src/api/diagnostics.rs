use serde::{Deserialize, Serialize};

use super::scheduler::SchedulerState;

/// Observable health signals of the map core.
///
/// A pin count and a failure count are the only user-facing signals the
/// tool surfaces; the rest serves operator debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    /// Markers currently drawn on the active surface.
    pub marker_count: usize,
    /// Clusters dropped from a draw pass because no provider could place
    /// them. Accumulates over the session.
    pub resolution_failures: u64,
    /// Completed draw passes.
    pub draw_passes: u64,
    /// Draw passes superseded mid-flight and discarded.
    pub stale_passes: u64,
    /// Parcel keys resolved so far this session.
    pub cache_entries: usize,
    pub surface_ready: bool,
    pub scheduler_state: SchedulerState,
}
