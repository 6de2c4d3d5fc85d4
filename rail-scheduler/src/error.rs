//! Scheduling error types.
//!
//! Every failure the engine can report is a variant here. Errors are plain
//! values; callers decide whether to retry after the network changes.

use crate::domain::{ClockTime, StationId};
use crate::engine::Conflict;

/// Errors from routing, timing, capacity resolution and committing runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    /// A referenced station or segment does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Degenerate route request (same endpoints, unknown or inactive station)
    #[error("invalid endpoints: {0}")]
    InvalidEndpoints(String),

    /// Origin and destination are disconnected in the active network
    #[error("no route from {origin} to {destination}")]
    NoRouteFound {
        origin: StationId,
        destination: StationId,
    },

    /// Route has zero total distance, so times cannot be interpolated
    #[error("route has zero total distance")]
    DegenerateRoute,

    /// Dwell at intermediate stations does not fit between the anchor times
    #[error("dwell of {dwell_mins} min exceeds the {span_mins} min available")]
    InsufficientRunningTime { span_mins: i64, dwell_mins: i64 },

    /// Capacity can only be restored by removing a manually scheduled run
    #[error(
        "capacity conflict at {station} from {window_start} needs {remaining_excess} manual run(s) removed"
    )]
    UnresolvableConflict {
        station: StationId,
        window_start: ClockTime,
        remaining_excess: usize,
    },

    /// Capacity window size outside 1..=1440 minutes
    #[error("invalid capacity window: {0} minutes")]
    InvalidWindow(u32),

    /// Network reference data is inconsistent
    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    /// Every run id has been issued
    #[error("no run ids left")]
    RunIdsExhausted,

    /// Candidate run overlaps runs already on the schedule
    #[error("run is not available: {} conflict(s)", .conflicts.len())]
    Unavailable { conflicts: Vec<Conflict> },
}

impl SchedulingError {
    pub(crate) fn station_not_found(id: &StationId) -> Self {
        SchedulingError::NotFound {
            kind: "station",
            id: id.to_string(),
        }
    }

    pub(crate) fn segment_not_found(a: &StationId, b: &StationId) -> Self {
        SchedulingError::NotFound {
            kind: "segment",
            id: format!("{a}-{b}"),
        }
    }
}
