//! Can a candidate run be added to the schedule?

use tracing::debug;

use super::route::RouteProvider;
use super::segments::{Conflict, check_segment_conflicts};
use super::timing::allocate_station_times;
use crate::domain::{ClockTime, Run, StationId};
use crate::error::SchedulingError;

/// The candidate could not be routed or timed.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingFailure {
    pub error: SchedulingError,
}

/// Availability of a candidate run against the other scheduled runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    pub available: bool,
    pub conflicts: Vec<Conflict>,
    pub failure: Option<RoutingFailure>,
}

impl Availability {
    fn failed(error: SchedulingError) -> Self {
        Self {
            available: false,
            conflicts: Vec::new(),
            failure: Some(RoutingFailure { error }),
        }
    }

    /// `Ok` if available, otherwise the routing error or an `Unavailable`
    /// error carrying the conflicts.
    pub fn into_result(self) -> Result<(), SchedulingError> {
        match self.failure {
            Some(RoutingFailure { error }) => Err(error),
            None if self.available => Ok(()),
            None => Err(SchedulingError::Unavailable {
                conflicts: self.conflicts,
            }),
        }
    }
}

/// Route, time and conflict-check a candidate run.
///
/// The run is available when it can be routed and timed and no other active
/// run shares any of its segments at the same time.
pub fn validate_route_availability<P: RouteProvider + ?Sized>(
    provider: &P,
    origin: &StationId,
    destination: &StationId,
    departure: ClockTime,
    arrival: ClockTime,
    other_runs: &[Run],
) -> Availability {
    let route = match provider.route(origin, destination) {
        Ok(route) => route,
        Err(error) => {
            debug!(origin = %origin, destination = %destination, error = %error, "Cannot route candidate");
            return Availability::failed(error);
        }
    };
    let timing = match allocate_station_times(&route, departure, arrival) {
        Ok(timing) => timing,
        Err(error) => {
            debug!(origin = %origin, destination = %destination, error = %error, "Cannot time candidate");
            return Availability::failed(error);
        }
    };

    let conflicts = match check_segment_conflicts(provider, &route, &timing, other_runs) {
        Ok(conflicts) => conflicts,
        Err(error) => return Availability::failed(error),
    };
    debug!(
        origin = %origin,
        destination = %destination,
        departure = %departure,
        arrival = %arrival,
        conflicts = conflicts.len(),
        "Availability checked"
    );

    Availability {
        available: conflicts.is_empty(),
        conflicts,
        failure: None,
    }
}
