//! Per-station times for a route.
//!
//! Given a route and the run's departure and arrival, each station is
//! assigned a crossing time by linear interpolation over distance. Dwell
//! configured at intermediate stations is reserved out of the running time,
//! so the destination still lands exactly on the requested arrival.

use serde::Serialize;
use tracing::trace;

use super::route::Route;
use crate::domain::{ClockTime, ServiceTime, StationId};
use crate::error::SchedulingError;

/// Where on its route a station lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopRole {
    Origin,
    Intermediate,
    Destination,
}

/// Arrival and departure at one station of a route.
///
/// Times are on the run's own timeline; use [`StationTiming::arrival_clock`]
/// and friends for wall-clock output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationTiming {
    pub station: StationId,
    pub role: StopRole,
    pub arrival: ServiceTime,
    pub departure: ServiceTime,
}

impl StationTiming {
    pub fn arrival_clock(&self) -> ClockTime {
        self.arrival.clock()
    }

    pub fn departure_clock(&self) -> ClockTime {
        self.departure.clock()
    }

    /// True if the run reaches this station after midnight.
    pub fn arrives_next_day(&self) -> bool {
        self.arrival.is_next_day()
    }

    /// The instants at which the run occupies this station.
    ///
    /// The origin is only left and the destination only reached; a station
    /// passed through is both reached and left.
    pub fn usage_instants(&self) -> Vec<ServiceTime> {
        match self.role {
            StopRole::Origin => vec![self.departure],
            StopRole::Destination => vec![self.arrival],
            StopRole::Intermediate => vec![self.arrival, self.departure],
        }
    }
}

/// Put the two anchor times on one timeline.
///
/// An arrival at or before the departure is on the next day, so the span is
/// always positive and at most 24 hours.
pub fn normalize_anchors(departure: ClockTime, arrival: ClockTime) -> (ServiceTime, ServiceTime) {
    let dep = departure.on_first_day();
    let arr = arrival.on_first_day();
    if arrival <= departure {
        (dep, arr.shifted_days(1))
    } else {
        (dep, arr)
    }
}

/// Allocate arrival and departure times to every station of a route.
///
/// # Errors
///
/// - `DegenerateRoute` if the route has zero total distance
/// - `InsufficientRunningTime` if intermediate dwell exceeds the time
///   between departure and arrival
pub fn allocate_station_times(
    route: &Route,
    departure: ClockTime,
    arrival: ClockTime,
) -> Result<Vec<StationTiming>, SchedulingError> {
    let total = route.total_distance();
    if total == 0 {
        return Err(SchedulingError::DegenerateRoute);
    }

    let (dep, arr) = normalize_anchors(departure, arrival);
    let span = arr.seconds() - dep.seconds();

    let stations = route.stations();
    let last = stations.len() - 1;
    let dwell_total: i64 = (1..last).map(|i| route.dwell_at(i).num_seconds()).sum();
    let running = span - dwell_total;
    if running < 0 {
        return Err(SchedulingError::InsufficientRunningTime {
            span_mins: span / 60,
            dwell_mins: dwell_total / 60,
        });
    }

    let mut timings = Vec::with_capacity(stations.len());
    let mut covered: u64 = 0;
    let mut dwell_so_far: i64 = 0;

    for (i, station) in stations.iter().enumerate() {
        if i > 0 {
            covered += route.legs()[i - 1].distance as u64;
        }

        let timing = if i == 0 {
            StationTiming {
                station: station.clone(),
                role: StopRole::Origin,
                arrival: dep,
                departure: dep,
            }
        } else if i == last {
            StationTiming {
                station: station.clone(),
                role: StopRole::Destination,
                arrival: arr,
                departure: arr,
            }
        } else {
            let travelled = (running as i128 * covered as i128 / total as i128) as i64;
            let reached = ServiceTime::from_seconds(dep.seconds() + travelled + dwell_so_far);
            let dwell = route.dwell_at(i);
            dwell_so_far += dwell.num_seconds();
            StationTiming {
                station: station.clone(),
                role: StopRole::Intermediate,
                arrival: reached,
                departure: reached + dwell,
            }
        };

        trace!(
            station = %timing.station,
            arrival = %timing.arrival,
            departure = %timing.departure,
            "Allocated station time"
        );
        timings.push(timing);
    }

    Ok(timings)
}
