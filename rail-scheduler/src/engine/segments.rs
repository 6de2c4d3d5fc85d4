//! Segment conflict detection.
//!
//! A segment is an exclusive-use resource: two runs may not be on it at the
//! same time. A run occupies a segment from its departure at the leg's first
//! station until its arrival at the leg's second station.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::route::{Route, RouteProvider};
use super::timing::{StationTiming, allocate_station_times};
use crate::domain::{Run, RunId, SegmentId, StationId, TimeWindow};
use crate::error::SchedulingError;

/// A run's use of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentOccupancy {
    pub segment: SegmentId,
    pub from: StationId,
    pub to: StationId,
    pub window: TimeWindow,
}

/// Two runs on the same segment at the same time.
///
/// All windows are on the candidate run's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub segment: SegmentId,
    /// Stations bounding the segment, in the candidate's direction of travel.
    pub from: StationId,
    pub to: StationId,
    pub other_run: RunId,
    pub other_number: String,
    pub candidate_window: TimeWindow,
    pub other_window: TimeWindow,
    pub overlap: TimeWindow,
}

/// Segment occupancy windows for a timed route.
///
/// # Errors
///
/// `InvalidNetwork` if `timing` does not have one entry per route station.
pub fn segment_occupancy(
    route: &Route,
    timing: &[StationTiming],
) -> Result<Vec<SegmentOccupancy>, SchedulingError> {
    if timing.len() != route.stations().len() {
        return Err(SchedulingError::InvalidNetwork(format!(
            "route has {} stations but {} timings",
            route.stations().len(),
            timing.len()
        )));
    }

    Ok(route
        .legs()
        .iter()
        .zip(timing.windows(2))
        .map(|(leg, ends)| SegmentOccupancy {
            segment: leg.segment,
            from: leg.from.clone(),
            to: leg.to.clone(),
            window: TimeWindow::new(ends[0].departure, ends[1].arrival),
        })
        .collect())
}

/// Route and time a scheduled run, returning its segment occupancy.
pub fn run_occupancy<P: RouteProvider + ?Sized>(
    provider: &P,
    run: &Run,
) -> Result<Vec<SegmentOccupancy>, SchedulingError> {
    let route = provider.route(&run.origin, &run.destination)?;
    let timing = allocate_station_times(&route, run.departure, run.arrival)?;
    segment_occupancy(&route, &timing)
}

/// Find every other active run that shares a segment with the candidate at
/// the same time.
///
/// Windows are half-open, so a run entering a segment exactly when another
/// leaves it is not a conflict. Runs are compared on a 24-hour cycle: a run
/// still on the line after midnight conflicts with an early candidate.
/// Inactive runs and runs that cannot be routed are ignored.
///
/// Conflicts are ordered by station pair, then by the other run's id.
///
/// # Errors
///
/// `InvalidNetwork` if the candidate's `timing` does not match `route`.
pub fn check_segment_conflicts<P: RouteProvider + ?Sized>(
    provider: &P,
    route: &Route,
    timing: &[StationTiming],
    other_runs: &[Run],
) -> Result<Vec<Conflict>, SchedulingError> {
    let candidate: HashMap<SegmentId, SegmentOccupancy> = segment_occupancy(route, timing)?
        .into_iter()
        .map(|occ| (occ.segment, occ))
        .collect();

    let mut conflicts = Vec::new();

    for run in other_runs.iter().filter(|r| r.active) {
        let occupancy = match run_occupancy(provider, run) {
            Ok(occ) => occ,
            Err(e) => {
                warn!(
                    run = %run.id,
                    number = %run.number,
                    error = %e,
                    "Skipping run that cannot be timed"
                );
                continue;
            }
        };

        for other in occupancy {
            let Some(mine) = candidate.get(&other.segment) else {
                continue;
            };
            let Some((overlap, shift)) = mine.window.overlap_across_days(&other.window) else {
                continue;
            };

            trace!(
                segment = %other.segment,
                run = %run.id,
                overlap = %overlap,
                "Segment conflict"
            );

            conflicts.push(Conflict {
                segment: other.segment,
                from: mine.from.clone(),
                to: mine.to.clone(),
                other_run: run.id,
                other_number: run.number.clone(),
                candidate_window: mine.window,
                other_window: other.window.shifted_days(shift),
                overlap,
            });
        }
    }

    conflicts.sort_by(|a, b| (&a.from, &a.to, a.other_run).cmp(&(&b.from, &b.to, b.other_run)));

    debug!(
        segments = candidate.len(),
        runs = other_runs.len(),
        conflicts = conflicts.len(),
        "Segment conflict check complete"
    );

    Ok(conflicts)
}
