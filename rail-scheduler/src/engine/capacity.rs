//! Station capacity analysis.
//!
//! A station can hold as many runs at once as it has active tracks. The day
//! is cut into fixed windows anchored at midnight, each run is mapped to the
//! windows in which it uses the station, and any window holding more runs
//! than there are tracks is reported.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, trace, warn};

use super::route::RouteProvider;
use super::timing::{StationTiming, allocate_station_times};
use crate::clock::TimeSource;
use crate::domain::{ClockTime, Run, RunId, RunSummary, SECS_PER_DAY, StationId};
use crate::error::SchedulingError;
use crate::network::NetworkGraph;

const MAX_WINDOW_MINS: u32 = 24 * 60;

/// More runs in a station window than the station has tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityConflict {
    pub station: StationId,
    pub capacity: usize,
    pub window_start: ClockTime,
    pub window_end: ClockTime,
    /// Runs using the station in this window, by id.
    pub runs: Vec<RunSummary>,
    /// How many runs are over capacity.
    pub excess: usize,
}

/// A run together with its per-station timing.
struct TimedRun {
    summary: RunSummary,
    timing: Vec<StationTiming>,
}

fn window_secs(window_mins: u32) -> Result<i64, SchedulingError> {
    if window_mins == 0 || window_mins > MAX_WINDOW_MINS {
        return Err(SchedulingError::InvalidWindow(window_mins));
    }
    Ok(window_mins as i64 * 60)
}

/// Route and time every active run once.
///
/// Runs that cannot be routed or timed are logged and left out.
fn time_runs<P: RouteProvider + ?Sized>(provider: &P, runs: &[Run]) -> Vec<TimedRun> {
    runs.iter()
        .filter(|r| r.active)
        .filter_map(|run| {
            let timed = provider
                .route(&run.origin, &run.destination)
                .and_then(|route| allocate_station_times(&route, run.departure, run.arrival));
            match timed {
                Ok(timing) => Some(TimedRun {
                    summary: run.summary(),
                    timing,
                }),
                Err(e) => {
                    warn!(
                        run = %run.id,
                        number = %run.number,
                        error = %e,
                        "Skipping run that cannot be timed"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Bucket the usage of one station and report the windows over capacity.
fn station_conflicts(
    station: &StationId,
    capacity: usize,
    runs: &[TimedRun],
    window: i64,
) -> Vec<CapacityConflict> {
    // Window start (seconds of day) -> runs present, keyed by id so two
    // instants in the same window count once.
    let mut buckets: BTreeMap<i64, BTreeMap<RunId, &RunSummary>> = BTreeMap::new();

    for run in runs {
        for timing in run.timing.iter().filter(|t| &t.station == station) {
            for instant in timing.usage_instants() {
                let of_day = instant.seconds().rem_euclid(SECS_PER_DAY);
                let start = of_day / window * window;
                trace!(station = %station, run = %run.summary.id, window_start = start, "Station use");
                buckets
                    .entry(start)
                    .or_default()
                    .insert(run.summary.id, &run.summary);
            }
        }
    }

    buckets
        .into_iter()
        .filter(|(_, present)| present.len() > capacity)
        .map(|(start, present)| {
            let end = (start + window).min(SECS_PER_DAY);
            CapacityConflict {
                station: station.clone(),
                capacity,
                window_start: ClockTime::from_seconds_wrapping(start),
                window_end: ClockTime::from_seconds_wrapping(end),
                excess: present.len() - capacity,
                runs: present.into_values().cloned().collect(),
            }
        })
        .collect()
}

/// Find the windows in which a station holds more runs than it has tracks.
///
/// A run uses its origin when it departs, its destination when it arrives,
/// and a station it passes through both when it arrives and when it leaves.
/// Windows are `window_mins` long and start at midnight. Stations without
/// active tracks are not analysed.
///
/// # Errors
///
/// - `InvalidWindow` if `window_mins` is not in `1..=1440`
/// - `NotFound` if the station does not exist
pub fn analyze_station_capacity<G, P>(
    graph: &G,
    provider: &P,
    station: &StationId,
    runs: &[Run],
    window_mins: u32,
) -> Result<Vec<CapacityConflict>, SchedulingError>
where
    G: NetworkGraph + ?Sized,
    P: RouteProvider + ?Sized,
{
    let window = window_secs(window_mins)?;
    let capacity = graph.station(station)?.capacity();
    if capacity == 0 {
        debug!(station = %station, "Station has no capacity, skipping analysis");
        return Ok(Vec::new());
    }

    let timed = time_runs(provider, runs);
    let conflicts = station_conflicts(station, capacity, &timed, window);

    debug!(
        station = %station,
        capacity,
        runs = timed.len(),
        conflicts = conflicts.len(),
        "Station capacity analysed"
    );
    Ok(conflicts)
}

/// Capacity analysis for every station, ordered by station then window.
///
/// Each run is routed once for the whole scan.
pub fn analyze_network_capacity<G, P>(
    graph: &G,
    provider: &P,
    runs: &[Run],
    window_mins: u32,
) -> Result<Vec<CapacityConflict>, SchedulingError>
where
    G: NetworkGraph + ?Sized,
    P: RouteProvider + ?Sized,
{
    let window = window_secs(window_mins)?;
    let timed = time_runs(provider, runs);

    let mut conflicts = Vec::new();
    for station in graph.stations() {
        let capacity = station.capacity();
        if capacity == 0 {
            continue;
        }
        conflicts.extend(station_conflicts(&station.id, capacity, &timed, window));
    }

    debug!(
        stations = graph.stations().len(),
        runs = timed.len(),
        conflicts = conflicts.len(),
        "Network capacity analysed"
    );
    Ok(conflicts)
}

/// Capacity conflicts in windows starting within `horizon` of now.
///
/// The window containing the current time is included. The search wraps
/// past midnight, and results are ordered by how soon the window starts,
/// then by station.
pub fn analyze_upcoming_capacity<G, P>(
    graph: &G,
    provider: &P,
    runs: &[Run],
    window_mins: u32,
    clock: &dyn TimeSource,
    horizon: Duration,
) -> Result<Vec<CapacityConflict>, SchedulingError>
where
    G: NetworkGraph + ?Sized,
    P: RouteProvider + ?Sized,
{
    let window = window_secs(window_mins)?;
    let now = clock.now();
    let secs = now.seconds_since_midnight() as i64;
    let current = secs / window * window;
    let horizon = horizon.num_seconds();

    let ahead = |c: &CapacityConflict| {
        (c.window_start.seconds_since_midnight() as i64 - current).rem_euclid(SECS_PER_DAY)
    };

    let mut upcoming: Vec<_> = analyze_network_capacity(graph, provider, runs, window_mins)?
        .into_iter()
        .filter(|c| ahead(c) < horizon)
        .collect();
    upcoming.sort_by(|a, b| (ahead(a), &a.station).cmp(&(ahead(b), &b.station)));

    debug!(
        now = %now,
        horizon_mins = horizon / 60,
        conflicts = upcoming.len(),
        "Upcoming capacity analysed"
    );
    Ok(upcoming)
}
