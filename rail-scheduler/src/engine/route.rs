//! Shortest-path routing over the active network.
//!
//! Dijkstra over non-negative segment distances. Labels are ordered by
//! `(distance, stations visited, station ids)`, which is monotone under
//! extension, so the first label settled for a station is final and the
//! search is deterministic even when several paths tie on distance.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::{SegmentId, StationId};
use crate::error::SchedulingError;
use crate::network::{Network, NetworkGraph};

/// One traversed segment of a route, in travel order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteLeg {
    pub segment: SegmentId,
    pub from: StationId,
    pub to: StationId,
    pub distance: u32,
}

/// A path from origin to destination.
///
/// # Invariants
///
/// - At least two stations
/// - `stations().len() == legs().len() + 1`
/// - Leg `i` runs from station `i` to station `i + 1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    stations: Vec<StationId>,
    legs: Vec<RouteLeg>,
    /// Dwell at each station, parallel to `stations`.
    dwell: Vec<Duration>,
    total_distance: u64,
}

impl Route {
    /// Assemble a route from its legs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidNetwork` if there are no legs, the legs do not chain
    /// from one to the next, or `dwell` does not have one entry per station.
    pub fn new(legs: Vec<RouteLeg>, dwell: Vec<Duration>) -> Result<Self, SchedulingError> {
        let first = legs
            .first()
            .ok_or_else(|| SchedulingError::InvalidNetwork("route has no legs".into()))?;

        let mut stations = Vec::with_capacity(legs.len() + 1);
        stations.push(first.from.clone());
        for leg in &legs {
            if stations.last() != Some(&leg.from) {
                return Err(SchedulingError::InvalidNetwork(format!(
                    "route leg {} does not start at {}",
                    leg.segment,
                    stations.last().map(|s| s.as_str()).unwrap_or_default()
                )));
            }
            stations.push(leg.to.clone());
        }

        if dwell.len() != stations.len() {
            return Err(SchedulingError::InvalidNetwork(format!(
                "route has {} stations but {} dwell entries",
                stations.len(),
                dwell.len()
            )));
        }

        let total_distance = legs.iter().map(|l| l.distance as u64).sum();

        Ok(Self {
            stations,
            legs,
            dwell,
            total_distance,
        })
    }

    pub fn origin(&self) -> &StationId {
        &self.stations[0]
    }

    pub fn destination(&self) -> &StationId {
        &self.stations[self.stations.len() - 1]
    }

    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }

    pub fn total_distance(&self) -> u64 {
        self.total_distance
    }

    /// Dwell at the station with the given index on this route.
    pub fn dwell_at(&self, index: usize) -> Duration {
        self.dwell.get(index).copied().unwrap_or_else(Duration::zero)
    }

    /// Index of a station on this route.
    pub fn position(&self, station: &StationId) -> Option<usize> {
        self.stations.iter().position(|s| s == station)
    }

    pub fn contains(&self, station: &StationId) -> bool {
        self.position(station).is_some()
    }
}

/// Source of routes between stations.
///
/// This abstraction allows the conflict checks to share cached routes, and
/// to be tested with a fixed topology.
pub trait RouteProvider {
    fn route(
        &self,
        origin: &StationId,
        destination: &StationId,
    ) -> Result<Arc<Route>, SchedulingError>;
}

impl RouteProvider for Network {
    fn route(
        &self,
        origin: &StationId,
        destination: &StationId,
    ) -> Result<Arc<Route>, SchedulingError> {
        compute_route(self, origin, destination).map(Arc::new)
    }
}

/// Search label: a path from the origin ending at its last station.
///
/// Field order gives the derived ordering: distance, then station count,
/// then the station ids themselves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Label {
    distance: u64,
    hops: usize,
    path: Vec<StationId>,
}

impl Label {
    fn station(&self) -> &StationId {
        &self.path[self.path.len() - 1]
    }
}

/// Compute the shortest route between two stations.
///
/// Only active stations and active segments are used. Among routes of equal
/// distance the one visiting the fewest stations wins, then the one whose
/// station ids sort first.
///
/// # Errors
///
/// - `InvalidEndpoints` if origin equals destination, or either is unknown
///   or inactive
/// - `NoRouteFound` if the two are not connected in the active network
pub fn compute_route<G: NetworkGraph + ?Sized>(
    graph: &G,
    origin: &StationId,
    destination: &StationId,
) -> Result<Route, SchedulingError> {
    if origin == destination {
        return Err(SchedulingError::InvalidEndpoints(format!(
            "origin and destination are both {origin}"
        )));
    }
    for end in [origin, destination] {
        match graph.station(end) {
            Ok(station) if station.active => {}
            Ok(_) => {
                return Err(SchedulingError::InvalidEndpoints(format!(
                    "station {end} is inactive"
                )));
            }
            Err(_) => {
                return Err(SchedulingError::InvalidEndpoints(format!(
                    "station {end} is unknown"
                )));
            }
        }
    }

    let directional = graph.is_directional();
    let mut best: HashMap<StationId, Label> = HashMap::new();
    let mut settled: HashSet<StationId> = HashSet::new();
    let mut heap = BinaryHeap::new();

    let start = Label {
        distance: 0,
        hops: 1,
        path: vec![origin.clone()],
    };
    best.insert(origin.clone(), start.clone());
    heap.push(Reverse(start));

    while let Some(Reverse(label)) = heap.pop() {
        let station = label.station().clone();
        if !settled.insert(station.clone()) {
            continue;
        }

        trace!(
            station = %station,
            distance = label.distance,
            hops = label.hops,
            "Settled station"
        );

        if &station == destination {
            debug!(
                origin = %origin,
                destination = %destination,
                distance = label.distance,
                stations = label.hops,
                settled = settled.len(),
                "Route found"
            );
            return build_route(graph, label);
        }

        for segment in graph.incident_segments(&station)? {
            if !segment.active {
                continue;
            }
            let next = if directional {
                if segment.a != station {
                    continue;
                }
                &segment.b
            } else {
                match segment.other_end(&station) {
                    Some(next) => next,
                    None => continue,
                }
            };
            if settled.contains(next) || !graph.station(next)?.active {
                continue;
            }

            let mut path = label.path.clone();
            path.push(next.clone());
            let candidate = Label {
                distance: label.distance + segment.distance as u64,
                hops: label.hops + 1,
                path,
            };

            let improves = best.get(next).is_none_or(|current| candidate < *current);
            if improves {
                best.insert(next.clone(), candidate.clone());
                heap.push(Reverse(candidate));
            }
        }
    }

    debug!(origin = %origin, destination = %destination, "No route");
    Err(SchedulingError::NoRouteFound {
        origin: origin.clone(),
        destination: destination.clone(),
    })
}

/// Turn a settled label into a route, looking up each traversed segment.
fn build_route<G: NetworkGraph + ?Sized>(
    graph: &G,
    label: Label,
) -> Result<Route, SchedulingError> {
    let mut legs = Vec::with_capacity(label.path.len() - 1);
    for pair in label.path.windows(2) {
        let segment = graph.segment_between(&pair[0], &pair[1])?;
        legs.push(RouteLeg {
            segment: segment.id,
            from: pair[0].clone(),
            to: pair[1].clone(),
            distance: segment.distance,
        });
    }

    let dwell = label
        .path
        .iter()
        .map(|s| graph.station(s).map(|st| st.dwell()))
        .collect::<Result<Vec<_>, _>>()?;

    Route::new(legs, dwell)
}
