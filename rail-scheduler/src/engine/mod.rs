//! Conflict detection engine.
//!
//! Everything here is synchronous and works on a consistent snapshot of the
//! network and the run set. Routes come from a [`RouteProvider`], so the
//! same checks run against a bare [`Network`](crate::network::Network) or a
//! [`RouteCache`] in front of it.

mod availability;
mod cache;
mod capacity;
mod resolver;
mod route;
mod segments;
mod timing;

#[cfg(test)]
mod scenario_tests;

pub use availability::{Availability, RoutingFailure, validate_route_availability};
pub use cache::{RouteCache, RouteCacheConfig};
pub use capacity::{
    CapacityConflict, analyze_network_capacity, analyze_station_capacity,
    analyze_upcoming_capacity,
};
pub use resolver::{Resolution, resolve_capacity_conflict};
pub use route::{Route, RouteLeg, RouteProvider, compute_route};
pub use segments::{
    Conflict, SegmentOccupancy, check_segment_conflicts, run_occupancy, segment_occupancy,
};
pub use timing::{StationTiming, StopRole, allocate_station_times, normalize_anchors};
