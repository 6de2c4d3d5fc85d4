//! End-to-end checks over a small layout.

use std::sync::Arc;

use super::*;
use crate::domain::{
    ClockTime, Run, RunId, RunSource, Segment, SegmentId, Station, StationId, TimeWindow, TrackId,
};
use crate::error::SchedulingError;
use crate::network::Network;

fn id(s: &str) -> StationId {
    StationId::parse(s).unwrap()
}

fn clock(s: &str) -> ClockTime {
    ClockTime::parse(s).unwrap()
}

/// NADAHAZA - BLAUMITH - KORNTAL, with a branch from BLAUMITH to OSTHEIM.
fn layout() -> Network {
    Network::builder()
        .station(
            Station::new(id("NADAHAZA"), "Nadahaza")
                .with_track(TrackId(1))
                .with_track(TrackId(2)),
        )
        .station(
            Station::new(id("BLAUMITH"), "Blaumith")
                .with_track(TrackId(3))
                .with_track(TrackId(4)),
        )
        .station(Station::new(id("KORNTAL"), "Korntal").with_track(TrackId(5)))
        .station(Station::new(id("OSTHEIM"), "Ostheim").with_track(TrackId(6)))
        .segment(Segment::new(SegmentId(1), id("NADAHAZA"), id("BLAUMITH"), 380))
        .segment(Segment::new(SegmentId(2), id("BLAUMITH"), id("KORNTAL"), 240))
        .segment(Segment::new(SegmentId(3), id("BLAUMITH"), id("OSTHEIM"), 150))
        .build()
        .unwrap()
}

fn cached() -> RouteCache<Network> {
    RouteCache::new(Arc::new(layout()), &RouteCacheConfig::default())
}

fn run(n: u64, from: &str, to: &str, dep: &str, arr: &str, source: RunSource) -> Run {
    Run {
        id: RunId(n),
        number: format!("IC {n}"),
        origin: id(from),
        destination: id(to),
        departure: clock(dep),
        arrival: clock(arr),
        active: true,
        source,
    }
}

#[test]
fn free_line_is_available() {
    let provider = cached();
    let a = validate_route_availability(
        &provider,
        &id("NADAHAZA"),
        &id("BLAUMITH"),
        clock("01:30"),
        clock("02:08"),
        &[],
    );
    assert!(a.available);
    assert!(a.conflicts.is_empty());
    assert!(a.failure.is_none());
}

#[test]
fn run_on_the_segment_conflicts() {
    let provider = cached();
    let other = run(7, "NADAHAZA", "BLAUMITH", "01:45", "01:55", RunSource::Manual);

    let a = validate_route_availability(
        &provider,
        &id("NADAHAZA"),
        &id("BLAUMITH"),
        clock("01:30"),
        clock("02:08"),
        &[other],
    );

    assert!(!a.available);
    assert_eq!(a.conflicts.len(), 1);
    let c = &a.conflicts[0];
    assert_eq!(c.segment, SegmentId(1));
    assert_eq!(c.from, id("NADAHAZA"));
    assert_eq!(c.to, id("BLAUMITH"));
    assert_eq!(c.other_run, RunId(7));
    assert_eq!(c.other_number, "IC 7");
    assert_eq!(
        c.overlap,
        TimeWindow::new(clock("01:45").on_first_day(), clock("01:55").on_first_day())
    );
    assert!(matches!(
        a.into_result(),
        Err(SchedulingError::Unavailable { conflicts }) if conflicts.len() == 1
    ));
}

#[test]
fn same_origin_and_destination() {
    let provider = cached();
    let a = validate_route_availability(
        &provider,
        &id("NADAHAZA"),
        &id("NADAHAZA"),
        clock("01:30"),
        clock("02:08"),
        &[],
    );
    assert!(!a.available);
    assert!(matches!(
        a.failure,
        Some(RoutingFailure {
            error: SchedulingError::InvalidEndpoints(_)
        })
    ));
}

#[test]
fn follower_leaving_as_leader_clears_is_available() {
    let provider = cached();
    let leader = run(1, "NADAHAZA", "BLAUMITH", "01:00", "01:30", RunSource::Automatic);
    let a = validate_route_availability(
        &provider,
        &id("NADAHAZA"),
        &id("BLAUMITH"),
        clock("01:30"),
        clock("02:08"),
        &[leader],
    );
    assert!(a.available);
}

#[test]
fn branch_runs_only_conflict_on_shared_segment() {
    let provider = cached();
    // Candidate NADAHAZA-KORNTAL 10:00-10:31, on BLAUMITH-KORNTAL from 10:19
    let others = [
        // On the branch the whole time: no shared segment
        run(1, "BLAUMITH", "OSTHEIM", "10:00", "10:30", RunSource::Automatic),
        // Coming back from KORNTAL while the candidate is heading there
        run(2, "KORNTAL", "BLAUMITH", "10:20", "10:40", RunSource::Manual),
    ];
    let a = validate_route_availability(
        &provider,
        &id("NADAHAZA"),
        &id("KORNTAL"),
        clock("10:00"),
        clock("10:31"),
        &others,
    );
    assert_eq!(a.conflicts.len(), 1);
    assert_eq!(a.conflicts[0].segment, SegmentId(2));
    assert_eq!(a.conflicts[0].other_run, RunId(2));
}

#[test]
fn over_capacity_station_resolved_by_shedding_newest_automatic() {
    let net = layout();
    let provider = cached();
    let runs = [
        run(1, "NADAHAZA", "BLAUMITH", "09:40", "10:05", RunSource::Manual),
        run(2, "KORNTAL", "BLAUMITH", "09:50", "10:10", RunSource::Automatic),
        run(3, "BLAUMITH", "OSTHEIM", "10:15", "10:30", RunSource::Automatic),
    ];

    let conflicts = analyze_station_capacity(&net, &provider, &id("BLAUMITH"), &runs, 30).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].excess, 1);
    assert_eq!(conflicts[0].window_start, clock("10:00"));

    let resolution = resolve_capacity_conflict(&conflicts[0]).into_result().unwrap();
    assert_eq!(resolution.remove, [RunId(3)]);
}

#[test]
fn network_scan_through_the_cache() {
    let net = layout();
    let provider = cached();
    let runs = [
        // Two runs arriving at single-track KORNTAL in one window
        run(1, "NADAHAZA", "KORNTAL", "10:00", "10:40", RunSource::Automatic),
        run(2, "OSTHEIM", "KORNTAL", "10:10", "10:50", RunSource::Automatic),
    ];

    let conflicts = analyze_network_capacity(&net, &provider, &runs, 30).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].station, id("KORNTAL"));
    assert_eq!(conflicts[0].window_start, clock("10:30"));
}
