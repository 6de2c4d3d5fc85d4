//! Domain types for the scheduling engine.
//!
//! This module contains the reference data (stations, tracks, segments) and
//! the scheduled runs the engine reasons about. Identifiers and times
//! enforce their invariants at construction time, so code that receives
//! these types can trust their validity.

mod run;
mod segment;
mod station;
mod time;

pub use run::{NewRun, Run, RunId, RunSource, RunSummary};
pub use segment::{Segment, SegmentId};
pub use station::{InvalidStationId, Station, StationId, Track, TrackId};
pub use time::{ClockTime, SECS_PER_DAY, ServiceTime, TimeError, TimeWindow};
