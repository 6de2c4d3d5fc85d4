//! Scheduled train runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ClockTime, StationId};

/// Identity of a run.
///
/// Issued by the schedule in creation order: a larger id is a newer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who put a run on the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunSource {
    /// Generated by a timetable generator; may be shed to resolve conflicts.
    Automatic,
    /// Scheduled by a person; never removed without an operator.
    Manual,
}

/// A scheduled train movement.
///
/// `arrival <= departure` means the run arrives on the following day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    /// Human-readable train number, e.g. "IC 512".
    pub number: String,
    pub origin: StationId,
    pub destination: StationId,
    pub departure: ClockTime,
    pub arrival: ClockTime,
    #[serde(default = "default_active")]
    pub active: bool,
    pub source: RunSource,
}

fn default_active() -> bool {
    true
}

impl Run {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            id: self.id,
            number: self.number.clone(),
            source: self.source,
        }
    }
}

/// The part of a run the conflict resolver needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: RunId,
    pub number: String,
    pub source: RunSource,
}

impl RunSummary {
    /// Automatic runs may be shed by the resolver.
    pub fn is_automatic(&self) -> bool {
        self.source == RunSource::Automatic
    }
}

/// A run requested for the schedule, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRun {
    pub number: String,
    pub origin: StationId,
    pub destination: StationId,
    pub departure: ClockTime,
    pub arrival: ClockTime,
    pub source: RunSource,
}

impl NewRun {
    /// Attach an id, producing an active run.
    pub fn into_run(self, id: RunId) -> Run {
        Run {
            id,
            number: self.number,
            origin: self.origin,
            destination: self.destination,
            departure: self.departure,
            arrival: self.arrival,
            active: true,
            source: self.source,
        }
    }
}
