//! Station and track types.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Maximum length of a station code.
const MAX_STATION_ID_LEN: usize = 32;

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station id: {reason}")]
pub struct InvalidStationId {
    reason: &'static str,
}

/// A valid station code, e.g. `NADAHAZA`.
///
/// Codes start with an uppercase ASCII letter and continue with uppercase
/// letters, digits, `_` or `-`, up to 32 characters. Ordering is by code,
/// which the route planner relies on for deterministic tie-breaks.
///
/// # Examples
///
/// ```
/// use rail_scheduler::domain::StationId;
///
/// let id = StationId::parse("NADAHAZA").unwrap();
/// assert_eq!(id.as_str(), "NADAHAZA");
///
/// // Surrounding whitespace is trimmed
/// assert_eq!(StationId::parse(" BLAUMITH ").unwrap().as_str(), "BLAUMITH");
///
/// assert!(StationId::parse("blaumith").is_err());
/// assert!(StationId::parse("").is_err());
/// assert!(StationId::parse("9LIVES").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId(String);

impl StationId {
    /// Parse a station code.
    pub fn parse(s: &str) -> Result<Self, InvalidStationId> {
        let s = s.trim();

        if s.is_empty() {
            return Err(InvalidStationId {
                reason: "must not be empty",
            });
        }
        if s.len() > MAX_STATION_ID_LEN {
            return Err(InvalidStationId {
                reason: "must be at most 32 characters",
            });
        }
        if !s.as_bytes()[0].is_ascii_uppercase() {
            return Err(InvalidStationId {
                reason: "must start with an uppercase letter",
            });
        }
        let valid = s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
        if !valid {
            return Err(InvalidStationId {
                reason: "must contain only A-Z, 0-9, '_' or '-'",
            });
        }

        Ok(StationId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StationId {
    type Error = InvalidStationId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationId> for String {
    fn from(value: StationId) -> Self {
        value.0
    }
}

/// Identity of a track (platform or siding) at a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// One unit of platform or siding capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub station: StationId,
    pub active: bool,
}

/// A named node of the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub active: bool,
    pub tracks: Vec<Track>,
    /// Scheduled stop at this station when a run passes through, in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dwell_mins: Option<u32>,
}

impl Station {
    /// Create an active station with no tracks and no dwell.
    pub fn new(id: StationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            tracks: Vec::new(),
            dwell_mins: None,
        }
    }

    /// Add an active track.
    pub fn with_track(mut self, id: TrackId) -> Self {
        self.tracks.push(Track {
            id,
            station: self.id.clone(),
            active: true,
        });
        self
    }

    /// Set the dwell applied when a run passes through.
    pub fn with_dwell_mins(mut self, mins: u32) -> Self {
        self.dwell_mins = Some(mins);
        self
    }

    /// Mark the station inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn active_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.active)
    }

    /// Number of runs the station can hold at once.
    ///
    /// Zero for an inactive station.
    pub fn capacity(&self) -> usize {
        if !self.active {
            return 0;
        }
        self.active_tracks().count()
    }

    pub fn dwell(&self) -> Duration {
        Duration::minutes(self.dwell_mins.unwrap_or(0) as i64)
    }
}
