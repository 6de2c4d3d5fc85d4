//! Segments: the exclusive-use edges between stations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StationId;

/// Identity of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SEG{}", self.0)
    }
}

/// An edge joining two stations.
///
/// In an undirected network `a` and `b` are interchangeable; in a
/// directional one the segment may only be travelled from `a` to `b`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub a: StationId,
    pub b: StationId,
    /// Length in layout units.
    pub distance: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Segment {
    pub fn new(id: SegmentId, a: StationId, b: StationId, distance: u32) -> Self {
        Self {
            id,
            a,
            b,
            distance,
            active: true,
        }
    }

    /// The end opposite `station`, if `station` is an end.
    pub fn other_end(&self, station: &StationId) -> Option<&StationId> {
        if &self.a == station {
            Some(&self.b)
        } else if &self.b == station {
            Some(&self.a)
        } else {
            None
        }
    }

    /// True if the segment joins `from` and `to` in a direction allowed by
    /// the network.
    pub fn joins(&self, from: &StationId, to: &StationId, directional: bool) -> bool {
        (&self.a == from && &self.b == to) || (!directional && &self.a == to && &self.b == from)
    }
}
