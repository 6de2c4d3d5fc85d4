//! The station/segment network.
//!
//! Stations, their tracks and the segments joining them are reference data.
//! The engine only reads them, through the [`NetworkGraph`] trait, so tests
//! and callers can supply their own topology source.

mod layout;

pub use layout::{Layout, LayoutError};

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::domain::{Segment, SegmentId, Station, StationId, Track};
use crate::error::SchedulingError;

/// Read access to the network topology.
pub trait NetworkGraph {
    /// True if segments may only be travelled from `a` to `b`.
    fn is_directional(&self) -> bool;

    /// All stations, ordered by id.
    fn stations(&self) -> Vec<&Station>;

    /// Look up a station.
    fn station(&self, id: &StationId) -> Result<&Station, SchedulingError>;

    /// Segments with `id` at either end, active or not.
    fn incident_segments(&self, id: &StationId) -> Result<Vec<&Segment>, SchedulingError>;

    /// The segment travelled when going from `from` to `to`.
    fn segment_between(
        &self,
        from: &StationId,
        to: &StationId,
    ) -> Result<&Segment, SchedulingError>;

    /// Active tracks at a station.
    fn active_tracks(&self, id: &StationId) -> Result<Vec<&Track>, SchedulingError> {
        Ok(self.station(id)?.active_tracks().collect())
    }
}

/// In-memory network, built and validated by [`NetworkBuilder`].
#[derive(Debug, Clone, Default)]
pub struct Network {
    directional: bool,
    stations: BTreeMap<StationId, Station>,
    segments: Vec<Segment>,
    /// Station to indices into `segments`.
    incident: HashMap<StationId, Vec<usize>>,
}

impl Network {
    /// Start building a network.
    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl NetworkGraph for Network {
    fn is_directional(&self) -> bool {
        self.directional
    }

    fn stations(&self) -> Vec<&Station> {
        self.stations.values().collect()
    }

    fn station(&self, id: &StationId) -> Result<&Station, SchedulingError> {
        self.stations
            .get(id)
            .ok_or_else(|| SchedulingError::station_not_found(id))
    }

    fn incident_segments(&self, id: &StationId) -> Result<Vec<&Segment>, SchedulingError> {
        self.station(id)?;
        Ok(self
            .incident
            .get(id)
            .map(|idxs| idxs.iter().map(|&i| &self.segments[i]).collect())
            .unwrap_or_default())
    }

    fn segment_between(
        &self,
        from: &StationId,
        to: &StationId,
    ) -> Result<&Segment, SchedulingError> {
        self.station(from)?;
        self.station(to)?;
        self.incident
            .get(from)
            .into_iter()
            .flatten()
            .map(|&i| &self.segments[i])
            .find(|s| s.joins(from, to, self.directional))
            .ok_or_else(|| SchedulingError::segment_not_found(from, to))
    }
}

/// Builder that validates network reference data.
///
/// Rejects duplicate station, track or segment ids, tracks filed under the
/// wrong station, segments that reference unknown stations or loop back to
/// their own station, and more than one segment per station pair (per
/// direction, in a directional network).
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    directional: bool,
    stations: Vec<Station>,
    segments: Vec<Segment>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat segments as one-way, from `a` to `b`.
    pub fn directional(mut self, directional: bool) -> Self {
        self.directional = directional;
        self
    }

    pub fn station(mut self, station: Station) -> Self {
        self.stations.push(station);
        self
    }

    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Network, SchedulingError> {
        let invalid = |msg: String| SchedulingError::InvalidNetwork(msg);

        let mut stations = BTreeMap::new();
        let mut track_ids = HashSet::new();
        for station in self.stations {
            for track in &station.tracks {
                if track.station != station.id {
                    return Err(invalid(format!(
                        "track {} is listed under {} but belongs to {}",
                        track.id, station.id, track.station
                    )));
                }
                if !track_ids.insert(track.id) {
                    return Err(invalid(format!("duplicate track id {}", track.id)));
                }
            }
            if stations.contains_key(&station.id) {
                return Err(invalid(format!("duplicate station {}", station.id)));
            }
            stations.insert(station.id.clone(), station);
        }

        let mut segment_ids: HashSet<SegmentId> = HashSet::new();
        let mut pairs: HashSet<(StationId, StationId)> = HashSet::new();
        let mut incident: HashMap<StationId, Vec<usize>> = HashMap::new();

        for (idx, segment) in self.segments.iter().enumerate() {
            if !segment_ids.insert(segment.id) {
                return Err(invalid(format!("duplicate segment id {}", segment.id)));
            }
            for end in [&segment.a, &segment.b] {
                if !stations.contains_key(end) {
                    return Err(invalid(format!(
                        "segment {} references unknown station {}",
                        segment.id, end
                    )));
                }
            }
            if segment.a == segment.b {
                return Err(invalid(format!(
                    "segment {} loops back to {}",
                    segment.id, segment.a
                )));
            }

            let key = if self.directional || segment.a < segment.b {
                (segment.a.clone(), segment.b.clone())
            } else {
                (segment.b.clone(), segment.a.clone())
            };
            if !pairs.insert(key) {
                return Err(invalid(format!(
                    "more than one segment joins {} and {}",
                    segment.a, segment.b
                )));
            }

            incident.entry(segment.a.clone()).or_default().push(idx);
            incident.entry(segment.b.clone()).or_default().push(idx);
        }

        debug!(
            stations = stations.len(),
            segments = self.segments.len(),
            directional = self.directional,
            "Built network"
        );

        Ok(Network {
            directional: self.directional,
            stations,
            segments: self.segments,
            incident,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrackId;

    fn id(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn station(s: &str) -> Station {
        Station::new(id(s), s)
    }

    fn seg(n: u32, a: &str, b: &str, d: u32) -> Segment {
        Segment::new(SegmentId(n), id(a), id(b), d)
    }

    fn triangle() -> Network {
        Network::builder()
            .station(station("A").with_track(TrackId(1)).with_track(TrackId(2)))
            .station(station("B").with_track(TrackId(3)))
            .station(station("C"))
            .segment(seg(1, "A", "B", 10))
            .segment(seg(2, "B", "C", 20))
            .segment(seg(3, "C", "A", 40))
            .build()
            .unwrap()
    }

    #[test]
    fn station_lookup() {
        let net = triangle();
        assert_eq!(net.len(), 3);
        assert_eq!(net.station(&id("A")).unwrap().name, "A");
        assert!(matches!(
            net.station(&id("Z")),
            Err(SchedulingError::NotFound { kind: "station", .. })
        ));
    }

    #[test]
    fn stations_are_ordered() {
        let net = triangle();
        let ids: Vec<_> = net.stations().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);
    }

    #[test]
    fn active_tracks() {
        let net = triangle();
        assert_eq!(net.active_tracks(&id("A")).unwrap().len(), 2);
        assert_eq!(net.active_tracks(&id("C")).unwrap().len(), 0);
        assert!(net.active_tracks(&id("Z")).is_err());
    }

    #[test]
    fn incident_segments() {
        let net = triangle();
        let mut ids: Vec<_> = net
            .incident_segments(&id("A"))
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        ids.sort();
        assert_eq!(ids, [SegmentId(1), SegmentId(3)]);
        assert!(net.incident_segments(&id("Z")).is_err());
    }

    #[test]
    fn segment_between_either_orientation() {
        let net = triangle();
        assert_eq!(net.segment_between(&id("A"), &id("B")).unwrap().id, SegmentId(1));
        assert_eq!(net.segment_between(&id("B"), &id("A")).unwrap().id, SegmentId(1));
        assert_eq!(net.segment_between(&id("A"), &id("C")).unwrap().id, SegmentId(3));
    }

    #[test]
    fn segment_between_missing() {
        let net = Network::builder()
            .station(station("A"))
            .station(station("B"))
            .build()
            .unwrap();
        assert!(matches!(
            net.segment_between(&id("A"), &id("B")),
            Err(SchedulingError::NotFound { kind: "segment", .. })
        ));
    }

    #[test]
    fn directional_segments_are_one_way() {
        let net = Network::builder()
            .directional(true)
            .station(station("A"))
            .station(station("B"))
            .segment(seg(1, "A", "B", 10))
            .segment(seg(2, "B", "A", 12))
            .build()
            .unwrap();
        assert!(net.is_directional());
        assert_eq!(net.segment_between(&id("A"), &id("B")).unwrap().id, SegmentId(1));
        assert_eq!(net.segment_between(&id("B"), &id("A")).unwrap().id, SegmentId(2));
    }

    #[test]
    fn rejects_duplicate_pair() {
        let result = Network::builder()
            .station(station("A"))
            .station(station("B"))
            .segment(seg(1, "A", "B", 10))
            .segment(seg(2, "B", "A", 12))
            .build();
        assert!(matches!(result, Err(SchedulingError::InvalidNetwork(_))));
    }

    #[test]
    fn rejects_unknown_station() {
        let result = Network::builder()
            .station(station("A"))
            .segment(seg(1, "A", "B", 10))
            .build();
        assert!(matches!(result, Err(SchedulingError::InvalidNetwork(_))));
    }

    #[test]
    fn rejects_self_loop() {
        let result = Network::builder()
            .station(station("A"))
            .segment(seg(1, "A", "A", 10))
            .build();
        assert!(matches!(result, Err(SchedulingError::InvalidNetwork(_))));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = Network::builder()
            .station(station("A"))
            .station(station("A"))
            .build();
        assert!(result.is_err());

        let result = Network::builder()
            .station(station("A").with_track(TrackId(1)))
            .station(station("B").with_track(TrackId(1)))
            .build();
        assert!(result.is_err());

        let result = Network::builder()
            .station(station("A"))
            .station(station("B"))
            .station(station("C"))
            .segment(seg(1, "A", "B", 1))
            .segment(seg(1, "B", "C", 1))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_misfiled_track() {
        let mut a = station("A").with_track(TrackId(1));
        a.tracks[0].station = id("B");
        let result = Network::builder().station(a).station(station("B")).build();
        assert!(matches!(result, Err(SchedulingError::InvalidNetwork(_))));
    }
}
