//! Layout files: a network and its runs as one JSON document.
//!
//! ```json
//! {
//!   "directional": false,
//!   "stations": [
//!     { "id": "NADAHAZA", "name": "Nadahaza", "active": true,
//!       "tracks": [{ "id": 1, "station": "NADAHAZA", "active": true }] }
//!   ],
//!   "segments": [{ "id": 1, "a": "NADAHAZA", "b": "BLAUMITH", "distance": 380 }],
//!   "runs": [{ "id": 1, "number": "RE 7", "origin": "NADAHAZA",
//!              "destination": "BLAUMITH", "departure": "01:30",
//!              "arrival": "02:08", "source": "manual" }]
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Network, NetworkBuilder};
use crate::domain::{Run, RunId, Segment, Station};
use crate::error::SchedulingError;

/// Errors from loading a layout file.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// Layout file could not be read
    #[error("failed to read layout {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Layout is not valid JSON or has invalid ids/times
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Network reference data is inconsistent
    #[error(transparent)]
    Network(#[from] SchedulingError),

    /// Two runs share an id
    #[error("duplicate run id {0}")]
    DuplicateRun(RunId),
}

/// A serialized layout: topology plus the runs scheduled on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub directional: bool,
    pub stations: Vec<Station>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Layout {
    /// Read a layout from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout = Self::from_json(&json)?;
        debug!(
            path = %path.display(),
            stations = layout.stations.len(),
            runs = layout.runs.len(),
            "Loaded layout"
        );
        Ok(layout)
    }

    /// Parse a layout from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and split into the network and the run list.
    pub fn into_parts(self) -> Result<(Network, Vec<Run>), LayoutError> {
        let mut seen = HashSet::new();
        for run in &self.runs {
            if !seen.insert(run.id) {
                return Err(LayoutError::DuplicateRun(run.id));
            }
        }

        let network = self
            .stations
            .into_iter()
            .fold(NetworkBuilder::new().directional(self.directional), |b, s| {
                b.station(s)
            });
        let network = self
            .segments
            .into_iter()
            .fold(network, |b, s| b.segment(s))
            .build()?;

        Ok((network, self.runs))
    }
}
