//! Choosing which runs to remove from an over-capacity window.

use serde::Serialize;
use tracing::debug;

use super::capacity::CapacityConflict;
use crate::domain::{ClockTime, RunId, StationId};
use crate::error::SchedulingError;

/// Outcome of resolving one capacity conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub station: StationId,
    pub window_start: ClockTime,
    /// Runs to deactivate, newest first. Empty when unresolved.
    pub remove: Vec<RunId>,
    /// Removing every automatic run would still leave the window over
    /// capacity.
    pub unresolved: bool,
    /// Runs still over capacity after removing every automatic run. Zero
    /// when resolved.
    pub remaining_excess: usize,
}

impl Resolution {
    /// Convert an unresolved outcome into an error.
    pub fn into_result(self) -> Result<Self, SchedulingError> {
        if self.unresolved {
            Err(SchedulingError::UnresolvableConflict {
                station: self.station,
                window_start: self.window_start,
                remaining_excess: self.remaining_excess,
            })
        } else {
            Ok(self)
        }
    }
}

/// Pick automatic runs to remove until the window is within capacity.
///
/// The newest automatic runs go first. Manual runs are never picked; if the
/// automatic runs alone cannot bring the window within capacity, nothing is
/// picked and the conflict is left to an operator.
pub fn resolve_capacity_conflict(conflict: &CapacityConflict) -> Resolution {
    let mut automatic: Vec<RunId> = conflict
        .runs
        .iter()
        .filter(|r| r.is_automatic())
        .map(|r| r.id)
        .collect();
    automatic.sort_unstable_by(|a, b| b.cmp(a));

    let excess = conflict.excess;
    let resolution = if automatic.len() >= excess {
        automatic.truncate(excess);
        Resolution {
            station: conflict.station.clone(),
            window_start: conflict.window_start,
            remove: automatic,
            unresolved: false,
            remaining_excess: 0,
        }
    } else {
        Resolution {
            station: conflict.station.clone(),
            window_start: conflict.window_start,
            remove: Vec::new(),
            unresolved: true,
            remaining_excess: excess - automatic.len(),
        }
    };

    debug!(
        station = %resolution.station,
        window_start = %resolution.window_start,
        remove = resolution.remove.len(),
        unresolved = resolution.unresolved,
        "Resolved capacity conflict"
    );
    resolution
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{RunSource, RunSummary};
    use proptest::prelude::*;

    prop_compose! {
        fn arb_conflict()(
            sources in prop::collection::vec(any::<bool>(), 1..12),
            capacity_seed in any::<usize>(),
        ) -> CapacityConflict {
            let runs: Vec<RunSummary> = sources
                .iter()
                .enumerate()
                .map(|(i, automatic)| RunSummary {
                    id: RunId(i as u64 * 3 + 1),
                    number: format!("R{i}"),
                    source: if *automatic { RunSource::Automatic } else { RunSource::Manual },
                })
                .collect();
            let capacity = capacity_seed % runs.len();
            CapacityConflict {
                station: StationId::parse("HUB").unwrap(),
                capacity,
                window_start: ClockTime::MIDNIGHT,
                window_end: ClockTime::parse("00:30").unwrap(),
                excess: runs.len() - capacity,
                runs,
            }
        }
    }

    proptest! {
        /// Only automatic runs are picked, newest first, and exactly enough
        /// of them to restore capacity
        #[test]
        fn picks_only_newest_automatic(c in arb_conflict()) {
            let r = resolve_capacity_conflict(&c);
            let automatic: Vec<RunId> = c
                .runs
                .iter()
                .filter(|s| s.is_automatic())
                .map(|s| s.id)
                .collect();

            if r.unresolved {
                prop_assert!(r.remove.is_empty());
                prop_assert_eq!(r.remaining_excess, c.excess - automatic.len());
            } else {
                prop_assert_eq!(r.remove.len(), c.excess);
                for id in &r.remove {
                    prop_assert!(automatic.contains(id));
                }
                // Every automatic run left behind is older than every one removed
                let oldest_removed = r.remove.iter().min();
                for id in automatic.iter().filter(|id| !r.remove.contains(id)) {
                    prop_assert!(Some(id) < oldest_removed);
                }
                prop_assert!(r.remove.windows(2).all(|w| w[0] > w[1]));
            }
        }
    }
}
