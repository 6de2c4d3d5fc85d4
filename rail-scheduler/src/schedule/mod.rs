//! The run repository.
//!
//! A [`Schedule`] owns the network and the set of scheduled runs. Adding a
//! run takes the schedule lock, checks the candidate against a snapshot of
//! the active runs and inserts it, all before the lock is released, so two
//! conflicting runs can never both be committed. Reports take a snapshot
//! and analyse it without holding the lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::TimeSource;
use crate::config::SchedulerConfig;
use crate::domain::{ClockTime, NewRun, Run, RunId, StationId};
use crate::engine::{
    CapacityConflict, Resolution, RouteCache, RouteCacheConfig, RouteProvider,
    analyze_network_capacity, analyze_upcoming_capacity, validate_route_availability,
};
use crate::error::SchedulingError;
use crate::network::Network;

struct State {
    routes: Arc<RouteCache<Network>>,
    runs: BTreeMap<RunId, Run>,
    /// `None` once `u64::MAX` has been issued.
    next_id: Option<u64>,
}

impl State {
    fn active(&self) -> Vec<Run> {
        self.runs.values().filter(|r| r.active).cloned().collect()
    }
}

/// Shared, thread-safe schedule.
#[derive(Clone)]
pub struct Schedule {
    inner: Arc<Mutex<State>>,
    config: SchedulerConfig,
}

impl Schedule {
    /// Create a schedule over `network`, starting with `runs`.
    ///
    /// New runs get ids above the largest existing one. If that is
    /// `u64::MAX`, later commits fail with `RunIdsExhausted`.
    pub fn new(network: Network, runs: Vec<Run>, config: SchedulerConfig) -> Self {
        let routes = Arc::new(RouteCache::new(
            Arc::new(network),
            &RouteCacheConfig::from(&config),
        ));
        let next_id = match runs.iter().map(|r| r.id.0).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        };
        let runs = runs.into_iter().map(|r| (r.id, r)).collect();

        Self {
            inner: Arc::new(Mutex::new(State {
                routes,
                runs,
                next_id,
            })),
            config,
        }
    }

    /// Validate a run against the active runs and add it.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if it shares a segment with an active run at the same time
    /// - the routing or timing error if it cannot be routed or timed
    /// - `RunIdsExhausted` if no id is left to give it
    pub async fn commit(&self, new_run: NewRun) -> Result<Run, SchedulingError> {
        let mut state = self.inner.lock().await;
        let Some(next) = state.next_id else {
            return Err(SchedulingError::RunIdsExhausted);
        };

        let active = state.active();
        validate_route_availability(
            state.routes.as_ref(),
            &new_run.origin,
            &new_run.destination,
            new_run.departure,
            new_run.arrival,
            &active,
        )
        .into_result()?;

        let id = RunId(next);
        state.next_id = next.checked_add(1);
        let run = new_run.into_run(id);
        state.runs.insert(id, run.clone());

        info!(
            run = %run.id,
            number = %run.number,
            origin = %run.origin,
            destination = %run.destination,
            departure = %run.departure,
            arrival = %run.arrival,
            "Committed run"
        );
        Ok(run)
    }

    /// Mark runs inactive. Returns how many were active before.
    pub async fn deactivate(&self, ids: &[RunId]) -> usize {
        let mut state = self.inner.lock().await;
        let mut count = 0;
        for id in ids {
            match state.runs.get_mut(id) {
                Some(run) if run.active => {
                    run.active = false;
                    count += 1;
                    info!(run = %id, number = %run.number, "Deactivated run");
                }
                Some(_) => {}
                None => warn!(run = %id, "Cannot deactivate unknown run"),
            }
        }
        count
    }

    /// Deactivate the runs a resolution selected.
    ///
    /// # Errors
    ///
    /// `UnresolvableConflict` if the resolution is unresolved; nothing is
    /// deactivated.
    pub async fn apply_resolution(&self, resolution: &Resolution) -> Result<usize, SchedulingError> {
        let resolution = resolution.clone().into_result()?;
        Ok(self.deactivate(&resolution.remove).await)
    }

    pub async fn get(&self, id: RunId) -> Option<Run> {
        self.inner.lock().await.runs.get(&id).cloned()
    }

    /// All active runs, by id.
    pub async fn active_runs(&self) -> Vec<Run> {
        self.inner.lock().await.active()
    }

    /// Active runs whose route touches `station`.
    pub async fn runs_at(&self, station: &StationId) -> Vec<Run> {
        let (routes, runs) = self.snapshot().await;
        runs.into_iter()
            .filter(|run| match routes.route(&run.origin, &run.destination) {
                Ok(route) => route.contains(station),
                Err(e) => {
                    warn!(run = %run.id, error = %e, "Skipping run that cannot be routed");
                    false
                }
            })
            .collect()
    }

    /// Active runs departing in `[from, to)`.
    ///
    /// A range with `to` before `from` wraps past midnight.
    pub async fn runs_departing_between(&self, from: ClockTime, to: ClockTime) -> Vec<Run> {
        let in_range = |t: ClockTime| {
            if from <= to {
                from <= t && t < to
            } else {
                t >= from || t < to
            }
        };
        self.active_runs()
            .await
            .into_iter()
            .filter(|r| in_range(r.departure))
            .collect()
    }

    /// Station capacity conflicts across the network.
    pub async fn capacity_report(
        &self,
        window_mins: u32,
    ) -> Result<Vec<CapacityConflict>, SchedulingError> {
        let (routes, runs) = self.snapshot().await;
        analyze_network_capacity(routes.graph(), routes.as_ref(), &runs, window_mins)
    }

    /// Capacity conflicts starting within the configured horizon of the
    /// current time, using the configured window size.
    pub async fn upcoming_capacity_report(
        &self,
        clock: &dyn TimeSource,
    ) -> Result<Vec<CapacityConflict>, SchedulingError> {
        let (routes, runs) = self.snapshot().await;
        analyze_upcoming_capacity(
            routes.graph(),
            routes.as_ref(),
            &runs,
            self.config.capacity_window_mins,
            clock,
            self.config.upcoming_horizon(),
        )
    }

    /// Swap in a new topology. Routes cached for the old one are dropped.
    pub async fn replace_network(&self, network: Network) {
        let routes = Arc::new(RouteCache::new(
            Arc::new(network),
            &RouteCacheConfig::from(&self.config),
        ));
        let mut state = self.inner.lock().await;
        state.routes.invalidate_all();
        state.routes = routes;
        info!(stations = state.routes.graph().len(), "Replaced network");
    }

    async fn snapshot(&self) -> (Arc<RouteCache<Network>>, Vec<Run>) {
        let state = self.inner.lock().await;
        let snapshot = (state.routes.clone(), state.active());
        debug!(runs = snapshot.1.len(), "Took schedule snapshot");
        snapshot
    }
}
