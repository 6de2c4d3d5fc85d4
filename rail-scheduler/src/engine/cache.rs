//! Caching layer for computed routes.
//!
//! Every conflict check routes each other active run again, so the same
//! origin/destination pairs are computed over and over while the topology
//! stays put. Successful routes are cached per pair; errors are not, so a
//! pair that becomes reachable after a topology change is found on the next
//! lookup. Any topology change must invalidate the whole cache.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache as MokaCache;
use tracing::trace;

use super::route::{Route, RouteProvider, compute_route};
use crate::config::SchedulerConfig;
use crate::domain::StationId;
use crate::error::SchedulingError;
use crate::network::NetworkGraph;

/// Cache key: (origin, destination).
type RouteKey = (StationId, StationId);

/// Configuration for the route cache.
#[derive(Debug, Clone)]
pub struct RouteCacheConfig {
    /// TTL for cached routes.
    pub ttl: Duration,

    /// Maximum number of cached routes.
    pub max_capacity: u64,
}

impl Default for RouteCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 1024,
        }
    }
}

impl From<&SchedulerConfig> for RouteCacheConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            ttl: config.route_cache_ttl(),
            max_capacity: config.route_cache_capacity,
        }
    }
}

/// A network graph with cached routing.
///
/// Wraps a graph and caches the routes computed on it.
pub struct RouteCache<G> {
    graph: Arc<G>,
    routes: MokaCache<RouteKey, Arc<Route>>,
}

impl<G: NetworkGraph> RouteCache<G> {
    /// Create a new cache in front of `graph`.
    pub fn new(graph: Arc<G>, config: &RouteCacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { graph, routes }
    }

    /// The underlying graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.routes.entry_count()
    }

    /// Invalidate all cached routes.
    pub fn invalidate_all(&self) {
        self.routes.invalidate_all();
    }
}

impl<G: NetworkGraph> RouteProvider for RouteCache<G> {
    fn route(
        &self,
        origin: &StationId,
        destination: &StationId,
    ) -> Result<Arc<Route>, SchedulingError> {
        let key = (origin.clone(), destination.clone());

        if let Some(cached) = self.routes.get(&key) {
            trace!(origin = %origin, destination = %destination, "Route cache hit");
            return Ok(cached);
        }

        let route = Arc::new(compute_route(self.graph.as_ref(), origin, destination)?);
        self.routes.insert(key, route.clone());
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Segment, SegmentId, Station};
    use crate::network::Network;

    fn id(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn cache() -> RouteCache<Network> {
        let net = Network::builder()
            .station(Station::new(id("A"), "A"))
            .station(Station::new(id("B"), "B"))
            .station(Station::new(id("C"), "C"))
            .segment(Segment::new(SegmentId(1), id("A"), id("B"), 7))
            .build()
            .unwrap();
        RouteCache::new(Arc::new(net), &RouteCacheConfig::default())
    }

    #[test]
    fn cached_route_is_shared() {
        let cache = cache();
        let first = cache.route(&id("A"), &id("B")).unwrap();
        let second = cache.route(&id("A"), &id("B")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.total_distance(), 7);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = cache();
        assert!(cache.route(&id("A"), &id("C")).is_err());
        cache.routes.run_pending_tasks();
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn invalidate_all_drops_routes() {
        let cache = cache();
        let first = cache.route(&id("A"), &id("B")).unwrap();
        cache.invalidate_all();
        let second = cache.route(&id("A"), &id("B")).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn config_from_scheduler_config() {
        let config = SchedulerConfig::default();
        let cache_config = RouteCacheConfig::from(&config);
        assert_eq!(cache_config.ttl, Duration::from_secs(300));
        assert_eq!(cache_config.max_capacity, 1024);
    }
}
