//! `Cluster` and `RangeState` — the in-memory catalog the evaluator reads
//! from.

use std::collections::HashMap;

/// A named mapping from uppercase key to an ordered list of range
/// expressions. The reserved key `CLUSTER` is the cluster's default value
/// set; `KEYS` is a virtual key, synthesized rather than stored.
pub type Cluster = HashMap<String, Vec<String>>;

/// The key synthesized to enumerate a cluster's stored keys.
pub const KEYS_KEY: &str = "KEYS";
/// The reserved key holding a cluster's default value set.
pub const CLUSTER_KEY: &str = "CLUSTER";

/// In-memory catalog of clusters, plus a lazily-populated memoization
/// cache keyed by `(cluster name, key)`.
///
/// Invariant: any mutation of the catalog invalidates the entire cache
/// (`add_cluster` and `remove_cluster` both call [`RangeState::reset_cache`]).
///
/// Concurrent queries against the same state are only safe once the cache
/// has been fully populated: call [`crate::range::prime_cache`] after
/// building the catalog and before handing the state to more than one
/// thread. Without priming, two threads can race to evaluate and cache the
/// same `(cluster, key)` pair.
#[derive(Debug, Default)]
pub struct RangeState {
    clusters: HashMap<String, Cluster>,
    default_cluster: String,
    cache: HashMap<String, HashMap<String, Vec<String>>>,
}

impl RangeState {
    /// Creates an empty state using `GROUPS` as the default cluster name.
    pub fn new() -> Self {
        RangeState {
            clusters: HashMap::new(),
            default_cluster: "GROUPS".to_string(),
            cache: HashMap::new(),
        }
    }

    /// Creates an empty state with an explicit default cluster name.
    pub fn with_default_cluster(default_cluster: impl Into<String>) -> Self {
        RangeState {
            clusters: HashMap::new(),
            default_cluster: default_cluster.into(),
            cache: HashMap::new(),
        }
    }

    pub fn default_cluster_name(&self) -> &str {
        &self.default_cluster
    }

    pub fn set_default_cluster(&mut self, name: impl Into<String>) {
        self.default_cluster = name.into();
    }

    /// Registers (or replaces) a cluster and invalidates the cache.
    pub fn add_cluster(&mut self, name: impl Into<String>, cluster: Cluster) {
        self.clusters.insert(name.into(), cluster);
        self.reset_cache();
    }

    pub fn remove_cluster(&mut self, name: &str) {
        self.clusters.remove(name);
        self.reset_cache();
    }

    pub fn get_cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters.get(name)
    }

    pub fn cluster_names(&self) -> impl Iterator<Item = &String> {
        self.clusters.keys()
    }

    pub fn contains_cluster(&self, name: &str) -> bool {
        self.clusters.contains_key(name)
    }

    /// Clears every cached expansion. The public mutation API already calls
    /// this when needed.
    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }

    pub(crate) fn cache_get(&self, cluster: &str, key: &str) -> Option<&Vec<String>> {
        self.cache.get(cluster).and_then(|m| m.get(key))
    }

    pub(crate) fn cache_put(&mut self, cluster: &str, key: &str, value: Vec<String>) {
        self.cache
            .entry(cluster.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}
