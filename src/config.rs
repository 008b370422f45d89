//! Process-wide defaults for the range query engine, threaded explicitly
//! through [`crate::range::evaluator::RangeEvaluator`] rather than read from
//! globals.

/// Limits and defaults governing a single range-query evaluation.
///
/// An explicit, cloneable struct rather than process-wide globals, so two
/// callers in the same process can use different limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeConfig {
    /// Maximum length, in characters, of a query string or any
    /// intermediate value produced while evaluating one.
    pub max_query_size: usize,
    /// Maximum cardinality of a single query's result set.
    pub max_results: usize,
    /// Maximum recursion depth of nested sub-evaluations.
    pub max_query_depth: usize,
    /// Name of the cluster used by the `@name` / `?value` shorthands and
    /// by a bare regex.
    pub default_cluster: String,
}

impl Default for RangeConfig {
    fn default() -> Self {
        RangeConfig {
            max_query_size: 1_000,
            max_results: 10_000,
            max_query_depth: 100,
            default_cluster: "GROUPS".to_string(),
        }
    }
}
