//! Evaluation context threaded through the visitor in
//! [`crate::range::evaluator`].
//!
//! Each recursive step produces its own immutable child rather than
//! mutating a shared context in place, which is the natural shape once
//! results are returned instead of accumulated through a shared pointer.

use super::result::RangeResult;

#[derive(Debug, Clone)]
pub struct EvalContext {
    /// The cluster `$KEY` and a bare key lookup resolve against. `None`
    /// means "no cluster selected yet", which falls back to the configured
    /// default cluster.
    pub current_cluster: Option<String>,
    /// The left-hand result of an enclosing `&` or `-`, visible to a regex
    /// atom on the right so it can filter instead of searching every
    /// cluster.
    pub working_set: Option<RangeResult>,
    pub depth: usize,
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext {
            current_cluster: None,
            working_set: None,
            depth: 0,
        }
    }

    /// A child one level deeper, inheriting the current cluster but not
    /// any working set (working sets apply only to the immediate
    /// right-hand operand that established them).
    pub fn child(&self) -> Self {
        EvalContext {
            current_cluster: self.current_cluster.clone(),
            working_set: None,
            depth: self.depth + 1,
        }
    }

    pub fn child_with_working_set(&self, working_set: RangeResult) -> Self {
        EvalContext {
            current_cluster: self.current_cluster.clone(),
            working_set: Some(working_set),
            depth: self.depth + 1,
        }
    }

    pub fn child_with_cluster(&self, cluster: impl Into<String>) -> Self {
        EvalContext {
            current_cluster: Some(cluster.into()),
            working_set: None,
            depth: self.depth + 1,
        }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        EvalContext::new()
    }
}
