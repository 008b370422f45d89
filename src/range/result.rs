//! The evaluator's result set.

use indexmap::IndexSet;

use super::error::RangeError;
use crate::config::RangeConfig;

/// An unordered set of strings, bounded in cardinality by
/// [`RangeConfig::max_results`]. Backed by an [`IndexSet`] so iteration
/// order is stable within a single evaluation (handy for tests and for
/// [`crate::range::compress`]) even though the language makes no ordering
/// guarantee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeResult(IndexSet<String>);

/// Outcome of attempting to add a value to a [`RangeResult`].
pub enum AddOutcome {
    /// The value is now present (it was inserted, or already was).
    Added,
    /// The set is already at `max_results` and the value was not present,
    /// so nothing was inserted. Callers should stop generating further
    /// values for this node.
    Capped,
}

impl RangeResult {
    pub fn new() -> Self {
        RangeResult(IndexSet::new())
    }

    pub fn from_iter_unchecked(values: impl IntoIterator<Item = String>) -> Self {
        RangeResult(values.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&String> {
        self.0.first()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Inserts `value` after checking the per-value size limit and the
    /// result-cardinality cap.
    pub fn try_add(&mut self, config: &RangeConfig, value: &str) -> Result<AddOutcome, RangeError> {
        if value.chars().count() > config.max_query_size {
            return Err(RangeError::ValueTooLarge {
                value: value.to_string(),
            });
        }
        if self.0.contains(value) {
            return Ok(AddOutcome::Added);
        }
        if self.0.len() >= config.max_results {
            return Ok(AddOutcome::Capped);
        }
        self.0.insert(value.to_string());
        Ok(AddOutcome::Added)
    }

    /// Merges `other` into `self`, respecting the same cap. Returns once
    /// the cap is hit rather than erroring.
    pub fn merge_from(&mut self, config: &RangeConfig, other: &RangeResult) -> Result<(), RangeError> {
        for v in other.iter() {
            if let AddOutcome::Capped = self.try_add(config, v)? {
                break;
            }
        }
        Ok(())
    }

    pub fn intersection(&self, other: &RangeResult) -> RangeResult {
        RangeResult(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn difference(&self, other: &RangeResult) -> RangeResult {
        RangeResult(self.0.difference(&other.0).cloned().collect())
    }

    pub fn intersects(&self, other: &RangeResult) -> bool {
        self.0.iter().any(|v| other.0.contains(v))
    }
}

impl FromIterator<String> for RangeResult {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        RangeResult(iter.into_iter().collect())
    }
}

impl IntoIterator for RangeResult {
    type Item = String;
    type IntoIter = indexmap::set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_at_max_results() {
        let config = RangeConfig {
            max_results: 2,
            ..RangeConfig::default()
        };
        let mut r = RangeResult::new();
        assert!(matches!(r.try_add(&config, "a").unwrap(), AddOutcome::Added));
        assert!(matches!(r.try_add(&config, "b").unwrap(), AddOutcome::Added));
        assert!(matches!(r.try_add(&config, "c").unwrap(), AddOutcome::Capped));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn duplicate_add_does_not_count_against_cap() {
        let config = RangeConfig {
            max_results: 1,
            ..RangeConfig::default()
        };
        let mut r = RangeResult::new();
        r.try_add(&config, "a").unwrap();
        assert!(matches!(r.try_add(&config, "a").unwrap(), AddOutcome::Added));
    }

    #[test]
    fn oversized_value_is_an_error() {
        let config = RangeConfig {
            max_query_size: 3,
            ..RangeConfig::default()
        };
        let mut r = RangeResult::new();
        assert!(r.try_add(&config, "abcd").is_err());
    }
}
