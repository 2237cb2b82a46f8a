//! Views: sized, searchable projections over a key axis, used by the
//! planner to estimate join order by candidate-set magnitude.

use std::collections::BTreeSet;

use crate::constraint::Constraint;
use crate::kv::OrderedKeyCollection;

/// A set-like handle over an ordered key axis filtered by a `Constraint`.
#[derive(Debug, Clone)]
pub enum View {
    /// No candidates.
    Null,
    /// A single axis filtered by one constraint. Filtering happens once, at
    /// construction, by walking the source keys — `min`/`max`/`magnitude`
    /// are then O(1).
    Constrained(BTreeSet<String>),
    /// A materialised union of several views' candidate sets.
    Union(BTreeSet<String>),
}

impl View {
    pub fn null() -> Self {
        View::Null
    }

    /// Build a `Constrained` view by walking `keys` once against `constraint`.
    pub fn constrained<'a>(keys: impl Iterator<Item = &'a String>, constraint: &Constraint) -> Self {
        View::Constrained(keys.filter(|k| constraint.matches(k)).cloned().collect())
    }

    /// Eagerly materialise the union of several views' candidate sets,
    /// re-filtered by `constraint`.
    pub fn union(views: &[View], constraint: &Constraint) -> Self {
        let mut merged = BTreeSet::new();
        for v in views {
            for k in v.enumerate() {
                if constraint.matches(&k) {
                    merged.insert(k);
                }
            }
        }
        View::Union(merged)
    }

    fn set(&self) -> Option<&BTreeSet<String>> {
        match self {
            View::Null => None,
            View::Constrained(s) | View::Union(s) => Some(s),
        }
    }
}

impl OrderedKeyCollection for View {
    fn min(&self) -> String {
        self.set().and_then(|s| s.iter().next()).cloned().unwrap_or_default()
    }

    fn max(&self) -> String {
        self.set().and_then(|s| s.iter().next_back()).cloned().unwrap_or_default()
    }

    fn magnitude(&self) -> usize {
        self.set().map_or(0, |s| s.len())
    }

    fn contains(&self, key: &str) -> bool {
        self.set().is_some_and(|s| s.contains(key))
    }

    fn between(&self, lo: &str, hi: &str) -> Vec<String> {
        match self.set() {
            Some(s) => s.range(lo.to_string()..=hi.to_string()).cloned().collect(),
            None => Vec::new(),
        }
    }

    fn enumerate(&self) -> Vec<String> {
        self.set().map_or_else(Vec::new, |s| s.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_view_is_empty() {
        let v = View::null();
        assert_eq!(v.magnitude(), 0);
        assert_eq!(v.min(), "");
        assert!(!v.contains("anything"));
    }

    #[test]
    fn constrained_view_filters_and_orders() {
        let keys = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let v = View::constrained(keys.iter(), &Constraint::Range("a".to_string(), "b".to_string()));
        assert_eq!(v.enumerate(), vec!["a", "b"]);
        assert_eq!(v.magnitude(), 2);
    }

    #[test]
    fn union_merges_and_dedupes() {
        let a = View::constrained(["a".to_string(), "b".to_string()].iter(), &Constraint::Empty);
        let b = View::constrained(["b".to_string(), "c".to_string()].iter(), &Constraint::Empty);
        let u = View::union(&[a, b], &Constraint::Empty);
        assert_eq!(u.enumerate(), vec!["a", "b", "c"]);
    }
}


