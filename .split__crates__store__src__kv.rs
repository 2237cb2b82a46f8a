//! Ordered key collection: the external interface the persistent storage
//! substrate would implement. `BTreeKeyCollection` is the one in-workspace
//! implementation, backing every `Index` axis.

use std::collections::BTreeSet;

/// An ordered set of strings, as the storage substrate would expose it.
///
/// `min`/`max` return the empty string for an empty collection, matching the
/// convention a sentinel-key on-disk structure would use rather than an
/// `Option`.
pub trait OrderedKeyCollection {
    fn min(&self) -> String;
    fn max(&self) -> String;
    fn magnitude(&self) -> usize;
    fn contains(&self, key: &str) -> bool;
    /// Ascending iteration over `[lo, hi]` inclusive of both ends.
    fn between(&self, lo: &str, hi: &str) -> Vec<String>;
    /// Ascending iteration over every key.
    fn enumerate(&self) -> Vec<String>;
}

/// `BTreeSet<String>`-backed `OrderedKeyCollection`.
#[derive(Debug, Clone, Default)]
pub struct BTreeKeyCollection {
    keys: BTreeSet<String>,
}

impl BTreeKeyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.keys.remove(key);
    }
}

impl OrderedKeyCollection for BTreeKeyCollection {
    fn min(&self) -> String {
        self.keys.iter().next().cloned().unwrap_or_default()
    }

    fn max(&self) -> String {
        self.keys.iter().next_back().cloned().unwrap_or_default()
    }

    fn magnitude(&self) -> usize {
        self.keys.len()
    }

    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn between(&self, lo: &str, hi: &str) -> Vec<String> {
        self.keys.range(lo.to_string()..=hi.to_string()).cloned().collect()
    }

    fn enumerate(&self) -> Vec<String> {
        self.keys.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_min_max_are_empty_strings() {
        let c = BTreeKeyCollection::new();
        assert_eq!(c.min(), "");
        assert_eq!(c.max(), "");
        assert_eq!(c.magnitude(), 0);
    }

    #[test]
    fn ascending_order_and_between() {
        let mut c = BTreeKeyCollection::new();
        for k in ["b", "a", "c", "d"] {
            c.insert(k);
        }
        assert_eq!(c.enumerate(), vec!["a", "b", "c", "d"]);
        assert_eq!(c.between("b", "c"), vec!["b", "c"]);
        assert_eq!(c.min(), "a");
        assert_eq!(c.max(), "d");
    }

    #[test]
    fn remove_drops_key() {
        let mut c = BTreeKeyCollection::new();
        c.insert("a");
        c.remove("a");
        assert!(!c.contains("a"));
        assert_eq!(c.magnitude(), 0);
    }
}


