//! Three-level ordered map over one key permutation (SPO, POS, or OSP).

use std::collections::{BTreeMap, BTreeSet};

use crate::constraint::Constraint;
use crate::view::View;

/// An ordered `(k1, k2, k3)` triple index for one axis permutation.
#[derive(Debug, Clone, Default)]
pub struct Index {
    map: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, k1: &str, k2: &str, k3: &str) {
        self.map
            .entry(k1.to_string())
            .or_default()
            .entry(k2.to_string())
            .or_default()
            .insert(k3.to_string());
    }

    /// Remove entries matching the given positions; `None` is a wildcard.
    pub fn remove(&mut self, k1: Option<&str>, k2: Option<&str>, k3: Option<&str>) {
        match k1 {
            Some(k1) => {
                let mut drop_k1 = false;
                if let Some(level2) = self.map.get_mut(k1) {
                    remove_in_level2(level2, k2, k3);
                    drop_k1 = level2.is_empty();
                }
                if drop_k1 {
                    self.map.remove(k1);
                }
            }
            None => {
                self.map.retain(|_, level2| {
                    remove_in_level2(level2, k2, k3);
                    !level2.is_empty()
                });
            }
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn contains(&self, k1: &str, k2: Option<&str>, k3: Option<&str>) -> bool {
        let Some(level2) = self.map.get(k1) else {
            return false;
        };
        match k2 {
            Some(k2) => match level2.get(k2) {
                Some(level3) => match k3 {
                    Some(k3) => level3.contains(k3),
                    None => !level3.is_empty(),
                },
                None => false,
            },
            None => !level2.is_empty(),
        }
    }

    /// Enumerate matching rows; the returned row width is the number of
    /// non-`Specific` positions among `c1, c2, c3`, in `(k1, k2, k3)` order.
    pub fn enumerate(&self, c1: &Constraint, c2: &Constraint, c3: &Constraint) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        for (k1v, level2) in self.candidates_1(c1) {
            for (k2v, level3) in candidates_2(level2, c2) {
                for k3v in candidates_3(level3, c3) {
                    let mut row = Vec::with_capacity(3);
                    if !c1.is_specific() {
                        row.push(k1v.clone());
                    }
                    if !c2.is_specific() {
                        row.push(k2v.clone());
                    }
                    if !c3.is_specific() {
                        row.push(k3v.clone());
                    }
                    rows.push(row);
                }
            }
        }
        rows
    }

    /// Per-axis `View`s over the candidate values at each level, filtered by
    /// the corresponding constraint. Magnitude on these views drives the
    /// planner's join ordering.
    pub fn views(&self, c1: &Constraint, c2: &Constraint, c3: &Constraint) -> (View, View, View) {
        let view1 = View::constrained(self.map.keys(), c1);

        let mut k2_keys: BTreeSet<String> = BTreeSet::new();
        let mut k3_keys: BTreeSet<String> = BTreeSet::new();
        for (_, level2) in self.candidates_1(c1) {
            for (k2v, level3) in candidates_2(level2, c2) {
                k2_keys.insert(k2v.clone());
                for k3v in candidates_3(level3, c3) {
                    k3_keys.insert(k3v.clone());
                }
            }
        }
        let view2 = View::constrained(k2_keys.iter(), c2);
        let view3 = View::constrained(k3_keys.iter(), c3);
        (view1, view2, view3)
    }

    /// A single `View` over the outer axis, filtered by `constraint`.
    pub fn view(&self, constraint: &Constraint) -> View {
        View::constrained(self.map.keys(), constraint)
    }

    fn candidates_1<'a>(
        &'a self,
        c1: &'a Constraint,
    ) -> Box<dyn Iterator<Item = (&'a String, &'a BTreeMap<String, BTreeSet<String>>)> + 'a> {
        match c1.as_specific() {
            Some(v) => Box::new(self.map.get_key_value(v).into_iter()),
            None => Box::new(self.map.iter().filter(move |(k, _)| c1.matches(k))),
        }
    }
}

fn candidates_2<'a>(
    level2: &'a BTreeMap<String, BTreeSet<String>>,
    c2: &'a Constraint,
) -> Box<dyn Iterator<Item = (&'a String, &'a BTreeSet<String>)> + 'a> {
    match c2.as_specific() {
        Some(v) => Box::new(level2.get_key_value(v).into_iter()),
        None => Box::new(level2.iter().filter(move |(k, _)| c2.matches(k))),
    }
}

fn candidates_3<'a>(level3: &'a BTreeSet<String>, c3: &'a Constraint) -> Box<dyn Iterator<Item = &'a String> + 'a> {
    match c3.as_specific() {
        Some(v) => Box::new(level3.get(v).into_iter()),
        None => Box::new(level3.iter().filter(move |k| c3.matches(k))),
    }
}

fn remove_in_level2(level2: &mut BTreeMap<String, BTreeSet<String>>, k2: Option<&str>, k3: Option<&str>) {
    match k2 {
        Some(k2) => {
            let mut drop_k2 = false;
            if let Some(level3) = level2.get_mut(k2) {
                match k3 {
                    Some(k3) => {
                        level3.remove(k3);
                    }
                    None => level3.clear(),
                }
                drop_k2 = level3.is_empty();
            }
            if drop_k2 {
                level2.remove(k2);
            }
        }
        None => {
            level2.retain(|_, level3| {
                match k3 {
                    Some(k3) => {
                        level3.remove(k3);
                    }
                    None => level3.clear(),
                }
                !level3.is_empty()
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_contains() {
        let mut idx = Index::new();
        idx.add("a", "p", "b");
        assert!(idx.contains("a", Some("p"), Some("b")));
        assert!(idx.contains("a", Some("p"), None));
        assert!(idx.contains("a", None, None));
        assert!(!idx.contains("a", Some("p"), Some("c")));
    }

    #[test]
    fn enumerate_two_specific_returns_single_column() {
        let mut idx = Index::new();
        idx.add("a", "p", "b");
        idx.add("a", "p", "c");
        idx.add("a", "q", "b");
        let rows = idx.enumerate(&Constraint::specific("a"), &Constraint::specific("p"), &Constraint::Empty);
        let mut flat: Vec<String> = rows.into_iter().map(|r| r[0].clone()).collect();
        flat.sort();
        assert_eq!(flat, vec!["b", "c"]);
    }

    #[test]
    fn enumerate_no_specific_returns_all_three_columns_in_order() {
        let mut idx = Index::new();
        idx.add("a", "p", "b");
        let rows = idx.enumerate(&Constraint::Empty, &Constraint::Empty, &Constraint::Empty);
        assert_eq!(rows, vec![vec!["a".to_string(), "p".to_string(), "b".to_string()]]);
    }

    #[test]
    fn remove_wildcard_drops_matching_entries() {
        let mut idx = Index::new();
        idx.add("a", "p", "b");
        idx.add("a", "p", "c");
        idx.remove(Some("a"), Some("p"), None);
        assert!(!idx.contains("a", Some("p"), None));
    }

    #[test]
    fn ascending_order_on_outer_axis() {
        let mut idx = Index::new();
        idx.add("b", "p", "x");
        idx.add("a", "p", "x");
        let rows = idx.enumerate(&Constraint::Empty, &Constraint::specific("p"), &Constraint::specific("x"));
        assert_eq!(rows, vec![vec!["a".to_string()], vec!["b".to_string()]]);
    }
}


