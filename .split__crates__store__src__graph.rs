//! A single RDF graph: three redundant indices plus the optional inference hook.

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::constraint::Constraint;
use crate::index::Index;
use crate::view::View;

/// An inference rule: given a just-asserted triple, returns zero or more
/// derived triples to assert alongside it.
///
/// Modelled as a pure function of the triple (rather than a closure with
/// direct graph access) so that applying a rule while the graph's write
/// lock is held never needs to re-enter the lock.
pub type InferenceRule = Box<dyn Fn(&[String; 3]) -> Vec<[String; 3]> + Send + Sync>;

/// A read-only solution to a pattern query: the matching rows, per-axis
/// views for planner use, and the row width (number of free positions).
pub struct Solution {
    pub rows: Vec<Vec<String>>,
    pub views: Vec<View>,
    pub width: usize,
}

struct Indices {
    spo: Index,
    pos: Index,
    osp: Index,
}

impl Indices {
    fn new() -> Self {
        Indices {
            spo: Index::new(),
            pos: Index::new(),
            osp: Index::new(),
        }
    }
}

/// A multiset of distinct triples held in three redundant indices (SPO,
/// POS, OSP) behind a single reader/writer lock.
pub struct Graph {
    indices: RwLock<Indices>,
    rules: RwLock<Vec<InferenceRule>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            indices: RwLock::new(Indices::new()),
            rules: RwLock::new(Vec::new()),
        }
    }

    /// Register an inference rule, run (in registration order) on every
    /// future assertion. Does not fire retroactively and never fires on
    /// retraction.
    pub fn add_rule(&self, rule: InferenceRule) {
        self.rules.write().push(rule);
    }

    /// Assert `(s, p, o)`. A no-op if the triple is already present.
    /// Applies every inference rule (in registration order) to the newly
    /// asserted triple before committing it, and recursively to whatever
    /// those rules derive, until no rule derives anything new.
    pub fn assert(&self, s: &str, p: &str, o: &str) {
        trace!(s, p, o, "graph.assert");
        let rules = self.rules.read();
        let mut indices = self.indices.write();
        let mut worklist = vec![[s.to_string(), p.to_string(), o.to_string()]];
        let mut seen = std::collections::HashSet::new();
        while let Some(triple) = worklist.pop() {
            if !seen.insert(triple.clone()) {
                continue;
            }
            for rule in rules.iter() {
                worklist.extend(rule(&triple));
            }
            let [s, p, o] = &triple;
            if indices.spo.contains(s, Some(p), Some(o)) {
                continue;
            }
            indices.spo.add(s, p, o);
            indices.pos.add(p, o, s);
            indices.osp.add(o, s, p);
        }
    }

    /// Retract triples matching `(s?, p?, o?)` (`None` is a wildcard). Does
    /// not fire inference rules.
    pub fn retract(&self, s: Option<&str>, p: Option<&str>, o: Option<&str>) {
        debug!(?s, ?p, ?o, "graph.retract");
        let mut indices = self.indices.write();
        indices.spo.remove(s, p, o);
        indices.pos.remove(p, o, s);
        indices.osp.remove(o, s, p);
    }

    pub fn is_true(&self, s: &str, p: &str, o: &str) -> bool {
        self.indices.read().spo.contains(s, Some(p), Some(o))
    }

    pub fn clear(&self) {
        let mut indices = self.indices.write();
        indices.spo.clear();
        indices.pos.clear();
        indices.osp.clear();
    }

    /// Query the graph for every triple matching `(cs, cp, co)`, dispatching
    /// to the cheapest index by how many positions are `Specific`.
    pub fn enumerate(&self, cs: &Constraint, cp: &Constraint, co: &Constraint) -> Solution {
        let indices = self.indices.read();
        let specifics = [cs.is_specific(), cp.is_specific(), co.is_specific()];
        match specifics {
            [true, true, true] => {
                let row_exists = indices
                    .spo
                    .contains(cs.as_specific().unwrap(), Some(cp.as_specific().unwrap()), Some(co.as_specific().unwrap()));
                Solution {
                    rows: if row_exists { vec![vec![]] } else { vec![] },
                    views: vec![],
                    width: 0,
                }
            }
            [true, true, false] => {
                let rows = indices.spo.enumerate(cs, cp, co);
                let view = indices.spo.view(co);
                Solution { rows, views: vec![view], width: 1 }
            }
            [false, true, true] => {
                // (p, o) bound via POS, producing [s].
                let rows = indices.pos.enumerate(cp, co, cs);
                let view = indices.pos.view(cs);
                Solution { rows, views: vec![view], width: 1 }
            }
            [true, false, true] => {
                // (o, s) bound via OSP, producing [p].
                let rows = indices.osp.enumerate(co, cs, cp);
                let view = indices.osp.view(cp);
                Solution { rows, views: vec![view], width: 1 }
            }
            [true, false, false] => {
                let rows = indices.spo.enumerate(cs, cp, co);
                let (_, v2, v3) = indices.spo.views(cs, cp, co);
                Solution { rows, views: vec![v2, v3], width: 2 }
            }
            [false, true, false] => {
                // subject bound indirectly via predicate: POS gives [o, s], reversed to [s, o].
                let rows: Vec<Vec<String>> = indices
                    .pos
                    .enumerate(cp, co, cs)
                    .into_iter()
                    .map(|row| vec![row[1].clone(), row[0].clone()])
                    .collect();
                let (_, v_o, v_s) = indices.pos.views(cp, co, cs);
                Solution { rows, views: vec![v_s, v_o], width: 2 }
            }
            [false, false, true] => {
                let rows = indices.osp.enumerate(co, cs, cp);
                let (_, v_s, v_p) = indices.osp.views(co, cs, cp);
                Solution { rows, views: vec![v_s, v_p], width: 2 }
            }
            [false, false, false] => {
                let rows = indices.spo.enumerate(cs, cp, co);
                let (v1, v2, v3) = indices.spo.views(cs, cp, co);
                Solution { rows, views: vec![v1, v2, v3], width: 3 }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_is_idempotent() {
        let g = Graph::new();
        g.assert("a", "p", "b");
        g.assert("a", "p", "b");
        assert_eq!(g.enumerate(&Constraint::Empty, &Constraint::Empty, &Constraint::Empty).rows.len(), 1);
    }

    #[test]
    fn index_triality() {
        let g = Graph::new();
        g.assert("a", "p", "b");
        assert!(g.is_true("a", "p", "b"));
        let indices = g.indices.read();
        assert!(indices.spo.contains("a", Some("p"), Some("b")));
        assert!(indices.pos.contains("p", Some("b"), Some("a")));
        assert!(indices.osp.contains("b", Some("a"), Some("p")));
    }

    #[test]
    fn assert_then_retract_round_trips() {
        let g = Graph::new();
        g.assert("a", "p", "b");
        g.retract(Some("a"), Some("p"), Some("b"));
        assert!(!g.is_true("a", "p", "b"));
        assert_eq!(g.enumerate(&Constraint::Empty, &Constraint::Empty, &Constraint::Empty).rows.len(), 0);
    }

    #[test]
    fn dispatch_one_bound_subject_returns_p_o_pairs() {
        let g = Graph::new();
        g.assert("a", "p", "b");
        g.assert("a", "q", "c");
        let sol = g.enumerate(&Constraint::specific("a"), &Constraint::Empty, &Constraint::Empty);
        assert_eq!(sol.width, 2);
        assert_eq!(sol.rows.len(), 2);
    }

    #[test]
    fn dispatch_two_bound_subject_predicate_returns_objects() {
        let g = Graph::new();
        g.assert("a", "p", "b");
        g.assert("a", "p", "c");
        let sol = g.enumerate(&Constraint::specific("a"), &Constraint::specific("p"), &Constraint::Empty);
        let mut objs: Vec<String> = sol.rows.into_iter().map(|r| r[0].clone()).collect();
        objs.sort();
        assert_eq!(objs, vec!["b", "c"]);
    }

    #[test]
    fn inference_rule_fires_on_assert_not_retract() {
        let g = Graph::new();
        g.add_rule(Box::new(|triple| {
            if triple[1] == "type" {
                vec![[triple[0].clone(), "derived".to_string(), "yes".to_string()]]
            } else {
                vec![]
            }
        }));
        g.assert("a", "type", "Person");
        assert!(g.is_true("a", "derived", "yes"));
        g.retract(Some("a"), Some("type"), Some("Person"));
        // retraction does not fire rules, so the derived triple survives.
        assert!(g.is_true("a", "derived", "yes"));
    }
}


