//! A named collection of graphs with an active selection.

use std::collections::HashMap;

use crate::error::{StoreError, StoreResult};
use crate::graph::Graph;

/// Name → `Graph` mapping with a designated default graph and an active
/// selection that all SPARQL evaluation reads from.
pub struct Dataset {
    graphs: HashMap<String, Graph>,
    default_graph_name: String,
    active: String,
}

impl Dataset {
    /// Create a dataset with a single empty graph, `default_graph_name`,
    /// both default and active.
    pub fn new(default_graph_name: impl Into<String>) -> Self {
        let name = default_graph_name.into();
        let mut graphs = HashMap::new();
        graphs.insert(name.clone(), Graph::new());
        Dataset {
            graphs,
            active: name.clone(),
            default_graph_name: name,
        }
    }

    pub fn default_graph_name(&self) -> &str {
        &self.default_graph_name
    }

    pub fn active_graph_name(&self) -> &str {
        &self.active
    }

    /// Create a named graph if it does not already exist.
    pub fn ensure_graph(&mut self, name: impl Into<String>) {
        self.graphs.entry(name.into()).or_insert_with(Graph::new);
    }

    pub fn graph(&self, name: &str) -> StoreResult<&Graph> {
        self.graphs.get(name).ok_or_else(|| StoreError::NoSuchGraph(name.to_string()))
    }

    pub fn active(&self) -> &Graph {
        // `active` always names an existing graph: set_active_graph only
        // accepts names that `ensure_graph` has already registered.
        self.graphs.get(&self.active).expect("active graph always exists")
    }

    pub fn set_active_graph(&mut self, name: impl Into<String>) -> StoreResult<()> {
        let name = name.into();
        if !self.graphs.contains_key(&name) {
            return Err(StoreError::NoSuchGraph(name));
        }
        self.active = name;
        Ok(())
    }

    pub fn graph_names(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dataset_has_active_default_graph() {
        let ds = Dataset::new("default");
        assert_eq!(ds.active_graph_name(), "default");
        assert_eq!(ds.default_graph_name(), "default");
    }

    #[test]
    fn switching_to_unknown_graph_errors() {
        let mut ds = Dataset::new("default");
        assert!(ds.set_active_graph("nope").is_err());
    }

    #[test]
    fn ensure_then_switch_active_graph() {
        let mut ds = Dataset::new("default");
        ds.ensure_graph("g1");
        ds.set_active_graph("g1").unwrap();
        assert_eq!(ds.active_graph_name(), "g1");
        ds.active().assert("a", "p", "b");
        assert!(ds.graph("g1").unwrap().is_true("a", "p", "b"));
    }
}
