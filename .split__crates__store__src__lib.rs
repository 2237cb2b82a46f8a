//! In-memory RDF graph and dataset: ordered key collection, three-index
//! pattern store, constraints/views, and the inference-rule hook.
//!
//! A `Graph` holds three redundant indices (SPO, POS, OSP) behind a single
//! reader/writer lock and dispatches pattern queries to the cheapest one by
//! how many positions are bound. A `Dataset` is a named collection of
//! `Graph`s with an active selection.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod constraint;
mod dataset;
mod error;
mod graph;
mod index;
mod kv;
mod observability;
mod view;

pub use constraint::Constraint;
pub use dataset::Dataset;
pub use error::{StoreError, StoreResult};
pub use graph::{Graph, InferenceRule, Solution};
pub use index::Index;
pub use kv::{BTreeKeyCollection, OrderedKeyCollection};
pub use observability::{track_operation, OperationType};
pub use view::View;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_roundtrip_smoke_test() {
        let ds = Dataset::new("default");
        ds.active().assert("http://a", "http://p", "http://b");
        assert!(ds.active().is_true("http://a", "http://p", "http://b"));
    }
}


