//! Captured-substring bindings, keyed by dotted name.

use std::collections::HashMap;

/// Mapping from a captured dotted name (e.g. `triple.subject`) to the
/// substring of input consumed while the corresponding `Named` production
/// was active.
#[derive(Debug, Clone, Default)]
pub struct Bindings(pub(crate) HashMap<String, String>);

impl Bindings {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// All captured names sharing a given dotted prefix (e.g. every
    /// `triples.3.*` capture of the third repetition of a named group),
    /// in no particular order.
    pub fn under_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.0.iter().filter_map(move |(k, v)| {
            k.strip_prefix(prefix).map(|rest| (rest.trim_start_matches('.'), v.as_str()))
        })
    }
}
