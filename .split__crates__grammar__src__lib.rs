//! A generic backtracking production-graph interpreter.
//!
//! A `Grammar<P>` is a graph of `Production<P>` nodes addressed by index.
//! Parsing drives a single entry production against an input string,
//! capturing named substrings into a `Bindings` map and deferring
//! semantic actions (`Call`) until the whole parse succeeds, at which
//! point they are replayed in registration order against a caller-
//! supplied producer value of type `P`.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod bindings;
mod error;
mod grammar;
mod production;

pub use bindings::Bindings;
pub use error::GrammarError;
pub use grammar::Grammar;
pub use production::{Action, ProdRef, Production};

/// Marker trait for types that can receive deferred `Call` actions during
/// a parse. Blanket-implemented for every type, since the only
/// requirement is the ability to be mutably borrowed.
pub trait Producer {}

impl<T> Producer for T {}


