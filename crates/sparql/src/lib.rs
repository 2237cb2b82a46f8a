//! SPARQL 1.1 query engine: grammar, algebra, and evaluation over a `store::Dataset`.
//!
//! Supports `SELECT`/`CONSTRUCT`/`DESCRIBE`/`ASK`, `OPTIONAL`/`UNION`/`MINUS`,
//! `GRAPH`/`SERVICE`, `FILTER` (including `EXISTS`/`NOT EXISTS`), `BIND`,
//! inline `VALUES`, aggregation with `GROUP BY`/`HAVING`, solution
//! modifiers, and the builtin function library.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod algebra;
mod builder;
mod builtins;
mod error;
mod executor;
mod grammar;
mod group;
mod parser;
mod table;

pub use algebra::{Aggregate, BuiltinFunction, CompareOp, EvalContext, Expression};
pub use error::{SparqlError, SparqlResult};
pub use executor::{execute, resource_from_canonical, QueryResult};
pub use group::{AggregateBinder, Binder, Group, GroupLabel, SelectSpec, ValuesBlock, ValuesRow};
pub use parser::{parse, query};
pub use table::Table;
