//! The Query group tree the builder assembles and the executor walks.
//!
//! This is deliberately a tree of labelled *groups*, not a relational-algebra
//! operator tree: a plain `{ }` block carries triple clauses, filters, and
//! binders directly rather than being lowered to `Join`/`Filter`/`Extend`
//! nodes up front. The executor applies each label's fixed evaluation rule
//! in one recursive walk instead of optimizing an operator tree first.

use rdf_model::Term;

use crate::algebra::{Aggregate, Expression};

/// What kind of group this node is; determines which Query Executor rule
/// applies to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupLabel {
    /// An ordinary `{ }` graph pattern block.
    Plain,
    Select,
    Construct,
    Ask,
    Describe,
    Optional,
    Minus,
    Union,
    Values,
    Exists,
    NotExists,
    /// `GRAPH <iri-or-var> { ... }`.
    Graph,
    /// `SERVICE <iri> { ... }` — evaluated against the active dataset only;
    /// no networked federation is performed (out of scope per the system's
    /// non-goals).
    Service,
}

/// An explicit `BIND(expr AS ?var)`, a SELECT `(expr AS ?var)` binder, or an
/// implicit scratch column the builder introduces for an ORDER BY key or an
/// aggregate argument.
#[derive(Debug, Clone)]
pub struct Binder {
    pub var: String,
    pub expr: Expression,
}

/// A SELECT `(COUNT(?x) AS ?c)`-style aggregate binder.
#[derive(Debug, Clone)]
pub struct AggregateBinder {
    pub var: String,
    pub aggregate: Aggregate,
}

/// One row of a `VALUES` clause: `None` for `UNDEF` in that column.
pub type ValuesRow = Vec<Option<Term>>;

/// The `VALUES` data carried by a group labelled `Values`.
#[derive(Debug, Clone, Default)]
pub struct ValuesBlock {
    pub vars: Vec<String>,
    pub rows: Vec<ValuesRow>,
}

/// SELECT-only configuration, populated when `label == GroupLabel::Select`.
#[derive(Debug, Clone, Default)]
pub struct SelectSpec {
    /// `true` for `SELECT *`; `projection` is filled in by the builder's
    /// finalisation pass once every descendant variable is known.
    pub select_star: bool,
    /// Declared output columns in order, each optionally a SELECT `AS` binder.
    pub projection: Vec<Binder>,
    pub distinct: bool,
    pub reduced: bool,
    pub group_by: Vec<String>,
    pub aggregates: Vec<AggregateBinder>,
    pub having: Vec<Expression>,
    /// `(sort key expression, descending)`.
    pub order_by: Vec<(Expression, bool)>,
    /// `-1` means unset, per the glossary's limit/offset convention.
    pub limit: i64,
    pub offset: i64,
}

impl SelectSpec {
    pub fn new() -> Self {
        SelectSpec {
            limit: -1,
            offset: -1,
            ..Default::default()
        }
    }

    pub fn has_aggregation(&self) -> bool {
        !self.aggregates.is_empty() || !self.group_by.is_empty()
    }
}

/// A node in the query group tree.
#[derive(Debug, Clone)]
pub struct Group {
    pub label: GroupLabel,
    /// Triple patterns directly in this group (not in a nested child).
    pub patterns: Vec<[Term; 3]>,
    pub children: Vec<Group>,
    pub filters: Vec<Expression>,
    pub binders: Vec<Binder>,
    /// The CONSTRUCT template, populated only when `label == Construct`.
    pub construct_template: Vec<[Term; 3]>,
    /// The `GRAPH`/`SERVICE` target term (IRI or variable).
    pub graph_term: Option<Term>,
    pub values: Option<ValuesBlock>,
    pub select: Option<SelectSpec>,
    /// `FILTER EXISTS { ... }` / `FILTER NOT EXISTS { ... }` attached to this
    /// group, each itself a nested group labelled `Exists`/`NotExists`.
    pub exists_filters: Vec<Group>,
    /// The resources a `DESCRIBE` query names directly (IRIs) or indirectly
    /// (variables bound by its optional WHERE body); populated only when
    /// `label == Describe`.
    pub describe_terms: Vec<Term>,
}

impl Group {
    pub fn new(label: GroupLabel) -> Self {
        Group {
            label,
            patterns: Vec::new(),
            children: Vec::new(),
            filters: Vec::new(),
            binders: Vec::new(),
            construct_template: Vec::new(),
            graph_term: None,
            values: None,
            select: None,
            exists_filters: Vec::new(),
            describe_terms: Vec::new(),
        }
    }

    /// Every variable name referenced anywhere under this group (patterns,
    /// filters, binders, children), skipping MINUS and FILTER subgroups per
    /// the `SELECT *` finalisation rule (§4.9).
    pub fn collect_variables(&self, out: &mut Vec<String>) {
        for pattern in &self.patterns {
            for term in pattern {
                if let Term::Variable(v) = term {
                    push_unique(out, &v.0);
                }
            }
        }
        for binder in &self.binders {
            push_unique(out, &binder.var);
        }
        for child in &self.children {
            if matches!(child.label, GroupLabel::Minus) {
                continue;
            }
            child.collect_variables(out);
        }
    }
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|v| v == name) {
        out.push(name.to_string());
    }
}
