//! The producer object driven by the SPARQL grammar's deferred actions: a
//! stack-based state machine that assembles the query group tree (`group.rs`)
//! and compiles expression/aggregate trees (`algebra.rs`) as the grammar's
//! `Call` actions replay against it, mirroring the nesting of Turtle's
//! subject/predicate stack but working over unresolved `Term`s (a pattern's
//! subject or object may itself be a variable) rather than canonical strings.

use std::collections::HashMap;

use rdf_model::{Literal, Resource, Term, Vocabulary};

use crate::algebra::{Aggregate, BuiltinFunction, CompareOp, Expression};
use crate::error::{SparqlError, SparqlResult};
use crate::group::{Binder, Group, GroupLabel, SelectSpec, ValuesBlock};

#[derive(Default)]
struct CollectionFrame {
    head: Option<Term>,
    previous: Option<Term>,
}

/// Semantic-action target for a SPARQL parse. Accumulates the query group
/// tree as the grammar's deferred `Call` actions replay against it.
pub struct SparqlProducer {
    prefixes: HashMap<String, String>,
    base: String,
    blank_seq: u64,
    synthetic_seq: u64,

    // --- Triple-pattern assembly (shared by WHERE-clause patterns and the
    // CONSTRUCT template; routed by `in_template`) ---
    subjects: Vec<Term>,
    predicates: Vec<Option<Term>>,
    predicate_inverse: Vec<bool>,
    pending: Option<Term>,
    blank_stack: Vec<Term>,
    collections: Vec<CollectionFrame>,
    in_template: bool,
    construct_template: Vec<[Term; 3]>,

    // --- Group tree assembly ---
    group_stack: Vec<Group>,
    /// Children accumulated for the group currently on top of `group_stack`,
    /// kept separate from the group itself so a `GroupOrUnionGraphPattern`'s
    /// branches can be collected before deciding whether they need wrapping
    /// in a `Union` group.
    children_stack: Vec<Vec<Group>>,
    /// The most recently closed group, consumed by whichever action follows
    /// `close_group` (`attach_child`, `capture_union_branch`, or
    /// `attach_exists_filter`).
    last_closed: Option<Group>,
    union_scopes: Vec<Vec<Group>>,
    root: Option<Group>,

    // --- VALUES block under construction ---
    values_vars: Vec<String>,
    values_rows: Vec<Vec<Option<Term>>>,
    values_row: Vec<Option<Term>>,

    // --- Expression compilation ---
    expr_stack: Vec<Expression>,
    arg_marks: Vec<usize>,

    // --- SELECT solution modifiers, accumulated directly (no nested
    // sub-SELECTs are supported, so one live spec suffices) ---
    select_spec: SelectSpec,
    select_binders: Vec<Binder>,
    order_desc: bool,
    group_concat_separator: Option<String>,

    error: Option<SparqlError>,
}

impl SparqlProducer {
    pub fn new(base: impl Into<String>) -> Self {
        SparqlProducer {
            prefixes: HashMap::new(),
            base: base.into(),
            blank_seq: 0,
            synthetic_seq: 0,
            subjects: Vec::new(),
            predicates: Vec::new(),
            predicate_inverse: Vec::new(),
            pending: None,
            blank_stack: Vec::new(),
            collections: Vec::new(),
            in_template: false,
            construct_template: Vec::new(),
            group_stack: Vec::new(),
            children_stack: Vec::new(),
            last_closed: None,
            union_scopes: Vec::new(),
            root: None,
            values_vars: Vec::new(),
            values_rows: Vec::new(),
            values_row: Vec::new(),
            expr_stack: Vec::new(),
            arg_marks: Vec::new(),
            select_spec: SelectSpec::new(),
            select_binders: Vec::new(),
            order_desc: false,
            group_concat_separator: None,
            error: None,
        }
    }

    /// Consumes the producer, returning the assembled top-level query group
    /// or the first semantic error encountered while replaying actions.
    pub fn into_query(mut self) -> SparqlResult<Group> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.root.ok_or_else(|| SparqlError::Semantic("empty query".to_string()))
    }

    fn fail(&mut self, err: SparqlError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub(crate) fn parse_term(&self, raw: &str) -> SparqlResult<Term> {
        Term::parse(raw, &self.prefixes, &self.base).map_err(SparqlError::Term)
    }

    fn fresh_blank(&mut self) -> Term {
        let id = self.blank_seq;
        self.blank_seq += 1;
        Term::blank(format!("qb{id}"))
    }

    fn fresh_synthetic_var(&mut self) -> String {
        let id = self.synthetic_seq;
        self.synthetic_seq += 1;
        format!("__agg{id}")
    }

    // --- Directives ---

    pub(crate) fn set_prefix(&mut self, raw_prefix: &str, raw_iri: &str) {
        let name = raw_prefix.trim_end_matches(':').to_string();
        match self.resolve_iri_ref(raw_iri) {
            Ok(resolved) => {
                self.prefixes.insert(name, resolved);
            }
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn set_base(&mut self, raw_iri: &str) {
        match self.resolve_iri_ref(raw_iri) {
            Ok(resolved) => self.base = resolved,
            Err(err) => self.fail(err),
        }
    }

    fn resolve_iri_ref(&self, bracketed: &str) -> SparqlResult<String> {
        let inner = bracketed.trim_start_matches('<').trim_end_matches('>');
        if inner.contains(':') {
            Ok(inner.to_string())
        } else {
            rdf_model::resolve_relative(inner, &self.base).map_err(SparqlError::Term)
        }
    }

    // --- Group tree ---

    pub(crate) fn open_group(&mut self, label: GroupLabel) {
        self.group_stack.push(Group::new(label));
        self.children_stack.push(Vec::new());
    }

    pub(crate) fn close_group(&mut self) {
        let Some(mut finished) = self.group_stack.pop() else { return };
        finished.children = self.children_stack.pop().unwrap_or_default();
        if self.group_stack.is_empty() {
            self.root = Some(finished);
        } else {
            self.last_closed = Some(finished);
        }
    }

    /// Attaches the most recently closed group as an ordinary child of
    /// whatever is now on top of the group stack.
    pub(crate) fn attach_child(&mut self) {
        if let Some(group) = self.last_closed.take() {
            if let Some(children) = self.children_stack.last_mut() {
                children.push(group);
            }
        }
    }

    /// Attaches the most recently closed group as a `FILTER EXISTS`/
    /// `FILTER NOT EXISTS` subquery of the group still open beneath it.
    pub(crate) fn attach_exists_filter(&mut self) {
        if let Some(group) = self.last_closed.take() {
            if let Some(parent) = self.group_stack.last_mut() {
                parent.exists_filters.push(group);
            }
        }
    }

    pub(crate) fn set_graph_term(&mut self, raw: &str) {
        match self.parse_term(raw) {
            Ok(term) => {
                if let Some(group) = self.group_stack.last_mut() {
                    group.graph_term = Some(term);
                }
            }
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn begin_union_scope(&mut self) {
        self.union_scopes.push(Vec::new());
    }

    /// Moves the most recently closed group into the current union scope's
    /// branch list, called right after each alternative of a
    /// `GroupOrUnionGraphPattern` closes.
    pub(crate) fn capture_union_branch(&mut self) {
        if let Some(group) = self.last_closed.take() {
            if let Some(scope) = self.union_scopes.last_mut() {
                scope.push(group);
            }
        }
    }

    /// Ends a `GroupOrUnionGraphPattern`: a single captured branch attaches
    /// directly (a bare `{ }` nested block), while two or more are wrapped
    /// in a synthesized `Union` group before attaching.
    pub(crate) fn end_union_scope(&mut self) {
        let Some(mut branches) = self.union_scopes.pop() else { return };
        let group = if branches.len() == 1 {
            branches.pop().unwrap()
        } else {
            let mut union = Group::new(GroupLabel::Union);
            union.children = branches;
            union
        };
        if let Some(children) = self.children_stack.last_mut() {
            children.push(group);
        }
    }

    // --- Subject / predicate / object, shared by WHERE patterns and the
    // CONSTRUCT template ---

    fn push_triple(&mut self, triple: [Term; 3]) {
        if self.in_template {
            self.construct_template.push(triple);
        } else if let Some(group) = self.group_stack.last_mut() {
            group.patterns.push(triple);
        }
    }

    pub(crate) fn begin_template(&mut self) {
        self.in_template = true;
    }

    pub(crate) fn end_template(&mut self) {
        self.in_template = false;
        if let Some(group) = self.group_stack.last_mut() {
            group.construct_template = std::mem::take(&mut self.construct_template);
        }
    }

    pub(crate) fn push_subject_from_text(&mut self, raw: &str) {
        match self.parse_term(raw) {
            Ok(term) => {
                self.subjects.push(term);
                self.predicates.push(None);
                self.predicate_inverse.push(false);
            }
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn push_subject_from_pending(&mut self) {
        let value = self.pending.take().unwrap_or_else(|| Term::blank("missing"));
        self.subjects.push(value);
        self.predicates.push(None);
        self.predicate_inverse.push(false);
    }

    pub(crate) fn pop_subject(&mut self) {
        self.subjects.pop();
        self.predicates.pop();
        self.predicate_inverse.pop();
    }

    pub(crate) fn set_predicate_from_text(&mut self, raw: &str, inverse: bool) {
        let result = if raw == "a" { Ok(Term::iri(Vocabulary::RDF_TYPE)) } else { self.parse_term(raw) };
        match result {
            Ok(term) => {
                if let Some(slot) = self.predicates.last_mut() {
                    *slot = Some(term);
                }
                if let Some(slot) = self.predicate_inverse.last_mut() {
                    *slot = inverse;
                }
            }
            Err(err) => self.fail(err),
        }
    }

    fn emit(&mut self, object: Term) {
        let Some(subject) = self.subjects.last().cloned() else {
            self.fail(SparqlError::Semantic("object outside of a subject/predicate context".to_string()));
            return;
        };
        let Some(Some(predicate)) = self.predicates.last().cloned() else {
            self.fail(SparqlError::Semantic("object with no preceding predicate".to_string()));
            return;
        };
        let inverse = self.predicate_inverse.last().copied().unwrap_or(false);
        let triple = if inverse { [object, predicate, subject] } else { [subject, predicate, object] };
        self.push_triple(triple);
    }

    pub(crate) fn emit_object_from_text(&mut self, raw: &str) {
        let parsed = parse_numeric_or_bool(raw).map(Ok).unwrap_or_else(|| self.parse_term(raw));
        match parsed {
            Ok(term) => self.emit(term),
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn emit_literal_object(&mut self, raw_with_quotes: &str, lang: Option<&str>, datatype: Option<&str>) {
        match build_literal(self, raw_with_quotes, lang, datatype) {
            Ok(term) => self.emit(term),
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn emit_object_from_pending(&mut self) {
        let value = self.pending.take().unwrap_or_else(|| Term::blank("missing"));
        self.emit(value);
    }

    // --- Blank-node property lists ---

    pub(crate) fn begin_blank_object(&mut self) {
        let blank = self.fresh_blank();
        self.blank_stack.push(blank.clone());
        self.subjects.push(blank);
        self.predicates.push(None);
        self.predicate_inverse.push(false);
    }

    pub(crate) fn end_blank_object(&mut self) {
        self.subjects.pop();
        self.predicates.pop();
        self.predicate_inverse.pop();
        self.pending = self.blank_stack.pop();
    }

    // --- Collections ---

    pub(crate) fn begin_collection(&mut self) {
        self.collections.push(CollectionFrame::default());
    }

    pub(crate) fn begin_collection_item(&mut self) {
        let cell = self.fresh_blank();
        {
            let frame = self.collections.last_mut().expect("collection frame");
            if let Some(previous) = frame.previous.clone() {
                self.push_triple([previous, Term::iri(Vocabulary::RDF_REST), cell.clone()]);
            } else {
                frame.head = Some(cell.clone());
            }
        }
        self.collections.last_mut().expect("collection frame").previous = Some(cell.clone());
        self.subjects.push(cell);
        self.predicates.push(Some(Term::iri(Vocabulary::RDF_FIRST)));
        self.predicate_inverse.push(false);
    }

    pub(crate) fn end_collection_item(&mut self) {
        self.subjects.pop();
        self.predicates.pop();
        self.predicate_inverse.pop();
    }

    pub(crate) fn end_collection(&mut self) {
        let frame = self.collections.pop().expect("collection frame");
        match (frame.head, frame.previous) {
            (Some(head), Some(last)) => {
                self.push_triple([last, Term::iri(Vocabulary::RDF_REST), Term::iri(Vocabulary::RDF_NIL)]);
                self.pending = Some(head);
            }
            _ => self.pending = Some(Term::iri(Vocabulary::RDF_NIL)),
        }
    }

    // --- GRAPH/SERVICE target, VALUES ---

    pub(crate) fn begin_values_block(&mut self) {
        self.values_vars.clear();
        self.values_rows.clear();
    }

    pub(crate) fn add_values_var(&mut self, raw: &str) {
        match self.parse_term(raw) {
            Ok(Term::Variable(v)) => self.values_vars.push(v.0),
            _ => self.fail(SparqlError::Semantic(format!("expected a variable in VALUES: {raw}"))),
        }
    }

    pub(crate) fn begin_values_row(&mut self) {
        self.values_row.clear();
    }

    pub(crate) fn add_values_cell_term(&mut self, raw: &str) {
        let parsed = parse_numeric_or_bool(raw).map(Ok).unwrap_or_else(|| self.parse_term(raw));
        match parsed {
            Ok(term) => self.values_row.push(Some(term)),
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn add_values_cell_literal(&mut self, raw_with_quotes: &str, lang: Option<&str>, datatype: Option<&str>) {
        match build_literal(self, raw_with_quotes, lang, datatype) {
            Ok(term) => self.values_row.push(Some(term)),
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn add_values_cell_undef(&mut self) {
        self.values_row.push(None);
    }

    pub(crate) fn end_values_row(&mut self) {
        self.values_rows.push(std::mem::take(&mut self.values_row));
    }

    pub(crate) fn finish_values(&mut self) {
        let block = ValuesBlock {
            vars: std::mem::take(&mut self.values_vars),
            rows: std::mem::take(&mut self.values_rows),
        };
        if let Some(group) = self.group_stack.last_mut() {
            group.values = Some(block);
        }
    }

    // --- FILTER / BIND ---

    pub(crate) fn push_filter(&mut self) {
        let Some(expr) = self.expr_stack.pop() else { return };
        if let Some(group) = self.group_stack.last_mut() {
            group.filters.push(expr);
        }
    }

    pub(crate) fn push_bind(&mut self, var: String) {
        let expr = self.expr_stack.pop().unwrap_or(Expression::Literal(Resource::Empty));
        if let Some(group) = self.group_stack.last_mut() {
            group.binders.push(Binder { var, expr });
        }
    }

    // --- Expression compilation ---

    pub(crate) fn push_var_expr(&mut self, raw: &str) {
        match self.parse_term(raw) {
            Ok(Term::Variable(v)) => self.expr_stack.push(Expression::Var(v.0)),
            _ => self.fail(SparqlError::Semantic(format!("expected a variable: {raw}"))),
        }
    }

    pub(crate) fn push_iri_expr(&mut self, raw: &str) {
        match self.parse_term(raw) {
            Ok(term) => self.expr_stack.push(Expression::Literal(Resource::Term(term))),
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn push_numeric_or_bool_expr(&mut self, raw: &str) {
        match parse_numeric_or_bool(raw) {
            Some(term) => self.expr_stack.push(Expression::Literal(Resource::Term(term))),
            None => self.fail(SparqlError::Semantic(format!("not a numeric or boolean literal: {raw}"))),
        }
    }

    pub(crate) fn push_string_literal_expr(&mut self, raw_with_quotes: &str, lang: Option<&str>, datatype: Option<&str>) {
        match build_literal(self, raw_with_quotes, lang, datatype) {
            Ok(term) => self.expr_stack.push(Expression::Literal(Resource::Term(term))),
            Err(err) => self.fail(err),
        }
    }

    fn pop_expr(&mut self) -> Expression {
        self.expr_stack.pop().unwrap_or(Expression::Literal(Resource::Empty))
    }

    pub(crate) fn finish_not(&mut self) {
        let e = self.pop_expr();
        self.expr_stack.push(Expression::Not(Box::new(e)));
    }

    pub(crate) fn finish_neg(&mut self) {
        let e = self.pop_expr();
        self.expr_stack.push(Expression::Neg(Box::new(e)));
    }

    pub(crate) fn finish_and(&mut self) {
        let b = self.pop_expr();
        let a = self.pop_expr();
        self.expr_stack.push(Expression::And(Box::new(a), Box::new(b)));
    }

    pub(crate) fn finish_or(&mut self) {
        let b = self.pop_expr();
        let a = self.pop_expr();
        self.expr_stack.push(Expression::Or(Box::new(a), Box::new(b)));
    }

    pub(crate) fn finish_arith(&mut self, op: &str) {
        let b = self.pop_expr();
        let a = self.pop_expr();
        let (a, b) = (Box::new(a), Box::new(b));
        self.expr_stack.push(match op {
            "+" => Expression::Add(a, b),
            "-" => Expression::Sub(a, b),
            "*" => Expression::Mul(a, b),
            "/" => Expression::Div(a, b),
            _ => Expression::Add(a, b),
        });
    }

    pub(crate) fn finish_compare(&mut self, op_text: &str) {
        let b = self.pop_expr();
        let a = self.pop_expr();
        let op = match op_text {
            "=" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            _ => CompareOp::Eq,
        };
        self.expr_stack.push(Expression::Compare(op, Box::new(a), Box::new(b)));
    }

    pub(crate) fn finish_if(&mut self) {
        let else_branch = self.pop_expr();
        let then_branch = self.pop_expr();
        let cond = self.pop_expr();
        self.expr_stack.push(Expression::If(Box::new(cond), Box::new(then_branch), Box::new(else_branch)));
    }

    pub(crate) fn mark_args(&mut self) {
        self.arg_marks.push(self.expr_stack.len());
    }

    fn take_marked_args(&mut self) -> Vec<Expression> {
        let mark = self.arg_marks.pop().unwrap_or(0).min(self.expr_stack.len());
        self.expr_stack.split_off(mark)
    }

    pub(crate) fn finish_call(&mut self, f: BuiltinFunction) {
        let args = self.take_marked_args();
        self.expr_stack.push(Expression::Call(f, args));
    }

    pub(crate) fn finish_coalesce(&mut self) {
        let args = self.take_marked_args();
        self.expr_stack.push(Expression::Coalesce(args));
    }

    // --- Aggregates ---

    pub(crate) fn finish_aggregate(&mut self, aggregate: Aggregate) {
        let var = self.fresh_synthetic_var();
        self.select_spec.aggregates.push(crate::group::AggregateBinder { var: var.clone(), aggregate });
        self.expr_stack.push(Expression::Var(var));
    }

    pub(crate) fn finish_count(&mut self, distinct: bool, star: bool) {
        let expr = if star { None } else { Some(self.pop_expr()) };
        self.finish_aggregate(Aggregate::Count { distinct, expr });
    }

    pub(crate) fn finish_sum(&mut self, distinct: bool) {
        let expr = self.pop_expr();
        self.finish_aggregate(Aggregate::Sum { distinct, expr });
    }

    pub(crate) fn finish_min(&mut self) {
        let expr = self.pop_expr();
        self.finish_aggregate(Aggregate::Min { expr });
    }

    pub(crate) fn finish_max(&mut self) {
        let expr = self.pop_expr();
        self.finish_aggregate(Aggregate::Max { expr });
    }

    pub(crate) fn finish_avg(&mut self, distinct: bool) {
        let expr = self.pop_expr();
        self.finish_aggregate(Aggregate::Avg { distinct, expr });
    }

    pub(crate) fn finish_sample(&mut self) {
        let expr = self.pop_expr();
        self.finish_aggregate(Aggregate::Sample { expr });
    }

    pub(crate) fn set_group_concat_separator(&mut self, raw_with_quotes: &str) {
        self.group_concat_separator = strip_quote_delimiters(raw_with_quotes).ok().map(|s| s.to_string());
    }

    pub(crate) fn finish_group_concat(&mut self, distinct: bool) {
        let expr = self.pop_expr();
        let separator = self.group_concat_separator.take().unwrap_or_else(|| " ".to_string());
        self.finish_aggregate(Aggregate::GroupConcat { distinct, expr, separator });
    }

    // --- SELECT clause ---

    pub(crate) fn select_star(&mut self) {
        self.select_spec.select_star = true;
    }

    pub(crate) fn set_distinct(&mut self) {
        self.select_spec.distinct = true;
    }

    pub(crate) fn set_reduced(&mut self) {
        self.select_spec.reduced = true;
    }

    pub(crate) fn push_plain_projection(&mut self, raw: &str) {
        match self.parse_term(raw) {
            Ok(Term::Variable(v)) => self.select_spec.projection.push(Binder { var: v.0.clone(), expr: Expression::Var(v.0) }),
            _ => self.fail(SparqlError::Semantic(format!("expected a variable in SELECT: {raw}"))),
        }
    }

    pub(crate) fn finish_as_binder(&mut self, raw_var: &str) {
        let expr = self.pop_expr();
        match self.parse_term(raw_var) {
            Ok(Term::Variable(v)) => self.select_spec.projection.push(Binder { var: v.0, expr }),
            _ => self.fail(SparqlError::Semantic(format!("expected a variable after AS: {raw_var}"))),
        }
    }

    // --- GROUP BY / HAVING / ORDER BY / LIMIT / OFFSET ---

    pub(crate) fn push_group_by_var(&mut self, raw: &str) {
        match self.parse_term(raw) {
            Ok(Term::Variable(v)) => self.select_spec.group_by.push(v.0),
            _ => self.fail(SparqlError::Semantic(format!("expected a variable in GROUP BY: {raw}"))),
        }
    }

    pub(crate) fn finish_group_by_expr(&mut self, raw_var: &str) {
        let expr = self.pop_expr();
        match self.parse_term(raw_var) {
            Ok(Term::Variable(v)) => {
                self.select_binders.push(Binder { var: v.0.clone(), expr });
                self.select_spec.group_by.push(v.0);
            }
            _ => self.fail(SparqlError::Semantic(format!("expected a variable after AS: {raw_var}"))),
        }
    }

    pub(crate) fn push_having(&mut self) {
        let expr = self.pop_expr();
        self.select_spec.having.push(expr);
    }

    pub(crate) fn set_order_descending(&mut self, descending: bool) {
        self.order_desc = descending;
    }

    pub(crate) fn finish_order_key(&mut self) {
        let expr = self.pop_expr();
        self.select_spec.order_by.push((expr, self.order_desc));
        self.order_desc = false;
    }

    pub(crate) fn set_limit(&mut self, raw: &str) {
        if let Ok(n) = raw.parse() {
            self.select_spec.limit = n;
        }
    }

    pub(crate) fn set_offset(&mut self, raw: &str) {
        if let Ok(n) = raw.parse() {
            self.select_spec.offset = n;
        }
    }

    /// Finalizes the SELECT group, called just before its `close_group`:
    /// fills in `SELECT *`'s projection from every variable the body (and
    /// any `GROUP BY (expr AS ?var)` binders) introduces, then hands the
    /// accumulated spec and binders to the group itself.
    pub(crate) fn finish_select(&mut self) {
        if self.select_spec.select_star {
            let mut names = Vec::new();
            for child in self.children_stack.last().cloned().unwrap_or_default() {
                child.collect_variables(&mut names);
            }
            for binder in &self.select_binders {
                if !names.contains(&binder.var) {
                    names.push(binder.var.clone());
                }
            }
            self.select_spec.projection = names.into_iter().map(|n| Binder { var: n.clone(), expr: Expression::Var(n) }).collect();
        }
        if let Some(group) = self.group_stack.last_mut() {
            group.select = Some(std::mem::take(&mut self.select_spec));
            group.binders = std::mem::take(&mut self.select_binders);
        }
        self.select_spec = SelectSpec::new();
    }

    // --- DESCRIBE ---

    pub(crate) fn push_describe_term(&mut self, raw: &str) {
        match self.parse_term(raw) {
            Ok(term) => {
                if let Some(group) = self.group_stack.last_mut() {
                    group.describe_terms.push(term);
                }
            }
            Err(err) => self.fail(err),
        }
    }
}

fn strip_quote_delimiters(raw: &str) -> SparqlResult<&str> {
    for triple in ["\"\"\"", "'''"] {
        if raw.len() >= 6 && raw.starts_with(triple) && raw.ends_with(triple) {
            return Ok(&raw[3..raw.len() - 3]);
        }
    }
    for single in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(single) && raw.ends_with(single) {
            return Ok(&raw[1..raw.len() - 1]);
        }
    }
    Err(SparqlError::Semantic(format!("malformed string literal: {raw}")))
}

fn build_literal(producer: &SparqlProducer, raw_with_quotes: &str, lang: Option<&str>, datatype: Option<&str>) -> SparqlResult<Term> {
    let inner = strip_quote_delimiters(raw_with_quotes)?;
    let lexical = rdf_model::unescape_lexical(inner).map_err(SparqlError::Term)?;
    if let Some(lang) = lang {
        return Ok(Term::Literal(Literal::lang_string(lexical, lang)));
    }
    if let Some(datatype_text) = datatype {
        let datatype_term = producer.parse_term(datatype_text)?;
        let datatype_iri = match datatype_term {
            Term::Iri(iri) => iri.value(),
            _ => return Err(SparqlError::Semantic(format!("datatype is not an IRI: {datatype_text}"))),
        };
        return Ok(Term::Literal(Literal::typed(lexical, datatype_iri)));
    }
    Ok(Term::Literal(Literal::string(lexical)))
}

/// Recognizes SPARQL's unquoted numeric and boolean literal forms (`42`,
/// `-3.14`, `1.0e10`, `true`, `false`), used both for RDF-term object
/// position and for `NumericLiteral`/`BooleanLiteral` in the expression
/// grammar — the same shorthand Turtle's surface syntax shares.
fn parse_numeric_or_bool(raw: &str) -> Option<Term> {
    if raw == "true" || raw == "false" {
        return Some(Term::Literal(Literal::boolean(raw == "true")));
    }
    if is_integer_literal(raw) {
        return Some(Term::Literal(Literal::typed(raw, Vocabulary::XSD_INTEGER)));
    }
    if is_decimal_literal(raw) {
        return Some(Term::Literal(Literal::typed(raw, Vocabulary::XSD_DECIMAL)));
    }
    if is_double_literal(raw) {
        return Some(Term::Literal(Literal::typed(raw, Vocabulary::XSD_DOUBLE)));
    }
    None
}

fn is_integer_literal(raw: &str) -> bool {
    let body = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !body.is_empty() && body.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal_literal(raw: &str) -> bool {
    let body = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let Some((int_part, frac_part)) = body.split_once('.') else {
        return false;
    };
    !frac_part.is_empty() && frac_part.chars().all(|c| c.is_ascii_digit()) && int_part.chars().all(|c| c.is_ascii_digit())
}

fn is_double_literal(raw: &str) -> bool {
    let body = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let Some(e_pos) = body.find(['e', 'E']) else {
        return false;
    };
    let (mantissa, exponent) = body.split_at(e_pos);
    let exponent = &exponent[1..];
    let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    if exponent.is_empty() || !exponent.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if mantissa.is_empty() {
        return false;
    }
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    !int_part.is_empty() && int_part.chars().all(|c| c.is_ascii_digit()) && frac_part.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_numeric_and_boolean_shorthand() {
        assert!(matches!(parse_numeric_or_bool("42"), Some(Term::Literal(_))));
        assert!(matches!(parse_numeric_or_bool("-3.14"), Some(Term::Literal(_))));
        assert!(matches!(parse_numeric_or_bool("1.0e10"), Some(Term::Literal(_))));
        assert!(matches!(parse_numeric_or_bool("true"), Some(Term::Literal(_))));
        assert!(parse_numeric_or_bool("abc").is_none());
    }

    #[test]
    fn union_scope_with_single_branch_attaches_directly() {
        let mut p = SparqlProducer::new("http://example.org/");
        p.open_group(GroupLabel::Select);
        p.open_group(GroupLabel::Plain);
        p.begin_union_scope();
        p.open_group(GroupLabel::Plain);
        p.close_group();
        p.capture_union_branch();
        p.end_union_scope();
        p.close_group(); // closes the body Plain group
        assert_eq!(p.children_stack.last().unwrap().len(), 1);
        assert_eq!(p.children_stack.last().unwrap()[0].label, GroupLabel::Plain);
    }

    #[test]
    fn union_scope_with_two_branches_wraps_in_union() {
        let mut p = SparqlProducer::new("http://example.org/");
        p.open_group(GroupLabel::Select);
        p.open_group(GroupLabel::Plain);
        p.begin_union_scope();
        p.open_group(GroupLabel::Plain);
        p.close_group();
        p.capture_union_branch();
        p.open_group(GroupLabel::Plain);
        p.close_group();
        p.capture_union_branch();
        p.end_union_scope();
        p.close_group();
        let child = &p.children_stack.last().unwrap()[0];
        assert_eq!(child.label, GroupLabel::Union);
        assert_eq!(child.children.len(), 2);
    }
}


