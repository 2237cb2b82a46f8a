//! The expression AST: arithmetic, comparison, logical, and builtin-function
//! trees compiled from the SPARQL grammar's `Call` actions, plus the
//! aggregate specifications GROUP BY folds over.

use rdf_model::{Literal, Resource, Term};

use crate::builtins;

/// A relational comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A scalar SPARQL function, dispatched by `Expression::Call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunction {
    Str,
    Lang,
    LangMatches,
    Datatype,
    Iri,
    BNode,
    StrLen,
    UCase,
    LCase,
    EncodeForUri,
    Contains,
    StrStarts,
    StrEnds,
    StrBefore,
    StrAfter,
    Substr,
    Replace,
    Regex,
    Concat,
    StrLang,
    StrDt,
    StrUuid,
    Uuid,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Abs,
    Ceil,
    Floor,
    Round,
    Rand,
    Year,
    Month,
    Day,
    Hours,
    Minutes,
    Seconds,
    Timezone,
    Tz,
    Now,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    Bound,
    SameTerm,
}

/// A compiled scalar expression, evaluated row-by-row against a `Table`
/// row via `row_lookup`.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A constant term or resource (`Resource::Empty` for an unbound constant).
    Literal(Resource),
    /// A variable reference, resolved by looking the name up in the row.
    Var(String),
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Neg(Box<Expression>),
    Add(Box<Expression>, Box<Expression>),
    Sub(Box<Expression>, Box<Expression>),
    Mul(Box<Expression>, Box<Expression>),
    Div(Box<Expression>, Box<Expression>),
    Compare(CompareOp, Box<Expression>, Box<Expression>),
    Call(BuiltinFunction, Vec<Expression>),
    If(Box<Expression>, Box<Expression>, Box<Expression>),
    Coalesce(Vec<Expression>),
}

/// What an `Expression` is evaluated against: a row lookup (returns
/// `Resource::Empty` for an unbound or absent column) and the query-wide
/// constant `NOW()` value.
pub struct EvalContext<'a> {
    pub lookup: &'a dyn Fn(&str) -> Resource,
    pub now: &'a Literal,
}

impl Expression {
    pub fn eval(&self, ctx: &EvalContext<'_>) -> Resource {
        match self {
            Expression::Literal(r) => r.clone(),
            Expression::Var(name) => (ctx.lookup)(name),
            Expression::Not(e) => match e.eval(ctx).effective_boolean_value() {
                Some(b) => Resource::Term(Term::Literal(Literal::boolean(!b))),
                None => Resource::error("NOT of a value with no effective boolean value"),
            },
            Expression::And(a, b) => kleene_and(a.eval(ctx).effective_boolean_value(), || b.eval(ctx).effective_boolean_value()),
            Expression::Or(a, b) => kleene_or(a.eval(ctx).effective_boolean_value(), || b.eval(ctx).effective_boolean_value()),
            Expression::Neg(e) => builtins::negate(&e.eval(ctx)),
            Expression::Add(a, b) => builtins::arithmetic(builtins::ArithOp::Add, &a.eval(ctx), &b.eval(ctx)),
            Expression::Sub(a, b) => builtins::arithmetic(builtins::ArithOp::Sub, &a.eval(ctx), &b.eval(ctx)),
            Expression::Mul(a, b) => builtins::arithmetic(builtins::ArithOp::Mul, &a.eval(ctx), &b.eval(ctx)),
            Expression::Div(a, b) => builtins::arithmetic(builtins::ArithOp::Div, &a.eval(ctx), &b.eval(ctx)),
            Expression::Compare(op, a, b) => builtins::compare(*op, &a.eval(ctx), &b.eval(ctx)),
            Expression::Call(f, args) => {
                let values: Vec<Resource> = args.iter().map(|a| a.eval(ctx)).collect();
                builtins::call(*f, &values, ctx.now)
            }
            Expression::If(cond, then_branch, else_branch) => match cond.eval(ctx).effective_boolean_value() {
                Some(true) => then_branch.eval(ctx),
                Some(false) => else_branch.eval(ctx),
                None => Resource::error("IF condition has no effective boolean value"),
            },
            Expression::Coalesce(args) => args
                .iter()
                .map(|a| a.eval(ctx))
                .find(|r| !r.is_empty() && !r.is_error())
                .unwrap_or(Resource::Empty),
        }
    }
}

fn kleene_and(a: Option<bool>, b: impl FnOnce() -> Option<bool>) -> Resource {
    match a {
        Some(false) => Resource::Term(Term::Literal(Literal::boolean(false))),
        Some(true) => match b() {
            Some(v) => Resource::Term(Term::Literal(Literal::boolean(v))),
            None => Resource::error("AND operand has no effective boolean value"),
        },
        None => match b() {
            Some(false) => Resource::Term(Term::Literal(Literal::boolean(false))),
            _ => Resource::error("AND operand has no effective boolean value"),
        },
    }
}

fn kleene_or(a: Option<bool>, b: impl FnOnce() -> Option<bool>) -> Resource {
    match a {
        Some(true) => Resource::Term(Term::Literal(Literal::boolean(true))),
        Some(false) => match b() {
            Some(v) => Resource::Term(Term::Literal(Literal::boolean(v))),
            None => Resource::error("OR operand has no effective boolean value"),
        },
        None => match b() {
            Some(true) => Resource::Term(Term::Literal(Literal::boolean(true))),
            _ => Resource::error("OR operand has no effective boolean value"),
        },
    }
}

/// A GROUP BY aggregate, folded over one group's rows per spec's
/// `(current, accumulator, distinctSet)` contract: the accumulator starts
/// at `Resource::Empty`.
#[derive(Debug, Clone)]
pub enum Aggregate {
    Count { distinct: bool, expr: Option<Expression> },
    Sum { distinct: bool, expr: Expression },
    Min { expr: Expression },
    Max { expr: Expression },
    Avg { distinct: bool, expr: Expression },
    Sample { expr: Expression },
    GroupConcat { distinct: bool, expr: Expression, separator: String },
}

impl Aggregate {
    /// Folds this aggregate over every row of `rows` (already restricted to
    /// one GROUP BY partition).
    pub fn fold(&self, rows: &[Vec<String>], columns: &[String], now: &Literal) -> Resource {
        let lookup_for = |row: &[String]| -> Box<dyn Fn(&str) -> Resource> {
            let row: Vec<String> = row.to_vec();
            let columns = columns.to_vec();
            Box::new(move |name: &str| {
                columns
                    .iter()
                    .position(|c| c == name)
                    .map(|i| row.get(i).cloned().unwrap_or_default())
                    .filter(|v| !v.is_empty())
                    .map(|v| crate::executor::resource_from_canonical(&v))
                    .unwrap_or(Resource::Empty)
            })
        };
        match self {
            Aggregate::Count { distinct, expr: None } => builtins::aggregate::count_star(rows, *distinct, columns),
            Aggregate::Count { distinct, expr: Some(e) } => {
                let values = eval_all(rows, e, &lookup_for, now);
                builtins::aggregate::count(&values, *distinct)
            }
            Aggregate::Sum { distinct, expr } => builtins::aggregate::sum(&eval_all(rows, expr, &lookup_for, now), *distinct),
            Aggregate::Min { expr } => builtins::aggregate::min(&eval_all(rows, expr, &lookup_for, now)),
            Aggregate::Max { expr } => builtins::aggregate::max(&eval_all(rows, expr, &lookup_for, now)),
            Aggregate::Avg { distinct, expr } => builtins::aggregate::avg(&eval_all(rows, expr, &lookup_for, now), *distinct),
            Aggregate::Sample { expr } => eval_all(rows, expr, &lookup_for, now).into_iter().next().unwrap_or(Resource::Empty),
            Aggregate::GroupConcat { distinct, expr, separator } => {
                builtins::aggregate::group_concat(&eval_all(rows, expr, &lookup_for, now), *distinct, separator)
            }
        }
    }
}

fn eval_all(
    rows: &[Vec<String>],
    expr: &Expression,
    lookup_for: &dyn Fn(&[String]) -> Box<dyn Fn(&str) -> Resource>,
    now: &Literal,
) -> Vec<Resource> {
    rows.iter()
        .map(|row| {
            let lookup = lookup_for(row);
            expr.eval(&EvalContext { lookup: &lookup, now })
        })
        .collect()
}


