//! Recursive descent over the Query group tree, producing a `Table`.
//!
//! Each group label has a fixed evaluation rule; a plain group's children
//! (`OPTIONAL`/`MINUS`/`UNION`/`VALUES`/`GRAPH`/`SERVICE`/nested plain
//! blocks) are folded into its running table in declared order as the
//! matching relational primitive (left join, anti-join, union, natural
//! join).

use std::collections::HashMap;

use rdf_model::{Literal, Resource, Term};
use store::{Constraint, Dataset};

use crate::algebra::EvalContext;
use crate::error::{SparqlError, SparqlResult};
use crate::group::{Group, GroupLabel};
use crate::table::Table;

/// The result of evaluating a top-level query.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Select(Table),
    Ask(bool),
    Construct(Vec<[String; 3]>),
    Describe(Vec<[String; 3]>),
}

/// Parses a table cell's canonical lexical form back into a `Resource`.
/// The empty string is the unbound marker; anything else round-trips
/// through `rdf_model::Term::parse` (which needs no namespace table since
/// a canonical cell is always fully resolved: `<iri>`, `_:label`, `"lex"...`).
pub fn resource_from_canonical(cell: &str) -> Resource {
    if cell.is_empty() {
        return Resource::Empty;
    }
    match Term::parse(cell, &HashMap::new(), "") {
        Ok(term) => Resource::Term(term),
        Err(e) => Resource::Error(e.to_string()),
    }
}

fn row_lookup<'a>(columns: &'a [String], row: &'a [String]) -> impl Fn(&str) -> Resource + 'a {
    move |name: &str| {
        columns
            .iter()
            .position(|c| c == name)
            .map(|i| resource_from_canonical(&row[i]))
            .unwrap_or(Resource::Empty)
    }
}

/// Evaluates the top-level query group (`Select`/`Construct`/`Ask`) against
/// `dataset`'s active graph.
pub fn execute(root: &Group, dataset: &Dataset, now: &Literal) -> SparqlResult<QueryResult> {
    let graph_name = dataset.active_graph_name().to_string();
    match root.label {
        GroupLabel::Select => Ok(QueryResult::Select(eval_select(root, dataset, &graph_name, now)?)),
        GroupLabel::Ask => {
            let body = root.children.first().ok_or_else(|| SparqlError::Semantic("ASK query has no body".to_string()))?;
            let table = eval_block(body, dataset, &graph_name, now)?;
            Ok(QueryResult::Ask(!table.is_empty()))
        }
        GroupLabel::Construct => {
            let body = root.children.first().ok_or_else(|| SparqlError::Semantic("CONSTRUCT query has no body".to_string()))?;
            let table = eval_block(body, dataset, &graph_name, now)?;
            Ok(QueryResult::Construct(instantiate_template(&root.construct_template, &table)))
        }
        GroupLabel::Describe => Ok(QueryResult::Describe(eval_describe(root, dataset, &graph_name, now)?)),
        _ => Err(SparqlError::Semantic("top-level query must be SELECT, ASK, CONSTRUCT, or DESCRIBE".to_string())),
    }
}

/// Resolves a `DESCRIBE` query's named/bound resources to their describing
/// triples: every triple in the active graph with that resource as subject.
fn eval_describe(root: &Group, dataset: &Dataset, graph_name: &str, now: &Literal) -> SparqlResult<Vec<[String; 3]>> {
    let graph = dataset.graph(graph_name)?;
    let mut subjects: Vec<String> = Vec::new();
    if let Some(body) = root.children.first() {
        let table = eval_block(body, dataset, graph_name, now)?;
        for term in &root.describe_terms {
            match term {
                Term::Variable(v) => {
                    if let Some(idx) = table.column_index(&v.0) {
                        for row in table.rows() {
                            if !row[idx].is_empty() {
                                subjects.push(row[idx].clone());
                            }
                        }
                    }
                }
                other => subjects.push(other.canonical()),
            }
        }
    } else {
        for term in &root.describe_terms {
            subjects.push(term.canonical());
        }
    }
    subjects.sort();
    subjects.dedup();

    let mut triples = Vec::new();
    for subject in subjects {
        let Ok(term) = Term::parse(&subject, &HashMap::new(), "") else { continue };
        let pattern = [term, Term::variable("p"), Term::variable("o")];
        for row in solve_pattern(&pattern, graph).rows() {
            triples.push([subject.clone(), row[0].clone(), row[1].clone()]);
        }
    }
    Ok(triples)
}

fn eval_select(select_group: &Group, dataset: &Dataset, graph_name: &str, now: &Literal) -> SparqlResult<Table> {
    let spec = select_group
        .select
        .as_ref()
        .ok_or_else(|| SparqlError::Semantic("SELECT group missing its select spec".to_string()))?;

    let body = select_group.children.first().ok_or_else(|| SparqlError::Semantic("SELECT query has no body".to_string()))?;
    let mut table = eval_block(body, dataset, graph_name, now)?;

    for binder in &select_group.binders {
        table = apply_binder(table, binder, now);
    }

    if spec.has_aggregation() {
        table = fold_aggregates(&table, spec, now);
    }

    for having in &spec.having {
        table = apply_filter(table, having, now);
    }

    for binder in &spec.projection {
        table = apply_binder(table, binder, now);
    }

    if !spec.order_by.is_empty() {
        table = order_by(table, &spec.order_by, now);
    }

    let projected_names: Vec<String> = spec.projection.iter().map(|b| b.var.clone()).collect();
    table = table.project(&projected_names);

    if spec.distinct || spec.reduced {
        table = table.distinct();
    }

    Ok(table.limit_offset(spec.limit, spec.offset))
}

fn fold_aggregates(table: &Table, spec: &crate::group::SelectSpec, now: &Literal) -> Table {
    let groups = table.group_by(&spec.group_by);
    let mut columns = spec.group_by.clone();
    for binder in &spec.aggregates {
        columns.push(binder.var.clone());
    }
    let mut rows = Vec::with_capacity(groups.len());
    for (key_values, group_table) in &groups {
        let mut row = key_values.clone();
        for binder in &spec.aggregates {
            let value = binder.aggregate.fold(group_table.rows(), group_table.columns(), now);
            row.push(render_cell(&value));
        }
        rows.push(row);
    }
    if groups.is_empty() && spec.group_by.is_empty() {
        // No input rows and no GROUP BY vars: aggregates still produce one
        // row (e.g. COUNT(*) over zero matches is 0), folding over an empty slice.
        let mut row = Vec::new();
        for binder in &spec.aggregates {
            let value = binder.aggregate.fold(&[], table.columns(), now);
            row.push(render_cell(&value));
        }
        rows.push(row);
    }
    Table::from_rows(columns, rows)
}

fn render_cell(value: &Resource) -> String {
    match value {
        Resource::Term(t) => t.canonical(),
        Resource::Error(_) | Resource::Empty => String::new(),
    }
}

fn apply_binder(table: Table, binder: &crate::group::Binder, now: &Literal) -> Table {
    let mut columns = table.columns().to_vec();
    let mut rows = table.into_rows();
    if !columns.contains(&binder.var) {
        columns.push(binder.var.clone());
    }
    let idx = columns.iter().position(|c| c == &binder.var).unwrap();
    for row in &mut rows {
        row.resize(columns.len(), String::new());
        if row[idx].is_empty() {
            let lookup = row_lookup(&columns, row);
            let ctx = EvalContext { lookup: &lookup, now };
            let value = binder.expr.eval(&ctx);
            row[idx] = render_cell(&value);
        }
    }
    Table::from_rows(columns, rows)
}

fn apply_filter(table: Table, filter: &crate::algebra::Expression, now: &Literal) -> Table {
    let columns = table.columns().to_vec();
    let rows: Vec<Vec<String>> = table
        .into_rows()
        .into_iter()
        .filter(|row| {
            let lookup = row_lookup(&columns, row);
            let ctx = EvalContext { lookup: &lookup, now };
            filter.eval(&ctx).effective_boolean_value() == Some(true)
        })
        .collect();
    Table::from_rows(columns, rows)
}

fn order_by(table: Table, keys: &[(crate::algebra::Expression, bool)], now: &Literal) -> Table {
    let columns = table.columns().to_vec();
    let mut rows = table.into_rows();
    rows.sort_by(|a, b| {
        for (expr, descending) in keys {
            let la = row_lookup(&columns, a);
            let lb = row_lookup(&columns, b);
            let ra = expr.eval(&EvalContext { lookup: &la, now });
            let rb = expr.eval(&EvalContext { lookup: &lb, now });
            let ord = crate::builtins::total_order(&ra, &rb);
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
    Table::from_rows(columns, rows)
}

/// Evaluates a group's own BGP (patterns, ordered by ascending variable
/// count), its direct binders and filters, then folds in its children by
/// their label's combinator. Used for any group's body regardless of label
/// (`Plain`, a `GRAPH`/`UNION`-branch body, an `OPTIONAL`/`MINUS` body).
fn eval_block(group: &Group, dataset: &Dataset, graph_name: &str, now: &Literal) -> SparqlResult<Table> {
    let graph = dataset.graph(graph_name)?;

    let mut patterns = group.patterns.clone();
    patterns.sort_by_key(|t| t.iter().filter(|term| term.is_variable()).count());

    let mut table = Table::unit();
    for pattern in &patterns {
        table = table.join(&solve_pattern(pattern, graph));
    }

    for binder in &group.binders {
        table = apply_binder(table, binder, now);
    }

    for child in &group.children {
        table = match child.label {
            GroupLabel::Optional => table.left_join(&eval_block(child, dataset, graph_name, now)?),
            GroupLabel::Minus => table.minus(&eval_block(child, dataset, graph_name, now)?),
            GroupLabel::Union => table.join(&eval_union(child, dataset, graph_name, now)?),
            GroupLabel::Values => table.join(&eval_values(child)),
            GroupLabel::Graph | GroupLabel::Service => table.join(&eval_graph(child, dataset, graph_name, now)?),
            GroupLabel::Plain => table.join(&eval_block(child, dataset, graph_name, now)?),
            _ => table,
        };
    }

    // Filters see the whole group graph pattern, including variables bound
    // only by a sibling OPTIONAL/UNION/VALUES, so they run after children
    // are folded in rather than against this group's own BGP alone.
    for filter in &group.filters {
        table = apply_filter(table, filter, now);
    }

    for exists_group in &group.exists_filters {
        table = apply_exists_filter(table, exists_group, dataset, graph_name, now)?;
    }

    Ok(table)
}

fn eval_union(union_group: &Group, dataset: &Dataset, graph_name: &str, now: &Literal) -> SparqlResult<Table> {
    let mut result = Table::empty(Vec::new());
    for (i, branch) in union_group.children.iter().enumerate() {
        let branch_table = eval_block(branch, dataset, graph_name, now)?;
        result = if i == 0 { branch_table } else { result.union(&branch_table) };
    }
    Ok(result)
}

fn eval_values(values_group: &Group) -> Table {
    let Some(block) = &values_group.values else {
        return Table::unit();
    };
    let rows: Vec<Vec<String>> = block
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.as_ref().map(Term::canonical).unwrap_or_default()).collect())
        .collect();
    Table::from_rows(block.vars.clone(), rows)
}

fn eval_graph(graph_group: &Group, dataset: &Dataset, outer_graph_name: &str, now: &Literal) -> SparqlResult<Table> {
    match &graph_group.graph_term {
        Some(Term::Iri(iri)) => eval_block(graph_group, dataset, &iri.value(), now),
        Some(Term::Variable(v)) => {
            let names: Vec<String> = dataset.graph_names().map(str::to_string).collect();
            let mut result = Table::empty(Vec::new());
            for (i, name) in names.into_iter().enumerate() {
                let sub = eval_block(graph_group, dataset, &name, now)?;
                let sub = sub.bind_constant(&v.0, &Term::iri(&name).canonical());
                result = if i == 0 { sub } else { result.union(&sub) };
            }
            Ok(result)
        }
        _ => eval_block(graph_group, dataset, outer_graph_name, now),
    }
}

fn apply_exists_filter(table: Table, exists_group: &Group, dataset: &Dataset, graph_name: &str, now: &Literal) -> SparqlResult<Table> {
    let negate = matches!(exists_group.label, GroupLabel::NotExists);
    let columns = table.columns().to_vec();
    let mut kept = Vec::new();
    for row in table.into_rows() {
        let prebound = Table::from_rows(columns.clone(), vec![row.clone()]);
        let inner = eval_block(exists_group, dataset, graph_name, now)?;
        let joined = prebound.join(&inner);
        let exists = !joined.is_empty();
        if exists != negate {
            kept.push(row);
        }
    }
    Ok(Table::from_rows(columns, kept))
}

/// Maps a triple pattern's term triple to per-position constraints and
/// calls `store::Graph::enumerate`, naming the resulting solution columns
/// by variable and merging any variable repeated across positions of the
/// same pattern (e.g. `?x :knows ?x`) down to a single column with a
/// self-equality filter.
fn solve_pattern(pattern: &[Term; 3], graph: &store::Graph) -> Table {
    let constraints: Vec<Constraint> = pattern
        .iter()
        .map(|t| match t {
            Term::Variable(_) => Constraint::Empty,
            other => Constraint::specific(other.canonical()),
        })
        .collect();
    let solution = graph.enumerate(&constraints[0], &constraints[1], &constraints[2]);

    let raw_columns: Vec<String> = pattern.iter().filter_map(|t| if let Term::Variable(v) = t { Some(v.0.clone()) } else { None }).collect();

    merge_duplicate_columns(raw_columns, solution.rows)
}

fn merge_duplicate_columns(raw_columns: Vec<String>, rows: Vec<Vec<String>>) -> Table {
    let mut columns: Vec<String> = Vec::new();
    let mut keep_indices: Vec<usize> = Vec::new();
    let mut dup_groups: Vec<Vec<usize>> = Vec::new();
    for (i, name) in raw_columns.iter().enumerate() {
        match columns.iter().position(|c| c == name) {
            Some(existing) => dup_groups[existing].push(i),
            None => {
                columns.push(name.clone());
                keep_indices.push(i);
                dup_groups.push(vec![i]);
            }
        }
    }
    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .filter(|row| dup_groups.iter().all(|group| group.windows(2).all(|w| row[w[0]] == row[w[1]])))
        .map(|row| keep_indices.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Table::from_rows(columns, rows)
}

fn instantiate_template(template: &[[Term; 3]], table: &Table) -> Vec<[String; 3]> {
    let columns = table.columns();
    let mut out = Vec::new();
    for row in table.rows() {
        let mut blank_map: HashMap<String, String> = HashMap::new();
        let mut seq = 0u64;
        'triple: for triple in template {
            let mut rendered = [String::new(), String::new(), String::new()];
            for (i, term) in triple.iter().enumerate() {
                rendered[i] = match term {
                    Term::Variable(v) => match columns.iter().position(|c| c == &v.0).map(|idx| row[idx].clone()) {
                        Some(value) if !value.is_empty() => value,
                        _ => continue 'triple,
                    },
                    Term::Blank(b) => {
                        let fresh = blank_map.entry(b.0.clone()).or_insert_with(|| {
                            seq += 1;
                            format!("_:c{seq}r{}", out.len())
                        });
                        fresh.clone()
                    }
                    other => other.canonical(),
                };
            }
            out.push(rendered);
        }
    }
    out
}
