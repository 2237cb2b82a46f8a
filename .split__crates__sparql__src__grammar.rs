//! Builds the production graph for (a practical subset of) SPARQL 1.1 Query
//! Language: `SELECT`/`CONSTRUCT`/`DESCRIBE`/`ASK`, the full graph pattern
//! grouping constructs (`OPTIONAL`, `MINUS`, `UNION`, `GRAPH`, `SERVICE`,
//! `FILTER` including `EXISTS`/`NOT EXISTS`, `BIND`, inline `VALUES`), the
//! expression and builtin-function grammar, and aggregates with `GROUP BY`/
//! `HAVING`. Identifier character classes are the same restricted ASCII
//! subset the Turtle grammar uses. Property paths are limited to a bare
//! predicate or its inverse (`^p`); sequence, alternation, and the
//! repetition operators are not supported. Variables use the `?` sigil only,
//! not `$`. `EXISTS`/`NOT EXISTS` are recognised only as a `FILTER`'s direct
//! constraint, not as a general boolean sub-expression. There is no nested
//! sub-`SELECT`, no top-level `VALUES` clause (only inline, inside a graph
//! pattern), and no `FROM`/`FROM NAMED` dataset clause.

use std::rc::Rc;

use grammar::{Bindings, Grammar, ProdRef, Production};

use crate::algebra::BuiltinFunction;
use crate::builder::SparqlProducer;
use crate::group::GroupLabel;

type G = Grammar<SparqlProducer>;

fn call(g: &mut G, f: impl Fn(&mut SparqlProducer, &Bindings) + 'static) -> ProdRef {
    g.add(Production::Call(Rc::new(f)))
}

fn lit(g: &mut G, text: &str) -> ProdRef {
    g.add(Production::Literal(text.to_string(), true))
}

/// Case-insensitive SPARQL keyword.
fn kw(g: &mut G, text: &str) -> ProdRef {
    g.add(Production::Literal(text.to_string(), false))
}

fn seq(g: &mut G, parts: Vec<ProdRef>) -> ProdRef {
    g.add(Production::All(parts))
}

fn any(g: &mut G, parts: Vec<ProdRef>) -> ProdRef {
    g.add(Production::AnyOf(parts))
}

fn opt(g: &mut G, part: ProdRef) -> ProdRef {
    g.add(Production::Optional(part))
}

fn star(g: &mut G, part: ProdRef) -> ProdRef {
    g.add(Production::ZeroOrMore(part))
}

fn plus(g: &mut G, part: ProdRef) -> ProdRef {
    g.add(Production::OneOrMore(part))
}

fn named(g: &mut G, name: &str, part: ProdRef) -> ProdRef {
    g.add(Production::Named(name.to_string(), part))
}

// --- Identifier character classes (restricted ASCII, per the Turtle grammar) ---

fn pn_char_start(g: &mut G) -> ProdRef {
    g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z'), ('_', '_')]))
}

fn pn_char(g: &mut G) -> ProdRef {
    g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_'), ('-', '-')]))
}

fn pn_ident(g: &mut G) -> ProdRef {
    let start = pn_char_start(g);
    let rest_char = pn_char(g);
    let rest = star(g, rest_char);
    seq(g, vec![start, rest])
}

// --- Terminals shared by both RDF terms and expressions ---

fn iri_ref(g: &mut G, name: &str) -> ProdRef {
    let open = g.add(Production::CharLiteral('<'));
    let body_char = g.add(Production::NotIn(vec!['<', '>', '"', '{', '}', '|', '^', '`', '\\', ' ', '\t', '\n', '\r']));
    let body = star(g, body_char);
    let close = g.add(Production::CharLiteral('>'));
    let token = g.add(Production::Sequence(vec![open, body, close]));
    named(g, name, token)
}

fn prefixed_name(g: &mut G, name: &str) -> ProdRef {
    let prefix_part = pn_ident(g);
    let prefix_opt = opt(g, prefix_part);
    let colon = g.add(Production::CharLiteral(':'));
    let local_start = g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')]));
    let local_rest_char = pn_char(g);
    let local_rest = star(g, local_rest_char);
    let local_part = seq(g, vec![local_start, local_rest]);
    let local_opt = opt(g, local_part);
    let token = g.add(Production::Sequence(vec![prefix_opt, colon, local_opt]));
    named(g, name, token)
}

fn iri_like(g: &mut G, name: &str) -> ProdRef {
    let iri = iri_ref(g, name);
    let pname = prefixed_name(g, name);
    any(g, vec![iri, pname])
}

fn var_token(g: &mut G, name: &str) -> ProdRef {
    let sigil = g.add(Production::CharLiteral('?'));
    let ident = pn_ident(g);
    let token = g.add(Production::Sequence(vec![sigil, ident]));
    named(g, name, token)
}

fn blank_label(g: &mut G, name: &str) -> ProdRef {
    let prefix = lit(g, "_:");
    let ident = pn_ident(g);
    let token = g.add(Production::Sequence(vec![prefix, ident]));
    named(g, name, token)
}

fn escaped_char(g: &mut G, quote: char) -> ProdRef {
    let backslash = g.add(Production::CharLiteral('\\'));
    let any_char = g.add(Production::NotIn(vec![]));
    let escape = g.add(Production::Sequence(vec![backslash, any_char]));
    let plain = g.add(Production::NotIn(vec![quote, '\\']));
    any(g, vec![escape, plain])
}

fn short_quoted(g: &mut G, quote: char) -> ProdRef {
    let open = g.add(Production::CharLiteral(quote));
    let backslash = g.add(Production::CharLiteral('\\'));
    let any_char = g.add(Production::NotIn(vec![]));
    let escape = g.add(Production::Sequence(vec![backslash, any_char]));
    let plain = g.add(Production::NotIn(vec![quote, '\\', '\n', '\r']));
    let body_char = any(g, vec![escape, plain]);
    let body = star(g, body_char);
    let close = g.add(Production::CharLiteral(quote));
    g.add(Production::Sequence(vec![open, body, close]))
}

fn long_quoted(g: &mut G, quote: char) -> ProdRef {
    let q = |g: &mut G| g.add(Production::CharLiteral(quote));
    let (q1, q2, q3) = (q(g), q(g), q(g));
    let open = g.add(Production::All(vec![q1, q2, q3]));
    let body_char = escaped_char(g, quote);
    let body = star(g, body_char);
    let (c1, c2, c3) = (q(g), q(g), q(g));
    let close = g.add(Production::All(vec![c1, c2, c3]));
    g.add(Production::Sequence(vec![open, body, close]))
}

/// Single-/triple-quoted string, captured with its delimiters under `name`
/// (the builder strips them while interpreting escapes).
fn quoted_string(g: &mut G, name: &str) -> ProdRef {
    let long_dq = long_quoted(g, '"');
    let long_sq = long_quoted(g, '\'');
    let short_dq = short_quoted(g, '"');
    let short_sq = short_quoted(g, '\'');
    let alt = any(g, vec![long_dq, long_sq, short_dq, short_sq]);
    named(g, name, alt)
}

fn digits(g: &mut G) -> ProdRef {
    let digit = g.add(Production::InRange(vec![('0', '9')]));
    plus(g, digit)
}

fn sign(g: &mut G) -> ProdRef {
    let plus_sign = g.add(Production::CharLiteral('+'));
    let minus_sign = g.add(Production::CharLiteral('-'));
    let either = any(g, vec![plus_sign, minus_sign]);
    opt(g, either)
}

/// Unquoted numeric literal or `true`/`false`, captured under `name`.
fn number_or_bool(g: &mut G, name: &str) -> ProdRef {
    let lead_sign = sign(g);
    let int_digits = digits(g);
    let dot_digits = {
        let dot = g.add(Production::CharLiteral('.'));
        let frac = digits(g);
        seq(g, vec![dot, frac])
    };
    let dot_digits_opt = opt(g, dot_digits);
    let exponent = {
        let lower_e = g.add(Production::CharLiteral('e'));
        let upper_e = g.add(Production::CharLiteral('E'));
        let e = any(g, vec![lower_e, upper_e]);
        let esign = sign(g);
        let edigits = digits(g);
        seq(g, vec![e, esign, edigits])
    };
    let exponent_opt = opt(g, exponent);
    let number = g.add(Production::Sequence(vec![lead_sign, int_digits, dot_digits_opt, exponent_opt]));
    let true_kw = lit(g, "true");
    let false_kw = lit(g, "false");
    let alt = any(g, vec![number, true_kw, false_kw]);
    named(g, name, alt)
}

/// `RDFLiteral := String ('@' LangTag | '^^' iri)?`, producing `term`/
/// `lang`/`datatype` bindings without attaching a consuming `Call`.
fn literal_term(g: &mut G) -> ProdRef {
    let string_term = quoted_string(g, "term");
    let lang_tag = {
        let at = lit(g, "@");
        let start = g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z')]));
        let rest_char = g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('-', '-')]));
        let rest = star(g, rest_char);
        let tag = seq(g, vec![start, rest]);
        let tag_named = named(g, "lang", tag);
        seq(g, vec![at, tag_named])
    };
    let datatype_suffix = {
        let h1 = g.add(Production::CharLiteral('^'));
        let h2 = g.add(Production::CharLiteral('^'));
        let hats = seq(g, vec![h1, h2]);
        let dt = iri_like(g, "datatype");
        seq(g, vec![hats, dt])
    };
    let lang_or_datatype = any(g, vec![lang_tag, datatype_suffix]);
    let suffix_opt = opt(g, lang_or_datatype);
    seq(g, vec![string_term, suffix_opt])
}

/// Builds the full grammar and returns its entry production: a `Prologue`
/// followed by exactly one `Select`/`Construct`/`Describe`/`Ask` query.
pub fn build() -> (G, ProdRef) {
    let mut g: G = Grammar::new();

    // Expression and graph-pattern grammars are mutually recursive
    // (bracketed sub-expressions, `EXISTS { ... }`, nested groups).
    let expr_ref = g.reserve();
    let ggp_sub_ref = g.reserve();

    let var_term = var_token(&mut g, "term");
    let blank_term = blank_label(&mut g, "term");
    let iri_term = iri_like(&mut g, "term");

    let triples_block_opt = build_triple_grammar(&mut g, var_term, blank_term, iri_term);
    let ggp_sub = build_graph_pattern_grammar(&mut g, var_term, iri_term, expr_ref, triples_block_opt);
    g.fill(ggp_sub_ref, Production::Reference(ggp_sub));
    build_expression_grammar(&mut g, expr_ref, var_term, iri_term);

    let prologue = build_prologue(&mut g);
    let select_query = build_select_query(&mut g, ggp_sub_ref, expr_ref, var_term);
    let construct_query = build_construct_query(&mut g, ggp_sub_ref, triples_block_opt);
    let describe_query = build_describe_query(&mut g, ggp_sub_ref, var_term, iri_term);
    let ask_query = build_ask_query(&mut g, ggp_sub_ref);
    let query = any(&mut g, vec![select_query, construct_query, describe_query, ask_query]);
    let entry = seq(&mut g, vec![prologue, query]);
    (g, entry)
}

fn build_prologue(g: &mut G) -> ProdRef {
    let prefix_name = {
        let ident_opt = {
            let ident = pn_ident(g);
            opt(g, ident)
        };
        let colon = lit(g, ":");
        let token = seq(g, vec![ident_opt, colon]);
        named(g, "prefix", token)
    };
    let prefix_decl = {
        let kw_prefix = kw(g, "PREFIX");
        let iri = iri_ref(g, "iri");
        let set = call(g, |p, b| {
            if let (Some(prefix), Some(iri)) = (b.get("prefix"), b.get("iri")) {
                p.set_prefix(prefix, iri);
            }
        });
        seq(g, vec![kw_prefix, prefix_name, iri, set])
    };
    let base_decl = {
        let kw_base = kw(g, "BASE");
        let iri = iri_ref(g, "iri");
        let set = call(g, |p, b| {
            if let Some(iri) = b.get("iri") {
                p.set_base(iri);
            }
        });
        seq(g, vec![kw_base, iri, set])
    };
    let decl = any(g, vec![prefix_decl, base_decl]);
    star(g, decl)
}

// --- Triple-pattern grammar: subject/verb/object-list, shared by the
// WHERE-clause body and the CONSTRUCT template. ---

fn build_triple_grammar(g: &mut G, var_term: ProdRef, blank_term: ProdRef, iri_term: ProdRef) -> ProdRef {
    let plain_term = any(g, vec![blank_term, var_term, iri_term]);

    let emit_literal = call(g, |p, b| {
        let raw = b.get("term").unwrap_or_default().to_string();
        p.emit_literal_object(&raw, b.get("lang"), b.get("datatype"));
    });
    let literal = literal_term(g);
    let literal_object = seq(g, vec![literal, emit_literal]);

    let number_term = number_or_bool(g, "term");
    let emit_number = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.emit_object_from_text(text);
        }
    });
    let number_object = seq(g, vec![number_term, emit_number]);

    let begin_blank = call(g, |p, _| p.begin_blank_object());
    let end_blank = call(g, |p, _| p.end_blank_object());

    let a_kw = lit(g, "a");
    let caret = lit(g, "^");
    let verb_target = any(g, vec![a_kw, iri_term, var_term]);
    let verb_named = named(g, "verb", verb_target);
    let set_predicate_plain = call(g, |p, b| {
        if let Some(text) = b.get("verb") {
            p.set_predicate_from_text(text, false);
        }
    });
    let plain_verb = seq(g, vec![verb_named, set_predicate_plain]);
    let inverse_target = any(g, vec![iri_term, var_term]);
    let inverse_named = named(g, "verb", inverse_target);
    let set_predicate_inverse = call(g, |p, b| {
        if let Some(text) = b.get("verb") {
            p.set_predicate_from_text(text, true);
        }
    });
    let inverse_verb = seq(g, vec![caret, inverse_named, set_predicate_inverse]);
    let verb = any(g, vec![inverse_verb, plain_verb]);

    let comma = lit(g, ",");
    let object_ref = g.reserve();
    let more_objects = seq(g, vec![comma, object_ref]);
    let more_objects_star = star(g, more_objects);
    let object_list = seq(g, vec![object_ref, more_objects_star]);
    let verb_object_list = seq(g, vec![verb, object_list]);
    let semi = lit(g, ";");
    let more_po = seq(g, vec![semi, verb_object_list]);
    let more_po_star = star(g, more_po);
    let predicate_object_list = seq(g, vec![verb_object_list, more_po_star]);
    let po_opt = opt(g, predicate_object_list);

    let bracket_open = lit(g, "[");
    let bracket_close = lit(g, "]");
    let blank_node_property_list = seq(g, vec![bracket_open, begin_blank, po_opt, end_blank, bracket_close]);

    let paren_open = lit(g, "(");
    let paren_close = lit(g, ")");
    let begin_collection = call(g, |p, _| p.begin_collection());
    let begin_item = call(g, |p, _| p.begin_collection_item());
    let end_item = call(g, |p, _| p.end_collection_item());
    let one_item = seq(g, vec![begin_item, object_ref, end_item]);
    let items = star(g, one_item);
    let end_collection = call(g, |p, _| p.end_collection());
    let collection = seq(g, vec![paren_open, begin_collection, items, end_collection, paren_close]);

    let emit_pending = call(g, |p, _| p.emit_object_from_pending());
    let bnpl_as_object = seq(g, vec![blank_node_property_list, emit_pending]);
    let collection_as_object = seq(g, vec![collection, emit_pending]);
    let emit_text_object = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.emit_object_from_text(text);
        }
    });
    let plain_object = seq(g, vec![plain_term, emit_text_object]);
    g.fill(object_ref, Production::AnyOf(vec![literal_object, number_object, bnpl_as_object, collection_as_object, plain_object]));

    let push_subject_text = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.push_subject_from_text(text);
        }
    });
    let subject_by_text = seq(g, vec![plain_term, push_subject_text]);
    let push_subject_pending = call(g, |p, _| p.push_subject_from_pending());
    let subject_by_bnpl = seq(g, vec![blank_node_property_list, push_subject_pending]);
    let subject_by_collection = seq(g, vec![collection, push_subject_pending]);
    let subject = any(g, vec![subject_by_text, subject_by_bnpl, subject_by_collection]);

    let dot = lit(g, ".");
    let pop_subject = call(g, |p, _| p.pop_subject());
    let one_triples_stmt = seq(g, vec![subject, po_opt, pop_subject]);
    let more_stmt = seq(g, vec![dot, one_triples_stmt]);
    let more_stmt_star = star(g, more_stmt);
    let trailing_dot_opt = opt(g, dot);
    let triples_block = seq(g, vec![one_triples_stmt, more_stmt_star, trailing_dot_opt]);
    opt(g, triples_block)
}

// --- Graph-pattern grammar: GroupGraphPatternSub and its GraphPatternNotTriples. ---

fn plain_block(g: &mut G, ggp_sub_ref: ProdRef, after: ProdRef) -> ProdRef {
    let open = call(g, |p, _| p.open_group(GroupLabel::Plain));
    let brace_open = lit(g, "{");
    let brace_close = lit(g, "}");
    let close = call(g, |p, _| p.close_group());
    seq(g, vec![open, brace_open, ggp_sub_ref, brace_close, close, after])
}

fn label_block(g: &mut G, label: GroupLabel, ggp_sub_ref: ProdRef, after: ProdRef) -> ProdRef {
    let open = call(g, move |p, _| p.open_group(label.clone()));
    let brace_open = lit(g, "{");
    let brace_close = lit(g, "}");
    let close = call(g, |p, _| p.close_group());
    seq(g, vec![open, brace_open, ggp_sub_ref, brace_close, close, after])
}

fn build_graph_pattern_grammar(g: &mut G, var_term: ProdRef, iri_term: ProdRef, expr_ref: ProdRef, triples_block_opt: ProdRef) -> ProdRef {
    let ggp_ref = g.reserve();

    let attach_child = call(g, |p, _| p.attach_child());
    let capture_union_branch = call(g, |p, _| p.capture_union_branch());
    let attach_exists = call(g, |p, _| p.attach_exists_filter());

    // --- GroupOrUnionGraphPattern ---
    let begin_union = call(g, |p, _| p.begin_union_scope());
    let end_union = call(g, |p, _| p.end_union_scope());
    let union_branch = plain_block(g, ggp_ref, capture_union_branch);
    let union_kw = kw(g, "UNION");
    let more_union = seq(g, vec![union_kw, union_branch]);
    let more_union_star = star(g, more_union);
    let group_or_union = seq(g, vec![begin_union, union_branch, more_union_star, end_union]);

    // --- OptionalGraphPattern / MinusGraphPattern ---
    let optional_kw = kw(g, "OPTIONAL");
    let optional_block = label_block(g, GroupLabel::Optional, ggp_ref, attach_child);
    let optional_pattern = seq(g, vec![optional_kw, optional_block]);

    let minus_kw = kw(g, "MINUS");
    let minus_block = label_block(g, GroupLabel::Minus, ggp_ref, attach_child);
    let minus_pattern = seq(g, vec![minus_kw, minus_block]);

    // --- GraphGraphPattern ---
    let graph_kw = kw(g, "GRAPH");
    let graph_target = any(g, vec![var_term, iri_term]);
    let set_graph_term = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.set_graph_term(text);
        }
    });
    let graph_open = call(g, |p, _| p.open_group(GroupLabel::Graph));
    let brace_open1 = lit(g, "{");
    let brace_close1 = lit(g, "}");
    let graph_close = call(g, |p, _| p.close_group());
    let graph_pattern = seq(g, vec![graph_kw, graph_target, graph_open, set_graph_term, brace_open1, ggp_ref, brace_close1, graph_close, attach_child]);

    // --- ServiceGraphPattern ---
    let service_kw = kw(g, "SERVICE");
    let silent_kw = kw(g, "SILENT");
    let silent_opt = opt(g, silent_kw);
    let service_target = any(g, vec![var_term, iri_term]);
    let set_service_term = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.set_graph_term(text);
        }
    });
    let service_open = call(g, |p, _| p.open_group(GroupLabel::Service));
    let brace_open2 = lit(g, "{");
    let brace_close2 = lit(g, "}");
    let service_close = call(g, |p, _| p.close_group());
    let service_pattern = seq(
        g,
        vec![service_kw, silent_opt, service_target, service_open, set_service_term, brace_open2, ggp_ref, brace_close2, service_close, attach_child],
    );

    // --- Filter ---
    let filter_kw = kw(g, "FILTER");
    let exists_kw = kw(g, "EXISTS");
    let exists_block = label_block(g, GroupLabel::Exists, ggp_ref, attach_exists);
    let exists_constraint = seq(g, vec![exists_kw, exists_block]);
    let not_kw = kw(g, "NOT");
    let not_exists_block = label_block(g, GroupLabel::NotExists, ggp_ref, attach_exists);
    let not_exists_constraint = seq(g, vec![not_kw, exists_kw, not_exists_block]);
    let push_filter = call(g, |p, _| p.push_filter());
    let plain_constraint = seq(g, vec![expr_ref, push_filter]);
    let constraint = any(g, vec![exists_constraint, not_exists_constraint, plain_constraint]);
    let filter = seq(g, vec![filter_kw, constraint]);

    // --- Bind ---
    let bind_kw = kw(g, "BIND");
    let paren_open = lit(g, "(");
    let as_kw = kw(g, "AS");
    let paren_close = lit(g, ")");
    let bind_var = named(g, "bindvar", var_term);
    let push_bind = call(g, |p, b| {
        if let Some(v) = b.get("bindvar") {
            p.push_bind(v.trim_start_matches('?').to_string());
        }
    });
    let bind = seq(g, vec![bind_kw, paren_open, expr_ref, as_kw, bind_var, paren_close, push_bind]);

    // --- Inline VALUES ---
    let values = build_values_grammar(g, var_term, iri_term);

    let graph_pattern_not_triples = any(g, vec![group_or_union, optional_pattern, minus_pattern, graph_pattern, service_pattern, filter, bind, values]);

    let dot = lit(g, ".");
    let dot_opt = opt(g, dot);
    let not_triples_then_more = seq(g, vec![graph_pattern_not_triples, dot_opt, triples_block_opt]);
    let not_triples_star = star(g, not_triples_then_more);
    let ggp_sub = seq(g, vec![triples_block_opt, not_triples_star]);
    g.fill(ggp_ref, Production::Reference(ggp_sub));
    ggp_sub
}

fn build_values_grammar(g: &mut G, _var_term: ProdRef, iri_term: ProdRef) -> ProdRef {
    let values_kw = kw(g, "VALUES");
    let begin = call(g, |p, _| p.begin_values_block());
    let finish = call(g, |p, _| p.finish_values());

    // one-var form: ?x { val val ... }
    let v1 = var_token(g, "v");
    let add_var1 = call(g, |p, b| {
        if let Some(raw) = b.get("v") {
            p.add_values_var(raw);
        }
    });
    let brace_open_a = lit(g, "{");
    let brace_close_a = lit(g, "}");
    let cell_a = data_block_value(g, iri_term);
    let begin_row_a = call(g, |p, _| p.begin_values_row());
    let end_row_a = call(g, |p, _| p.end_values_row());
    let one_row_a = seq(g, vec![begin_row_a, cell_a, end_row_a]);
    let rows_a = star(g, one_row_a);
    let form_a = seq(g, vec![v1, add_var1, brace_open_a, rows_a, brace_close_a]);

    // multi-var form: ( ?x ?y ) { (val val) (val val) ... }
    let paren_open1 = lit(g, "(");
    let paren_close1 = lit(g, ")");
    let vn = var_token(g, "v");
    let add_varn = call(g, |p, b| {
        if let Some(raw) = b.get("v") {
            p.add_values_var(raw);
        }
    });
    let one_var = seq(g, vec![vn, add_varn]);
    let vars_star = star(g, one_var);
    let var_list = seq(g, vec![paren_open1, vars_star, paren_close1]);
    let brace_open_b = lit(g, "{");
    let brace_close_b = lit(g, "}");
    let paren_open2 = lit(g, "(");
    let paren_close2 = lit(g, ")");
    let begin_row_b = call(g, |p, _| p.begin_values_row());
    let end_row_b = call(g, |p, _| p.end_values_row());
    let cells = star(g, data_block_value(g, iri_term));
    let one_row_b = seq(g, vec![paren_open2, begin_row_b, cells, end_row_b, paren_close2]);
    let rows_b = star(g, one_row_b);
    let form_b = seq(g, vec![var_list, brace_open_b, rows_b, brace_close_b]);

    let form = any(g, vec![form_a, form_b]);
    seq(g, vec![values_kw, begin, form, finish])
}

fn data_block_value(g: &mut G, iri_term: ProdRef) -> ProdRef {
    let undef_kw = kw(g, "UNDEF");
    let undef_call = call(g, |p, _| p.add_values_cell_undef());
    let undef = seq(g, vec![undef_kw, undef_call]);

    let literal = literal_term(g);
    let literal_call = call(g, |p, b| {
        let raw = b.get("term").unwrap_or_default().to_string();
        p.add_values_cell_literal(&raw, b.get("lang"), b.get("datatype"));
    });
    let literal_cell = seq(g, vec![literal, literal_call]);

    let number_term = number_or_bool(g, "term");
    let number_call = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.add_values_cell_term(text);
        }
    });
    let number_cell = seq(g, vec![number_term, number_call]);

    let iri_call = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.add_values_cell_term(text);
        }
    });
    let iri_cell = seq(g, vec![iri_term, iri_call]);

    any(g, vec![undef, literal_cell, number_cell, iri_cell])
}

// --- Expression grammar ---

fn mark_call(g: &mut G) -> ProdRef {
    call(g, |p, _| p.mark_args())
}

fn arg_list(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let open = lit(g, "(");
    let mark = mark_call(g);
    let comma = lit(g, ",");
    let more = seq(g, vec![comma, expr_ref]);
    let more_star = star(g, more);
    let list = seq(g, vec![expr_ref, more_star]);
    let list_opt = opt(g, list);
    let close = lit(g, ")");
    seq(g, vec![open, mark, list_opt, close])
}

fn builtin_call(g: &mut G, expr_ref: ProdRef, keyword: &str, f: BuiltinFunction) -> ProdRef {
    let kwp = kw(g, keyword);
    let args = arg_list(g, expr_ref);
    let finish = call(g, move |p, _| p.finish_call(f));
    seq(g, vec![kwp, args, finish])
}

const BUILTIN_TABLE: &[(&str, BuiltinFunction)] = &[
    ("STR", BuiltinFunction::Str),
    ("LANGMATCHES", BuiltinFunction::LangMatches),
    ("LANG", BuiltinFunction::Lang),
    ("DATATYPE", BuiltinFunction::Datatype),
    ("IRI", BuiltinFunction::Iri),
    ("URI", BuiltinFunction::Iri),
    ("BNODE", BuiltinFunction::BNode),
    ("STRLEN", BuiltinFunction::StrLen),
    ("UCASE", BuiltinFunction::UCase),
    ("LCASE", BuiltinFunction::LCase),
    ("ENCODE_FOR_URI", BuiltinFunction::EncodeForUri),
    ("CONTAINS", BuiltinFunction::Contains),
    ("STRSTARTS", BuiltinFunction::StrStarts),
    ("STRENDS", BuiltinFunction::StrEnds),
    ("STRBEFORE", BuiltinFunction::StrBefore),
    ("STRAFTER", BuiltinFunction::StrAfter),
    ("SUBSTR", BuiltinFunction::Substr),
    ("REPLACE", BuiltinFunction::Replace),
    ("REGEX", BuiltinFunction::Regex),
    ("CONCAT", BuiltinFunction::Concat),
    ("STRLANG", BuiltinFunction::StrLang),
    ("STRDT", BuiltinFunction::StrDt),
    ("STRUUID", BuiltinFunction::StrUuid),
    ("UUID", BuiltinFunction::Uuid),
    ("MD5", BuiltinFunction::Md5),
    ("SHA256", BuiltinFunction::Sha256),
    ("SHA384", BuiltinFunction::Sha384),
    ("SHA512", BuiltinFunction::Sha512),
    ("SHA1", BuiltinFunction::Sha1),
    ("ABS", BuiltinFunction::Abs),
    ("CEIL", BuiltinFunction::Ceil),
    ("FLOOR", BuiltinFunction::Floor),
    ("ROUND", BuiltinFunction::Round),
    ("RAND", BuiltinFunction::Rand),
    ("YEAR", BuiltinFunction::Year),
    ("MONTH", BuiltinFunction::Month),
    ("DAY", BuiltinFunction::Day),
    ("HOURS", BuiltinFunction::Hours),
    ("MINUTES", BuiltinFunction::Minutes),
    ("SECONDS", BuiltinFunction::Seconds),
    ("TIMEZONE", BuiltinFunction::Timezone),
    ("TZ", BuiltinFunction::Tz),
    ("NOW", BuiltinFunction::Now),
    ("ISIRI", BuiltinFunction::IsIri),
    ("ISURI", BuiltinFunction::IsIri),
    ("ISBLANK", BuiltinFunction::IsBlank),
    ("ISLITERAL", BuiltinFunction::IsLiteral),
    ("ISNUMERIC", BuiltinFunction::IsNumeric),
    ("BOUND", BuiltinFunction::Bound),
    ("SAMETERM", BuiltinFunction::SameTerm),
];

fn optional_distinct(g: &mut G) -> ProdRef {
    let d = kw(g, "DISTINCT");
    let d_named = named(g, "distinct", d);
    opt(g, d_named)
}

fn aggregate_count(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let kwc = kw(g, "COUNT");
    let open = lit(g, "(");
    let distinct_opt = optional_distinct(g);
    let star_lit = lit(g, "*");
    let star_named = named(g, "star", star_lit);
    let star_branch = star_named;
    let expr_branch = expr_ref;
    let arg = any(g, vec![star_branch, expr_branch]);
    let close = lit(g, ")");
    let finish = call(g, |p, b| p.finish_count(b.contains("distinct"), b.contains("star")));
    seq(g, vec![kwc, open, distinct_opt, arg, close, finish])
}

fn aggregate_sum(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let kwp = kw(g, "SUM");
    let open = lit(g, "(");
    let distinct_opt = optional_distinct(g);
    let close = lit(g, ")");
    let finish = call(g, |p, b| p.finish_sum(b.contains("distinct")));
    seq(g, vec![kwp, open, distinct_opt, expr_ref, close, finish])
}

fn aggregate_avg(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let kwp = kw(g, "AVG");
    let open = lit(g, "(");
    let distinct_opt = optional_distinct(g);
    let close = lit(g, ")");
    let finish = call(g, |p, b| p.finish_avg(b.contains("distinct")));
    seq(g, vec![kwp, open, distinct_opt, expr_ref, close, finish])
}

fn aggregate_min(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let kwp = kw(g, "MIN");
    let open = lit(g, "(");
    let close = lit(g, ")");
    let finish = call(g, |p, _| p.finish_min());
    seq(g, vec![kwp, open, expr_ref, close, finish])
}

fn aggregate_max(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let kwp = kw(g, "MAX");
    let open = lit(g, "(");
    let close = lit(g, ")");
    let finish = call(g, |p, _| p.finish_max());
    seq(g, vec![kwp, open, expr_ref, close, finish])
}

fn aggregate_sample(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let kwp = kw(g, "SAMPLE");
    let open = lit(g, "(");
    let close = lit(g, ")");
    let finish = call(g, |p, _| p.finish_sample());
    seq(g, vec![kwp, open, expr_ref, close, finish])
}

fn aggregate_group_concat(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let kwp = kw(g, "GROUP_CONCAT");
    let open = lit(g, "(");
    let distinct_opt = optional_distinct(g);
    let semi = lit(g, ";");
    let sep_kw = kw(g, "SEPARATOR");
    let eq = lit(g, "=");
    let sep_string = quoted_string(g, "sep");
    let set_sep = call(g, |p, b| {
        if let Some(raw) = b.get("sep") {
            p.set_group_concat_separator(raw);
        }
    });
    let sep_clause = seq(g, vec![semi, sep_kw, eq, sep_string, set_sep]);
    let sep_clause_opt = opt(g, sep_clause);
    let close = lit(g, ")");
    let finish = call(g, |p, b| p.finish_group_concat(b.contains("distinct")));
    seq(g, vec![kwp, open, distinct_opt, expr_ref, sep_clause_opt, close, finish])
}

fn build_expression_grammar(g: &mut G, expr_ref: ProdRef, var_term: ProdRef, iri_term: ProdRef) {
    // --- PrimaryExpression ---
    let paren_open = lit(g, "(");
    let paren_close = lit(g, ")");
    let bracketed = seq(g, vec![paren_open, expr_ref, paren_close]);

    let mut builtins = Vec::new();
    for &(keyword, f) in BUILTIN_TABLE {
        builtins.push(builtin_call(g, expr_ref, keyword, f));
    }
    let builtin_any = any(g, builtins);

    let if_kw = kw(g, "IF");
    let if_open = lit(g, "(");
    let comma1 = lit(g, ",");
    let comma2 = lit(g, ",");
    let if_close = lit(g, ")");
    let finish_if = call(g, |p, _| p.finish_if());
    let if_expr = seq(g, vec![if_kw, if_open, expr_ref, comma1, expr_ref, comma2, expr_ref, if_close, finish_if]);

    let coalesce_kw = kw(g, "COALESCE");
    let coalesce_args = arg_list(g, expr_ref);
    let finish_coalesce = call(g, |p, _| p.finish_coalesce());
    let coalesce_expr = seq(g, vec![coalesce_kw, coalesce_args, finish_coalesce]);

    let count_agg = aggregate_count(g, expr_ref);
    let sum_agg = aggregate_sum(g, expr_ref);
    let avg_agg = aggregate_avg(g, expr_ref);
    let min_agg = aggregate_min(g, expr_ref);
    let max_agg = aggregate_max(g, expr_ref);
    let sample_agg = aggregate_sample(g, expr_ref);
    let group_concat_agg = aggregate_group_concat(g, expr_ref);

    let literal = literal_term(g);
    let push_literal = call(g, |p, b| {
        let raw = b.get("term").unwrap_or_default().to_string();
        p.push_string_literal_expr(&raw, b.get("lang"), b.get("datatype"));
    });
    let literal_expr = seq(g, vec![literal, push_literal]);

    let number_term = number_or_bool(g, "term");
    let push_number = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.push_numeric_or_bool_expr(text);
        }
    });
    let number_expr = seq(g, vec![number_term, push_number]);

    let push_var = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.push_var_expr(text);
        }
    });
    let var_expr = seq(g, vec![var_term, push_var]);

    let push_iri = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.push_iri_expr(text);
        }
    });
    let iri_expr = seq(g, vec![iri_term, push_iri]);

    let primary = any(
        g,
        vec![
            bracketed,
            if_expr,
            coalesce_expr,
            count_agg,
            sum_agg,
            avg_agg,
            min_agg,
            max_agg,
            sample_agg,
            group_concat_agg,
            builtin_any,
            literal_expr,
            number_expr,
            var_expr,
            iri_expr,
        ],
    );

    // --- UnaryExpression ---
    let not_sym = lit(g, "!");
    let finish_not = call(g, |p, _| p.finish_not());
    let not_expr = seq(g, vec![not_sym, primary, finish_not]);
    let plus_sym = lit(g, "+");
    let plus_expr = seq(g, vec![plus_sym, primary]);
    let minus_sym = lit(g, "-");
    let finish_neg = call(g, |p, _| p.finish_neg());
    let neg_expr = seq(g, vec![minus_sym, primary, finish_neg]);
    let unary = any(g, vec![not_expr, plus_expr, neg_expr, primary]);

    // --- MultiplicativeExpression ---
    let star_op = lit(g, "*");
    let finish_mul = call(g, |p, _| p.finish_arith("*"));
    let mul_step = seq(g, vec![star_op, unary, finish_mul]);
    let slash_op = lit(g, "/");
    let finish_div = call(g, |p, _| p.finish_arith("/"));
    let div_step = seq(g, vec![slash_op, unary, finish_div]);
    let mul_any = any(g, vec![mul_step, div_step]);
    let mul_star = star(g, mul_any);
    let multiplicative = seq(g, vec![unary, mul_star]);

    // --- AdditiveExpression ---
    let plus_op = lit(g, "+");
    let finish_add = call(g, |p, _| p.finish_arith("+"));
    let add_step = seq(g, vec![plus_op, multiplicative, finish_add]);
    let minus_op = lit(g, "-");
    let finish_sub = call(g, |p, _| p.finish_arith("-"));
    let sub_step = seq(g, vec![minus_op, multiplicative, finish_sub]);
    let add_any = any(g, vec![add_step, sub_step]);
    let add_star = star(g, add_any);
    let additive = seq(g, vec![multiplicative, add_star]);

    // --- RelationalExpression (non-chaining comparison) ---
    let compare_op = |g: &mut G, text: &str| -> ProdRef { lit(g, text) };
    let mut cmp_branches = Vec::new();
    for text in ["!=", "<=", ">=", "=", "<", ">"] {
        let op = compare_op(g, text);
        let text_owned = text.to_string();
        let finish = call(g, move |p, _| p.finish_compare(&text_owned));
        cmp_branches.push(seq(g, vec![op, additive, finish]));
    }
    let cmp_any = any(g, cmp_branches);
    let cmp_opt = opt(g, cmp_any);
    let relational = seq(g, vec![additive, cmp_opt]);

    // --- ConditionalAndExpression / ConditionalOrExpression ---
    let and_kw = lit(g, "&&");
    let finish_and = call(g, |p, _| p.finish_and());
    let and_step = seq(g, vec![and_kw, relational, finish_and]);
    let and_star = star(g, and_step);
    let conditional_and = seq(g, vec![relational, and_star]);

    let or_kw = lit(g, "||");
    let finish_or = call(g, |p, _| p.finish_or());
    let or_step = seq(g, vec![or_kw, conditional_and, finish_or]);
    let or_star = star(g, or_step);
    let conditional_or = seq(g, vec![conditional_and, or_star]);

    g.fill(expr_ref, Production::Reference(conditional_or));
}

// --- Query forms ---

fn build_select_clause(g: &mut G, expr_ref: ProdRef, var_term: ProdRef) -> ProdRef {
    let select_kw = kw(g, "SELECT");
    let distinct_kw = kw(g, "DISTINCT");
    let set_distinct = call(g, |p, _| p.set_distinct());
    let distinct_form = seq(g, vec![distinct_kw, set_distinct]);
    let reduced_kw = kw(g, "REDUCED");
    let set_reduced = call(g, |p, _| p.set_reduced());
    let reduced_form = seq(g, vec![reduced_kw, set_reduced]);
    let modifier = any(g, vec![distinct_form, reduced_form]);
    let modifier_opt = opt(g, modifier);

    let star_sel = lit(g, "*");
    let select_star_call = call(g, |p, _| p.select_star());
    let star_form = seq(g, vec![star_sel, select_star_call]);

    let plain_var = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.push_plain_projection(text);
        }
    });
    let plain_item = seq(g, vec![var_term, plain_var]);

    let paren_open = lit(g, "(");
    let as_kw = kw(g, "AS");
    let as_var = named(g, "asvar", var_term);
    let paren_close = lit(g, ")");
    let finish_as = call(g, |p, b| {
        if let Some(text) = b.get("asvar") {
            p.finish_as_binder(text);
        }
    });
    let as_item = seq(g, vec![paren_open, expr_ref, as_kw, as_var, paren_close, finish_as]);

    let item = any(g, vec![as_item, plain_item]);
    let item_list = plus(g, item);
    let projection = any(g, vec![star_form, item_list]);
    seq(g, vec![select_kw, modifier_opt, projection])
}

fn build_group_clause(g: &mut G, expr_ref: ProdRef, var_term: ProdRef) -> ProdRef {
    let group_kw = kw(g, "GROUP");
    let by_kw = kw(g, "BY");
    let plain_var = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.push_group_by_var(text);
        }
    });
    let plain_condition = seq(g, vec![var_term, plain_var]);
    let paren_open = lit(g, "(");
    let as_kw = kw(g, "AS");
    let as_var = named(g, "asvar", var_term);
    let paren_close = lit(g, ")");
    let finish_group_expr = call(g, |p, b| {
        if let Some(text) = b.get("asvar") {
            p.finish_group_by_expr(text);
        }
    });
    let expr_condition = seq(g, vec![paren_open, expr_ref, as_kw, as_var, paren_close, finish_group_expr]);
    let condition = any(g, vec![expr_condition, plain_condition]);
    let conditions = plus(g, condition);
    let clause = seq(g, vec![group_kw, by_kw, conditions]);
    opt(g, clause)
}

fn build_having_clause(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let having_kw = kw(g, "HAVING");
    let push_having = call(g, |p, _| p.push_having());
    let condition = seq(g, vec![expr_ref, push_having]);
    let conditions = plus(g, condition);
    let clause = seq(g, vec![having_kw, conditions]);
    opt(g, clause)
}

fn build_order_clause(g: &mut G, expr_ref: ProdRef) -> ProdRef {
    let order_kw = kw(g, "ORDER");
    let by_kw = kw(g, "BY");

    let asc_kw = kw(g, "ASC");
    let set_asc = call(g, |p, _| p.set_order_descending(false));
    let desc_kw = kw(g, "DESC");
    let set_desc = call(g, |p, _| p.set_order_descending(true));
    let direction = any(g, vec![seq(g, vec![asc_kw, set_asc]), seq(g, vec![desc_kw, set_desc])]);
    let paren_open = lit(g, "(");
    let paren_close = lit(g, ")");
    let finish_directed = call(g, |p, _| p.finish_order_key());
    let directed_condition = seq(g, vec![direction, paren_open, expr_ref, paren_close, finish_directed]);

    let finish_bare = call(g, |p, _| p.finish_order_key());
    let bare_condition = seq(g, vec![expr_ref, finish_bare]);

    let condition = any(g, vec![directed_condition, bare_condition]);
    let conditions = plus(g, condition);
    let clause = seq(g, vec![order_kw, by_kw, conditions]);
    opt(g, clause)
}

fn build_limit_offset_clauses(g: &mut G) -> ProdRef {
    let digit = g.add(Production::InRange(vec![('0', '9')]));
    let integer = plus(g, digit);
    let integer_named = named(g, "n", integer);

    let limit_kw = kw(g, "LIMIT");
    let set_limit = call(g, |p, b| {
        if let Some(text) = b.get("n") {
            p.set_limit(text);
        }
    });
    let limit_clause = seq(g, vec![limit_kw, integer_named, set_limit]);
    let limit_opt = opt(g, limit_clause);

    let integer2 = {
        let digit2 = g.add(Production::InRange(vec![('0', '9')]));
        plus(g, digit2)
    };
    let integer2_named = named(g, "n", integer2);
    let offset_kw = kw(g, "OFFSET");
    let set_offset = call(g, |p, b| {
        if let Some(text) = b.get("n") {
            p.set_offset(text);
        }
    });
    let offset_clause = seq(g, vec![offset_kw, integer2_named, set_offset]);
    let offset_opt = opt(g, offset_clause);

    seq(g, vec![limit_opt, offset_opt])
}

fn build_where_clause(g: &mut G, ggp_sub_ref: ProdRef) -> ProdRef {
    let attach_child = call(g, |p, _| p.attach_child());
    let where_kw = kw(g, "WHERE");
    let where_opt = opt(g, where_kw);
    let body = plain_block(g, ggp_sub_ref, attach_child);
    seq(g, vec![where_opt, body])
}

fn build_select_query(g: &mut G, ggp_sub_ref: ProdRef, expr_ref: ProdRef, var_term: ProdRef) -> ProdRef {
    let open = call(g, |p, _| p.open_group(GroupLabel::Select));
    let select_clause = build_select_clause(g, expr_ref, var_term);
    let where_clause = build_where_clause(g, ggp_sub_ref);
    let group_clause = build_group_clause(g, expr_ref, var_term);
    let having_clause = build_having_clause(g, expr_ref);
    let order_clause = build_order_clause(g, expr_ref);
    let limit_offset = build_limit_offset_clauses(g);
    let finish_select = call(g, |p, _| p.finish_select());
    let close = call(g, |p, _| p.close_group());
    seq(g, vec![open, select_clause, where_clause, group_clause, having_clause, order_clause, limit_offset, finish_select, close])
}

fn build_construct_query(g: &mut G, ggp_sub_ref: ProdRef, triples_block_opt: ProdRef) -> ProdRef {
    let open = call(g, |p, _| p.open_group(GroupLabel::Construct));
    let construct_kw = kw(g, "CONSTRUCT");
    let brace_open = lit(g, "{");
    let begin_template = call(g, |p, _| p.begin_template());
    let triples = triples_block_opt;
    let end_template = call(g, |p, _| p.end_template());
    let brace_close = lit(g, "}");
    let where_clause = build_where_clause(g, ggp_sub_ref);
    let close = call(g, |p, _| p.close_group());
    seq(g, vec![open, construct_kw, brace_open, begin_template, triples, end_template, brace_close, where_clause, close])
}

fn build_describe_query(g: &mut G, ggp_sub_ref: ProdRef, var_term: ProdRef, iri_term: ProdRef) -> ProdRef {
    let open = call(g, |p, _| p.open_group(GroupLabel::Describe));
    let describe_kw = kw(g, "DESCRIBE");
    let target = any(g, vec![var_term, iri_term]);
    let push_target = call(g, |p, b| {
        if let Some(text) = b.get("term") {
            p.push_describe_term(text);
        }
    });
    let one_target = seq(g, vec![target, push_target]);
    let targets = plus(g, one_target);
    let where_clause = build_where_clause(g, ggp_sub_ref);
    let where_clause_opt = opt(g, where_clause);
    let close = call(g, |p, _| p.close_group());
    seq(g, vec![open, describe_kw, targets, where_clause_opt, close])
}

fn build_ask_query(g: &mut G, ggp_sub_ref: ProdRef) -> ProdRef {
    let open = call(g, |p, _| p.open_group(GroupLabel::Ask));
    let ask_kw = kw(g, "ASK");
    let where_clause = build_where_clause(g, ggp_sub_ref);
    let close = call(g, |p, _| p.close_group());
    seq(g, vec![open, ask_kw, where_clause, close])
}


