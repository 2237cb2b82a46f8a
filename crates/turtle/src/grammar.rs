//! Builds the production graph for (a practical subset of) W3C Turtle 1.1:
//! full and prefixed IRIs, `@prefix`/`@base` and their SPARQL-style
//! case-insensitive equivalents, blank-node labels and anonymous blank
//! nodes, blank-node property lists, collections, single- and
//! triple-quoted strings with `@lang`/`^^iri`, and the numeric/boolean
//! object shorthand. Identifier character classes are restricted to
//! ASCII letters, digits, `_`, and `-`, a deliberate narrowing of the
//! full Unicode `PN_CHARS_BASE` ranges in the W3C grammar. Triple-quoted
//! strings forbid their own delimiter character unescaped anywhere in
//! the body (the W3C grammar allows one or two consecutive quote
//! characters mid-string), a further narrowing kept for simplicity.

use std::rc::Rc;

use grammar::{Bindings, Grammar, ProdRef, Production};

use crate::producer::TurtleProducer;

type G = Grammar<TurtleProducer>;

fn call(g: &mut G, f: impl Fn(&mut TurtleProducer, &Bindings) + 'static) -> ProdRef {
    g.add(Production::Call(Rc::new(f)))
}

fn lit(g: &mut G, text: &str) -> ProdRef {
    g.add(Production::Literal(text.to_string(), true))
}

/// Case-insensitive keyword, for the SPARQL-style `PREFIX`/`BASE` forms.
fn kw(g: &mut G, text: &str) -> ProdRef {
    g.add(Production::Literal(text.to_string(), false))
}

fn pn_char_start(g: &mut G) -> ProdRef {
    g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z'), ('_', '_')]))
}

fn pn_char(g: &mut G) -> ProdRef {
    g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_'), ('-', '-')]))
}

fn pn_ident(g: &mut G) -> ProdRef {
    let start = pn_char_start(g);
    let rest_char = pn_char(g);
    let rest = g.add(Production::ZeroOrMore(rest_char));
    g.add(Production::All(vec![start, rest]))
}

/// `<...>` IRI reference, disallowing whitespace and reserved delimiters
/// inside, captured whole (including the angle brackets) under `name`.
fn iri_ref(g: &mut G, name: &str) -> ProdRef {
    let open = g.add(Production::CharLiteral('<'));
    let body_char = g.add(Production::NotIn(vec!['<', '>', '"', '{', '}', '|', '^', '`', '\\', ' ', '\t', '\n', '\r']));
    let body = g.add(Production::ZeroOrMore(body_char));
    let close = g.add(Production::CharLiteral('>'));
    let token = g.add(Production::Sequence(vec![open, body, close]));
    g.add(Production::Named(name.to_string(), token))
}

/// `prefix:local`, prefix and local parts each optional on their own.
fn prefixed_name(g: &mut G, name: &str) -> ProdRef {
    let prefix_part = pn_ident(g);
    let prefix_opt = g.add(Production::Optional(prefix_part));
    let colon = g.add(Production::CharLiteral(':'));
    let local_start = g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')]));
    let local_rest_char = pn_char(g);
    let local_rest = g.add(Production::ZeroOrMore(local_rest_char));
    let local_part = g.add(Production::All(vec![local_start, local_rest]));
    let local_opt = g.add(Production::Optional(local_part));
    let token = g.add(Production::Sequence(vec![prefix_opt, colon, local_opt]));
    g.add(Production::Named(name.to_string(), token))
}

/// Blank-node label `_:ident`.
fn blank_label(g: &mut G, name: &str) -> ProdRef {
    let prefix = lit(g, "_:");
    let ident = pn_ident(g);
    let token = g.add(Production::Sequence(vec![prefix, ident]));
    g.add(Production::Named(name.to_string(), token))
}

fn escaped_char(g: &mut G, quote: char) -> ProdRef {
    let backslash = g.add(Production::CharLiteral('\\'));
    let any = g.add(Production::NotIn(vec![]));
    let escape = g.add(Production::Sequence(vec![backslash, any]));
    let plain = g.add(Production::NotIn(vec![quote, '\\']));
    g.add(Production::AnyOf(vec![escape, plain]))
}

fn short_quoted(g: &mut G, quote: char) -> ProdRef {
    let open = g.add(Production::CharLiteral(quote));
    let backslash = g.add(Production::CharLiteral('\\'));
    let any = g.add(Production::NotIn(vec![]));
    let escape = g.add(Production::Sequence(vec![backslash, any]));
    let plain = g.add(Production::NotIn(vec![quote, '\\', '\n', '\r']));
    let body_char = g.add(Production::AnyOf(vec![escape, plain]));
    let body = g.add(Production::ZeroOrMore(body_char));
    let close = g.add(Production::CharLiteral(quote));
    g.add(Production::Sequence(vec![open, body, close]))
}

fn long_quoted(g: &mut G, quote: char) -> ProdRef {
    let q = |g: &mut G| g.add(Production::CharLiteral(quote));
    let (q1, q2, q3) = (q(g), q(g), q(g));
    let open = g.add(Production::All(vec![q1, q2, q3]));
    let body_char = escaped_char(g, quote);
    let body = g.add(Production::ZeroOrMore(body_char));
    let (c1, c2, c3) = (q(g), q(g), q(g));
    let close = g.add(Production::All(vec![c1, c2, c3]));
    g.add(Production::Sequence(vec![open, body, close]))
}

/// Single-/triple-quoted string body (with either quote character),
/// captured without its delimiters under `name`. Long forms are tried
/// first since a short form would otherwise consume only the opening
/// quote of an (empty) long one.
fn quoted_string(g: &mut G, name: &str) -> ProdRef {
    let long_dq = long_quoted(g, '"');
    let long_sq = long_quoted(g, '\'');
    let short_dq = short_quoted(g, '"');
    let short_sq = short_quoted(g, '\'');
    let any = g.add(Production::AnyOf(vec![long_dq, long_sq, short_dq, short_sq]));
    g.add(Production::Named(name.to_string(), any))
}

fn digits(g: &mut G) -> ProdRef {
    let digit = g.add(Production::InRange(vec![('0', '9')]));
    g.add(Production::OneOrMore(digit))
}

fn sign(g: &mut G) -> ProdRef {
    let plus = g.add(Production::CharLiteral('+'));
    let minus = g.add(Production::CharLiteral('-'));
    let either = g.add(Production::AnyOf(vec![plus, minus]));
    g.add(Production::Optional(either))
}

/// Unquoted numeric literal or `true`/`false`, captured under `name`.
fn number_or_bool(g: &mut G, name: &str) -> ProdRef {
    let lead_sign = sign(g);
    let int_digits = digits(g);
    let dot_digits = {
        let dot = g.add(Production::CharLiteral('.'));
        let frac = digits(g);
        g.add(Production::All(vec![dot, frac]))
    };
    let dot_digits_opt = g.add(Production::Optional(dot_digits));
    let exponent = {
        let lower_e = g.add(Production::CharLiteral('e'));
        let upper_e = g.add(Production::CharLiteral('E'));
        let e = g.add(Production::AnyOf(vec![lower_e, upper_e]));
        let esign = sign(g);
        let edigits = digits(g);
        g.add(Production::All(vec![e, esign, edigits]))
    };
    let exponent_opt = g.add(Production::Optional(exponent));
    let number = g.add(Production::Sequence(vec![lead_sign, int_digits, dot_digits_opt, exponent_opt]));
    let true_kw = lit(g, "true");
    let false_kw = lit(g, "false");
    let any = g.add(Production::AnyOf(vec![number, true_kw, false_kw]));
    g.add(Production::Named(name.to_string(), any))
}

/// Builds the full grammar and returns its entry production (zero or
/// more top-level statements: directives and triples blocks).
pub fn build() -> (G, ProdRef) {
    let mut g: G = Grammar::new();

    // `object` is mutually recursive with collections and blank-node
    // property lists, so its definition is deferred.
    let object_ref = g.reserve();

    // --- IRI-or-prefixed-name term, shared by subject/predicate/object ---
    let iri_term = iri_ref(&mut g, "term");
    let pname_term = prefixed_name(&mut g, "term");
    let term_iri_like = g.add(Production::AnyOf(vec![iri_term, pname_term]));
    let blank_term = blank_label(&mut g, "term");
    let plain_term = g.add(Production::AnyOf(vec![blank_term, term_iri_like]));

    // --- literal := string ('@' lang | '^^' (IRI|pname))? ---
    let string_term = quoted_string(&mut g, "term");
    let lang_tag = {
        let at = lit(&mut g, "@");
        let start = g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z')]));
        let rest_char = g.add(Production::InRange(vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('-', '-')]));
        let rest = g.add(Production::ZeroOrMore(rest_char));
        let tag = g.add(Production::All(vec![start, rest]));
        let named = g.add(Production::Named("lang".to_string(), tag));
        g.add(Production::All(vec![at, named]))
    };
    let datatype_suffix = {
        let h1 = g.add(Production::CharLiteral('^'));
        let h2 = g.add(Production::CharLiteral('^'));
        let hats = g.add(Production::All(vec![h1, h2]));
        let iri = iri_ref(&mut g, "datatype");
        let pname = prefixed_name(&mut g, "datatype");
        let dt = g.add(Production::AnyOf(vec![iri, pname]));
        g.add(Production::All(vec![hats, dt]))
    };
    let lang_or_datatype = g.add(Production::AnyOf(vec![lang_tag, datatype_suffix]));
    let suffix_opt = g.add(Production::Optional(lang_or_datatype));
    let literal_term = g.add(Production::All(vec![string_term, suffix_opt]));
    let emit_literal = call(&mut g, |p, b| {
        let raw = b.get("term").unwrap_or_default().to_string();
        p.emit_literal_object(&raw, b.get("lang"), b.get("datatype"));
    });
    let literal_object = g.add(Production::All(vec![literal_term, emit_literal]));

    let number_term = number_or_bool(&mut g, "term");
    let emit_number = call(&mut g, |p, b| {
        if let Some(text) = b.get("term") {
            p.emit_object_from_text(text);
        }
    });
    let number_object = g.add(Production::All(vec![number_term, emit_number]));

    // --- anonymous blank `[]`, blank-node property list `[ ... ]`, and
    // collections `( ... )` each resolve to a pending term consumed by
    // whichever rule (subject or object) wraps them.
    let begin_blank = call(&mut g, |p, _| p.begin_blank_object());
    let end_blank = call(&mut g, |p, _| p.end_blank_object());
    let verb_alternatives = {
        let a_kw = lit(&mut g, "a");
        g.add(Production::AnyOf(vec![a_kw, iri_term, pname_term]))
    };
    let verb_named = g.add(Production::Named("verb".to_string(), verb_alternatives));
    let set_predicate = call(&mut g, |p, b| {
        if let Some(text) = b.get("verb") {
            p.set_predicate_from_text(text);
        }
    });
    let verb = g.add(Production::All(vec![verb_named, set_predicate]));
    let comma = lit(&mut g, ",");
    let more_objects = g.add(Production::All(vec![comma, object_ref]));
    let more_objects_star = g.add(Production::ZeroOrMore(more_objects));
    let object_list = g.add(Production::All(vec![object_ref, more_objects_star]));
    let verb_object_list = g.add(Production::All(vec![verb, object_list]));
    let semi = lit(&mut g, ";");
    let more_po = g.add(Production::All(vec![semi, verb_object_list]));
    let more_po_star = g.add(Production::ZeroOrMore(more_po));
    let predicate_object_list = g.add(Production::All(vec![verb_object_list, more_po_star]));
    let po_opt = g.add(Production::Optional(predicate_object_list));
    let bracket_open = lit(&mut g, "[");
    let bracket_close = lit(&mut g, "]");
    let blank_node_property_list = g.add(Production::All(vec![bracket_open, begin_blank, po_opt, end_blank, bracket_close]));

    let paren_open = lit(&mut g, "(");
    let paren_close = lit(&mut g, ")");
    let begin_collection = call(&mut g, |p, _| p.begin_collection());
    let begin_item = call(&mut g, |p, _| p.begin_collection_item());
    let end_item = call(&mut g, |p, _| p.end_collection_item());
    let one_item = g.add(Production::All(vec![begin_item, object_ref, end_item]));
    let items = g.add(Production::ZeroOrMore(one_item));
    let end_collection = call(&mut g, |p, _| p.end_collection());
    let collection = g.add(Production::All(vec![paren_open, begin_collection, items, end_collection, paren_close]));

    // --- object := literal | number/bool | blank-node list | collection | plain term ---
    let emit_pending = call(&mut g, |p, _| p.emit_object_from_pending());
    let bnpl_as_object = g.add(Production::All(vec![blank_node_property_list, emit_pending]));
    let collection_as_object = g.add(Production::All(vec![collection, emit_pending]));
    let emit_text_object = call(&mut g, |p, b| {
        if let Some(text) = b.get("term") {
            p.emit_object_from_text(text);
        }
    });
    let plain_object = g.add(Production::All(vec![plain_term, emit_text_object]));
    g.fill(
        object_ref,
        Production::AnyOf(vec![literal_object, number_object, bnpl_as_object, collection_as_object, plain_object]),
    );

    // --- subject := plain term | blank-node list | collection ---
    let push_subject_text = call(&mut g, |p, b| {
        if let Some(text) = b.get("term") {
            p.push_subject_from_text(text);
        }
    });
    let subject_by_text = g.add(Production::All(vec![plain_term, push_subject_text]));
    let push_subject_pending = call(&mut g, |p, _| p.push_subject_from_pending());
    let subject_by_bnpl = g.add(Production::All(vec![blank_node_property_list, push_subject_pending]));
    let subject_by_collection = g.add(Production::All(vec![collection, push_subject_pending]));
    let subject = g.add(Production::AnyOf(vec![subject_by_text, subject_by_bnpl, subject_by_collection]));

    let dot = lit(&mut g, ".");
    let pop_subject = call(&mut g, |p, _| p.pop_subject());
    let top_level_po_opt = g.add(Production::Optional(predicate_object_list));
    let triples = g.add(Production::All(vec![subject, top_level_po_opt, pop_subject, dot]));

    // --- directives ---
    let prefix_decl = directive_prefix(&mut g);
    let base_decl = directive_base(&mut g);

    let statement = g.add(Production::AnyOf(vec![prefix_decl, base_decl, triples]));
    let statements = g.add(Production::ZeroOrMore(statement));
    (g, statements)
}

fn directive_prefix(g: &mut G) -> ProdRef {
    let prefix_name = |g: &mut G| -> ProdRef {
        let ident_opt = {
            let ident = pn_ident(g);
            g.add(Production::Optional(ident))
        };
        let colon = lit(g, ":");
        let token = g.add(Production::Sequence(vec![ident_opt, colon]));
        g.add(Production::Named("prefix".to_string(), token))
    };

    let at_form = {
        let at_prefix = lit(g, "@prefix");
        let prefix = prefix_name(g);
        let iri = iri_ref(g, "iri");
        let dot = lit(g, ".");
        g.add(Production::All(vec![at_prefix, prefix, iri, dot]))
    };
    let sparql_form = {
        let kw_prefix = kw(g, "PREFIX");
        let prefix = prefix_name(g);
        let iri = iri_ref(g, "iri");
        g.add(Production::All(vec![kw_prefix, prefix, iri]))
    };
    let any = g.add(Production::AnyOf(vec![at_form, sparql_form]));
    let set = call(g, |p, b| {
        if let (Some(prefix), Some(iri)) = (b.get("prefix"), b.get("iri")) {
            p.set_prefix(prefix, iri);
        }
    });
    g.add(Production::All(vec![any, set]))
}

fn directive_base(g: &mut G) -> ProdRef {
    let at_form = {
        let at_base = lit(g, "@base");
        let iri = iri_ref(g, "iri");
        let dot = lit(g, ".");
        g.add(Production::All(vec![at_base, iri, dot]))
    };
    let sparql_form = {
        let kw_base = kw(g, "BASE");
        let iri = iri_ref(g, "iri");
        g.add(Production::All(vec![kw_base, iri]))
    };
    let any = g.add(Production::AnyOf(vec![at_form, sparql_form]));
    let set = call(g, |p, b| {
        if let Some(iri) = b.get("iri") {
            p.set_base(iri);
        }
    });
    g.add(Production::All(vec![any, set]))
}
