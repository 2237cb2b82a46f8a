//! Turtle document entry point.

use crate::error::TurtleResult;
use crate::grammar::build;
use crate::producer::TurtleProducer;

/// Parses a Turtle document into its asserted triples, each a 3-element
/// array of canonical lexical forms (`<iri>`, `_:label`, or a literal's
/// `"lex"...` form), using `base` to resolve relative IRI references.
pub fn parse(input: &str, base: &str) -> TurtleResult<Vec<[String; 3]>> {
    let stripped = strip_comments(input);
    let (grammar, start) = build();
    let mut producer = TurtleProducer::new(base);
    grammar.parse(start, &stripped, &mut producer)?;
    producer.into_triples()
}

/// Removes `#`-to-end-of-line comments, leaving `#` characters inside
/// `<...>` IRI references and quoted string literals untouched.
fn strip_comments(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut in_iri = false;
    let mut string_quote: Option<(char, bool)> = None; // (quote char, is_triple)

    while i < chars.len() {
        let c = chars[i];
        if let Some((quote, triple)) = string_quote {
            if c == '\\' && i + 1 < chars.len() {
                out.push(c);
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == quote {
                let closing_len = if triple { 3 } else { 1 };
                if i + closing_len <= chars.len() && chars[i..i + closing_len].iter().all(|&ch| ch == quote) {
                    out.extend(&chars[i..i + closing_len]);
                    i += closing_len;
                    string_quote = None;
                    continue;
                }
            }
            out.push(c);
            i += 1;
            continue;
        }
        if in_iri {
            out.push(c);
            if c == '>' {
                in_iri = false;
            }
            i += 1;
            continue;
        }
        match c {
            '<' => {
                in_iri = true;
                out.push(c);
                i += 1;
            }
            '"' | '\'' => {
                let triple = i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c;
                let consumed = if triple { 3 } else { 1 };
                out.extend(&chars[i..i + consumed]);
                i += consumed;
                string_quote = Some((c, triple));
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                if i < chars.len() {
                    out.push('\n');
                    i += 1;
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_triple() {
        let triples = parse("<http://x/a> <http://x/p> <http://x/b> .", "").unwrap();
        assert_eq!(triples, vec![["<http://x/a>".to_string(), "<http://x/p>".to_string(), "<http://x/b>".to_string()]]);
    }

    #[test]
    fn parses_prefixed_names_and_a_shorthand() {
        let doc = "@prefix ex: <http://example.org/> .\nex:a a ex:Thing .";
        let triples = parse(doc, "").unwrap();
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0][1], "<http://www.w3.org/1999/02/22-rdf-syntax-ns#type>");
        assert_eq!(triples[0][0], "<http://example.org/a>");
        assert_eq!(triples[0][2], "<http://example.org/Thing>");
    }

    #[test]
    fn parses_object_list_and_predicate_list() {
        let doc = "@prefix ex: <http://example.org/> .\nex:a ex:p ex:b , ex:c ; ex:q ex:d .";
        let triples = parse(doc, "").unwrap();
        assert_eq!(triples.len(), 3);
    }

    #[test]
    fn parses_literal_with_language_tag() {
        let doc = "@prefix ex: <http://example.org/> .\nex:a ex:name \"hello\"@en .";
        let triples = parse(doc, "").unwrap();
        assert_eq!(triples[0][2], "\"hello\"@en");
    }

    #[test]
    fn parses_numeric_and_boolean_shorthand() {
        let doc = "@prefix ex: <http://example.org/> .\nex:a ex:n 42 .\nex:a ex:flag true .";
        let triples = parse(doc, "").unwrap();
        assert!(triples[0][2].contains("42"));
        assert!(triples[1][2].contains("true"));
    }

    #[test]
    fn parses_blank_node_property_list_as_object() {
        let doc = "@prefix ex: <http://example.org/> .\nex:a ex:p [ ex:q ex:r ] .";
        let triples = parse(doc, "").unwrap();
        assert_eq!(triples.len(), 2);
        // The property list's own triple is recorded before the anchor
        // triple that points at it, since its Call actions run while the
        // `[...]` is still being parsed.
        assert_eq!(triples[0][0], triples[1][2]);
    }

    #[test]
    fn parses_nested_blank_node_property_lists() {
        let doc = "@prefix ex: <http://example.org/> .\nex:a ex:p [ ex:q [ ex:r ex:s ] ] .";
        let triples = parse(doc, "").unwrap();
        // (innerBlank r s), (outerBlank q innerBlank), (a p outerBlank), in
        // that order: each list's own body triples are recorded before the
        // `Call` that hands its blank identity up to whatever wraps it.
        assert_eq!(triples.len(), 3);
        assert_eq!(triples[0][0], triples[1][2]);
        assert_eq!(triples[1][0], triples[2][2]);
        assert_eq!(triples[2][0], "<http://example.org/a>");
    }

    #[test]
    fn parses_collection() {
        let doc = "@prefix ex: <http://example.org/> .\nex:a ex:p ( ex:x ex:y ) .";
        let triples = parse(doc, "").unwrap();
        // two list cells plus the anchor assertion: (a p cell0), (cell0 first x),
        // (cell0 rest cell1), (cell1 first y), (cell1 rest nil)
        assert_eq!(triples.len(), 5);
    }

    #[test]
    fn strips_hash_comments_outside_iris_and_strings() {
        let doc = "@prefix ex: <http://example.org/> . # a comment\nex:a ex:p \"not # a comment\" .";
        let triples = parse(doc, "").unwrap();
        assert_eq!(triples[0][2], "\"not # a comment\"");
    }
}


