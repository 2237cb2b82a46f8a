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
