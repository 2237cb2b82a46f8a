//! A minimal Turtle pretty-printer.
//!
//! Triples are already canonical atoms (`<iri>`, `_:label`, or a
//! literal's `"lex"...` form) by the time they reach this module, so
//! Turtle's grammar already accepts each atom unchanged — no
//! prefix-compaction is attempted, trading compactness for a trivially
//! round-trippable output.

/// Serializes triples as one `s p o .` statement per line.
pub fn write(triples: &[[String; 3]]) -> String {
    let mut out = String::new();
    for [s, p, o] in triples {
        out.push_str(s);
        out.push(' ');
        out.push_str(p);
        out.push(' ');
        out.push_str(o);
        out.push_str(" .\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn round_trips_through_reparse() {
        let doc = "@prefix ex: <http://example.org/> .\nex:a ex:p ex:b, \"x\"@en .";
        let original = parse(doc, "").unwrap();
        let rendered = write(&original);
        let reparsed = parse(&rendered, "").unwrap();
        let mut original_sorted = original.clone();
        let mut reparsed_sorted = reparsed.clone();
        original_sorted.sort();
        reparsed_sorted.sort();
        assert_eq!(original_sorted, reparsed_sorted);
    }
}

