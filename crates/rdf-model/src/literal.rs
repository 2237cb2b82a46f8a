//! RDF literal: lexical form plus an optional language tag or datatype IRI.

use std::fmt;

use crate::vocab::Vocabulary;
use crate::RdfError;

/// An RDF literal. `language` and `datatype` are mutually exclusive: a
/// language-tagged literal's implicit datatype is `rdf:langString` and is
/// not stored redundantly in `datatype`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub lexical_form: String,
    pub language: Option<String>,
    pub datatype: Option<String>,
}

impl Literal {
    /// A plain `xsd:string` literal.
    pub fn string(lexical_form: impl Into<String>) -> Self {
        Literal {
            lexical_form: lexical_form.into(),
            language: None,
            datatype: None,
        }
    }

    /// A language-tagged literal.
    pub fn lang_string(lexical_form: impl Into<String>, language: impl Into<String>) -> Self {
        Literal {
            lexical_form: lexical_form.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    /// A typed literal with an explicit datatype IRI.
    pub fn typed(lexical_form: impl Into<String>, datatype: impl Into<String>) -> Self {
        Literal {
            lexical_form: lexical_form.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Literal::typed(if value { "true" } else { "false" }, Vocabulary::XSD_BOOLEAN)
    }

    pub fn integer(value: i64) -> Self {
        Literal::typed(value.to_string(), Vocabulary::XSD_INTEGER)
    }

    /// The literal's effective datatype: `rdf:langString` for a
    /// language-tagged literal, the explicit datatype if present, else
    /// `xsd:string`.
    pub fn effective_datatype(&self) -> &str {
        if self.language.is_some() {
            Vocabulary::RDF_LANG_STRING
        } else {
            self.datatype.as_deref().unwrap_or(Vocabulary::XSD_STRING)
        }
    }

    pub fn is_numeric(&self) -> bool {
        Vocabulary::numeric_rank(self.effective_datatype()).is_some()
    }

    pub fn numeric_rank(&self) -> Option<u8> {
        Vocabulary::numeric_rank(self.effective_datatype())
    }

    pub fn as_bool(&self) -> Option<bool> {
        if self.effective_datatype() != Vocabulary::XSD_BOOLEAN {
            return None;
        }
        match self.lexical_form.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        if self.effective_datatype() == Vocabulary::XSD_INTEGER {
            self.lexical_form.parse().ok()
        } else {
            None
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        if self.is_numeric() {
            self.lexical_form.parse().ok()
        } else {
            None
        }
    }

    /// Render a numeric literal produced by computation in canonical form,
    /// so that values produced arithmetically and values parsed from text
    /// compare equal. Integers have no fractional part or exponent;
    /// decimals always carry at least one fractional digit; float/double
    /// use Rust's default shortest round-trip formatting.
    pub fn canonical_numeric(value: f64, datatype: &str) -> Self {
        let lexical = match datatype {
            Vocabulary::XSD_INTEGER => format!("{}", value as i64),
            Vocabulary::XSD_DECIMAL => {
                if value.fract() == 0.0 {
                    format!("{:.1}", value)
                } else {
                    let s = format!("{}", value);
                    if s.contains('.') {
                        s
                    } else {
                        format!("{}.0", s)
                    }
                }
            }
            _ => format!("{}", value),
        };
        Literal::typed(lexical, datatype)
    }

    /// Canonical lexical form: `"lex"@lang` or `"lex"^^<datatype>` or
    /// `"lex"` for a plain `xsd:string`.
    pub fn canonical(&self) -> String {
        let escaped = escape_lexical(&self.lexical_form);
        if let Some(lang) = &self.language {
            format!("\"{}\"@{}", escaped, lang)
        } else if let Some(dt) = &self.datatype {
            if dt == Vocabulary::XSD_STRING {
                format!("\"{}\"", escaped)
            } else {
                format!("\"{}\"^^<{}>", escaped, dt)
            }
        } else {
            format!("\"{}\"", escaped)
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Literal({})", self.canonical())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

fn escape_lexical(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Unescape a Turtle string-literal body: `\t \b \n \r \f \\ \" \'`,
/// `\uXXXX` and `\U00000000` numeric escapes.
pub fn unescape_lexical(value: &str) -> Result<String, RdfError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{0008}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('u') => out.push(read_hex_escape(&mut chars, 4)?),
            Some('U') => out.push(read_hex_escape(&mut chars, 8)?),
            Some(other) => {
                return Err(RdfError::InvalidLiteral(format!(
                    "unknown escape sequence \\{other}"
                )))
            }
            None => return Err(RdfError::InvalidLiteral("trailing backslash".to_string())),
        }
    }
    Ok(out)
}

fn read_hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
) -> Result<char, RdfError> {
    let mut hex = String::with_capacity(digits);
    for _ in 0..digits {
        match chars.next() {
            Some(c) if c.is_ascii_hexdigit() => hex.push(c),
            _ => {
                return Err(RdfError::InvalidLiteral(format!(
                    "expected {digits} hex digits in unicode escape"
                )))
            }
        }
    }
    let code = u32::from_str_radix(&hex, 16)
        .map_err(|e| RdfError::InvalidLiteral(format!("bad unicode escape: {e}")))?;
    char::from_u32(code)
        .ok_or_else(|| RdfError::InvalidLiteral(format!("invalid code point U+{hex}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_has_xsd_string_effective_datatype() {
        let lit = Literal::string("hello");
        assert_eq!(lit.effective_datatype(), Vocabulary::XSD_STRING);
        assert_eq!(lit.canonical(), "\"hello\"");
    }

    #[test]
    fn lang_string_effective_datatype_is_rdf_lang_string() {
        let lit = Literal::lang_string("bonjour", "fr");
        assert_eq!(lit.effective_datatype(), Vocabulary::RDF_LANG_STRING);
        assert_eq!(lit.canonical(), "\"bonjour\"@fr");
    }

    #[test]
    fn typed_literal_canonical_form() {
        let lit = Literal::integer(42);
        assert_eq!(lit.canonical(), "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>");
    }

    #[test]
    fn numeric_rank_orders_by_width() {
        assert!(Literal::integer(1).numeric_rank() < Literal::typed("1.0", Vocabulary::XSD_DOUBLE).numeric_rank());
    }

    #[test]
    fn canonical_numeric_integer_has_no_fraction() {
        let lit = Literal::canonical_numeric(5.0, Vocabulary::XSD_INTEGER);
        assert_eq!(lit.lexical_form, "5");
    }

    #[test]
    fn canonical_numeric_decimal_keeps_fraction_digit() {
        let lit = Literal::canonical_numeric(5.0, Vocabulary::XSD_DECIMAL);
        assert_eq!(lit.lexical_form, "5.0");
        let lit = Literal::canonical_numeric(5.5, Vocabulary::XSD_DECIMAL);
        assert_eq!(lit.lexical_form, "5.5");
    }

    #[test]
    fn unescape_handles_standard_escapes() {
        assert_eq!(unescape_lexical("a\\tb\\n").unwrap(), "a\tb\n");
        assert_eq!(unescape_lexical("\\\"quoted\\\"").unwrap(), "\"quoted\"");
    }

    #[test]
    fn unescape_handles_unicode_escapes() {
        assert_eq!(unescape_lexical("\\u00e9").unwrap(), "é");
        assert_eq!(unescape_lexical("\\U0001F600").unwrap(), "\u{1F600}");
    }

    #[test]
    fn unescape_rejects_truncated_hex_escape() {
        assert!(unescape_lexical("\\u12").is_err());
    }
}
