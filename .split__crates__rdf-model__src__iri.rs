//! IRI type: prefix/namespace/local-name splitting, canonical form, RFC 3986 resolution

use std::fmt;

use crate::RdfError;

/// An absolute or prefixed IRI.
///
/// `value` is always the fully resolved `namespace + local_name` form.
/// `prefix` is the short name the IRI was parsed with (empty string if
/// parsed from an angle-bracketed absolute form or if no prefix was
/// registered for its namespace).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri {
    pub prefix: String,
    pub namespace: String,
    pub local_name: String,
}

impl Iri {
    /// Build an IRI from an already-resolved absolute string, splitting it
    /// into namespace/local-name at the last `#` or `/`.
    pub fn from_absolute(value: &str) -> Self {
        let (namespace, local_name) = split_namespace(value);
        Iri {
            prefix: String::new(),
            namespace,
            local_name,
        }
    }

    /// Build an IRI from a registered prefix and local name.
    pub fn from_prefixed(prefix: &str, namespace: &str, local_name: &str) -> Self {
        Iri {
            prefix: prefix.to_string(),
            namespace: namespace.to_string(),
            local_name: local_name.to_string(),
        }
    }

    /// The full IRI string (`namespace` + `local_name`).
    pub fn value(&self) -> String {
        format!("{}{}", self.namespace, self.local_name)
    }

    /// Canonical lexical form used as a store key: `<value>`.
    pub fn canonical(&self) -> String {
        format!("<{}>", self.value())
    }
}

impl fmt::Debug for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iri({})", self.value())
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.value())
    }
}

/// Split an absolute IRI into `(namespace, local_name)` at the last `#` or
/// `/`. An IRI with neither separator has an empty namespace.
fn split_namespace(value: &str) -> (String, String) {
    if let Some(pos) = value.rfind('#') {
        (value[..=pos].to_string(), value[pos + 1..].to_string())
    } else if let Some(pos) = value.rfind('/') {
        (value[..=pos].to_string(), value[pos + 1..].to_string())
    } else {
        (String::new(), value.to_string())
    }
}

/// Resolve a relative IRI reference `r` against a base `base`, per RFC 3986
/// §5.3 (including dot-segment removal, §5.2.4).
pub fn resolve_relative(r: &str, base: &str) -> Result<String, RdfError> {
    if let Some(scheme_end) = r.find(':') {
        if r[..scheme_end].chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
            && !r[..scheme_end].is_empty()
            && r.as_bytes()[0].is_ascii_alphabetic()
        {
            // `r` already has a scheme: it is absolute.
            return Ok(remove_dot_segments_full(r));
        }
    }

    let base_parts = UriParts::parse(base)?;

    if r.is_empty() {
        return Ok(base.to_string());
    }

    if let Some(rest) = r.strip_prefix("//") {
        return Ok(format!("{}://{}", base_parts.scheme, remove_dot_segments(rest)));
    }

    if let Some(rest) = r.strip_prefix('?') {
        return Ok(format!("{}{}?{}", base_parts.scheme_authority(), base_parts.path, rest));
    }

    if let Some(rest) = r.strip_prefix('#') {
        return Ok(format!(
            "{}{}{}#{}",
            base_parts.scheme_authority(),
            base_parts.path,
            base_parts.query_suffix(),
            rest
        ));
    }

    if r.starts_with('/') {
        let merged = remove_dot_segments(r);
        return Ok(format!("{}{}", base_parts.scheme_authority(), merged));
    }

    // Relative-path reference: merge with base path, then remove dot segments.
    let merged_path = merge_paths(&base_parts, r);
    let resolved_path = remove_dot_segments(&merged_path);
    Ok(format!("{}{}", base_parts.scheme_authority(), resolved_path))
}

fn remove_dot_segments_full(iri: &str) -> String {
    // `iri` is absolute (has a scheme). Only normalize the path component.
    if let Some(authority_start) = iri.find("://") {
        let after_scheme = authority_start + 3;
        let rest = &iri[after_scheme..];
        let path_start = rest.find('/').map(|p| after_scheme + p);
        match path_start {
            Some(p) => {
                let (head, path_and_rest) = iri.split_at(p);
                let (path, suffix) = split_query_fragment(path_and_rest);
                format!("{}{}{}", head, remove_dot_segments(path), suffix)
            }
            None => iri.to_string(),
        }
    } else {
        iri.to_string()
    }
}

fn split_query_fragment(s: &str) -> (&str, String) {
    let cut = s.find(['?', '#']).unwrap_or(s.len());
    (&s[..cut], s[cut..].to_string())
}

struct UriParts<'a> {
    scheme: &'a str,
    authority: Option<&'a str>,
    path: String,
    query: Option<String>,
}

impl<'a> UriParts<'a> {
    fn parse(uri: &'a str) -> Result<Self, RdfError> {
        let scheme_end = uri
            .find(':')
            .ok_or_else(|| RdfError::InvalidIri(format!("base IRI has no scheme: {}", uri)))?;
        let scheme = &uri[..scheme_end];
        let rest = &uri[scheme_end + 1..];

        let (authority, path_and_rest) = if let Some(stripped) = rest.strip_prefix("//") {
            let end = stripped.find('/').unwrap_or(stripped.len());
            (Some(&stripped[..end]), &stripped[end..])
        } else {
            (None, rest)
        };

        let (path, query) = split_query_fragment(path_and_rest);
        let query = if query.starts_with('?') {
            Some(query.trim_start_matches('?').to_string())
        } else {
            None
        };

        Ok(UriParts {
            scheme,
            authority,
            path: path.to_string(),
            query,
        })
    }

    fn scheme_authority(&self) -> String {
        match self.authority {
            Some(a) => format!("{}://{}", self.scheme, a),
            None => format!("{}:", self.scheme),
        }
    }

    fn query_suffix(&self) -> String {
        match &self.query {
            Some(q) => format!("?{}", q),
            None => String::new(),
        }
    }
}

fn merge_paths(base: &UriParts<'_>, reference: &str) -> String {
    if base.authority.is_some() && base.path.is_empty() {
        format!("/{}", reference)
    } else {
        match base.path.rfind('/') {
            Some(pos) => format!("{}{}", &base.path[..=pos], reference),
            None => reference.to_string(),
        }
    }
}

/// RFC 3986 §5.2.4 dot-segment removal.
fn remove_dot_segments(path: &str) -> String {
    fn pop_last_segment(output: &mut String) {
        match output.rfind('/') {
            Some(pos) => output.truncate(pos),
            None => output.clear(),
        }
    }

    let mut input = path.to_string();
    let mut output = String::new();

    while !input.is_empty() {
        if let Some(rest) = input.strip_prefix("../") {
            input = rest.to_string();
        } else if let Some(rest) = input.strip_prefix("./") {
            input = rest.to_string();
        } else if let Some(rest) = input.strip_prefix("/./") {
            input = format!("/{}", rest);
        } else if input == "/." {
            input = "/".to_string();
        } else if let Some(rest) = input.strip_prefix("/../") {
            pop_last_segment(&mut output);
            input = format!("/{}", rest);
        } else if input == "/.." {
            pop_last_segment(&mut output);
            input = "/".to_string();
        } else if input == "." || input == ".." {
            input = String::new();
        } else {
            let start = usize::from(input.starts_with('/'));
            let next_slash = input[start..].find('/').map(|p| p + start);
            match next_slash {
                Some(p) => {
                    output.push_str(&input[..p]);
                    input = input[p..].to_string();
                }
                None => {
                    output.push_str(&input);
                    input = String::new();
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_local_name_split() {
        let iri = Iri::from_absolute("http://example.org/ns#localName");
        assert_eq!(iri.namespace, "http://example.org/ns#");
        assert_eq!(iri.local_name, "localName");
    }

    #[test]
    fn no_separator_keeps_whole_value_as_local_name() {
        let iri = Iri::from_absolute("mailto:foo");
        assert_eq!(iri.namespace, "");
        assert_eq!(iri.local_name, "mailto:foo");
    }

    #[test]
    fn rfc3986_normal_examples() {
        let base = "http://a/b/c/d;p?q";
        let cases: &[(&str, &str)] = &[
            ("g:h", "g:h"),
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("?y", "http://a/b/c/d;p?y"),
            ("g?y", "http://a/b/c/g?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("g#s", "http://a/b/c/g#s"),
            ("", "http://a/b/c/d;p?q"),
        ];
        for (r, expected) in cases {
            assert_eq!(resolve_relative(r, base).unwrap(), *expected, "resolving {r}");
        }
    }

    #[test]
    fn rfc3986_abnormal_dot_segments() {
        let base = "http://a/b/c/d;p?q";
        assert_eq!(resolve_relative("../g", base).unwrap(), "http://a/b/g");
        assert_eq!(resolve_relative("../../g", base).unwrap(), "http://a/g");
    }
}


