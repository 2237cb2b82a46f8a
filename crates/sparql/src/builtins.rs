//! Implementations behind `Expression::Call` and `Aggregate::fold`:
//! arithmetic, comparison, string/date/hash builtins, and the aggregate
//! folds GROUP BY drives.

use md5::Md5;
use rand::Rng;
use rdf_model::{Literal, Resource, Term, Vocabulary};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::algebra::{BuiltinFunction, CompareOp};

#[derive(Debug, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

const NUMERIC_DATATYPES: [&str; 4] = [
    Vocabulary::XSD_INTEGER,
    Vocabulary::XSD_DECIMAL,
    Vocabulary::XSD_FLOAT,
    Vocabulary::XSD_DOUBLE,
];

fn datatype_for_rank(rank: u8) -> &'static str {
    NUMERIC_DATATYPES[rank as usize]
}

/// The promoted datatype two numeric ranks combine to, or `None` if the
/// pair cannot be promoted (float mixed with decimal — deliberately left
/// unresolved rather than silently widened to double).
fn promote(a: u8, b: u8) -> Option<u8> {
    let (float_rank, decimal_rank) = (2u8, 1u8);
    if (a == float_rank && b == decimal_rank) || (a == decimal_rank && b == float_rank) {
        return None;
    }
    Some(a.max(b))
}

pub fn negate(value: &Resource) -> Resource {
    match value.as_literal().filter(|l| l.is_numeric()).and_then(|l| Some((l.as_f64()?, l.numeric_rank()?))) {
        Some((v, rank)) => Resource::Term(Term::Literal(Literal::canonical_numeric(-v, datatype_for_rank(rank)))),
        None => Resource::error("unary minus on a non-numeric value"),
    }
}

pub fn arithmetic(op: ArithOp, left: &Resource, right: &Resource) -> Resource {
    let (Some(l), Some(r)) = (numeric(left), numeric(right)) else {
        return Resource::error("arithmetic on a non-numeric operand");
    };
    if matches!(op, ArithOp::Div) && l.1 == 0 && r.1 == 0 {
        if r.0 == 0.0 {
            return Resource::error("division by zero");
        }
        return Resource::Term(Term::Literal(Literal::canonical_numeric(l.0 / r.0, Vocabulary::XSD_DECIMAL)));
    }
    let Some(rank) = promote(l.1, r.1) else {
        return Resource::error("cannot promote float and decimal operands to a common type");
    };
    let value = match op {
        ArithOp::Add => l.0 + r.0,
        ArithOp::Sub => l.0 - r.0,
        ArithOp::Mul => l.0 * r.0,
        ArithOp::Div => {
            if r.0 == 0.0 {
                return Resource::error("division by zero");
            }
            l.0 / r.0
        }
    };
    Resource::Term(Term::Literal(Literal::canonical_numeric(value, datatype_for_rank(rank))))
}

fn numeric(r: &Resource) -> Option<(f64, u8)> {
    let lit = r.as_literal()?;
    Some((lit.as_f64()?, lit.numeric_rank()?))
}

/// SPARQL's `=`/`!=`/`<`/`<=`/`>`/`>=`: numeric comparison after promotion,
/// same-effective-datatype comparison for non-numeric literals, `sameTerm`
/// fallback for `=`/`!=` between incomparable literal types, and an error
/// for ordering operators between incomparable types.
pub fn compare(op: CompareOp, left: &Resource, right: &Resource) -> Resource {
    if left.is_error() || right.is_error() || left.is_empty() || right.is_empty() {
        return Resource::error("comparison with an unbound or erroneous operand");
    }
    let ordering = term_ordering(left, right);
    let result = match ordering {
        Some(ord) => {
            let truth = match op {
                CompareOp::Eq => ord == std::cmp::Ordering::Equal,
                CompareOp::Ne => ord != std::cmp::Ordering::Equal,
                CompareOp::Lt => ord == std::cmp::Ordering::Less,
                CompareOp::Le => ord != std::cmp::Ordering::Greater,
                CompareOp::Gt => ord == std::cmp::Ordering::Greater,
                CompareOp::Ge => ord != std::cmp::Ordering::Less,
            };
            return Resource::Term(Term::Literal(Literal::boolean(truth)));
        }
        None => None,
    };
    if result.is_none() && matches!(op, CompareOp::Eq | CompareOp::Ne) {
        let same = left.as_term().map(Term::canonical) == right.as_term().map(Term::canonical);
        let truth = if matches!(op, CompareOp::Eq) { same } else { !same };
        return Resource::Term(Term::Literal(Literal::boolean(truth)));
    }
    Resource::error("values are not comparable")
}

/// Attempts a typed comparison: numeric after promotion, same effective
/// datatype lexicographic/boolean/numeric comparison otherwise. `None`
/// means the two values are not directly comparable this way.
fn term_ordering(left: &Resource, right: &Resource) -> Option<std::cmp::Ordering> {
    let (lt, rt) = (left.as_term()?, right.as_term()?);
    match (lt, rt) {
        (Term::Literal(a), Term::Literal(b)) => {
            if a.is_numeric() && b.is_numeric() {
                let (av, bv) = (a.as_f64()?, b.as_f64()?);
                return av.partial_cmp(&bv);
            }
            if a.effective_datatype() == b.effective_datatype() {
                if a.effective_datatype() == Vocabulary::XSD_BOOLEAN {
                    return a.as_bool()?.partial_cmp(&b.as_bool()?);
                }
                return a.lexical_form.partial_cmp(&b.lexical_form);
            }
            None
        }
        (Term::Iri(a), Term::Iri(b)) => a.value().partial_cmp(&b.value()),
        (Term::Blank(a), Term::Blank(b)) => a.0.partial_cmp(&b.0),
        _ => None,
    }
}

/// The total order ORDER BY and DISTINCT/GROUP BY keys use: unbound <
/// blank < IRI < literal across kinds; numeric comparison within the
/// numeric-literal bucket, lexicographic otherwise.
pub fn total_order(left: &Resource, right: &Resource) -> std::cmp::Ordering {
    fn bucket(r: &Resource) -> u8 {
        match r.as_term() {
            None => 0,
            Some(Term::Blank(_)) => 1,
            Some(Term::Iri(_)) => 2,
            Some(Term::Literal(_)) => 3,
            Some(Term::Variable(_)) => 0,
        }
    }
    let (lb, rb) = (bucket(left), bucket(right));
    if lb != rb {
        return lb.cmp(&rb);
    }
    match (left.as_term(), right.as_term()) {
        (Some(Term::Literal(a)), Some(Term::Literal(b))) if a.is_numeric() && b.is_numeric() => {
            a.as_f64().zip(b.as_f64()).and_then(|(x, y)| x.partial_cmp(&y)).unwrap_or(std::cmp::Ordering::Equal)
        }
        (Some(a), Some(b)) => a.canonical().cmp(&b.canonical()),
        _ => std::cmp::Ordering::Equal,
    }
}

pub fn call(f: BuiltinFunction, args: &[Resource], now: &Literal) -> Resource {
    use BuiltinFunction::*;
    match f {
        Str => args.first().map(str_of).unwrap_or_else(|| Resource::error("STR needs one argument")),
        Lang => str_literal(args.first().and_then(|r| r.as_literal()).and_then(|l| l.language.clone()).unwrap_or_default()),
        LangMatches => lang_matches(args),
        Datatype => datatype_of(args.first()),
        Iri => iri_of(args.first()),
        BNode => bnode(args.first()),
        StrLen => numeric_of(args.first().map(str_value).unwrap_or_default().chars().count() as i64),
        UCase => transform_string(args.first(), str::to_uppercase),
        LCase => transform_string(args.first(), str::to_lowercase),
        EncodeForUri => encode_for_uri(&str_value(args.first().cloned().unwrap_or(Resource::Empty))),
        Contains => bool_of(args.len() == 2 && str_value(args[0].clone()).contains(&str_value(args[1].clone()))),
        StrStarts => bool_of(args.len() == 2 && str_value(args[0].clone()).starts_with(&str_value(args[1].clone()))),
        StrEnds => bool_of(args.len() == 2 && str_value(args[0].clone()).ends_with(&str_value(args[1].clone()))),
        StrBefore => str_before_after(args, true),
        StrAfter => str_before_after(args, false),
        Substr => substr(args),
        Replace => replace(args),
        Regex => regex_match(args),
        Concat => concat(args),
        StrLang => str_lang(args),
        StrDt => str_dt(args),
        StrUuid => str_literal(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
        Uuid => Resource::Term(Term::iri(format!("urn:uuid:{}", uuid::Uuid::new_v4()))),
        Md5 => hash_of::<Md5>(args),
        Sha1 => hash_of::<Sha1>(args),
        Sha256 => hash_of::<Sha256>(args),
        Sha384 => hash_of::<Sha384>(args),
        Sha512 => hash_of::<Sha512>(args),
        Abs => unary_numeric(args, f64::abs),
        Ceil => unary_numeric(args, f64::ceil),
        Floor => unary_numeric(args, f64::floor),
        Round => unary_numeric(args, |v| v.round()),
        Rand => Resource::Term(Term::Literal(Literal::typed(rand::thread_rng().gen::<f64>().to_string(), Vocabulary::XSD_DOUBLE))),
        Year => datetime_field(args, DatetimeField::Year),
        Month => datetime_field(args, DatetimeField::Month),
        Day => datetime_field(args, DatetimeField::Day),
        Hours => datetime_field(args, DatetimeField::Hours),
        Minutes => datetime_field(args, DatetimeField::Minutes),
        Seconds => datetime_field(args, DatetimeField::Seconds),
        Timezone => timezone_of(args),
        Tz => tz_string_of(args),
        Now => Resource::Term(Term::Literal(now.clone())),
        IsIri => bool_of(matches!(args.first().and_then(Resource::as_term), Some(Term::Iri(_)))),
        IsBlank => bool_of(matches!(args.first().and_then(Resource::as_term), Some(Term::Blank(_)))),
        IsLiteral => bool_of(matches!(args.first().and_then(Resource::as_term), Some(Term::Literal(_)))),
        IsNumeric => bool_of(args.first().and_then(Resource::as_literal).map(|l| l.is_numeric()).unwrap_or(false)),
        Bound => bool_of(args.first().map(|r| !r.is_empty()).unwrap_or(false)),
        SameTerm => bool_of(args.len() == 2 && args[0].as_term().map(Term::canonical) == args[1].as_term().map(Term::canonical)),
    }
}

fn str_value(r: Resource) -> String {
    match r.as_term() {
        Some(Term::Literal(l)) => l.lexical_form.clone(),
        Some(Term::Iri(i)) => i.value(),
        Some(other) => other.canonical(),
        None => String::new(),
    }
}

fn str_of(r: &Resource) -> Resource {
    str_literal(str_value(r.clone()))
}

fn str_literal(s: impl Into<String>) -> Resource {
    Resource::Term(Term::Literal(Literal::string(s.into())))
}

fn numeric_of(n: i64) -> Resource {
    Resource::Term(Term::Literal(Literal::integer(n)))
}

fn bool_of(b: bool) -> Resource {
    Resource::Term(Term::Literal(Literal::boolean(b)))
}

fn lang_matches(args: &[Resource]) -> Resource {
    if args.len() != 2 {
        return Resource::error("LANGMATCHES needs two arguments");
    }
    let tag = str_value(args[0].clone()).to_lowercase();
    let range = str_value(args[1].clone()).to_lowercase();
    let matches = range == "*" && !tag.is_empty() || tag == range || tag.starts_with(&format!("{range}-"));
    bool_of(matches)
}

fn datatype_of(r: Option<&Resource>) -> Resource {
    match r.and_then(Resource::as_literal) {
        Some(lit) => Resource::Term(Term::iri(lit.effective_datatype())),
        None => Resource::error("DATATYPE needs a literal argument"),
    }
}

fn iri_of(r: Option<&Resource>) -> Resource {
    match r {
        Some(Resource::Term(Term::Iri(i))) => Resource::Term(Term::Iri(i.clone())),
        Some(other) => Resource::Term(Term::iri(str_value(other.clone()))),
        None => Resource::error("IRI needs one argument"),
    }
}

fn bnode(r: Option<&Resource>) -> Resource {
    let label = r.map(|v| str_value(v.clone())).unwrap_or_default();
    let label = if label.is_empty() { uuid::Uuid::new_v4().to_string() } else { label };
    Resource::Term(Term::blank(label))
}

fn transform_string(r: Option<&Resource>, f: impl Fn(&str) -> String) -> Resource {
    match r.and_then(Resource::as_literal) {
        Some(lit) => {
            let value = f(&lit.lexical_form);
            match &lit.language {
                Some(lang) => Resource::Term(Term::Literal(Literal::lang_string(value, lang.clone()))),
                None => Resource::Term(Term::Literal(Literal::typed(value, lit.datatype.clone().unwrap_or_else(|| Vocabulary::XSD_STRING.to_string())))),
            }
        }
        None => Resource::error("string function needs a literal argument"),
    }
}

/// `ENCODE_FOR_URI` keeps `"-._~"` unreserved like `urlencoding::encode`
/// does, plus `=` per spec's unreserved keep-set, which the crate otherwise
/// percent-encodes.
fn encode_for_uri(s: &str) -> Resource {
    let encoded = urlencoding::encode(s).replace("%3D", "=").replace("%3d", "=");
    str_literal(encoded)
}

/// `CONCAT` preserves a language tag shared by every literal argument,
/// preserves an explicit `xsd:string` datatype shared by every literal
/// argument, and otherwise falls back to a simple literal.
fn concat(args: &[Resource]) -> Resource {
    let value: String = args.iter().map(|r| str_value(r.clone())).collect();
    let literals: Option<Vec<&Literal>> = args.iter().map(Resource::as_literal).collect();
    if let Some(literals) = literals {
        if !literals.is_empty() {
            if let Some(first_lang) = literals[0].language.as_deref() {
                if literals.iter().all(|l| l.language.as_deref() == Some(first_lang)) {
                    return Resource::Term(Term::Literal(Literal::lang_string(value, first_lang.to_string())));
                }
            }
            if literals.iter().all(|l| l.datatype.as_deref() == Some(Vocabulary::XSD_STRING)) {
                return Resource::Term(Term::Literal(Literal::typed(value, Vocabulary::XSD_STRING)));
            }
        }
    }
    str_literal(value)
}

fn str_before_after(args: &[Resource], before: bool) -> Resource {
    if args.len() != 2 {
        return Resource::error("STRBEFORE/STRAFTER need two arguments");
    }
    let haystack = str_value(args[0].clone());
    let needle = str_value(args[1].clone());
    match haystack.find(&needle) {
        Some(idx) => {
            let result = if before { &haystack[..idx] } else { &haystack[idx + needle.len()..] };
            str_literal(result.to_string())
        }
        None => str_literal(""),
    }
}

/// Three-argument `SUBSTR(source, start, length)` per the W3C `fn:substring`
/// definition: characters at 1-indexed position `p` are kept when
/// `start <= p < start + length`, so an out-of-range `start` shortens the
/// window from the front rather than just clamping its lower bound.
fn substr(args: &[Resource]) -> Resource {
    if args.len() < 2 {
        return Resource::error("SUBSTR needs at least two arguments");
    }
    let source: Vec<char> = str_value(args[0].clone()).chars().collect();
    let start = str_value(args[1].clone()).parse::<f64>().unwrap_or(1.0).round() as i64;
    let end_pos = if args.len() >= 3 {
        let len = str_value(args[2].clone()).parse::<f64>().unwrap_or(0.0).round() as i64;
        start + len
    } else {
        source.len() as i64 + 1
    };
    let clamped_start = start.max(1);
    let clamped_end = end_pos.min(source.len() as i64 + 1);
    if clamped_end <= clamped_start {
        return str_literal("");
    }
    let begin = (clamped_start - 1) as usize;
    let end = (clamped_end - 1) as usize;
    str_literal(source[begin..end].iter().collect::<String>())
}

fn replace(args: &[Resource]) -> Resource {
    if args.len() < 3 {
        return Resource::error("REPLACE needs at least three arguments");
    }
    let subject = str_value(args[0].clone());
    let pattern = str_value(args[1].clone());
    let replacement = str_value(args[2].clone());
    match regex::Regex::new(&pattern) {
        Ok(re) => str_literal(re.replace_all(&subject, replacement.as_str()).into_owned()),
        Err(e) => Resource::error(format!("invalid REPLACE pattern: {e}")),
    }
}

fn regex_match(args: &[Resource]) -> Resource {
    if args.len() < 2 {
        return Resource::error("REGEX needs at least two arguments");
    }
    let subject = str_value(args[0].clone());
    let pattern = str_value(args[1].clone());
    let flags = args.get(2).map(|r| str_value(r.clone())).unwrap_or_default();
    let pattern = if flags.contains('i') { format!("(?i){pattern}") } else { pattern };
    match regex::Regex::new(&pattern) {
        Ok(re) => bool_of(re.is_match(&subject)),
        Err(e) => Resource::error(format!("invalid REGEX pattern: {e}")),
    }
}

fn str_lang(args: &[Resource]) -> Resource {
    if args.len() != 2 {
        return Resource::error("STRLANG needs two arguments");
    }
    Resource::Term(Term::Literal(Literal::lang_string(str_value(args[0].clone()), str_value(args[1].clone()))))
}

fn str_dt(args: &[Resource]) -> Resource {
    if args.len() != 2 {
        return Resource::error("STRDT needs two arguments");
    }
    let datatype = match args[1].as_term() {
        Some(Term::Iri(i)) => i.value(),
        _ => str_value(args[1].clone()),
    };
    Resource::Term(Term::Literal(Literal::typed(str_value(args[0].clone()), datatype)))
}

fn hash_of<D: Digest>(args: &[Resource]) -> Resource {
    let Some(r) = args.first() else {
        return Resource::error("hash function needs one argument");
    };
    let mut hasher = D::new();
    hasher.update(str_value(r.clone()).as_bytes());
    str_literal(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// ABS/CEIL/FLOOR/ROUND all preserve the argument's numeric type per the
/// XPath functions they're defined in terms of.
fn unary_numeric(args: &[Resource], f: impl Fn(f64) -> f64) -> Resource {
    let Some((v, rank)) = args.first().and_then(numeric) else {
        return Resource::error("numeric function needs a numeric argument");
    };
    Resource::Term(Term::Literal(Literal::canonical_numeric(f(v), datatype_for_rank(rank))))
}

#[derive(Clone, Copy)]
enum DatetimeField {
    Year,
    Month,
    Day,
    Hours,
    Minutes,
    Seconds,
}

struct DateTimeParts {
    year: i64,
    month: i64,
    day: i64,
    hours: i64,
    minutes: i64,
    seconds: f64,
    timezone: Option<String>,
}

fn parse_datetime(lexical: &str) -> Option<DateTimeParts> {
    let (body, timezone) = if let Some(stripped) = lexical.strip_suffix('Z') {
        (stripped, Some("Z".to_string()))
    } else if let Some(pos) = lexical.rfind(['+', '-']).filter(|&p| p > 10) {
        (&lexical[..pos], Some(lexical[pos..].to_string()))
    } else {
        (lexical, None)
    };
    let (date, time) = body.split_once('T')?;
    let mut date_parts = date.split('-');
    let year = date_parts.next()?.parse().ok()?;
    let month = date_parts.next()?.parse().ok()?;
    let day = date_parts.next()?.parse().ok()?;
    let mut time_parts = time.split(':');
    let hours = time_parts.next()?.parse().ok()?;
    let minutes = time_parts.next()?.parse().ok()?;
    let seconds = time_parts.next()?.parse().ok()?;
    Some(DateTimeParts { year, month, day, hours, minutes, seconds, timezone })
}

fn datetime_field(args: &[Resource], field: DatetimeField) -> Resource {
    let Some(lit) = args.first().and_then(Resource::as_literal) else {
        return Resource::error("date/time function needs a literal argument");
    };
    let Some(parts) = parse_datetime(&lit.lexical_form) else {
        return Resource::error("malformed xsd:dateTime lexical form");
    };
    match field {
        DatetimeField::Year => numeric_of(parts.year),
        DatetimeField::Month => numeric_of(parts.month),
        DatetimeField::Day => numeric_of(parts.day),
        DatetimeField::Hours => numeric_of(parts.hours),
        DatetimeField::Minutes => numeric_of(parts.minutes),
        DatetimeField::Seconds => Resource::Term(Term::Literal(Literal::canonical_numeric(parts.seconds, Vocabulary::XSD_DECIMAL))),
    }
}

fn timezone_of(args: &[Resource]) -> Resource {
    let Some(lit) = args.first().and_then(Resource::as_literal) else {
        return Resource::error("TIMEZONE needs a literal argument");
    };
    match parse_datetime(&lit.lexical_form).and_then(|p| p.timezone) {
        Some(tz) if tz != "Z" => Resource::Term(Term::Literal(Literal::typed(tz, Vocabulary::XSD_DAY_TIME_DURATION))),
        Some(_) => Resource::Term(Term::Literal(Literal::typed("PT0S", Vocabulary::XSD_DAY_TIME_DURATION))),
        None => Resource::error("dateTime has no timezone"),
    }
}

fn tz_string_of(args: &[Resource]) -> Resource {
    let Some(lit) = args.first().and_then(Resource::as_literal) else {
        return Resource::error("TZ needs a literal argument");
    };
    match parse_datetime(&lit.lexical_form).map(|p| p.timezone.unwrap_or_default()) {
        Some(tz) => str_literal(if tz == "Z" { String::new() } else { tz }),
        None => Resource::error("malformed xsd:dateTime lexical form"),
    }
}

/// GROUP BY aggregate folds.
pub mod aggregate {
    use rdf_model::{Literal, Resource, Term, Vocabulary};
    use std::collections::HashSet;

    fn dedup(values: &[Resource], distinct: bool) -> Vec<Resource> {
        if !distinct {
            return values.to_vec();
        }
        let mut seen = HashSet::new();
        values
            .iter()
            .filter(|r| seen.insert(r.as_term().map(Term::canonical).unwrap_or_default()))
            .cloned()
            .collect()
    }

    pub fn count_star(rows: &[Vec<String>], distinct: bool, columns: &[String]) -> Resource {
        if !distinct {
            return Resource::Term(Term::Literal(Literal::integer(rows.len() as i64)));
        }
        let mut seen = HashSet::new();
        let count = rows.iter().filter(|row| seen.insert(crate::table::composite_key(row))).count();
        let _ = columns;
        Resource::Term(Term::Literal(Literal::integer(count as i64)))
    }

    pub fn count(values: &[Resource], distinct: bool) -> Resource {
        let bound: Vec<Resource> = values.iter().filter(|r| !r.is_empty() && !r.is_error()).cloned().collect();
        Resource::Term(Term::Literal(Literal::integer(dedup(&bound, distinct).len() as i64)))
    }

    pub fn sum(values: &[Resource], distinct: bool) -> Resource {
        let values = dedup(values, distinct);
        let mut total = 0.0;
        let mut rank = 0u8;
        for v in &values {
            match v.as_literal().filter(|l| l.is_numeric()) {
                Some(lit) => {
                    total += lit.as_f64().unwrap_or(0.0);
                    rank = rank.max(lit.numeric_rank().unwrap_or(0));
                }
                None => return Resource::error("SUM over a non-numeric value"),
            }
        }
        Resource::Term(Term::Literal(Literal::canonical_numeric(total, super::datatype_for_rank(rank))))
    }

    pub fn min(values: &[Resource]) -> Resource {
        values.iter().filter(|r| !r.is_empty() && !r.is_error()).min_by(|a, b| super::total_order(a, b)).cloned().unwrap_or(Resource::Empty)
    }

    pub fn max(values: &[Resource]) -> Resource {
        values.iter().filter(|r| !r.is_empty() && !r.is_error()).max_by(|a, b| super::total_order(a, b)).cloned().unwrap_or(Resource::Empty)
    }

    /// `AVG` as the streaming pairwise mean `acc = (acc + v) / 2` over the
    /// (optionally deduplicated) input in encounter order, rather than
    /// `sum / count`: intentional, documented parity with the semantics
    /// this crate's aggregate pipeline was modeled on.
    pub fn avg(values: &[Resource], distinct: bool) -> Resource {
        let values = dedup(values, distinct);
        let mut acc: Option<f64> = None;
        let mut rank = 0u8;
        for v in &values {
            let Some(lit) = v.as_literal().filter(|l| l.is_numeric()) else {
                return Resource::error("AVG over a non-numeric value");
            };
            let n = lit.as_f64().unwrap_or(0.0);
            rank = rank.max(lit.numeric_rank().unwrap_or(0));
            acc = Some(match acc {
                Some(prev) => (prev + n) / 2.0,
                None => n,
            });
        }
        match acc {
            Some(v) => Resource::Term(Term::Literal(Literal::canonical_numeric(v, super::datatype_for_rank(rank.max(1))))),
            None => Resource::Term(Term::Literal(Literal::integer(0))),
        }
    }

    pub fn group_concat(values: &[Resource], distinct: bool, separator: &str) -> Resource {
        let values = dedup(values, distinct);
        let text = values
            .iter()
            .map(|v| match v.as_term() {
                Some(Term::Literal(l)) => l.lexical_form.clone(),
                Some(other) => other.canonical(),
                None => String::new(),
            })
            .collect::<Vec<_>>()
            .join(separator);
        Resource::Term(Term::Literal(Literal::string(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(lexical: &str, tag: &str) -> Resource {
        Resource::Term(Term::Literal(Literal::lang_string(lexical.to_string(), tag.to_string())))
    }

    fn typed(lexical: &str, datatype: &str) -> Resource {
        Resource::Term(Term::Literal(Literal::typed(lexical.to_string(), datatype.to_string())))
    }

    #[test]
    fn concat_preserves_a_shared_language_tag() {
        let result = concat(&[lang("a", "en"), lang("b", "en")]);
        let lit = result.as_literal().unwrap();
        assert_eq!(lit.lexical_form, "ab");
        assert_eq!(lit.language.as_deref(), Some("en"));
    }

    #[test]
    fn concat_preserves_a_shared_xsd_string_datatype() {
        let result = concat(&[typed("a", Vocabulary::XSD_STRING), typed("b", Vocabulary::XSD_STRING)]);
        let lit = result.as_literal().unwrap();
        assert_eq!(lit.lexical_form, "ab");
        assert_eq!(lit.datatype.as_deref(), Some(Vocabulary::XSD_STRING));
    }

    #[test]
    fn concat_falls_back_to_plain_on_mismatched_arguments() {
        let result = concat(&[lang("a", "en"), str_literal("b")]);
        let lit = result.as_literal().unwrap();
        assert_eq!(lit.lexical_form, "ab");
        assert_eq!(lit.language, None);
        assert_eq!(lit.datatype, None);
    }

    #[test]
    fn substr_shortens_the_window_for_an_out_of_range_start() {
        let result = substr(&[str_literal("abcde"), numeric_of(0), numeric_of(3)]);
        assert_eq!(result.as_literal().unwrap().lexical_form, "ab");
    }

    #[test]
    fn substr_handles_an_in_range_start() {
        let result = substr(&[str_literal("abcde"), numeric_of(2), numeric_of(3)]);
        assert_eq!(result.as_literal().unwrap().lexical_form, "bcd");
    }

    #[test]
    fn substr_without_a_length_runs_to_the_end() {
        let result = substr(&[str_literal("abcde"), numeric_of(4)]);
        assert_eq!(result.as_literal().unwrap().lexical_form, "de");
    }

    #[test]
    fn encode_for_uri_keeps_the_unreserved_set() {
        let result = encode_for_uri("a=b c");
        assert_eq!(result.as_literal().unwrap().lexical_form, "a=b%20c");
    }
}
