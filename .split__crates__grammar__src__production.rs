//! The tagged production enum the grammar engine interprets.

use std::rc::Rc;

use crate::bindings::Bindings;

/// Index of a production within a `Grammar`'s production vector. Using an
/// index rather than a boxed/`Rc` child lets productions reference each
/// other cyclically (for recursive grammar rules) without reference
/// cycles or lifetimes.
pub type ProdRef = usize;

/// A deferred semantic action: applied to the producer, with the final
/// bindings map, after the whole parse succeeds.
pub type Action<P> = Rc<dyn Fn(&mut P, &Bindings)>;

/// One node of the production graph.
pub enum Production<P> {
    // --- Terminals ---
    /// A literal string, optionally case-sensitive.
    Literal(String, bool),
    /// A single literal character.
    CharLiteral(char),
    /// One character in any of the given inclusive `(lo, hi)` ranges.
    InRange(Vec<(char, char)>),
    /// Like `InRange` but with single-character string bounds (surrogate-
    /// aware boundary representation retained from the source grammar;
    /// Rust's `char` already spans the full Unicode scalar range).
    InRangeU(String, String),
    /// A character not in the given set.
    NotIn(Vec<char>),
    /// Intentionally always fails to match ("no characters"). The source
    /// grammar's `NotInRange` terminal tests `c >= lo || c <= hi`, which is
    /// always true for any non-empty range — i.e. it never excludes
    /// anything the way its name suggests. Per spec, this is implemented
    /// as its logical opposite reading ("matches no characters") rather
    /// than silently corrected into a conventional negated range.
    NotInRange(char, char),
    /// One of a set of single characters or short strings.
    In(Vec<String>),

    // --- Conditions ---
    /// All productions in order; fails and rewinds as one unit if any fails.
    All(Vec<ProdRef>),
    /// The first alternative that matches, in order, with backtracking.
    AnyOf(Vec<ProdRef>),
    /// Zero or one occurrence; never fails.
    Optional(ProdRef),
    /// Zero or more occurrences, guarded against zero-width infinite loops.
    ZeroOrMore(ProdRef),
    /// One or more occurrences, guarded against zero-width infinite loops.
    OneOrMore(ProdRef),
    /// A token: all productions in order, with whitespace-skipping
    /// disabled for the duration (the "token" form).
    Sequence(Vec<ProdRef>),
    /// Runs `p`, emitting a trace-level log line with `label`, the
    /// position, and whether it matched. Debug-only aid.
    Trace(String, ProdRef),

    // --- Structural ---
    /// Captures the substring consumed while `p` is active, storing it in
    /// the bindings map at the dotted path `parent.name`.
    Named(String, ProdRef),
    /// A lazy forward reference to another production, resolved once the
    /// whole production graph is constructed.
    Reference(ProdRef),
    /// Discards all pending choice points: once passed, earlier
    /// alternatives are irrevocably committed.
    Cut,
    /// Defers a semantic action, to be run after the whole parse succeeds.
    Call(Action<P>),
    /// Eagerly sets a captured binding before running `p`.
    SetName(String, String, ProdRef),
}


