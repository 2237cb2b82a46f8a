//! The production graph and its recursive-descent interpreter.
//!
//! The source engine models parsing as an explicit goal stack plus an
//! explicit choice-point stack that `Cut` truncates directly. Here the
//! native Rust call stack plays the role of the goal stack: `exec`
//! recurses into child productions and each `AnyOf` alternative is tried
//! via an ordinary loop, saving and restoring a `Ctx` snapshot around the
//! attempt. `Cut`'s "discard all pending choice points" is reproduced with
//! a monotonic `cut_generation` counter: `Cut` bumps it, and every `AnyOf`
//! records the generation on entry and refuses to try its next
//! alternative if the generation changed underneath it. This preserves
//! every observable backtracking behavior of the explicit-stack design
//! without needing to reify the stack itself.

use std::collections::HashMap;

use crate::bindings::Bindings;
use crate::error::GrammarError;
use crate::production::{Action, ProdRef, Production};

/// A graph of productions, addressed by `ProdRef` index.
pub struct Grammar<P> {
    productions: Vec<Production<P>>,
}

impl<P> Grammar<P> {
    pub fn new() -> Self {
        Grammar { productions: Vec::new() }
    }

    /// Adds a production, returning its `ProdRef`.
    pub fn add(&mut self, production: Production<P>) -> ProdRef {
        self.productions.push(production);
        self.productions.len() - 1
    }

    /// Reserves a slot for a production that will be defined later,
    /// returning a `ProdRef` that can be embedded in other productions
    /// before the real definition is known (needed for recursive rules).
    /// Must be followed by exactly one `fill` call with the same ref.
    pub fn reserve(&mut self) -> ProdRef {
        self.productions.push(Production::All(Vec::new()));
        self.productions.len() - 1
    }

    /// Fills in a slot created by `reserve`.
    pub fn fill(&mut self, slot: ProdRef, production: Production<P>) {
        self.productions[slot] = production;
    }

    /// Runs `start` against the full input, requiring it to consume the
    /// entire string, then replays every deferred `Call` action (in
    /// registration order) against `producer` with the final bindings.
    pub fn parse(&self, start: ProdRef, input: &str, producer: &mut P) -> Result<(), GrammarError> {
        let mut ctx = Ctx::new(input);
        let matched = self.exec(start, &mut ctx);
        if !matched {
            return Err(GrammarError::at(&ctx.residual_from(ctx.pos)));
        }
        ctx.skip_ws();
        if ctx.pos != ctx.chars.len() {
            return Err(GrammarError::at(&ctx.residual_from(ctx.pos)));
        }
        for (action, bindings) in &ctx.appliers {
            action(producer, &Bindings(bindings.clone()));
        }
        Ok(())
    }

    fn exec(&self, idx: ProdRef, ctx: &mut Ctx<P>) -> bool {
        match &self.productions[idx] {
            Production::Literal(text, case_sensitive) => {
                ctx.skip_ws_unless_in_sequence();
                match_literal(ctx, text, *case_sensitive)
            }
            Production::CharLiteral(c) => {
                ctx.skip_ws_unless_in_sequence();
                match_char(ctx, *c)
            }
            Production::InRange(ranges) => {
                ctx.skip_ws_unless_in_sequence();
                match_in_range(ctx, ranges)
            }
            Production::InRangeU(lo, hi) => {
                ctx.skip_ws_unless_in_sequence();
                match_in_range_u(ctx, lo, hi)
            }
            Production::NotIn(chars) => {
                ctx.skip_ws_unless_in_sequence();
                match_not_in(ctx, chars)
            }
            Production::NotInRange(_, _) => false,
            Production::In(options) => {
                ctx.skip_ws_unless_in_sequence();
                match_in(ctx, options)
            }

            Production::All(parts) => {
                let snapshot = ctx.snapshot();
                for &part in parts {
                    if !self.exec(part, ctx) {
                        ctx.restore(snapshot);
                        return false;
                    }
                }
                true
            }

            Production::AnyOf(alternatives) => {
                let entry_generation = ctx.cut_generation;
                for &alt in alternatives {
                    let snapshot = ctx.snapshot();
                    if self.exec(alt, ctx) {
                        return true;
                    }
                    ctx.restore(snapshot);
                    if ctx.cut_generation != entry_generation {
                        return false;
                    }
                }
                false
            }

            Production::Optional(part) => {
                let snapshot = ctx.snapshot();
                if !self.exec(*part, ctx) {
                    ctx.restore(snapshot);
                }
                true
            }

            Production::ZeroOrMore(part) => {
                loop {
                    let before = ctx.pos;
                    let snapshot = ctx.snapshot();
                    if !self.exec(*part, ctx) {
                        ctx.restore(snapshot);
                        break;
                    }
                    if ctx.pos == before {
                        break;
                    }
                }
                true
            }

            Production::OneOrMore(part) => {
                let mut count = 0;
                loop {
                    let before = ctx.pos;
                    let snapshot = ctx.snapshot();
                    if !self.exec(*part, ctx) {
                        ctx.restore(snapshot);
                        break;
                    }
                    count += 1;
                    if ctx.pos == before {
                        break;
                    }
                }
                count > 0
            }

            Production::Sequence(parts) => {
                let snapshot = ctx.snapshot();
                ctx.in_sequences += 1;
                for &part in parts {
                    if !self.exec(part, ctx) {
                        ctx.in_sequences -= 1;
                        ctx.restore(snapshot);
                        return false;
                    }
                }
                ctx.in_sequences -= 1;
                true
            }

            Production::Trace(label, part) => {
                let start_pos = ctx.pos;
                let matched = self.exec(*part, ctx);
                tracing::trace!(label = %label, start_pos, matched, pos = ctx.pos, "grammar trace");
                matched
            }

            Production::Named(name, part) => {
                let start_pos = ctx.pos;
                let snapshot = ctx.snapshot();
                if !self.exec(*part, ctx) {
                    ctx.restore(snapshot);
                    return false;
                }
                let captured: String = ctx.chars[start_pos..ctx.pos].iter().collect();
                let key = ctx.dotted(name);
                ctx.bindings.insert(key, captured);
                true
            }

            Production::Reference(target) => self.exec(*target, ctx),

            Production::Cut => {
                ctx.cut_generation += 1;
                true
            }

            Production::Call(action) => {
                // Capture the bindings visible right now, not whatever the
                // map looks like once the whole parse finishes: two Calls
                // for two different triples must not see each other's
                // captures just because they share binding names.
                ctx.appliers.push((action.clone(), ctx.bindings.clone()));
                true
            }

            Production::SetName(name, value, part) => {
                let key = ctx.dotted(name);
                ctx.bindings.insert(key, value.clone());
                self.exec(*part, ctx)
            }
        }
    }
}

impl<P> Default for Grammar<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of everything `restore` needs to undo a failed attempt.
struct Snapshot {
    pos: usize,
    bindings: HashMap<String, String>,
    appliers_len: usize,
    named_context_len: usize,
}

/// Mutable parse state threaded through `exec`.
struct Ctx<P> {
    chars: Vec<char>,
    pos: usize,
    bindings: HashMap<String, String>,
    named_context: String,
    appliers: Vec<(Action<P>, HashMap<String, String>)>,
    in_sequences: u32,
    cut_generation: u64,
}

impl<P> Ctx<P> {
    fn new(input: &str) -> Self {
        Ctx {
            chars: input.chars().collect(),
            pos: 0,
            bindings: HashMap::new(),
            named_context: String::new(),
            appliers: Vec::new(),
            in_sequences: 0,
            cut_generation: 0,
        }
    }

    fn dotted(&self, name: &str) -> String {
        if self.named_context.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.named_context, name)
        }
    }

    fn residual_from(&self, pos: usize) -> String {
        self.chars[pos.min(self.chars.len())..].iter().collect()
    }

    fn skip_ws(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn skip_ws_unless_in_sequence(&mut self) {
        if self.in_sequences == 0 {
            self.skip_ws();
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            bindings: self.bindings.clone(),
            appliers_len: self.appliers.len(),
            named_context_len: self.named_context.len(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
        self.bindings = snapshot.bindings;
        self.appliers.truncate(snapshot.appliers_len);
        self.named_context.truncate(snapshot.named_context_len);
    }
}

fn match_literal<P>(ctx: &mut Ctx<P>, text: &str, case_sensitive: bool) -> bool {
    let target: Vec<char> = text.chars().collect();
    if ctx.pos + target.len() > ctx.chars.len() {
        return false;
    }
    let slice = &ctx.chars[ctx.pos..ctx.pos + target.len()];
    let matches = if case_sensitive {
        slice.iter().eq(target.iter())
    } else {
        slice
            .iter()
            .zip(target.iter())
            .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
    };
    if matches {
        ctx.pos += target.len();
    }
    matches
}

fn match_char<P>(ctx: &mut Ctx<P>, c: char) -> bool {
    if ctx.pos < ctx.chars.len() && ctx.chars[ctx.pos] == c {
        ctx.pos += 1;
        true
    } else {
        false
    }
}

fn match_in_range<P>(ctx: &mut Ctx<P>, ranges: &[(char, char)]) -> bool {
    if ctx.pos >= ctx.chars.len() {
        return false;
    }
    let c = ctx.chars[ctx.pos];
    if ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi) {
        ctx.pos += 1;
        true
    } else {
        false
    }
}

fn match_in_range_u<P>(ctx: &mut Ctx<P>, lo: &str, hi: &str) -> bool {
    let lo_c = lo.chars().next();
    let hi_c = hi.chars().next();
    match (lo_c, hi_c) {
        (Some(lo_c), Some(hi_c)) => match_in_range(ctx, &[(lo_c, hi_c)]),
        _ => false,
    }
}

fn match_not_in<P>(ctx: &mut Ctx<P>, excluded: &[char]) -> bool {
    if ctx.pos >= ctx.chars.len() {
        return false;
    }
    let c = ctx.chars[ctx.pos];
    if excluded.contains(&c) {
        false
    } else {
        ctx.pos += 1;
        true
    }
}

fn match_in<P>(ctx: &mut Ctx<P>, options: &[String]) -> bool {
    for option in options {
        let target: Vec<char> = option.chars().collect();
        if ctx.pos + target.len() <= ctx.chars.len() && ctx.chars[ctx.pos..ctx.pos + target.len()] == target[..] {
            ctx.pos += target.len();
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopProducer;

    fn lit(g: &mut Grammar<NoopProducer>, text: &str) -> ProdRef {
        g.add(Production::Literal(text.to_string(), true))
    }

    #[test]
    fn any_of_backtracks_to_second_alternative() {
        let mut g: Grammar<NoopProducer> = Grammar::new();
        let a = lit(&mut g, "foo");
        let b = lit(&mut g, "bar");
        let start = g.add(Production::AnyOf(vec![a, b]));
        let mut producer = NoopProducer;
        assert!(g.parse(start, "bar", &mut producer).is_ok());
    }

    #[test]
    fn cut_commits_to_first_alternative_branch() {
        let mut g: Grammar<NoopProducer> = Grammar::new();
        // (foo Cut "x") | (foo "y")  parsing "fooy" must fail, not fall
        // through to the second alternative, because Cut commits after
        // matching "foo".
        let foo1 = lit(&mut g, "foo");
        let cut = g.add(Production::Cut);
        let x = lit(&mut g, "x");
        let branch1 = g.add(Production::All(vec![foo1, cut, x]));
        let foo2 = lit(&mut g, "foo");
        let y = lit(&mut g, "y");
        let branch2 = g.add(Production::All(vec![foo2, y]));
        let start = g.add(Production::AnyOf(vec![branch1, branch2]));
        let mut producer = NoopProducer;
        assert!(g.parse(start, "fooy", &mut producer).is_err());
    }

    #[test]
    fn named_captures_consumed_substring() {
        let mut g: Grammar<NoopProducer> = Grammar::new();
        let digits = g.add(Production::InRange(vec![('0', '9')]));
        let one_or_more = g.add(Production::OneOrMore(digits));
        let named = g.add(Production::Named("value".to_string(), one_or_more));
        let captured = std::rc::Rc::new(std::cell::RefCell::new(String::new()));
        let captured_clone = captured.clone();
        let call = g.add(Production::Call(std::rc::Rc::new(move |_: &mut NoopProducer, b: &Bindings| {
            if let Some(v) = b.get("value") {
                *captured_clone.borrow_mut() = v.to_string();
            }
        })));
        let start = g.add(Production::All(vec![named, call]));
        let mut producer = NoopProducer;
        g.parse(start, "4217", &mut producer).unwrap();
        assert_eq!(&*captured.borrow(), "4217");
    }

    #[test]
    fn zero_or_more_does_not_loop_forever_on_zero_width_match() {
        let mut g: Grammar<NoopProducer> = Grammar::new();
        let a = lit(&mut g, "a");
        let maybe_a = g.add(Production::Optional(a));
        let star = g.add(Production::ZeroOrMore(maybe_a));
        let mut producer = NoopProducer;
        // "bbb" never matches "a", so the inner Optional always succeeds
        // with zero width; ZeroOrMore must still terminate.
        let result = g.parse(star, "", &mut producer);
        assert!(result.is_ok());
    }

    #[test]
    fn failure_message_is_truncated_to_42_chars() {
        let mut g: Grammar<NoopProducer> = Grammar::new();
        let start = lit(&mut g, "x");
        let mut producer = NoopProducer;
        let long_input = "y".repeat(100);
        let err = g.parse(start, &long_input, &mut producer).unwrap_err();
        let quoted_len = err.message.len();
        assert!(quoted_len < 100);
    }

    #[test]
    fn deferred_calls_replay_in_registration_order() {
        let mut g: Grammar<NoopProducer> = Grammar::new();
        let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let order1 = order.clone();
        let call1 = g.add(Production::Call(std::rc::Rc::new(move |_: &mut NoopProducer, _: &Bindings| {
            order1.borrow_mut().push(1);
        })));
        let order2 = order.clone();
        let call2 = g.add(Production::Call(std::rc::Rc::new(move |_: &mut NoopProducer, _: &Bindings| {
            order2.borrow_mut().push(2);
        })));
        let start = g.add(Production::All(vec![call1, call2]));
        let mut producer = NoopProducer;
        g.parse(start, "", &mut producer).unwrap();
        assert_eq!(&*order.borrow(), &[1, 2]);
    }

    #[test]
    fn sequence_disables_whitespace_skipping() {
        let mut g: Grammar<NoopProducer> = Grammar::new();
        let a = lit(&mut g, "a");
        let b = lit(&mut g, "b");
        let seq = g.add(Production::Sequence(vec![a, b]));
        let mut producer = NoopProducer;
        assert!(g.parse(seq, "ab", &mut producer).is_ok());
        assert!(g.parse(seq, "a b", &mut producer).is_err());
    }

    #[test]
    fn not_in_range_always_fails() {
        let mut g: Grammar<NoopProducer> = Grammar::new();
        let start = g.add(Production::NotInRange('a', 'z'));
        let mut producer = NoopProducer;
        assert!(g.parse(start, "m", &mut producer).is_err());
    }
}


