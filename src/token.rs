//! Tokenizer primitives (C2): literal and regex matching against a byte position.
//!
//! Grounded on the teacher's `parser::lexer` (span-based, zero-copy matching) but generalized:
//! the grammar compiler builds one of these per `StrLit`/`RegexLit` leaf, and the driver calls
//! `match_at` rather than relying on a pre-tokenized stream, since a packrat PEG grammar can
//! attempt a terminal at any byte position, not just at lexer-determined token boundaries.

use regex_automata::{Anchored, Input, meta::Regex};

use crate::error::GrammarError;
use crate::span::Span;

/// A compiled regular-expression matcher, anchored at the attempt position.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    pattern: String,
    regex: Regex,
}

impl RegexMatcher {
    pub fn compile(name: &str, pattern: &str, span: Span) -> Result<Self, GrammarError> {
        let regex = Regex::new(pattern).map_err(|e| GrammarError::InvalidRegex {
            name: name.to_string(),
            span,
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Anchored match starting exactly at `pos`; returns the byte length matched.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<usize> {
        let input = Input::new(text).range(pos..text.len()).anchored(Anchored::Yes);
        self.regex.find(input).map(|m| m.end() - pos)
    }
}

/// Describes what a failed terminal match was looking for, used to synthesize a human-readable
/// `ParseError` message without storing a host closure in the `Expression` tree (design note §9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    Literal(String),
    Pattern(String),
}

impl Expectation {
    pub fn message(&self) -> String {
        match self {
            Expectation::Literal(s) => format!("Expected {s:?}."),
            Expectation::Pattern(p) => format!("Expected input matching `{p}`."),
        }
    }
}

/// Matches a literal string prefix at `pos`.
pub fn match_literal(text: &str, pos: usize, literal: &str) -> Option<usize> {
    text.as_bytes()
        .get(pos..)?
        .starts_with(literal.as_bytes())
        .then_some(literal.len())
}

/// Consumes the longest prefix matched by the `_ignored` sink's leaf matchers; used by
/// `skip_ignored` leaves after a successful terminal match.
pub fn skip_ignored_at(text: &str, pos: usize, ignored_literals: &[String], ignored_regexes: &[RegexMatcher]) -> usize {
    let mut cur = pos;
    loop {
        let mut advanced = 0;
        for lit in ignored_literals {
            if let Some(n) = match_literal(text, cur, lit) {
                advanced = advanced.max(n);
            }
        }
        for re in ignored_regexes {
            if let Some(n) = re.match_at(text, cur) {
                advanced = advanced.max(n);
            }
        }
        if advanced == 0 {
            return cur;
        }
        cur += advanced;
    }
}
