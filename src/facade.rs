//! Public entry points (C7): compile a grammar, then parse text against it or a named rule.
//!
//! Grounded on the teacher's top-level `Query`/`QueryCursor` split (a compiled, reusable object
//! plus a cheap per-invocation cursor) — here there's no incremental cursor state to reuse, so
//! `Grammar` itself is the reusable compiled artifact and `parse`/`parse_at` are one-shot calls.

use crate::compiler::compile_grammar;
use crate::driver::{self, Limits};
use crate::error::{GrammarError, ParseError};
use crate::program::Program;
use crate::value::Value;

/// A compiled grammar, ready to parse input text (§6.2).
#[derive(Debug, Clone)]
pub struct Grammar {
    program: Program,
    limits: Limits,
}

impl Grammar {
    /// Compiles a grammar description into a reusable [`Grammar`] (§4.6).
    pub fn compile(source: &str) -> Result<Self, GrammarError> {
        Ok(Self {
            program: compile_grammar(source)?,
            limits: Limits::default(),
        })
    }

    /// Starts a [`GrammarBuilder`] for configuring resource limits before compiling (§5, C10).
    pub fn builder(source: &str) -> GrammarBuilder<'_> {
        GrammarBuilder {
            source,
            limits: Limits::default(),
        }
    }

    /// Parses `text` from byte 0 against the grammar's `start` rule, requiring the whole input to
    /// be consumed.
    pub fn parse(&self, text: &str) -> Result<Value, ParseError> {
        let (value, end) = self.parse_at(text, 0)?;
        if end != text.len() {
            return Err(ParseError::new(
                format!("unconsumed input remains at byte {end}"),
                end,
            ));
        }
        Ok(value)
    }

    /// Parses `text` starting at byte offset `pos` against `start`, returning the value and the
    /// position just past the parsed span (partial parses are the caller's choice, not an error).
    pub fn parse_at(&self, text: &str, pos: usize) -> Result<(Value, usize), ParseError> {
        driver::run(&self.program, text, self.program.start, pos, self.limits)
    }

    /// Looks up a named rule for parsing independently of `start` (§6.2).
    pub fn rule<'g>(&'g self, name: &str) -> Option<Rule<'g>> {
        let id = self.program.rule_id_by_name(name)?;
        Some(Rule {
            program: &self.program,
            limits: self.limits,
            id,
        })
    }
}

/// Configures resource limits (§5 "Concurrency & Resource Model", C10) before compiling a
/// [`Grammar`]. Grounded on the teacher's `QueryBuilder`-style fluent config.
pub struct GrammarBuilder<'s> {
    source: &'s str,
    limits: Limits,
}

impl<'s> GrammarBuilder<'s> {
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.limits.max_steps = max_steps;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.limits.max_depth = max_depth;
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        Ok(Grammar {
            program: compile_grammar(self.source)?,
            limits: self.limits,
        })
    }
}

/// A single rule within a compiled [`Grammar`], parseable on its own (§6.2).
#[derive(Clone, Copy)]
pub struct Rule<'g> {
    program: &'g Program,
    limits: Limits,
    id: crate::algebra::RuleId,
}

impl<'g> Rule<'g> {
    pub fn parse(&self, text: &str) -> Result<Value, ParseError> {
        let (value, end) = self.parse_at(text, 0)?;
        if end != text.len() {
            return Err(ParseError::new(
                format!("unconsumed input remains at byte {end}"),
                end,
            ));
        }
        Ok(value)
    }

    pub fn parse_at(&self, text: &str, pos: usize) -> Result<(Value, usize), ParseError> {
        driver::run(self.program, text, self.id, pos, self.limits)
    }
}
