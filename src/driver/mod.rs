//! The parse driver (C3): a trampolined, packrat-memoized evaluator.
//!
//! Grounded on the teacher's `engine::vm::VM` (`FrameArena` + `CheckpointStack`, a single
//! `execute_with` dispatch loop fetching/decoding one instruction per iteration) and
//! `engine::checkpoint::CheckpointStack` (O(1) push/pop backtracking), but evaluates this
//! crate's tree-shaped `Expression` algebra directly rather than a flattened bytecode stream.
//!
//! Every [`Expr`] node is evaluated by pushing a [`Frame`] onto an explicit heap-allocated
//! `Vec<Frame>` (§3.4, §4.4) — never by host recursion — so a grammar with deeply nested
//! combinators over a long input cannot exhaust the Rust call stack. Memoization (§3.4, §4.6)
//! applies only at [`Frame::RuleCall`]: composite combinators are resumable but not memoized,
//! since their result depends on which alternative reached them, not purely on `(node, pos)`.

mod climb;
mod frame;

use std::collections::HashMap;

use crate::algebra::RuleId;
use crate::error::{InternalError, ParseError};
use crate::program::Program;
use crate::token::skip_ignored_at;
use crate::value::Value;

use frame::Frame;

/// Resource ceilings applied by the driver (C10), grounded on the teacher's `FuelLimits`
/// (`engine::vm::FuelLimits`, default `exec_fuel = 1_000_000`, `recursion_limit = 1024`).
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_steps: usize,
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            max_depth: 4096,
        }
    }
}

/// The outcome of evaluating one `Expr` subtree: a successful value at a new position, or a
/// failure at the farthest position reached, carrying whether it crossed a `Checkpoint` boundary
/// (§4.2 "Commit / Checkpoint") and so must bubble past any enclosing `Choice`/`Opt`/`List`.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success { value: Value, pos: usize },
    Failure {
        pos: usize,
        message: String,
        committed: bool,
    },
}

impl Outcome {
    pub(crate) fn fail(pos: usize, message: impl Into<String>) -> Self {
        Outcome::Failure {
            pos,
            message: message.into(),
            committed: false,
        }
    }

    pub(crate) fn fail_committed(pos: usize, message: impl Into<String>) -> Self {
        Outcome::Failure {
            pos,
            message: message.into(),
            committed: true,
        }
    }
}

/// Result of resuming one frame for a single driver step.
pub(crate) enum Step<'p> {
    Push(Frame<'p>),
    Done(Outcome),
}

pub struct Driver<'p> {
    program: &'p Program,
    text: &'p str,
    memo: HashMap<(RuleId, usize), Outcome>,
    stack: Vec<Frame<'p>>,
    /// Runtime environment for `let`-bound names, pushed/popped by `LetExpr` frames. A `Ref` to
    /// a local name is compiled to a de Bruijn depth (§4.6 step 7) indexing from the top.
    env: Vec<Value>,
    steps: usize,
    limits: Limits,
}

/// Runs `program`'s rule `rule_id` against `text` starting at `pos`, returning the parsed value
/// and the position just past it, or the farthest `ParseError`.
pub fn run(
    program: &Program,
    text: &str,
    rule_id: RuleId,
    pos: usize,
    limits: Limits,
) -> Result<(Value, usize), ParseError> {
    let mut driver = Driver {
        program,
        text,
        memo: HashMap::new(),
        stack: Vec::new(),
        env: Vec::new(),
        steps: 0,
        limits,
    };
    // §4.6 step 5: `start` is implicitly prefixed with a skip of any leading ignored matter.
    let start_pos = if program.has_ignored() {
        skip_ignored_at(text, pos, &program.ignored_literals, &program.ignored_regexes)
    } else {
        pos
    };
    driver.run_from(rule_id, start_pos)
}

impl<'p> Driver<'p> {
    fn run_from(&mut self, rule_id: RuleId, pos: usize) -> Result<(Value, usize), ParseError> {
        self.stack.push(Frame::rule_call(rule_id, pos));
        let mut last: Option<Outcome> = None;

        loop {
            let Some(mut top) = self.stack.pop() else {
                break;
            };
            self.steps += 1;
            if self.steps > self.limits.max_steps {
                return Err(ParseError::from_internal(InternalError::FuelExhausted {
                    limit: self.limits.max_steps,
                }));
            }

            match frame::resume(&mut top, last.take(), self) {
                Step::Push(child) => {
                    if self.stack.len() + 2 >= self.limits.max_depth {
                        return Err(ParseError::from_internal(InternalError::RecursionLimitExceeded {
                            limit: self.limits.max_depth,
                        }));
                    }
                    self.stack.push(top);
                    self.stack.push(child);
                }
                Step::Done(outcome) => {
                    last = Some(outcome);
                }
            }
        }

        match last.expect("driver stack emptied with no result") {
            Outcome::Success { value, pos } => Ok((value, pos)),
            Outcome::Failure { pos, message, .. } => Err(ParseError::new(message, pos)),
        }
    }

    pub(crate) fn text(&self) -> &'p str {
        self.text
    }

    pub(crate) fn program(&self) -> &'p Program {
        self.program
    }

    pub(crate) fn memo_get(&self, rule_id: RuleId, pos: usize) -> Option<Outcome> {
        self.memo.get(&(rule_id, pos)).cloned()
    }

    pub(crate) fn memo_insert(&mut self, rule_id: RuleId, pos: usize, outcome: Outcome) {
        self.memo.insert((rule_id, pos), outcome);
    }

    pub(crate) fn env_push(&mut self, value: Value) {
        self.env.push(value);
    }

    pub(crate) fn env_pop(&mut self) {
        self.env.pop();
    }

    pub(crate) fn env_get(&self, depth: u32) -> Value {
        let idx = self.env.len() - 1 - depth as usize;
        self.env[idx].clone()
    }
}
