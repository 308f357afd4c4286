//! Operator-precedence climbing (§4.3 `OpPrec`).
//!
//! Levels are given tightest-to-loosest in source order; level 0's operand is the shared `atom`,
//! and level `i`'s operand (`i > 0`) is level `i-1`'s result. The climber's entry point is
//! therefore the *last* level — the most composed one — which recurses inward through
//! `operand_frame` down to the atom. Grounded on the original source's `parse_operators` family
//! (`sourcer/parsing_expressions.py`), re-expressed as an explicit resumable state machine since
//! this crate has no host recursion to fall back on (§4.4).

use crate::algebra::{Expr, Level};
use crate::value::{Infix, Postfix, Prefix, Value};

use super::frame::{make_frame, Frame};
use super::{Outcome, Step};

pub(crate) fn entry_frame<'p>(atom: &'p Expr, levels: &'p [Level], pos: usize) -> Frame<'p> {
    if levels.is_empty() {
        return make_frame(atom, pos);
    }
    level_frame(atom, levels, levels.len() - 1, pos)
}

fn operand_frame<'p>(atom: &'p Expr, levels: &'p [Level], level_idx: usize, pos: usize) -> Frame<'p> {
    if level_idx == 0 {
        make_frame(atom, pos)
    } else {
        level_frame(atom, levels, level_idx - 1, pos)
    }
}

fn level_frame<'p>(atom: &'p Expr, levels: &'p [Level], level_idx: usize, pos: usize) -> Frame<'p> {
    let op = levels[level_idx].operator();
    let frame = match &levels[level_idx] {
        Level::Postfix(_) => ClimbFrame::Postfix(PostfixFrame {
            atom,
            levels,
            level_idx,
            op,
            phase: PostfixPhase::Operand,
            staging: None,
            pos,
        }),
        Level::Prefix(_) => ClimbFrame::Prefix(PrefixFrame {
            atom,
            levels,
            level_idx,
            op,
            phase: PrefixPhase::CollectOps,
            ops: Vec::new(),
            pos,
        }),
        Level::LeftAssoc(_) => ClimbFrame::LeftAssoc(AssocFrame {
            atom,
            levels,
            level_idx,
            op,
            phase: AssocPhase::Operand,
            staging: None,
            pending_op: None,
            pos,
        }),
        Level::NonAssoc(_) => ClimbFrame::NonAssoc(AssocFrame {
            atom,
            levels,
            level_idx,
            op,
            phase: AssocPhase::Operand,
            staging: None,
            pending_op: None,
            pos,
        }),
        Level::RightAssoc(_) => ClimbFrame::RightAssoc(RightAssocFrame {
            atom,
            levels,
            level_idx,
            op,
            phase: RightPhase::FirstOperand,
            first_operand: None,
            pairs: Vec::new(),
            pos,
        }),
    };
    Frame::Climb(frame)
}

#[derive(Debug)]
pub(crate) enum ClimbFrame<'p> {
    Postfix(PostfixFrame<'p>),
    Prefix(PrefixFrame<'p>),
    LeftAssoc(AssocFrame<'p>),
    NonAssoc(AssocFrame<'p>),
    RightAssoc(RightAssocFrame<'p>),
}

#[derive(Debug, Clone, Copy)]
enum PostfixPhase {
    Operand,
    TryOp,
}

#[derive(Debug)]
pub(crate) struct PostfixFrame<'p> {
    atom: &'p Expr,
    levels: &'p [Level],
    level_idx: usize,
    op: &'p Expr,
    phase: PostfixPhase,
    staging: Option<Value>,
    pos: usize,
}

#[derive(Debug, Clone, Copy)]
enum PrefixPhase {
    CollectOps,
    Operand,
}

#[derive(Debug)]
pub(crate) struct PrefixFrame<'p> {
    atom: &'p Expr,
    levels: &'p [Level],
    level_idx: usize,
    op: &'p Expr,
    phase: PrefixPhase,
    ops: Vec<Value>,
    pos: usize,
}

#[derive(Debug, Clone, Copy)]
enum AssocPhase {
    Operand,
    TryOp,
    RhsOperand,
}

/// Shared state for `LeftAssoc` and `NonAssoc` — both parse operand, (op, operand)*, differing
/// only in whether the loop continues after the first fold.
#[derive(Debug)]
pub(crate) struct AssocFrame<'p> {
    atom: &'p Expr,
    levels: &'p [Level],
    level_idx: usize,
    op: &'p Expr,
    phase: AssocPhase,
    staging: Option<Value>,
    pending_op: Option<Value>,
    pos: usize,
}

#[derive(Debug, Clone, Copy)]
enum RightPhase {
    FirstOperand,
    TryOp,
    NextOperand,
}

#[derive(Debug)]
pub(crate) struct RightAssocFrame<'p> {
    atom: &'p Expr,
    levels: &'p [Level],
    level_idx: usize,
    op: &'p Expr,
    phase: RightPhase,
    first_operand: Option<Value>,
    pairs: Vec<(Value, Value)>,
    pos: usize,
}

pub(crate) fn resume<'p>(frame: &mut ClimbFrame<'p>, input: Option<Outcome>) -> Step<'p> {
    match frame {
        ClimbFrame::Postfix(f) => resume_postfix(f, input),
        ClimbFrame::Prefix(f) => resume_prefix(f, input),
        ClimbFrame::LeftAssoc(f) => resume_assoc(f, input, true),
        ClimbFrame::NonAssoc(f) => resume_assoc(f, input, false),
        ClimbFrame::RightAssoc(f) => resume_right_assoc(f, input),
    }
}

fn resume_postfix<'p>(f: &mut PostfixFrame<'p>, input: Option<Outcome>) -> Step<'p> {
    match (f.phase, input) {
        (_, None) => {
            f.phase = PostfixPhase::Operand;
            Step::Push(operand_frame(f.atom, f.levels, f.level_idx, f.pos))
        }
        (PostfixPhase::Operand, Some(Outcome::Success { value, pos })) => {
            f.staging = Some(value);
            f.pos = pos;
            f.phase = PostfixPhase::TryOp;
            Step::Push(make_frame(f.op, f.pos))
        }
        (PostfixPhase::Operand, Some(failure)) => Step::Done(failure),
        (PostfixPhase::TryOp, Some(Outcome::Success { value: op_value, pos })) => {
            let left = f.staging.take().expect("postfix staging missing");
            f.staging = Some(Value::Postfix(Box::new(Postfix { left, op: op_value })));
            f.pos = pos;
            Step::Push(make_frame(f.op, f.pos))
        }
        (PostfixPhase::TryOp, Some(Outcome::Failure { committed: true, pos, message })) => {
            Step::Done(Outcome::fail_committed(pos, message))
        }
        (PostfixPhase::TryOp, Some(Outcome::Failure { .. })) => Step::Done(Outcome::Success {
            value: f.staging.take().expect("postfix staging missing"),
            pos: f.pos,
        }),
    }
}

fn resume_prefix<'p>(f: &mut PrefixFrame<'p>, input: Option<Outcome>) -> Step<'p> {
    match (f.phase, input) {
        (_, None) => {
            f.phase = PrefixPhase::CollectOps;
            Step::Push(make_frame(f.op, f.pos))
        }
        (PrefixPhase::CollectOps, Some(Outcome::Success { value, pos })) => {
            f.ops.push(value);
            f.pos = pos;
            Step::Push(make_frame(f.op, f.pos))
        }
        (PrefixPhase::CollectOps, Some(Outcome::Failure { committed: true, pos, message })) => {
            Step::Done(Outcome::fail_committed(pos, message))
        }
        (PrefixPhase::CollectOps, Some(Outcome::Failure { .. })) => {
            f.phase = PrefixPhase::Operand;
            Step::Push(operand_frame(f.atom, f.levels, f.level_idx, f.pos))
        }
        (PrefixPhase::Operand, Some(Outcome::Success { value, pos })) => {
            let mut result = value;
            while let Some(op) = f.ops.pop() {
                result = Value::Prefix(Box::new(Prefix { op, right: result }));
            }
            Step::Done(Outcome::Success { value: result, pos })
        }
        (PrefixPhase::Operand, Some(failure)) => Step::Done(failure),
    }
}

fn resume_assoc<'p>(f: &mut AssocFrame<'p>, input: Option<Outcome>, repeat: bool) -> Step<'p> {
    match (f.phase, input) {
        (_, None) => {
            f.phase = AssocPhase::Operand;
            Step::Push(operand_frame(f.atom, f.levels, f.level_idx, f.pos))
        }
        (AssocPhase::Operand, Some(Outcome::Success { value, pos })) => {
            f.staging = Some(value);
            f.pos = pos;
            f.phase = AssocPhase::TryOp;
            Step::Push(make_frame(f.op, f.pos))
        }
        (AssocPhase::Operand, Some(failure)) => Step::Done(failure),
        (AssocPhase::TryOp, Some(Outcome::Success { value: op_value, pos })) => {
            f.pending_op = Some(op_value);
            f.pos = pos;
            f.phase = AssocPhase::RhsOperand;
            Step::Push(operand_frame(f.atom, f.levels, f.level_idx, f.pos))
        }
        (AssocPhase::TryOp, Some(Outcome::Failure { committed: true, pos, message })) => {
            Step::Done(Outcome::fail_committed(pos, message))
        }
        (AssocPhase::TryOp, Some(Outcome::Failure { .. })) => Step::Done(Outcome::Success {
            value: f.staging.take().expect("assoc staging missing"),
            pos: f.pos,
        }),
        (AssocPhase::RhsOperand, Some(Outcome::Success { value: rhs, pos })) => {
            let left = f.staging.take().expect("assoc staging missing");
            let op = f.pending_op.take().expect("assoc pending op missing");
            f.staging = Some(Value::Infix(Box::new(Infix { left, op, right: rhs })));
            f.pos = pos;
            if repeat {
                f.phase = AssocPhase::TryOp;
                Step::Push(make_frame(f.op, f.pos))
            } else {
                Step::Done(Outcome::Success {
                    value: f.staging.take().expect("assoc staging missing"),
                    pos: f.pos,
                })
            }
        }
        (AssocPhase::RhsOperand, Some(failure)) => Step::Done(failure),
    }
}

fn resume_right_assoc<'p>(f: &mut RightAssocFrame<'p>, input: Option<Outcome>) -> Step<'p> {
    match (f.phase, input) {
        (_, None) => {
            f.phase = RightPhase::FirstOperand;
            Step::Push(operand_frame(f.atom, f.levels, f.level_idx, f.pos))
        }
        (RightPhase::FirstOperand, Some(Outcome::Success { value, pos })) => {
            f.first_operand = Some(value);
            f.pos = pos;
            f.phase = RightPhase::TryOp;
            Step::Push(make_frame(f.op, f.pos))
        }
        (RightPhase::FirstOperand, Some(failure)) => Step::Done(failure),
        (RightPhase::TryOp, Some(Outcome::Success { value: op_value, pos })) => {
            f.pos = pos;
            f.phase = RightPhase::NextOperand;
            f.pairs.push((op_value, Value::Null));
            Step::Push(operand_frame(f.atom, f.levels, f.level_idx, f.pos))
        }
        (RightPhase::TryOp, Some(Outcome::Failure { committed: true, pos, message })) => {
            Step::Done(Outcome::fail_committed(pos, message))
        }
        (RightPhase::TryOp, Some(Outcome::Failure { .. })) => Step::Done(Outcome::Success {
            value: fold_right(f),
            pos: f.pos,
        }),
        (RightPhase::NextOperand, Some(Outcome::Success { value, pos })) => {
            f.pairs.last_mut().expect("right-assoc pair missing").1 = value;
            f.pos = pos;
            f.phase = RightPhase::TryOp;
            Step::Push(make_frame(f.op, f.pos))
        }
        (RightPhase::NextOperand, Some(failure)) => Step::Done(failure),
    }
}

/// Right-folds the collected `(op, operand)` pairs onto the first operand, from the last pair
/// outward: `a op1 b op2 c` folds as `Infix(a, op1, Infix(b, op2, c))`.
fn fold_right(f: &mut RightAssocFrame<'_>) -> Value {
    let first = f.first_operand.take().expect("right-assoc missing first operand");
    let pairs = std::mem::take(&mut f.pairs);
    let mut operands = Vec::with_capacity(pairs.len() + 1);
    let mut ops = Vec::with_capacity(pairs.len());
    operands.push(first);
    for (op, operand) in pairs {
        ops.push(op);
        operands.push(operand);
    }

    let mut result = operands.pop().expect("right-assoc must have at least one operand");
    while let Some(op) = ops.pop() {
        let left = operands.pop().expect("right-assoc operand/op count mismatch");
        result = Value::Infix(Box::new(Infix { left, op, right: result }));
    }
    result
}
