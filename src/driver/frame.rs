//! Resumable evaluation state for every `Expr` variant.
//!
//! One `Frame` variant per `ExprKind` variant (plus `Climb`, which itself covers all five
//! `OpPrec` level kinds — see `climb.rs`). `resume` is called once per driver iteration with the
//! most recently completed child's [`Outcome`] (`None` on a frame's first activation) and either
//! asks the driver to push a child frame or reports this frame as finished.

use crate::algebra::{Builtin, Expr, ExprKind, RefTarget, RuleId};
use crate::token::{match_literal, skip_ignored_at};
use crate::value::{Node, Value};

use super::climb::{self, ClimbFrame};
use super::{Driver, Outcome, Step};

#[derive(Debug)]
pub(crate) enum Frame<'p> {
    /// A terminal that resolves on its first `resume` call: `StrLit`, `RegexLit`, `Fail`, or a
    /// local (`let`-bound) `Ref`.
    Leaf { expr: &'p Expr, pos: usize },
    RuleCall {
        rule_id: RuleId,
        pos0: usize,
    },
    Seq {
        items: &'p [Expr],
        ctor: Option<&'p crate::algebra::SeqCtor>,
        idx: usize,
        pos: usize,
        values: Vec<Value>,
    },
    Choice {
        alts: &'p [Expr],
        idx: usize,
        pos0: usize,
        farthest: Option<(usize, String)>,
    },
    List {
        inner: &'p Expr,
        allow_empty: bool,
        running_pos: usize,
        attempt_start: usize,
        values: Vec<Value>,
    },
    Alt {
        item: &'p Expr,
        sep: &'p Expr,
        allow_trailer: bool,
        allow_empty: bool,
        phase: AltPhase,
        values: Vec<Value>,
        last_good_pos: usize,
        start_pos: usize,
    },
    Opt {
        pos0: usize,
        inner: &'p Expr,
        entered: bool,
    },
    Left {
        a: &'p Expr,
        b: &'p Expr,
        pos: usize,
        phase: LeftRightPhase,
        kept: Option<Value>,
    },
    Right {
        a: &'p Expr,
        b: &'p Expr,
        pos: usize,
        phase: LeftRightPhase,
    },
    Apply {
        inner: &'p Expr,
        transform: Builtin,
        pos: usize,
        entered: bool,
    },
    Expect {
        inner: &'p Expr,
        pos0: usize,
        entered: bool,
    },
    ExpectNot {
        inner: &'p Expr,
        pos0: usize,
        entered: bool,
    },
    Skip {
        items: &'p [Expr],
        idx: usize,
        pos: usize,
        entered: bool,
    },
    Where {
        inner: &'p Expr,
        predicate: Builtin,
        pos: usize,
        entered: bool,
    },
    Let {
        bound: &'p Expr,
        body: &'p Expr,
        pos: usize,
        phase: LetPhase,
    },
    Commit {
        inner: &'p Expr,
        pos: usize,
        entered: bool,
    },
    Checkpoint {
        inner: &'p Expr,
        pos: usize,
        entered: bool,
    },
    Recover {
        primary: &'p Expr,
        alternatives: &'p [Expr],
        idx: Option<usize>,
        pos0: usize,
        farthest: Option<(usize, String)>,
    },
    Climb(ClimbFrame<'p>),
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum AltPhase {
    Item,
    Sep,
    ItemAgain,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum LeftRightPhase {
    NeedA,
    NeedB,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum LetPhase {
    NeedBound,
    NeedBody,
}

impl<'p> Frame<'p> {
    pub(crate) fn rule_call(rule_id: RuleId, pos0: usize) -> Self {
        Frame::RuleCall { rule_id, pos0 }
    }
}

/// Builds the frame that will evaluate `expr` starting at `pos` (§4.4: every node gets a frame).
pub(crate) fn make_frame<'p>(expr: &'p Expr, pos: usize) -> Frame<'p> {
    match &expr.kind {
        ExprKind::StrLit(_) | ExprKind::RegexLit(_) | ExprKind::Fail(_) | ExprKind::Ref(RefTarget::Local(_)) => {
            Frame::Leaf { expr, pos }
        }
        ExprKind::Ref(RefTarget::Rule(id)) => Frame::RuleCall { rule_id: *id, pos0: pos },
        ExprKind::Seq(s) => Frame::Seq {
            items: &s.items,
            ctor: s.ctor.as_ref(),
            idx: 0,
            pos,
            values: Vec::with_capacity(s.items.len()),
        },
        ExprKind::Choice(alts) => Frame::Choice {
            alts,
            idx: 0,
            pos0: pos,
            farthest: None,
        },
        ExprKind::List(l) => Frame::List {
            inner: &l.inner,
            allow_empty: l.allow_empty,
            running_pos: pos,
            attempt_start: pos,
            values: Vec::new(),
        },
        ExprKind::Alt(a) => Frame::Alt {
            item: &a.item,
            sep: &a.sep,
            allow_trailer: a.allow_trailer,
            allow_empty: a.allow_empty,
            phase: AltPhase::Item,
            values: Vec::new(),
            last_good_pos: pos,
            start_pos: pos,
        },
        ExprKind::Opt(inner) => Frame::Opt { pos0: pos, inner, entered: false },
        ExprKind::Left(a, b) => Frame::Left { a, b, pos, phase: LeftRightPhase::NeedA, kept: None },
        ExprKind::Right(a, b) => Frame::Right { a, b, pos, phase: LeftRightPhase::NeedA },
        ExprKind::Apply(app) => Frame::Apply {
            inner: &app.inner,
            transform: app.transform,
            pos,
            entered: false,
        },
        ExprKind::Expect(inner) => Frame::Expect { inner, pos0: pos, entered: false },
        ExprKind::ExpectNot(inner) => Frame::ExpectNot { inner, pos0: pos, entered: false },
        ExprKind::Skip(items) => Frame::Skip { items, idx: 0, pos, entered: false },
        ExprKind::Where(w) => Frame::Where {
            inner: &w.inner,
            predicate: w.predicate,
            pos,
            entered: false,
        },
        ExprKind::LetExpr(l) => Frame::Let {
            bound: &l.bound,
            body: &l.body,
            pos,
            phase: LetPhase::NeedBound,
        },
        ExprKind::Commit(inner) => Frame::Commit { inner, pos, entered: false },
        ExprKind::Checkpoint(inner) => Frame::Checkpoint { inner, pos, entered: false },
        ExprKind::Recover(r) => Frame::Recover {
            primary: &r.primary,
            alternatives: &r.alternatives,
            idx: None,
            pos0: pos,
            farthest: None,
        },
        ExprKind::OpPrec(o) => climb::entry_frame(&o.atom, &o.levels, pos),
    }
}

pub(crate) fn resume<'p>(frame: &mut Frame<'p>, input: Option<Outcome>, driver: &mut Driver<'p>) -> Step<'p> {
    match frame {
        Frame::Leaf { expr, pos } => Step::Done(eval_leaf(driver, *expr, *pos)),
        Frame::RuleCall { rule_id, pos0 } => resume_rule_call(*rule_id, *pos0, input, driver),
        Frame::Seq { items, ctor, idx, pos, values } => resume_seq(*items, *ctor, idx, pos, values, input),
        Frame::Choice { alts, idx, pos0, farthest } => resume_choice(*alts, idx, *pos0, farthest, input),
        Frame::List { inner, allow_empty, running_pos, attempt_start, values } => {
            resume_list(*inner, *allow_empty, running_pos, attempt_start, values, input)
        }
        Frame::Alt {
            item,
            sep,
            allow_trailer,
            allow_empty,
            phase,
            values,
            last_good_pos,
            start_pos,
        } => resume_alt(*item, *sep, *allow_trailer, *allow_empty, phase, values, last_good_pos, *start_pos, input),
        Frame::Opt { pos0, inner, entered } => resume_opt(*pos0, *inner, entered, input),
        Frame::Left { a, b, pos, phase, kept } => resume_left(*a, *b, pos, phase, kept, input),
        Frame::Right { a, b, pos, phase } => resume_right(*a, *b, pos, phase, input),
        Frame::Apply { inner, transform, pos, entered } => resume_apply(*inner, *transform, *pos, entered, input),
        Frame::Expect { inner, pos0, entered } => resume_expect(*inner, *pos0, entered, input),
        Frame::ExpectNot { inner, pos0, entered } => resume_expect_not(*inner, *pos0, entered, input),
        Frame::Skip { items, idx, pos, entered } => resume_skip(*items, idx, pos, entered, input),
        Frame::Where { inner, predicate, pos, entered } => resume_where(*inner, *predicate, *pos, entered, input),
        Frame::Let { bound, body, pos, phase } => resume_let(*bound, *body, *pos, phase, input, driver),
        Frame::Commit { inner, pos, entered } => resume_transparent(*inner, *pos, entered, input),
        Frame::Checkpoint { inner, pos, entered } => resume_checkpoint(*inner, *pos, entered, input),
        Frame::Recover {
            primary,
            alternatives,
            idx,
            pos0,
            farthest,
        } => resume_recover(*primary, *alternatives, idx, *pos0, farthest, input),
        Frame::Climb(c) => climb::resume(c, input),
    }
}

fn resume_rule_call<'p>(rule_id: RuleId, pos0: usize, input: Option<Outcome>, driver: &mut Driver<'p>) -> Step<'p> {
    match input {
        None => match driver.memo_get(rule_id, pos0) {
            Some(cached) => Step::Done(cached),
            None => {
                let expr = &driver.program().rule(rule_id).expr;
                Step::Push(make_frame(expr, pos0))
            }
        },
        Some(outcome) => {
            driver.memo_insert(rule_id, pos0, outcome.clone());
            Step::Done(outcome)
        }
    }
}

fn eval_leaf(driver: &Driver<'_>, expr: &Expr, pos: usize) -> Outcome {
    match &expr.kind {
        ExprKind::StrLit(lit) => match match_literal(driver.text(), pos, &lit.text) {
            Some(len) => {
                let mut end = pos + len;
                if lit.skip_ignored {
                    end = skip_ignored_at(driver.text(), end, &driver.program().ignored_literals, &driver.program().ignored_regexes);
                }
                Outcome::Success {
                    value: Value::Text(driver.text()[pos..pos + len].to_string()),
                    pos: end,
                }
            }
            None => Outcome::fail(pos, lit.expectation.message()),
        },
        ExprKind::RegexLit(re) => match re.matcher.match_at(driver.text(), pos) {
            Some(len) => {
                let mut end = pos + len;
                if re.skip_ignored {
                    end = skip_ignored_at(driver.text(), end, &driver.program().ignored_literals, &driver.program().ignored_regexes);
                }
                Outcome::Success {
                    value: Value::Text(driver.text()[pos..pos + len].to_string()),
                    pos: end,
                }
            }
            None => Outcome::fail(pos, re.expectation.message()),
        },
        ExprKind::Fail(msg) => Outcome::fail(pos, msg.clone().unwrap_or_else(|| "Parse failed.".to_string())),
        ExprKind::Ref(RefTarget::Local(depth)) => Outcome::Success {
            value: driver.env_get(*depth),
            pos,
        },
        other => unreachable!("eval_leaf called on non-leaf {other:?}"),
    }
}

fn resume_seq<'p>(
    items: &'p [Expr],
    ctor: Option<&'p crate::algebra::SeqCtor>,
    idx: &mut usize,
    pos: &mut usize,
    values: &mut Vec<Value>,
    input: Option<Outcome>,
) -> Step<'p> {
    match input {
        None => {
            if items.is_empty() {
                return Step::Done(Outcome::Success {
                    value: build_seq_value(ctor, Vec::new()),
                    pos: *pos,
                });
            }
            Step::Push(make_frame(&items[0], *pos))
        }
        Some(Outcome::Success { value, pos: new_pos }) => {
            values.push(value);
            *idx += 1;
            *pos = new_pos;
            if *idx == items.len() {
                Step::Done(Outcome::Success {
                    value: build_seq_value(ctor, std::mem::take(values)),
                    pos: *pos,
                })
            } else {
                Step::Push(make_frame(&items[*idx], *pos))
            }
        }
        Some(failure) => Step::Done(failure),
    }
}

fn build_seq_value(ctor: Option<&crate::algebra::SeqCtor>, values: Vec<Value>) -> Value {
    match ctor {
        None => Value::List(values),
        Some(c) => {
            let mut node = Node::new(c.type_name.clone());
            for (name, value) in c.field_names.iter().cloned().zip(values) {
                node.fields.insert(name, value);
            }
            Value::Node(node)
        }
    }
}

fn resume_choice<'p>(
    alts: &'p [Expr],
    idx: &mut usize,
    pos0: usize,
    farthest: &mut Option<(usize, String)>,
    input: Option<Outcome>,
) -> Step<'p> {
    match input {
        None => Step::Push(make_frame(&alts[0], pos0)),
        Some(Outcome::Success { value, pos }) => Step::Done(Outcome::Success { value, pos }),
        Some(Outcome::Failure { pos, message, committed: true }) => Step::Done(Outcome::fail_committed(pos, message)),
        Some(Outcome::Failure { pos, message, committed: false }) => {
            if farthest.as_ref().is_none_or(|(fp, _)| pos > *fp) {
                *farthest = Some((pos, message));
            }
            *idx += 1;
            if *idx == alts.len() {
                let (fpos, fmsg) = farthest.take().unwrap();
                Step::Done(Outcome::fail(fpos, fmsg))
            } else {
                Step::Push(make_frame(&alts[*idx], pos0))
            }
        }
    }
}

fn resume_list<'p>(
    inner: &'p Expr,
    allow_empty: bool,
    running_pos: &mut usize,
    attempt_start: &mut usize,
    values: &mut Vec<Value>,
    input: Option<Outcome>,
) -> Step<'p> {
    match input {
        None => {
            *attempt_start = *running_pos;
            Step::Push(make_frame(inner, *running_pos))
        }
        Some(Outcome::Success { value, pos: new_pos }) => {
            if new_pos == *attempt_start {
                values.push(value);
                return Step::Done(Outcome::Success {
                    value: Value::List(std::mem::take(values)),
                    pos: new_pos,
                });
            }
            values.push(value);
            *running_pos = new_pos;
            *attempt_start = *running_pos;
            Step::Push(make_frame(inner, *running_pos))
        }
        Some(Outcome::Failure { pos, message, committed: true }) => Step::Done(Outcome::fail_committed(pos, message)),
        Some(Outcome::Failure { pos, message, committed: false }) => {
            if values.is_empty() && !allow_empty {
                Step::Done(Outcome::fail(pos, message))
            } else {
                Step::Done(Outcome::Success {
                    value: Value::List(std::mem::take(values)),
                    pos: *running_pos,
                })
            }
        }
    }
}

fn resume_alt<'p>(
    item: &'p Expr,
    sep: &'p Expr,
    allow_trailer: bool,
    allow_empty: bool,
    phase: &mut AltPhase,
    values: &mut Vec<Value>,
    last_good_pos: &mut usize,
    start_pos: usize,
    input: Option<Outcome>,
) -> Step<'p> {
    match (*phase, input) {
        (_, None) => {
            *phase = AltPhase::Item;
            Step::Push(make_frame(item, start_pos))
        }
        (AltPhase::Item, Some(Outcome::Success { value, pos })) => {
            values.push(value);
            *last_good_pos = pos;
            *phase = AltPhase::Sep;
            Step::Push(make_frame(sep, pos))
        }
        (AltPhase::Item, Some(Outcome::Failure { pos, message, committed })) => {
            if committed {
                return Step::Done(Outcome::fail_committed(pos, message));
            }
            if values.is_empty() {
                if allow_empty {
                    Step::Done(Outcome::Success { value: Value::List(Vec::new()), pos: start_pos })
                } else {
                    Step::Done(Outcome::fail(pos, message))
                }
            } else {
                Step::Done(Outcome::Success { value: Value::List(std::mem::take(values)), pos: *last_good_pos })
            }
        }
        (AltPhase::Sep, Some(Outcome::Success { value: _, pos })) => {
            *phase = AltPhase::ItemAgain;
            Step::Push(make_frame(item, pos))
        }
        (AltPhase::Sep, Some(Outcome::Failure { committed: true, pos, message })) => {
            Step::Done(Outcome::fail_committed(pos, message))
        }
        (AltPhase::Sep, Some(Outcome::Failure { .. })) => {
            Step::Done(Outcome::Success { value: Value::List(std::mem::take(values)), pos: *last_good_pos })
        }
        (AltPhase::ItemAgain, Some(Outcome::Success { value, pos })) => {
            values.push(value);
            *last_good_pos = pos;
            *phase = AltPhase::Sep;
            Step::Push(make_frame(sep, pos))
        }
        (AltPhase::ItemAgain, Some(Outcome::Failure { pos, message, committed })) => {
            if committed {
                return Step::Done(Outcome::fail_committed(pos, message));
            }
            let _ = message;
            if allow_trailer {
                Step::Done(Outcome::Success { value: Value::List(std::mem::take(values)), pos })
            } else {
                Step::Done(Outcome::Success { value: Value::List(std::mem::take(values)), pos: *last_good_pos })
            }
        }
    }
}

fn resume_opt<'p>(pos0: usize, inner: &'p Expr, entered: &mut bool, input: Option<Outcome>) -> Step<'p> {
    if !*entered {
        *entered = true;
        return Step::Push(make_frame(inner, pos0));
    }
    match input.expect("opt frame resumed twice without a child result") {
        Outcome::Success { value, pos } => Step::Done(Outcome::Success { value, pos }),
        Outcome::Failure { pos, message, committed: true } => Step::Done(Outcome::fail_committed(pos, message)),
        Outcome::Failure { .. } => Step::Done(Outcome::Success { value: Value::Null, pos: pos0 }),
    }
}

/// `Left(a, b)` (`a << b`): parse `a`, save its value; parse `b`; keep `a`'s value.
fn resume_left<'p>(
    a: &'p Expr,
    b: &'p Expr,
    pos: &mut usize,
    phase: &mut LeftRightPhase,
    kept: &mut Option<Value>,
    input: Option<Outcome>,
) -> Step<'p> {
    match (*phase, input) {
        (_, None) => {
            *phase = LeftRightPhase::NeedA;
            Step::Push(make_frame(a, *pos))
        }
        (LeftRightPhase::NeedA, Some(Outcome::Success { value, pos: new_pos })) => {
            *pos = new_pos;
            *kept = Some(value);
            *phase = LeftRightPhase::NeedB;
            Step::Push(make_frame(b, *pos))
        }
        (LeftRightPhase::NeedA, Some(failure)) => Step::Done(failure),
        (LeftRightPhase::NeedB, Some(Outcome::Success { pos: new_pos, .. })) => {
            Step::Done(Outcome::Success { value: kept.take().unwrap_or(Value::Null), pos: new_pos })
        }
        (LeftRightPhase::NeedB, Some(failure)) => Step::Done(failure),
    }
}

/// `Right(a, b)` (`a >> b`): parse `a`, discard its value; parse `b`; keep `b`'s value.
fn resume_right<'p>(a: &'p Expr, b: &'p Expr, pos: &mut usize, phase: &mut LeftRightPhase, input: Option<Outcome>) -> Step<'p> {
    match (*phase, input) {
        (_, None) => {
            *phase = LeftRightPhase::NeedA;
            Step::Push(make_frame(a, *pos))
        }
        (LeftRightPhase::NeedA, Some(Outcome::Success { pos: new_pos, .. })) => {
            *pos = new_pos;
            *phase = LeftRightPhase::NeedB;
            Step::Push(make_frame(b, *pos))
        }
        (LeftRightPhase::NeedA, Some(failure)) => Step::Done(failure),
        (LeftRightPhase::NeedB, Some(Outcome::Success { value, pos })) => {
            Step::Done(Outcome::Success { value, pos })
        }
        (LeftRightPhase::NeedB, Some(failure)) => Step::Done(failure),
    }
}

fn resume_apply<'p>(inner: &'p Expr, transform: Builtin, pos: usize, entered: &mut bool, input: Option<Outcome>) -> Step<'p> {
    if !*entered {
        *entered = true;
        return Step::Push(make_frame(inner, pos));
    }
    match input.expect("apply frame resumed twice without a child result") {
        Outcome::Success { value, pos } => Step::Done(Outcome::Success { value: transform.apply(value), pos }),
        failure => Step::Done(failure),
    }
}

fn resume_expect<'p>(inner: &'p Expr, pos0: usize, entered: &mut bool, input: Option<Outcome>) -> Step<'p> {
    if !*entered {
        *entered = true;
        return Step::Push(make_frame(inner, pos0));
    }
    match input.expect("expect frame resumed twice without a child result") {
        Outcome::Success { value, .. } => Step::Done(Outcome::Success { value, pos: pos0 }),
        failure => Step::Done(failure),
    }
}

fn resume_expect_not<'p>(inner: &'p Expr, pos0: usize, entered: &mut bool, input: Option<Outcome>) -> Step<'p> {
    if !*entered {
        *entered = true;
        return Step::Push(make_frame(inner, pos0));
    }
    match input.expect("expect-not frame resumed twice without a child result") {
        Outcome::Success { .. } => Step::Done(Outcome::fail(pos0, "unexpected input")),
        Outcome::Failure { .. } => Step::Done(Outcome::Success { value: Value::Null, pos: pos0 }),
    }
}

fn resume_skip<'p>(items: &'p [Expr], idx: &mut usize, pos: &mut usize, entered: &mut bool, input: Option<Outcome>) -> Step<'p> {
    if !*entered {
        *entered = true;
        if items.is_empty() {
            return Step::Done(Outcome::Success { value: Value::Null, pos: *pos });
        }
        return Step::Push(make_frame(&items[0], *pos));
    }
    match input.expect("skip frame resumed without a child result") {
        Outcome::Success { pos: new_pos, .. } if new_pos > *pos => {
            *pos = new_pos;
            *idx = 0;
            Step::Push(make_frame(&items[0], *pos))
        }
        _ => {
            *idx += 1;
            if *idx < items.len() {
                Step::Push(make_frame(&items[*idx], *pos))
            } else {
                Step::Done(Outcome::Success { value: Value::Null, pos: *pos })
            }
        }
    }
}

fn resume_where<'p>(inner: &'p Expr, predicate: Builtin, pos: usize, entered: &mut bool, input: Option<Outcome>) -> Step<'p> {
    if !*entered {
        *entered = true;
        return Step::Push(make_frame(inner, pos));
    }
    match input.expect("where frame resumed twice without a child result") {
        Outcome::Success { value, pos } => {
            if predicate.test(&value) {
                Step::Done(Outcome::Success { value, pos })
            } else {
                Step::Done(Outcome::fail(pos, "predicate rejected parsed value"))
            }
        }
        failure => Step::Done(failure),
    }
}

fn resume_transparent<'p>(inner: &'p Expr, pos: usize, entered: &mut bool, input: Option<Outcome>) -> Step<'p> {
    if !*entered {
        *entered = true;
        return Step::Push(make_frame(inner, pos));
    }
    Step::Done(input.expect("transparent frame resumed twice without a child result"))
}

fn resume_checkpoint<'p>(inner: &'p Expr, pos: usize, entered: &mut bool, input: Option<Outcome>) -> Step<'p> {
    if !*entered {
        *entered = true;
        return Step::Push(make_frame(inner, pos));
    }
    match input.expect("checkpoint frame resumed twice without a child result") {
        Outcome::Success { value, pos } => Step::Done(Outcome::Success { value, pos }),
        Outcome::Failure { pos, message, .. } => Step::Done(Outcome::fail_committed(pos, message)),
    }
}

fn resume_let<'p>(
    bound: &'p Expr,
    body: &'p Expr,
    pos: usize,
    phase: &mut LetPhase,
    input: Option<Outcome>,
    driver: &mut Driver<'p>,
) -> Step<'p> {
    match (*phase, input) {
        (_, None) => {
            *phase = LetPhase::NeedBound;
            Step::Push(make_frame(bound, pos))
        }
        (LetPhase::NeedBound, Some(Outcome::Success { value, pos })) => {
            driver.env_push(value);
            *phase = LetPhase::NeedBody;
            Step::Push(make_frame(body, pos))
        }
        (LetPhase::NeedBound, Some(failure)) => Step::Done(failure),
        (LetPhase::NeedBody, Some(outcome)) => {
            driver.env_pop();
            Step::Done(outcome)
        }
    }
}

fn resume_recover<'p>(
    primary: &'p Expr,
    alternatives: &'p [Expr],
    idx: &mut Option<usize>,
    pos0: usize,
    farthest: &mut Option<(usize, String)>,
    input: Option<Outcome>,
) -> Step<'p> {
    match (*idx, input) {
        (None, None) => Step::Push(make_frame(primary, pos0)),
        (None, Some(Outcome::Success { value, pos })) => Step::Done(Outcome::Success { value, pos }),
        (None, Some(Outcome::Failure { pos, message, .. })) => {
            *farthest = Some((pos, message));
            if alternatives.is_empty() {
                let (fpos, fmsg) = farthest.take().unwrap();
                return Step::Done(Outcome::fail(fpos, fmsg));
            }
            *idx = Some(0);
            Step::Push(make_frame(&alternatives[0], pos0))
        }
        (Some(_), Some(Outcome::Success { value, pos })) => Step::Done(Outcome::Success { value, pos }),
        (Some(i), Some(Outcome::Failure { pos, message, .. })) => {
            if farthest.as_ref().is_none_or(|(fp, _)| pos > *fp) {
                *farthest = Some((pos, message));
            }
            let next = i + 1;
            *idx = Some(next);
            if next < alternatives.len() {
                Step::Push(make_frame(&alternatives[next], pos0))
            } else {
                let (fpos, fmsg) = farthest.take().unwrap();
                Step::Done(Outcome::fail(fpos, fmsg))
            }
        }
        (Some(_), None) => unreachable!("Recover frame re-entered without a pending child result"),
    }
}
