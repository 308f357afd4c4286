//! The expression algebra (C1): the tagged-variant IR every grammar compiles to.
//!
//! Grounded on the teacher's IR layering (`ir::compiled`/`ir::emit` build a typed node tree from
//! a smaller instruction set) but scoped to a generic text PEG rather than a tree-sitter query.
//! Every node carries a `program_id` (§3.5 invariant 1) assigned by [`assign_program_ids`] during
//! grammar compilation (§4.6 step 6).

pub mod builtin;
pub mod oprec;

pub use builtin::Builtin;
pub use oprec::Level;

use crate::token::{Expectation, RegexMatcher};

pub type ProgramId = u32;
pub type RuleId = u32;

/// Where a `Ref` resolves: a top-level rule (by id) or a lexically enclosing `let`-binding
/// (by de Bruijn depth, nearest-first). Template parameters never survive to this stage: template
/// application is a grammar-compile-time substitution (§4.6), so by the time a program is built
/// every `Ref` that named a template parameter has already been replaced by the argument subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    Rule(RuleId),
    Local(u32),
}

/// One node of the expression algebra, plus its assigned program id.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ProgramId,
    pub kind: ExprKind,
}

impl Expr {
    /// Constructs a node with a placeholder id; real ids are assigned by [`assign_program_ids`].
    pub fn new(kind: ExprKind) -> Self {
        Self { id: 0, kind }
    }

    /// §3.5 invariant 4: whether this node can succeed without consuming input.
    pub fn always_succeeds(&self) -> bool {
        match &self.kind {
            ExprKind::Opt(_) | ExprKind::Skip(_) | ExprKind::ExpectNot(_) | ExprKind::Expect(_) => true,
            ExprKind::List(inner) => inner.allow_empty,
            ExprKind::Alt(alt) => alt.allow_empty,
            ExprKind::Commit(inner) | ExprKind::Checkpoint(inner) => inner.always_succeeds(),
            ExprKind::LetExpr(l) => l.body.always_succeeds(),
            _ => false,
        }
    }

    /// Walks the subtree, returning true if any node is a `Commit` — used by the compiler to
    /// decide whether a rule needs `Checkpoint` wrapping (§4.6 step 3).
    pub fn contains_commit(&self) -> bool {
        match &self.kind {
            ExprKind::Commit(_) => true,
            ExprKind::StrLit(_) | ExprKind::RegexLit(_) | ExprKind::Ref(_) | ExprKind::Fail(_) => false,
            ExprKind::Seq(s) => s.items.iter().any(Expr::contains_commit),
            ExprKind::Choice(items) => items.iter().any(Expr::contains_commit),
            ExprKind::List(l) => l.inner.contains_commit(),
            ExprKind::Alt(a) => a.item.contains_commit() || a.sep.contains_commit(),
            ExprKind::Opt(inner)
            | ExprKind::Expect(inner)
            | ExprKind::ExpectNot(inner)
            | ExprKind::Checkpoint(inner) => inner.contains_commit(),
            ExprKind::Left(a, b) | ExprKind::Right(a, b) => a.contains_commit() || b.contains_commit(),
            ExprKind::Apply(a) => a.inner.contains_commit(),
            ExprKind::Skip(items) => items.iter().any(Expr::contains_commit),
            ExprKind::Where(w) => w.inner.contains_commit(),
            ExprKind::LetExpr(l) => l.bound.contains_commit() || l.body.contains_commit(),
            ExprKind::OpPrec(o) => {
                o.atom.contains_commit() || o.levels.iter().any(Level::contains_commit)
            }
            ExprKind::Recover(r) => {
                r.primary.contains_commit() || r.alternatives.iter().any(Expr::contains_commit)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    StrLit(StrLit),
    RegexLit(RegexLitExpr),
    Ref(RefTarget),
    Seq(Seq),
    Choice(Vec<Expr>),
    List(ListExpr),
    Alt(AltExpr),
    Opt(Box<Expr>),
    Left(Box<Expr>, Box<Expr>),
    Right(Box<Expr>, Box<Expr>),
    Apply(Apply),
    Expect(Box<Expr>),
    ExpectNot(Box<Expr>),
    Skip(Vec<Expr>),
    Where(Where),
    Fail(Option<String>),
    Commit(Box<Expr>),
    /// Inserted by the compiler (never written by a grammar author) around any rule whose body
    /// transitively contains a `Commit` (§4.2 "Commit / Checkpoint").
    Checkpoint(Box<Expr>),
    LetExpr(LetExpr),
    OpPrec(OpPrec),
    /// Supplements the distilled algebra with the `recover` construct (§4.6 step 4 / SPEC_FULL §3.1).
    Recover(Recover),
}

#[derive(Debug, Clone)]
pub struct StrLit {
    pub text: String,
    pub skip_ignored: bool,
    pub expectation: Expectation,
}

#[derive(Debug, Clone)]
pub struct RegexLitExpr {
    pub matcher: RegexMatcher,
    pub skip_ignored: bool,
    pub expectation: Expectation,
}

/// A `class`'s declared type name and field order. `None` means `Seq` builds a flat [`crate::value::Value::List`].
#[derive(Debug, Clone)]
pub struct SeqCtor {
    pub type_name: String,
    pub field_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Seq {
    pub items: Vec<Expr>,
    pub ctor: Option<SeqCtor>,
}

#[derive(Debug, Clone)]
pub struct ListExpr {
    pub inner: Box<Expr>,
    pub allow_empty: bool,
}

#[derive(Debug, Clone)]
pub struct AltExpr {
    pub item: Box<Expr>,
    pub sep: Box<Expr>,
    pub allow_trailer: bool,
    pub allow_empty: bool,
}

/// A transform chain: the inner expression's result is passed through a named [`Builtin`].
/// Deliberately not the distilled spec's two-child-expression shape (§4.2 `Apply`) — see
/// `builtin.rs`'s module doc for why host-closure-shaped transforms are avoided in this IR.
#[derive(Debug, Clone)]
pub struct Apply {
    pub inner: Box<Expr>,
    pub transform: Builtin,
}

#[derive(Debug, Clone)]
pub struct Where {
    pub inner: Box<Expr>,
    pub predicate: Builtin,
}

#[derive(Debug, Clone)]
pub struct LetExpr {
    pub bound: Box<Expr>,
    pub body: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct OpPrec {
    pub atom: Box<Expr>,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone)]
pub struct Recover {
    pub primary: Box<Expr>,
    pub alternatives: Vec<Expr>,
}

/// Assigns unique, pre-order `program_id`s across an entire compiled program (§4.6 step 6).
pub fn assign_program_ids(rules: &mut [crate::program::CompiledRule]) {
    let mut next = 0u32;
    for rule in rules {
        assign_ids(&mut rule.expr, &mut next);
    }
}

fn assign_ids(expr: &mut Expr, next: &mut u32) {
    expr.id = *next;
    *next += 1;
    match &mut expr.kind {
        ExprKind::StrLit(_) | ExprKind::RegexLit(_) | ExprKind::Ref(_) | ExprKind::Fail(_) => {}
        ExprKind::Seq(s) => s.items.iter_mut().for_each(|e| assign_ids(e, next)),
        ExprKind::Choice(items) | ExprKind::Skip(items) => {
            items.iter_mut().for_each(|e| assign_ids(e, next))
        }
        ExprKind::List(l) => assign_ids(&mut l.inner, next),
        ExprKind::Alt(a) => {
            assign_ids(&mut a.item, next);
            assign_ids(&mut a.sep, next);
        }
        ExprKind::Opt(inner)
        | ExprKind::Expect(inner)
        | ExprKind::ExpectNot(inner)
        | ExprKind::Commit(inner)
        | ExprKind::Checkpoint(inner) => assign_ids(inner, next),
        ExprKind::Left(a, b) | ExprKind::Right(a, b) => {
            assign_ids(a, next);
            assign_ids(b, next);
        }
        ExprKind::Apply(a) => assign_ids(&mut a.inner, next),
        ExprKind::Where(w) => assign_ids(&mut w.inner, next),
        ExprKind::LetExpr(l) => {
            assign_ids(&mut l.bound, next);
            assign_ids(&mut l.body, next);
        }
        ExprKind::OpPrec(o) => {
            assign_ids(&mut o.atom, next);
            for level in &mut o.levels {
                assign_ids(level.operator_mut(), next);
            }
        }
        ExprKind::Recover(r) => {
            assign_ids(&mut r.primary, next);
            r.alternatives.iter_mut().for_each(|e| assign_ids(e, next));
        }
    }
}
