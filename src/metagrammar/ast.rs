//! The surface syntax tree produced by [`super::parser`] (C6, §6.1).
//!
//! Grounded on the original source's `sourcer/metasyntax.py` definition forms (`Let`, `Rule`,
//! `Class`, `Token`, `Template`) and the distilled spec's expression grammar, re-expressed as
//! plain Rust structs/enums rather than parser-combinator classes. This tree is untyped with
//! respect to rule/local references (every name is still a bare `String`) — resolving those to
//! [`crate::algebra::RefTarget`] is the compiler's job (C6).

use crate::span::Span;

#[derive(Debug, Clone)]
pub struct Grammar {
    pub defs: Vec<Def>,
}

#[derive(Debug, Clone)]
pub enum Def {
    Token(TokenDef),
    Class(ClassDef),
    Template(TemplateDef),
    Rule(RuleDef),
    Recover(RecoverDef),
}

/// `ignored? token NAME = EXPR` or `ignored? token class NAME { FIELD ; ... }`.
#[derive(Debug, Clone)]
pub struct TokenDef {
    pub name: String,
    pub is_ignored: bool,
    pub body: TokenBody,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TokenBody {
    Expr(Expr),
    Fields(Vec<Field>),
}

/// `class NAME { FIELD ; ... }` or `class NAME(PARAM, ...) { FIELD ; ... }`.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub params: Vec<String>,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub expr: Expr,
    pub span: Span,
}

/// `template NAME(PARAM, ...) => EXPR` or `template NAME(PARAM, ...) = EXPR`.
#[derive(Debug, Clone)]
pub struct TemplateDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
    pub span: Span,
}

/// `NAME = EXPR` (ordinary rule) or `NAME : EXPR` (token-like rule, per §6.1).
#[derive(Debug, Clone)]
pub struct RuleDef {
    pub name: String,
    pub is_token: bool,
    pub body: Expr,
    pub span: Span,
}

/// `recover NAME = EXPR`: a fallback tried, in definition order, when `NAME`'s primary body
/// fails without having committed (§4.6 step 4).
#[derive(Debug, Clone)]
pub struct RecoverDef {
    pub target: String,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A quoted literal, still carrying its quotes/escapes (decoded by the compiler).
    StrLit(String),
    /// A backtick-delimited regex pattern, with the delimiters stripped.
    RegexLit(String),
    /// A bare name: a rule, a template parameter, a `let`-bound local, or (applied) a template.
    Name(String),
    /// `[e, e, ...]` — a list literal, compiled to a fixed-arity `Seq` with no constructor.
    ListLit(Vec<Expr>),
    /// `a b c` (juxtaposition): sequence with no named constructor.
    Seq(Vec<Expr>),
    /// `a | b | c`: ordered choice.
    Choice(Vec<Expr>),
    /// `a << b`: evaluate both, keep `a`'s value.
    DiscardRight(Box<Expr>, Box<Expr>),
    /// `a >> b`: evaluate both, keep `b`'s value.
    DiscardLeft(Box<Expr>, Box<Expr>),
    /// `a <<! b` / `a !>> b`: as above, but commit to this alternative once `a`/`b` succeeds.
    DiscardRightCommit(Box<Expr>, Box<Expr>),
    DiscardLeftCommit(Box<Expr>, Box<Expr>),
    /// `item / sep`: zero-or-more `item`s separated by `sep`; a trailing `sep` is allowed.
    Alt(Box<Expr>, Box<Expr>),
    /// `item // sep`: as above, but no trailing `sep` is allowed.
    AltTrailing(Box<Expr>, Box<Expr>),
    /// Postfix `?`.
    Opt(Box<Expr>),
    /// Postfix `*`.
    Star(Box<Expr>),
    /// Postfix `+`.
    Plus(Box<Expr>),
    /// Postfix `!`: commit to the enclosing choice once this subexpression succeeds.
    Commit(Box<Expr>),
    /// `callee(arg, ...)`: a template invocation, or one of the special forms the compiler
    /// recognizes by callee name (`OperatorPrecedence`, `expect`, `expect_not`, `where`, `fail`).
    Call(Box<Expr>, Vec<Expr>),
    /// `let NAME = EXPR in BODY`: binds `NAME` to `EXPR`'s successful parse result while parsing
    /// `BODY` (§3.1 `LetExpr`). Distinct from a `class`/`token class` [`Field`], which names a
    /// constructed node's field rather than a transient local.
    Let(String, Box<Expr>, Box<Expr>),
}
