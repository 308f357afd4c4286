//! Recursive-descent parser for the grammar description language (C6, §6.1).
//!
//! Grounded on the original source's `_create_parser`/`Grammar` driver in
//! `sourcer/metasyntax.py`, which builds the metagrammar itself from the same combinators this
//! crate compiles user grammars to. A hand-written precedence-climbing parser is used here
//! instead of bootstrapping through the algebra, since nothing in this crate can run until a
//! first grammar has been parsed.
//!
//! Expression precedence, tightest to loosest (§6.1):
//! 1. atoms — `NAME`, string/regex literals, `[e, ...]`, `(e)`
//! 2. postfix call — `callee(arg, ...)`
//! 3. postfix `? * + !`, prefix `!`
//! 4. `/` and `//` (alternating repetition)
//! 5. `<< >> <<! !>>` (discard-left/right, with commit variants)
//! 6. `|` (ordered choice)

use super::ast::*;
use super::lexer::{Spanned, Token, TokenStream};
use crate::error::MetaSyntaxError;
use crate::span::Span;

pub fn parse_grammar(source: &str) -> Result<Grammar, MetaSyntaxError> {
    let tokens: Vec<Spanned<'_>> = TokenStream::new(source).collect();
    let mut p = Parser { tokens, pos: 0 };
    p.parse_grammar()
}

struct Parser<'src> {
    tokens: Vec<Spanned<'src>>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(Token::Newline)) {
            self.pos += 1;
        }
    }

    fn span_at(&self, idx: usize) -> Span {
        self.tokens
            .get(idx)
            .map(|s| Span::new(s.span.start, s.span.end))
            .unwrap_or_else(|| {
                let end = self.tokens.last().map(|s| s.span.end).unwrap_or(0);
                Span::point(end)
            })
    }

    fn cur_span(&self) -> Span {
        self.span_at(self.pos)
    }

    fn bump(&mut self) -> Spanned<'src> {
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        tok
    }

    fn error(&self, message: impl Into<String>) -> MetaSyntaxError {
        MetaSyntaxError::new(message.into(), self.cur_span())
    }

    fn expect(&mut self, want: &Token<'src>, what: &str) -> Result<Spanned<'src>, MetaSyntaxError> {
        self.skip_newlines();
        match self.peek() {
            Some(tok) if tok == want => Ok(self.bump()),
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    fn eat(&mut self, want: &Token<'src>) -> bool {
        self.skip_newlines();
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn word(&mut self) -> Result<(String, Span), MetaSyntaxError> {
        self.skip_newlines();
        match self.peek() {
            Some(Token::Word(w)) => {
                let name = w.to_string();
                let span = self.cur_span();
                self.bump();
                Ok((name, span))
            }
            _ => Err(self.error("expected a name")),
        }
    }

    // ---- top level ---------------------------------------------------

    fn parse_grammar(&mut self) -> Result<Grammar, MetaSyntaxError> {
        let mut defs = Vec::new();
        self.skip_newlines();
        while self.peek().is_some() {
            defs.push(self.parse_def()?);
            self.skip_newlines();
        }
        Ok(Grammar { defs })
    }

    fn parse_def(&mut self) -> Result<Def, MetaSyntaxError> {
        let start = self.cur_span();
        let is_ignored = self.eat(&Token::Ignored);

        if self.eat(&Token::TokenKw) {
            return self.parse_token_def(is_ignored, start);
        }
        if is_ignored {
            return Err(self.error("`ignored` must be followed by `token`"));
        }
        if self.eat(&Token::Class) {
            return self.parse_class_def(start).map(Def::Class);
        }
        if self.eat(&Token::Template) {
            return self.parse_template_def(start).map(Def::Template);
        }
        if self.eat(&Token::Recover) {
            let (target, _) = self.word()?;
            self.expect(&Token::Eq, "`=`")?;
            let body = self.parse_expr()?;
            return Ok(Def::Recover(RecoverDef {
                target,
                body,
                span: start.join(self.cur_span()),
            }));
        }

        let (name, _) = self.word()?;
        self.skip_newlines();
        let is_token = match self.peek() {
            Some(Token::Eq) => false,
            Some(Token::Colon) => true,
            _ => return Err(self.error("expected `=` or `:` after rule name")),
        };
        self.bump();
        let body = self.parse_expr()?;
        Ok(Def::Rule(RuleDef {
            name,
            is_token,
            body,
            span: start.join(self.cur_span()),
        }))
    }

    fn parse_token_def(&mut self, is_ignored: bool, start: Span) -> Result<Def, MetaSyntaxError> {
        let (name, _) = self.word()?;
        self.skip_newlines();
        if self.eat(&Token::Class) {
            let (name2, fields) = self.parse_braced_fields(&name)?;
            let _ = name2;
            return Ok(Def::Token(TokenDef {
                name,
                is_ignored,
                body: TokenBody::Fields(fields),
                span: start.join(self.cur_span()),
            }));
        }
        self.expect(&Token::Eq, "`=`")?;
        let body = self.parse_expr()?;
        Ok(Def::Token(TokenDef {
            name,
            is_ignored,
            body: TokenBody::Expr(body),
            span: start.join(self.cur_span()),
        }))
    }

    fn parse_class_def(&mut self, start: Span) -> Result<ClassDef, MetaSyntaxError> {
        let (name, _) = self.word()?;
        let params = self.parse_optional_params()?;
        let (_, fields) = self.parse_braced_fields(&name)?;
        Ok(ClassDef {
            name,
            params,
            fields,
            span: start.join(self.cur_span()),
        })
    }

    fn parse_template_def(&mut self, start: Span) -> Result<TemplateDef, MetaSyntaxError> {
        let (name, _) = self.word()?;
        let params = self.parse_optional_params()?;
        self.skip_newlines();
        if !self.eat(&Token::FatArrow) {
            self.expect(&Token::Eq, "`=>` or `=`")?;
        }
        let body = self.parse_expr()?;
        Ok(TemplateDef {
            name,
            params,
            body,
            span: start.join(self.cur_span()),
        })
    }

    fn parse_optional_params(&mut self) -> Result<Vec<String>, MetaSyntaxError> {
        self.skip_newlines();
        if !self.eat(&Token::ParenOpen) {
            return Ok(Vec::new());
        }
        let mut params = Vec::new();
        self.skip_newlines();
        if !matches!(self.peek(), Some(Token::ParenClose)) {
            loop {
                let (name, _) = self.word()?;
                params.push(name);
                self.skip_newlines();
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::ParenClose, "`)`")?;
        Ok(params)
    }

    /// `{ FIELD ; ... }` where `FIELD = NAME ("=" | ":") EXPR`.
    fn parse_braced_fields(&mut self, owner: &str) -> Result<(String, Vec<Field>), MetaSyntaxError> {
        self.expect(&Token::BraceOpen, "`{`")?;
        let mut fields = Vec::new();
        self.skip_newlines();
        while !matches!(self.peek(), Some(Token::BraceClose)) {
            let field_start = self.cur_span();
            let (name, _) = self.word()?;
            self.skip_newlines();
            match self.peek() {
                Some(Token::Eq) | Some(Token::Colon) => {
                    self.bump();
                }
                _ => return Err(self.error("expected `=` or `:` in field definition")),
            }
            let expr = self.parse_expr()?;
            fields.push(Field {
                name,
                expr,
                span: field_start.join(self.cur_span()),
            });
            self.skip_newlines();
            self.eat(&Token::Semi);
            self.skip_newlines();
        }
        self.expect(&Token::BraceClose, "`}`")?;
        Ok((owner.to_string(), fields))
    }

    // ---- expressions ---------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, MetaSyntaxError> {
        self.skip_newlines();
        if matches!(self.peek(), Some(Token::Let)) {
            return self.parse_let();
        }
        self.parse_choice()
    }

    /// `let NAME = EXPR in BODY` (§3.1 `LetExpr`).
    fn parse_let(&mut self) -> Result<Expr, MetaSyntaxError> {
        let start = self.cur_span();
        self.bump();
        let (name, _) = self.word()?;
        self.expect(&Token::Eq, "`=`")?;
        let bound = self.parse_choice()?;
        self.skip_newlines();
        self.expect(&Token::In, "`in`")?;
        let body = self.parse_expr()?;
        Ok(Expr {
            span: start.join(self.cur_span()),
            kind: ExprKind::Let(name, Box::new(bound), Box::new(body)),
        })
    }

    /// Level 6: `a | b | c`.
    fn parse_choice(&mut self) -> Result<Expr, MetaSyntaxError> {
        let start = self.cur_span();
        let mut items = vec![self.parse_discard()?];
        while self.eat_at_level(&Token::Pipe) {
            items.push(self.parse_discard()?);
        }
        if items.len() == 1 {
            return Ok(items.pop().unwrap());
        }
        Ok(Expr {
            span: start.join(self.cur_span()),
            kind: ExprKind::Choice(items),
        })
    }

    /// `<<`/`>>` may peek past a newline only when unambiguous, so these operators use
    /// [`Self::eat_at_level`], which tolerates a leading newline before the operator itself
    /// (mirroring `_wrap`'s `Skip(Newline) >> x << Skip(Newline)` in the original source).
    fn eat_at_level(&mut self, want: &Token<'src>) -> bool {
        let save = self.pos;
        self.skip_newlines();
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            self.pos = save;
            false
        }
    }

    /// Level 5: `a << b`, `a >> b`, `a <<! b`, `a !>> b`.
    fn parse_discard(&mut self) -> Result<Expr, MetaSyntaxError> {
        let start = self.cur_span();
        let mut left = self.parse_alt()?;
        loop {
            let save = self.pos;
            self.skip_newlines();
            match self.peek() {
                Some(Token::ShiftLeft) => {
                    self.bump();
                    let right = self.parse_alt()?;
                    let span = start.join(self.cur_span());
                    left = Expr {
                        span,
                        kind: ExprKind::DiscardRight(Box::new(left), Box::new(right)),
                    };
                }
                Some(Token::ShiftLeftCommit) => {
                    self.bump();
                    let right = self.parse_alt()?;
                    let span = start.join(self.cur_span());
                    left = Expr {
                        span,
                        kind: ExprKind::DiscardRightCommit(Box::new(left), Box::new(right)),
                    };
                }
                Some(Token::ShiftRight) => {
                    self.bump();
                    let right = self.parse_alt()?;
                    let span = start.join(self.cur_span());
                    left = Expr {
                        span,
                        kind: ExprKind::DiscardLeft(Box::new(left), Box::new(right)),
                    };
                }
                Some(Token::ShiftRightCommit) => {
                    self.bump();
                    let right = self.parse_alt()?;
                    let span = start.join(self.cur_span());
                    left = Expr {
                        span,
                        kind: ExprKind::DiscardLeftCommit(Box::new(left), Box::new(right)),
                    };
                }
                _ => {
                    self.pos = save;
                    break;
                }
            }
        }
        Ok(left)
    }

    /// Level 4: `item / sep`, `item // sep`.
    fn parse_alt(&mut self) -> Result<Expr, MetaSyntaxError> {
        let start = self.cur_span();
        let item = self.parse_postfix()?;
        let save = self.pos;
        self.skip_newlines();
        let trailing = match self.peek() {
            Some(Token::SlashSlash) => {
                self.bump();
                true
            }
            Some(Token::Slash) => {
                self.bump();
                false
            }
            _ => {
                self.pos = save;
                return Ok(item);
            }
        };
        let sep = self.parse_postfix()?;
        let span = start.join(self.cur_span());
        let kind = if trailing {
            ExprKind::AltTrailing(Box::new(item), Box::new(sep))
        } else {
            ExprKind::Alt(Box::new(item), Box::new(sep))
        };
        Ok(Expr { span, kind })
    }

    /// Level 3: postfix `? * + !`; wraps an implicit sequence of atoms/calls (juxtaposition,
    /// §6.1) that share this precedence tier. `!` is postfix-only here (it compiles to `Commit`,
    /// per the authoritative metagrammar's own `Postfix(Choice('?', '*', '+', '!'))` — negative
    /// lookahead has no surface token in that grammar at all and is reached only through the
    /// `expect`/`expect_not` call forms the compiler recognizes, see `compiler.rs`).
    fn parse_postfix(&mut self) -> Result<Expr, MetaSyntaxError> {
        let start = self.cur_span();
        let mut items = Vec::new();
        loop {
            if !self.starts_atom() {
                break;
            }
            let mut e = self.parse_call()?;
            loop {
                match self.peek() {
                    Some(Token::Question) => {
                        self.bump();
                        e = Expr {
                            span: start.join(self.cur_span()),
                            kind: ExprKind::Opt(Box::new(e)),
                        };
                    }
                    Some(Token::Star) => {
                        self.bump();
                        e = Expr {
                            span: start.join(self.cur_span()),
                            kind: ExprKind::Star(Box::new(e)),
                        };
                    }
                    Some(Token::Plus) => {
                        self.bump();
                        e = Expr {
                            span: start.join(self.cur_span()),
                            kind: ExprKind::Plus(Box::new(e)),
                        };
                    }
                    Some(Token::Bang) => {
                        self.bump();
                        e = Expr {
                            span: start.join(self.cur_span()),
                            kind: ExprKind::Commit(Box::new(e)),
                        };
                    }
                    _ => break,
                }
            }
            items.push(e);
            if !self.starts_atom() {
                break;
            }
        }
        if items.is_empty() {
            return Err(self.error("expected an expression"));
        }
        if items.len() == 1 {
            return Ok(items.pop().unwrap());
        }
        Ok(Expr {
            span: start.join(self.cur_span()),
            kind: ExprKind::Seq(items),
        })
    }

    fn starts_atom(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Word(_))
                | Some(Token::StringLiteral(_))
                | Some(Token::RegexLiteral(_))
                | Some(Token::ParenOpen)
                | Some(Token::BracketOpen)
        )
    }

    /// Level 2: postfix call, `callee(arg, ...)`.
    fn parse_call(&mut self) -> Result<Expr, MetaSyntaxError> {
        let start = self.cur_span();
        let mut e = self.parse_atom()?;
        loop {
            let save = self.pos;
            self.skip_newlines();
            if self.peek() == Some(&Token::ParenOpen) {
                self.bump();
                let mut args = Vec::new();
                self.skip_newlines();
                if !matches!(self.peek(), Some(Token::ParenClose)) {
                    loop {
                        args.push(self.parse_expr()?);
                        self.skip_newlines();
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::ParenClose, "`)`")?;
                e = Expr {
                    span: start.join(self.cur_span()),
                    kind: ExprKind::Call(Box::new(e), args),
                };
            } else {
                self.pos = save;
                break;
            }
        }
        Ok(e)
    }

    /// Level 1: atoms.
    fn parse_atom(&mut self) -> Result<Expr, MetaSyntaxError> {
        self.skip_newlines();
        let start = self.cur_span();
        match self.peek().cloned() {
            Some(Token::Word(w)) => {
                self.bump();
                Ok(Expr {
                    span: start,
                    kind: ExprKind::Name(w.to_string()),
                })
            }
            Some(Token::StringLiteral(s)) => {
                self.bump();
                Ok(Expr {
                    span: start,
                    kind: ExprKind::StrLit(s.to_string()),
                })
            }
            Some(Token::RegexLiteral(s)) => {
                self.bump();
                Ok(Expr {
                    span: start,
                    kind: ExprKind::RegexLit(s.to_string()),
                })
            }
            Some(Token::ParenOpen) => {
                self.bump();
                self.skip_newlines();
                let inner = self.parse_expr()?;
                self.expect(&Token::ParenClose, "`)`")?;
                Ok(Expr {
                    span: start.join(self.cur_span()),
                    kind: inner.kind,
                })
            }
            Some(Token::BracketOpen) => {
                self.bump();
                let mut items = Vec::new();
                self.skip_newlines();
                if !matches!(self.peek(), Some(Token::BracketClose)) {
                    loop {
                        items.push(self.parse_expr()?);
                        self.skip_newlines();
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::BracketClose, "`]`")?;
                Ok(Expr {
                    span: start.join(self.cur_span()),
                    kind: ExprKind::ListLit(items),
                })
            }
            _ => Err(self.error("expected a name, literal, `(`, or `[`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Grammar {
        parse_grammar(src).unwrap_or_else(|e| panic!("parse failed: {} ({:?})", e.message, e.span))
    }

    #[test]
    fn parses_simple_rule() {
        let g = parse_ok("start = 'a' 'b'\n");
        assert_eq!(g.defs.len(), 1);
        match &g.defs[0] {
            Def::Rule(r) => {
                assert_eq!(r.name, "start");
                assert!(!r.is_token);
                assert!(matches!(r.body.kind, ExprKind::Seq(_)));
            }
            _ => panic!("expected a rule"),
        }
    }

    #[test]
    fn parses_choice_and_discard() {
        let g = parse_ok("start = 'a' << 'b' | 'c' >> 'd'\n");
        match &g.defs[0] {
            Def::Rule(r) => assert!(matches!(r.body.kind, ExprKind::Choice(_))),
            _ => panic!("expected a rule"),
        }
    }

    #[test]
    fn parses_template_call() {
        let g = parse_ok("start = OperatorPrecedence(Int, LeftAssoc(`\\+`))\n");
        match &g.defs[0] {
            Def::Rule(r) => match &r.body.kind {
                ExprKind::Call(callee, args) => {
                    assert!(matches!(callee.kind, ExprKind::Name(ref n) if n == "OperatorPrecedence"));
                    assert_eq!(args.len(), 2);
                }
                _ => panic!("expected a call"),
            },
            _ => panic!("expected a rule"),
        }
    }

    #[test]
    fn parses_class_with_fields() {
        let g = parse_ok(
            "class Pair {\n  left = Int;\n  right = Int;\n}\n",
        );
        match &g.defs[0] {
            Def::Class(c) => {
                assert_eq!(c.name, "Pair");
                assert_eq!(c.fields.len(), 2);
            }
            _ => panic!("expected a class"),
        }
    }

    #[test]
    fn newline_inside_parens_is_insignificant() {
        let g = parse_ok("start = f(\n  'a',\n  'b'\n)\n");
        match &g.defs[0] {
            Def::Rule(r) => assert!(matches!(r.body.kind, ExprKind::Call(_, _))),
            _ => panic!("expected a rule"),
        }
    }

    #[test]
    fn parses_commit_discard_variants() {
        let g = parse_ok("start = 'if' <<! cond !>> 'then'\n");
        match &g.defs[0] {
            Def::Rule(r) => match &r.body.kind {
                ExprKind::DiscardLeftCommit(lhs, _) => {
                    assert!(matches!(lhs.kind, ExprKind::DiscardRightCommit(_, _)));
                }
                other => panic!("expected DiscardLeftCommit, got {other:?}"),
            },
            _ => panic!("expected a rule"),
        }
    }

    #[test]
    fn parses_recover_def() {
        let g = parse_ok("start = 'a'\nrecover start = 'b'\n");
        assert_eq!(g.defs.len(), 2);
        assert!(matches!(g.defs[1], Def::Recover(_)));
    }
}
