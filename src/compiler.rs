//! The grammar compiler (C6, §4.6): lowers a definition AST into a [`Program`].
//!
//! Grounded on the distilled spec's eight-step recipe (§4.6) and the original source's
//! environment-based `Grammar` compiler (`sourcer/metasyntax.py`'s `_create_parser`): seed a lazy
//! forward-reference environment so mutually recursive rules resolve, evaluate definitions in
//! source order, then do the cross-cutting passes (`recover` rewriting, ignored-token threading,
//! `program_id` assignment) once every rule body has been lowered to the expression algebra.

use std::collections::{HashMap, HashSet};

use crate::algebra::{
    self, Apply, AltExpr, Builtin, Expr, ExprKind, LetExpr, Level, ListExpr, OpPrec, Recover,
    RefTarget, RegexLitExpr, RuleId, Seq, SeqCtor, StrLit, Where,
};
use crate::error::GrammarError;
use crate::metagrammar::ast;
use crate::metagrammar::parse_grammar;
use crate::program::{CompiledRule, Program};
use crate::span::Span;
use crate::token::{Expectation, RegexMatcher};

pub fn compile_grammar(source: &str) -> Result<Program, GrammarError> {
    let grammar = parse_grammar(source)?;
    compile(&grammar)
}

struct TemplateDef {
    params: Vec<String>,
    body: ast::Expr,
}

/// A parametric `class NAME(PARAM, ...) { FIELD ; ... }`: invoking it substitutes `params` into
/// each field expression and builds a named-field `Seq`, exactly like a non-parametric `class`
/// except the field expressions are grammar-compile-time-substituted first.
struct ClassTemplate {
    params: Vec<String>,
    fields: Vec<ast::Field>,
}

struct Compiler {
    rule_ids: HashMap<String, RuleId>,
    templates: HashMap<String, TemplateDef>,
    class_templates: HashMap<String, ClassTemplate>,
    rules: Vec<CompiledRule>,
    recoveries: HashMap<String, Vec<Expr>>,
}

fn compile(grammar: &ast::Grammar) -> Result<Program, GrammarError> {
    let mut rule_ids = HashMap::new();
    let mut templates = HashMap::new();
    let mut class_templates = HashMap::new();
    let mut seen = HashSet::new();
    let mut slots: Vec<(String, bool, bool)> = Vec::new(); // name, is_ignored, is_token

    for def in &grammar.defs {
        match def {
            ast::Def::Token(t) => {
                register_name(&t.name, t.span, &mut seen)?;
                rule_ids.insert(t.name.clone(), slots.len() as RuleId);
                slots.push((t.name.clone(), t.is_ignored, true));
            }
            ast::Def::Class(c) if c.params.is_empty() => {
                register_name(&c.name, c.span, &mut seen)?;
                rule_ids.insert(c.name.clone(), slots.len() as RuleId);
                slots.push((c.name.clone(), false, false));
            }
            ast::Def::Class(_) => {} // parametric class: a template, handled below
            ast::Def::Rule(r) => {
                register_name(&r.name, r.span, &mut seen)?;
                rule_ids.insert(r.name.clone(), slots.len() as RuleId);
                slots.push((r.name.clone(), false, r.is_token));
            }
            ast::Def::Template(_) | ast::Def::Recover(_) => {}
        }
    }
    for def in &grammar.defs {
        if let ast::Def::Template(t) = def {
            register_name(&t.name, t.span, &mut seen)?;
            templates.insert(
                t.name.clone(),
                TemplateDef {
                    params: t.params.clone(),
                    body: t.body.clone(),
                },
            );
        }
        if let ast::Def::Class(c) = def {
            if !c.params.is_empty() {
                register_name(&c.name, c.span, &mut seen)?;
                class_templates.insert(
                    c.name.clone(),
                    ClassTemplate {
                        params: c.params.clone(),
                        fields: c.fields.clone(),
                    },
                );
            }
        }
    }

    let mut compiler = Compiler {
        rule_ids,
        templates,
        class_templates,
        rules: Vec::with_capacity(slots.len()),
        recoveries: HashMap::new(),
    };

    // Reserve slots so forward references resolve; filled in below in source order.
    for (name, is_ignored, is_token) in &slots {
        compiler.rules.push(CompiledRule {
            name: name.clone(),
            expr: Expr::new(ExprKind::Fail(None)),
            is_ignored: *is_ignored,
            is_token: *is_token,
        });
    }

    for def in &grammar.defs {
        match def {
            ast::Def::Token(t) => {
                let expr = match &t.body {
                    ast::TokenBody::Expr(e) => compiler.compile_expr(e, &mut Vec::new())?,
                    ast::TokenBody::Fields(fields) => {
                        compiler.compile_fields(&t.name, fields, &mut Vec::new())?
                    }
                };
                compiler.finish_rule(&t.name, expr);
            }
            ast::Def::Class(c) if c.params.is_empty() => {
                let expr = compiler.compile_fields(&c.name, &c.fields, &mut Vec::new())?;
                compiler.finish_rule(&c.name, expr);
            }
            ast::Def::Class(_) => {}
            ast::Def::Rule(r) => {
                let expr = compiler.compile_expr(&r.body, &mut Vec::new())?;
                compiler.finish_rule(&r.name, expr);
            }
            ast::Def::Template(_) => {}
            ast::Def::Recover(rd) => {
                let expr = compiler.compile_expr(&rd.body, &mut Vec::new())?;
                compiler
                    .recoveries
                    .entry(rd.target.clone())
                    .or_default()
                    .push(expr);
            }
        }
    }

    // Step 4: rewrite recovered rules to `Recover(original, alternatives)`.
    for (target, alternatives) in compiler.recoveries.drain().collect::<Vec<_>>() {
        let Some(&id) = compiler.rule_ids.get(&target) else {
            return Err(GrammarError::UndefinedReference {
                name: target,
                span: Span::point(0),
            });
        };
        let rule = &mut compiler.rules[id as usize];
        let original = std::mem::replace(&mut rule.expr, Expr::new(ExprKind::Fail(None)));
        rule.expr = Expr::new(ExprKind::Recover(Recover {
            primary: Box::new(original),
            alternatives,
        }));
    }

    let start_id = compiler
        .rule_ids
        .get("start")
        .copied()
        .ok_or(GrammarError::MissingStart)?;
    if compiler.rules[start_id as usize].is_ignored {
        return Err(GrammarError::StartIsIgnored {
            span: Span::point(0),
        });
    }

    // Step 5: build the ignored sink and thread `skip_ignored` into every non-ignored leaf.
    let mut ignored_literals = Vec::new();
    let mut ignored_regexes = Vec::new();
    for rule in &compiler.rules {
        if rule.is_ignored {
            collect_terminal_matchers(&rule.expr, &mut ignored_literals, &mut ignored_regexes);
        }
    }
    for rule in &mut compiler.rules {
        if !rule.is_ignored {
            set_skip_ignored(&mut rule.expr, true);
        }
    }

    // Step 3 (commit detection) + step 6 (program ids).
    for rule in &mut compiler.rules {
        if rule.expr.contains_commit() {
            let inner = std::mem::replace(&mut rule.expr, Expr::new(ExprKind::Fail(None)));
            rule.expr = Expr::new(ExprKind::Checkpoint(Box::new(inner)));
        }
    }
    algebra::assign_program_ids(&mut compiler.rules);

    Ok(Program {
        rules: compiler.rules,
        start: start_id,
        ignored_literals,
        ignored_regexes,
    })
}

fn register_name(name: &str, span: Span, seen: &mut HashSet<String>) -> Result<(), GrammarError> {
    if name.starts_with('_') {
        return Err(GrammarError::ReservedName {
            name: name.to_string(),
            span,
        });
    }
    if !seen.insert(name.to_string()) {
        return Err(GrammarError::DuplicateDefinition {
            name: name.to_string(),
            span,
        });
    }
    Ok(())
}

impl Compiler {
    fn finish_rule(&mut self, name: &str, expr: Expr) {
        let id = self.rule_ids[name];
        self.rules[id as usize].expr = expr;
    }

    /// Compiles `{ FIELD ; ... }` into a named-field `Seq` (§3.2, S3).
    fn compile_fields(
        &mut self,
        type_name: &str,
        fields: &[ast::Field],
        scope: &mut Vec<String>,
    ) -> Result<Expr, GrammarError> {
        let mut items = Vec::with_capacity(fields.len());
        let mut field_names = Vec::with_capacity(fields.len());
        for field in fields {
            items.push(self.compile_expr(&field.expr, scope)?);
            field_names.push(field.name.clone());
        }
        Ok(Expr::new(ExprKind::Seq(Seq {
            items,
            ctor: Some(SeqCtor {
                type_name: type_name.to_string(),
                field_names,
            }),
        })))
    }

    fn compile_expr(&mut self, expr: &ast::Expr, scope: &mut Vec<String>) -> Result<Expr, GrammarError> {
        match &expr.kind {
            ast::ExprKind::StrLit(raw) => {
                let text = decode_string_literal(raw);
                Ok(Expr::new(ExprKind::StrLit(StrLit {
                    expectation: Expectation::Literal(text.clone()),
                    text,
                    skip_ignored: false,
                })))
            }
            ast::ExprKind::RegexLit(raw) => {
                let pattern = decode_regex_literal(raw);
                let matcher = RegexMatcher::compile("<regex>", &pattern, expr.span)?;
                let expectation = Expectation::Pattern(matcher.pattern().to_string());
                Ok(Expr::new(ExprKind::RegexLit(RegexLitExpr {
                    matcher,
                    skip_ignored: false,
                    expectation,
                })))
            }
            ast::ExprKind::Name(name) => self.compile_name_ref(name, expr.span, scope),
            ast::ExprKind::ListLit(items) => {
                let mut compiled = Vec::with_capacity(items.len());
                for item in items {
                    compiled.push(self.compile_expr(item, scope)?);
                }
                Ok(Expr::new(ExprKind::Seq(Seq {
                    items: compiled,
                    ctor: None,
                })))
            }
            ast::ExprKind::Seq(items) => {
                let mut compiled = Vec::with_capacity(items.len());
                for item in items {
                    compiled.push(self.compile_expr(item, scope)?);
                }
                Ok(Expr::new(ExprKind::Seq(Seq {
                    items: compiled,
                    ctor: None,
                })))
            }
            ast::ExprKind::Choice(items) => {
                let mut compiled = Vec::with_capacity(items.len());
                for item in items {
                    compiled.push(self.compile_expr(item, scope)?);
                }
                Ok(Expr::new(ExprKind::Choice(compiled)))
            }
            ast::ExprKind::DiscardRight(a, b) => Ok(Expr::new(ExprKind::Left(
                Box::new(self.compile_expr(a, scope)?),
                Box::new(self.compile_expr(b, scope)?),
            ))),
            ast::ExprKind::DiscardLeft(a, b) => Ok(Expr::new(ExprKind::Right(
                Box::new(self.compile_expr(a, scope)?),
                Box::new(self.compile_expr(b, scope)?),
            ))),
            ast::ExprKind::DiscardRightCommit(a, b) => {
                let inner = ExprKind::Left(
                    Box::new(self.compile_expr(a, scope)?),
                    Box::new(self.compile_expr(b, scope)?),
                );
                Ok(Expr::new(ExprKind::Commit(Box::new(Expr::new(inner)))))
            }
            ast::ExprKind::DiscardLeftCommit(a, b) => {
                let inner = ExprKind::Right(
                    Box::new(self.compile_expr(a, scope)?),
                    Box::new(self.compile_expr(b, scope)?),
                );
                Ok(Expr::new(ExprKind::Commit(Box::new(Expr::new(inner)))))
            }
            ast::ExprKind::Alt(item, sep) => Ok(Expr::new(ExprKind::Alt(AltExpr {
                item: Box::new(self.compile_expr(item, scope)?),
                sep: Box::new(self.compile_expr(sep, scope)?),
                allow_trailer: true,
                allow_empty: true,
            }))),
            ast::ExprKind::AltTrailing(item, sep) => Ok(Expr::new(ExprKind::Alt(AltExpr {
                item: Box::new(self.compile_expr(item, scope)?),
                sep: Box::new(self.compile_expr(sep, scope)?),
                allow_trailer: false,
                allow_empty: true,
            }))),
            ast::ExprKind::Opt(inner) => Ok(Expr::new(ExprKind::Opt(Box::new(
                self.compile_expr(inner, scope)?,
            )))),
            ast::ExprKind::Star(inner) => Ok(Expr::new(ExprKind::List(ListExpr {
                inner: Box::new(self.compile_expr(inner, scope)?),
                allow_empty: true,
            }))),
            ast::ExprKind::Plus(inner) => Ok(Expr::new(ExprKind::List(ListExpr {
                inner: Box::new(self.compile_expr(inner, scope)?),
                allow_empty: false,
            }))),
            ast::ExprKind::Commit(inner) => Ok(Expr::new(ExprKind::Commit(Box::new(
                self.compile_expr(inner, scope)?,
            )))),
            ast::ExprKind::Call(callee, args) => self.compile_call(callee, args, expr.span, scope),
            ast::ExprKind::Let(name, bound, body) => {
                let bound_expr = self.compile_expr(bound, scope)?;
                scope.push(name.clone());
                let body_expr = self.compile_expr(body, scope);
                scope.pop();
                Ok(Expr::new(ExprKind::LetExpr(LetExpr {
                    bound: Box::new(bound_expr),
                    body: Box::new(body_expr?),
                })))
            }
        }
    }

    fn compile_name_ref(
        &mut self,
        name: &str,
        span: Span,
        scope: &mut Vec<String>,
    ) -> Result<Expr, GrammarError> {
        if let Some(depth) = local_depth(scope, name) {
            return Ok(Expr::new(ExprKind::Ref(RefTarget::Local(depth))));
        }
        if let Some(&id) = self.rule_ids.get(name) {
            return Ok(Expr::new(ExprKind::Ref(RefTarget::Rule(id))));
        }
        if self.templates.contains_key(name) || self.class_templates.contains_key(name) {
            // A bare reference to a zero-arg template is a zero-arg invocation.
            return self.compile_call_by_name(name, &[], span, scope);
        }
        Err(GrammarError::UndefinedReference {
            name: name.to_string(),
            span,
        })
    }

    fn compile_call(
        &mut self,
        callee: &ast::Expr,
        args: &[ast::Expr],
        span: Span,
        scope: &mut Vec<String>,
    ) -> Result<Expr, GrammarError> {
        let ast::ExprKind::Name(name) = &callee.kind else {
            return Err(GrammarError::UndefinedReference {
                name: "<callable expression>".to_string(),
                span: callee.span,
            });
        };
        self.compile_call_by_name(name, args, span, scope)
    }

    fn compile_call_by_name(
        &mut self,
        name: &str,
        args: &[ast::Expr],
        span: Span,
        scope: &mut Vec<String>,
    ) -> Result<Expr, GrammarError> {
        match name {
            "OperatorPrecedence" => self.compile_op_prec(args, span, scope),
            "where" => {
                let [inner, pred] = args else {
                    return Err(arity_error("where", 2, args.len(), span));
                };
                let ast::ExprKind::Name(pred_name) = &pred.kind else {
                    return Err(GrammarError::UndefinedReference {
                        name: "<predicate>".to_string(),
                        span: pred.span,
                    });
                };
                let predicate = Builtin::by_name(pred_name).ok_or_else(|| {
                    GrammarError::UndefinedReference {
                        name: pred_name.clone(),
                        span: pred.span,
                    }
                })?;
                Ok(Expr::new(ExprKind::Where(Where {
                    inner: Box::new(self.compile_expr(inner, scope)?),
                    predicate,
                })))
            }
            "fail" => {
                let message = match args {
                    [] => None,
                    [ast::Expr {
                        kind: ast::ExprKind::StrLit(s),
                        ..
                    }] => Some(decode_string_literal(s)),
                    _ => return Err(arity_error("fail", 1, args.len(), span)),
                };
                Ok(Expr::new(ExprKind::Fail(message)))
            }
            "expect" => {
                let [inner] = args else {
                    return Err(arity_error("expect", 1, args.len(), span));
                };
                Ok(Expr::new(ExprKind::Expect(Box::new(
                    self.compile_expr(inner, scope)?,
                ))))
            }
            "expect_not" => {
                let [inner] = args else {
                    return Err(arity_error("expect_not", 1, args.len(), span));
                };
                Ok(Expr::new(ExprKind::ExpectNot(Box::new(
                    self.compile_expr(inner, scope)?,
                ))))
            }
            _ if self.rule_ids.contains_key(name) && !self.templates.contains_key(name) => {
                if !args.is_empty() {
                    return Err(GrammarError::TemplateArity {
                        name: name.to_string(),
                        expected: 0,
                        got: args.len(),
                        span,
                    });
                }
                Ok(Expr::new(ExprKind::Ref(RefTarget::Rule(
                    self.rule_ids[name],
                ))))
            }
            _ => {
                if let Some(builtin) = Builtin::by_name(name) {
                    let [inner] = args else {
                        return Err(arity_error(name, 1, args.len(), span));
                    };
                    return Ok(Expr::new(ExprKind::Apply(Apply {
                        inner: Box::new(self.compile_expr(inner, scope)?),
                        transform: builtin,
                    })));
                }
                self.compile_template_call(name, args, span, scope)
            }
        }
    }

    fn compile_template_call(
        &mut self,
        name: &str,
        args: &[ast::Expr],
        span: Span,
        scope: &mut Vec<String>,
    ) -> Result<Expr, GrammarError> {
        if let Some(class_template) = self.class_templates.get(name) {
            if class_template.params.len() != args.len() {
                return Err(GrammarError::TemplateArity {
                    name: name.to_string(),
                    expected: class_template.params.len(),
                    got: args.len(),
                    span,
                });
            }
            let params = class_template.params.clone();
            let fields = class_template.fields.clone();
            let mut items = Vec::with_capacity(fields.len());
            let mut field_names = Vec::with_capacity(fields.len());
            for field in &fields {
                let substituted = substitute(&field.expr, &params, args);
                items.push(self.compile_expr(&substituted, scope)?);
                field_names.push(field.name.clone());
            }
            return Ok(Expr::new(ExprKind::Seq(Seq {
                items,
                ctor: Some(SeqCtor {
                    type_name: name.to_string(),
                    field_names,
                }),
            })));
        }

        let Some(template) = self.templates.get(name) else {
            return Err(GrammarError::UndefinedReference {
                name: name.to_string(),
                span,
            });
        };
        if template.params.len() != args.len() {
            return Err(GrammarError::TemplateArity {
                name: name.to_string(),
                expected: template.params.len(),
                got: args.len(),
                span,
            });
        }
        let params: Vec<String> = template.params.clone();
        let body: ast::Expr = template.body.clone();
        let substituted = substitute(&body, &params, args);
        self.compile_expr(&substituted, scope)
    }

    /// `OperatorPrecedence(atom, LeftAssoc(expr), RightAssoc(expr), ...)` (§6.1, S1/S2) — a
    /// call-like form the compiler special-cases rather than resolving as a template, since its
    /// "arguments" after the first are themselves tagged by callee name (`LeftAssoc`, `Prefix`,
    /// ...) rather than plain expressions.
    fn compile_op_prec(
        &mut self,
        args: &[ast::Expr],
        span: Span,
        scope: &mut Vec<String>,
    ) -> Result<Expr, GrammarError> {
        let Some((atom_ast, level_asts)) = args.split_first() else {
            return Err(arity_error("OperatorPrecedence", 1, 0, span));
        };
        let atom = self.compile_expr(atom_ast, scope)?;
        let mut levels = Vec::with_capacity(level_asts.len());
        for level_ast in level_asts {
            let ast::ExprKind::Call(callee, level_args) = &level_ast.kind else {
                return Err(GrammarError::UndefinedReference {
                    name: "<operator-precedence level>".to_string(),
                    span: level_ast.span,
                });
            };
            let ast::ExprKind::Name(kind_name) = &callee.kind else {
                return Err(GrammarError::UndefinedReference {
                    name: "<operator-precedence level>".to_string(),
                    span: callee.span,
                });
            };
            let [operator_ast] = level_args.as_slice() else {
                return Err(arity_error(kind_name, 1, level_args.len(), level_ast.span));
            };
            let operator = self.compile_expr(operator_ast, scope)?;
            let level = match kind_name.as_str() {
                "Postfix" => Level::Postfix(operator),
                "Prefix" => Level::Prefix(operator),
                "LeftAssoc" => Level::LeftAssoc(operator),
                "NonAssoc" => Level::NonAssoc(operator),
                "RightAssoc" => Level::RightAssoc(operator),
                other => {
                    return Err(GrammarError::UndefinedReference {
                        name: other.to_string(),
                        span: callee.span,
                    });
                }
            };
            levels.push(level);
        }
        Ok(Expr::new(ExprKind::OpPrec(OpPrec {
            atom: Box::new(atom),
            levels,
        })))
    }
}

fn arity_error(name: &str, expected: usize, got: usize, span: Span) -> GrammarError {
    GrammarError::TemplateArity {
        name: name.to_string(),
        expected,
        got,
        span,
    }
}

fn local_depth(scope: &[String], name: &str) -> Option<u32> {
    scope
        .iter()
        .rposition(|n| n == name)
        .map(|i| (scope.len() - 1 - i) as u32)
}

/// AST-level beta-reduction (§4.6 "Template invocation ... is a grammar-compile-time
/// substitution"): replaces every unshadowed `Name(param)` in `body` with the corresponding
/// `args` subtree, cloned. Substitution happens before the body is compiled, so the arguments
/// are resolved against the *call site's* lexical scope, exactly as §4.6 step 7's free-variable
/// rule requires.
fn substitute(body: &ast::Expr, params: &[String], args: &[ast::Expr]) -> ast::Expr {
    let map: HashMap<&str, &ast::Expr> = params.iter().map(String::as_str).zip(args).collect();
    subst_expr(body, &map)
}

fn subst_expr(expr: &ast::Expr, map: &HashMap<&str, &ast::Expr>) -> ast::Expr {
    use ast::ExprKind::*;
    let kind = match &expr.kind {
        StrLit(s) => StrLit(s.clone()),
        RegexLit(s) => RegexLit(s.clone()),
        Name(n) => return map.get(n.as_str()).map(|e| (*e).clone()).unwrap_or_else(|| expr.clone()),
        ListLit(items) => ListLit(items.iter().map(|e| subst_expr(e, map)).collect()),
        Seq(items) => Seq(items.iter().map(|e| subst_expr(e, map)).collect()),
        Choice(items) => Choice(items.iter().map(|e| subst_expr(e, map)).collect()),
        DiscardRight(a, b) => DiscardRight(
            Box::new(subst_expr(a, map)),
            Box::new(subst_expr(b, map)),
        ),
        DiscardLeft(a, b) => DiscardLeft(Box::new(subst_expr(a, map)), Box::new(subst_expr(b, map))),
        DiscardRightCommit(a, b) => DiscardRightCommit(
            Box::new(subst_expr(a, map)),
            Box::new(subst_expr(b, map)),
        ),
        DiscardLeftCommit(a, b) => DiscardLeftCommit(
            Box::new(subst_expr(a, map)),
            Box::new(subst_expr(b, map)),
        ),
        Alt(a, b) => Alt(Box::new(subst_expr(a, map)), Box::new(subst_expr(b, map))),
        AltTrailing(a, b) => AltTrailing(Box::new(subst_expr(a, map)), Box::new(subst_expr(b, map))),
        Opt(a) => Opt(Box::new(subst_expr(a, map))),
        Star(a) => Star(Box::new(subst_expr(a, map))),
        Plus(a) => Plus(Box::new(subst_expr(a, map))),
        Commit(a) => Commit(Box::new(subst_expr(a, map))),
        Call(callee, call_args) => Call(
            Box::new(subst_expr(callee, map)),
            call_args.iter().map(|e| subst_expr(e, map)).collect(),
        ),
        Let(name, bound, let_body) => {
            let bound = Box::new(subst_expr(bound, map));
            let body = if map.contains_key(name.as_str()) {
                let mut shadowed = map.clone();
                shadowed.remove(name.as_str());
                Box::new(subst_expr(let_body, &shadowed))
            } else {
                Box::new(subst_expr(let_body, map))
            };
            Let(name.clone(), bound, body)
        }
    };
    ast::Expr { kind, span: expr.span }
}

fn set_skip_ignored(expr: &mut Expr, value: bool) {
    match &mut expr.kind {
        ExprKind::StrLit(s) => s.skip_ignored = value,
        ExprKind::RegexLit(r) => r.skip_ignored = value,
        ExprKind::Ref(_) | ExprKind::Fail(_) => {}
        ExprKind::Seq(s) => s.items.iter_mut().for_each(|e| set_skip_ignored(e, value)),
        ExprKind::Choice(items) | ExprKind::Skip(items) => {
            items.iter_mut().for_each(|e| set_skip_ignored(e, value))
        }
        ExprKind::List(l) => set_skip_ignored(&mut l.inner, value),
        ExprKind::Alt(a) => {
            set_skip_ignored(&mut a.item, value);
            set_skip_ignored(&mut a.sep, value);
        }
        ExprKind::Opt(inner)
        | ExprKind::Expect(inner)
        | ExprKind::ExpectNot(inner)
        | ExprKind::Commit(inner)
        | ExprKind::Checkpoint(inner) => set_skip_ignored(inner, value),
        ExprKind::Left(a, b) | ExprKind::Right(a, b) => {
            set_skip_ignored(a, value);
            set_skip_ignored(b, value);
        }
        ExprKind::Apply(a) => set_skip_ignored(&mut a.inner, value),
        ExprKind::Where(w) => set_skip_ignored(&mut w.inner, value),
        ExprKind::LetExpr(l) => {
            set_skip_ignored(&mut l.bound, value);
            set_skip_ignored(&mut l.body, value);
        }
        ExprKind::OpPrec(o) => {
            set_skip_ignored(&mut o.atom, value);
            for level in &mut o.levels {
                set_skip_ignored(level.operator_mut(), value);
            }
        }
        ExprKind::Recover(r) => {
            set_skip_ignored(&mut r.primary, value);
            r.alternatives.iter_mut().for_each(|e| set_skip_ignored(e, value));
        }
    }
}

/// Best-effort flatten of an ignored rule's body into the leaf matchers that make up the
/// `_ignored` skip sink (§4.6 step 5). Ignored token definitions are, in practice, a single
/// literal or regex (optionally alternated); anything compiled from one still works as a regular
/// rule via `Ref`, it just won't additionally contribute to the fast skip-loop.
fn collect_terminal_matchers(expr: &Expr, literals: &mut Vec<String>, regexes: &mut Vec<RegexMatcher>) {
    match &expr.kind {
        ExprKind::StrLit(s) => literals.push(s.text.clone()),
        ExprKind::RegexLit(r) => regexes.push(r.matcher.clone()),
        ExprKind::Choice(items) => {
            for item in items {
                collect_terminal_matchers(item, literals, regexes);
            }
        }
        ExprKind::Commit(inner) | ExprKind::Checkpoint(inner) => {
            collect_terminal_matchers(inner, literals, regexes)
        }
        ExprKind::List(l) => collect_terminal_matchers(&l.inner, literals, regexes),
        ExprKind::Seq(s) if s.items.len() == 1 => {
            collect_terminal_matchers(&s.items[0], literals, regexes)
        }
        _ => {}
    }
}

fn decode_string_literal(raw: &str) -> String {
    let stripped = if raw.len() >= 6 && (raw.starts_with("'''") || raw.starts_with(r#"""""#)) {
        &raw[3..raw.len() - 3]
    } else {
        &raw[1..raw.len() - 1]
    };
    let mut out = String::with_capacity(stripped.len());
    let mut chars = stripped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn decode_regex_literal(raw: &str) -> String {
    let stripped = &raw[1..raw.len() - 1];
    stripped.replace("\\`", "`")
}

