//! The compiled, immutable representation of a grammar (§3.3, §5 "immutable post-compilation").

use crate::algebra::{Expr, RuleId};
use crate::token::RegexMatcher;

/// One top-level definition compiled to an expression plus the metadata the driver and facade
/// need about it. Rolls up the distilled spec's `Rule`/`Class`/`TokenClass` table entries
/// (§3.1) as metadata on a registered rule rather than as `Expr` variants: rules only ever occur
/// at the top level of a grammar (the grammar language has no syntax for nesting a rule
/// definition inside an arbitrary sub-expression), so giving `Ref` a `RuleId` to index directly
/// into this table is simpler than modeling "a rule" as something any `Expr` tree could embed.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub expr: Expr,
    pub is_ignored: bool,
    pub is_token: bool,
}

/// A fully compiled grammar, ready to drive parses against arbitrary input text.
#[derive(Debug, Clone)]
pub struct Program {
    pub rules: Vec<CompiledRule>,
    pub start: RuleId,
    /// Literal matchers contributed by `ignored token` definitions, forming the `_ignored` sink.
    pub ignored_literals: Vec<String>,
    /// Regex matchers contributed by `ignored token` definitions, forming the `_ignored` sink.
    pub ignored_regexes: Vec<RegexMatcher>,
}

impl Program {
    pub fn rule_id_by_name(&self, name: &str) -> Option<RuleId> {
        self.rules.iter().position(|r| r.name == name).map(|i| i as RuleId)
    }

    pub fn rule(&self, id: RuleId) -> &CompiledRule {
        &self.rules[id as usize]
    }

    pub fn has_ignored(&self) -> bool {
        !self.ignored_literals.is_empty() || !self.ignored_regexes.is_empty()
    }
}
