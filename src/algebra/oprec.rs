//! Operator-precedence levels (C1/C4, §4.3).
//!
//! Grounded on the original source's `OperatorPrecedenceRule` family
//! (`sourcer/parsing_expressions.py`: `Postfix`, `Prefix`, `LeftAssoc`, `NonAssoc`, `RightAssoc`),
//! re-expressed as a plain enum over this crate's `Expr` rather than a class hierarchy.

use super::Expr;

/// One precedence level of an `OpPrec` climber, from tightest- to loosest-binding in source order
/// (each level consumes the previous level's result as its operand, per §4.3).
#[derive(Debug, Clone)]
pub enum Level {
    Postfix(Expr),
    Prefix(Expr),
    LeftAssoc(Expr),
    NonAssoc(Expr),
    RightAssoc(Expr),
}

impl Level {
    pub fn operator(&self) -> &Expr {
        match self {
            Level::Postfix(e)
            | Level::Prefix(e)
            | Level::LeftAssoc(e)
            | Level::NonAssoc(e)
            | Level::RightAssoc(e) => e,
        }
    }

    pub fn operator_mut(&mut self) -> &mut Expr {
        match self {
            Level::Postfix(e)
            | Level::Prefix(e)
            | Level::LeftAssoc(e)
            | Level::NonAssoc(e)
            | Level::RightAssoc(e) => e,
        }
    }

    pub fn contains_commit(&self) -> bool {
        self.operator().contains_commit()
    }
}
