//! Error taxonomy: compile-time, parse-time, and internal-invariant errors.
//!
//! Grounded on the teacher's top-level `Error` enum (`lib.rs`), widened into three enums since
//! this crate has two distinct failure stages (compiling a grammar, running a parse) plus an
//! internal class (fuel/depth exhaustion) that the teacher folds into its single `Error` type.

use crate::diagnostics::Diagnostic;
use crate::span::Span;

/// Failure while compiling a grammar description into a [`crate::Grammar`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum GrammarError {
    #[error("parse error in grammar source: {0}")]
    Syntax(#[from] MetaSyntaxError),

    #[error("duplicate definition of `{name}`")]
    DuplicateDefinition { name: String, span: Span },

    #[error("reserved name `{name}` cannot be defined")]
    ReservedName { name: String, span: Span },

    #[error("undefined reference to `{name}`")]
    UndefinedReference { name: String, span: Span },

    #[error("grammar has no `start` rule")]
    MissingStart,

    #[error("`start` cannot be marked `ignored`")]
    StartIsIgnored { span: Span },

    #[error("template `{name}` applied with {got} argument(s), expected {expected}")]
    TemplateArity {
        name: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("invalid regular expression in token `{name}`: {reason}")]
    InvalidRegex {
        name: String,
        span: Span,
        reason: String,
    },
}

impl GrammarError {
    /// Render this error against the grammar source that produced it, when a span is available.
    pub fn render(&self, source: &str) -> String {
        match self.span() {
            Some(span) => Diagnostic::error(span, self.to_string()).render(source),
            None => self.to_string(),
        }
    }

    fn span(&self) -> Option<Span> {
        match self {
            GrammarError::Syntax(e) => Some(e.span),
            GrammarError::DuplicateDefinition { span, .. }
            | GrammarError::ReservedName { span, .. }
            | GrammarError::UndefinedReference { span, .. }
            | GrammarError::StartIsIgnored { span }
            | GrammarError::TemplateArity { span, .. }
            | GrammarError::InvalidRegex { span, .. } => Some(*span),
            GrammarError::MissingStart => None,
        }
    }
}

/// A syntax error raised while tokenizing or parsing the grammar-description text itself.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct MetaSyntaxError {
    pub message: String,
    pub span: Span,
}

impl MetaSyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Failure while running a compiled grammar's parser against input text.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub pos: usize,
    #[source]
    pub internal: Option<InternalError>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: usize) -> Self {
        Self {
            message: message.into(),
            pos,
            internal: None,
        }
    }

    pub fn from_internal(err: InternalError) -> Self {
        Self {
            message: err.to_string(),
            pos: 0,
            internal: Some(err),
        }
    }

    /// Render this failure as a source-annotated diagnostic pointing at [`Self::pos`].
    pub fn render(&self, source: &str) -> String {
        Diagnostic::error(Span::point(self.pos), &self.message).render(source)
    }
}

/// An evaluator invariant violation or resource-limit overrun.
///
/// Reaching one of these never indicates malformed *input*; it indicates a pathological or
/// (in the `Cycle` case) erroneous grammar. Surfaced to callers as a [`ParseError`] rather than
/// a panic, per the crate's "never panic on well-formed calls" rule.
#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum InternalError {
    #[error("parser step limit exceeded ({limit} steps)")]
    FuelExhausted { limit: usize },

    #[error("parser recursion limit exceeded ({limit} frames)")]
    RecursionLimitExceeded { limit: usize },

    #[error("grammar rule `{0:?}` is left-recursive without an operator-precedence frame")]
    UnguardedLeftRecursion(u32),
}
