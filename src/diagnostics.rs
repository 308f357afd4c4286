//! Rendering a single diagnostic against its source text.
//!
//! Grounded on the teacher's `diagnostics::printer` module, simplified to one diagnostic at a
//! time: a grammar compile fails with one `GrammarError`, and a parse attempt reports exactly one
//! farthest failure, so there is never a collection to iterate.

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use crate::span::Span;

/// Severity level of a rendered diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single renderable diagnostic: a message anchored at a span.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
        }
    }

    /// Plain, source-free rendering: `error at 12..15: unexpected token`.
    pub fn render_plain(&self) -> String {
        format!(
            "{} at {}..{}: {}",
            self.severity, self.span.start, self.span.end, self.message
        )
    }

    /// Source-annotated rendering via `annotate-snippets`, falling back to [`render_plain`] when
    /// `colored` rendering isn't needed and the caller just wants a quick string.
    pub fn render(&self, source: &str) -> String {
        let range = adjust_range(self.span, source.len());
        let level = match self.severity {
            Severity::Error => Level::ERROR,
            Severity::Warning => Level::WARNING,
        };
        let snippet = Snippet::source(source)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(range).label(&self.message));
        let report = level.primary_title(&self.message).element(snippet);
        Renderer::plain().render(&[report]).to_string()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render_plain())
    }
}

fn adjust_range(span: Span, limit: usize) -> std::ops::Range<usize> {
    if span.is_empty() {
        return span.start..(span.start + 1).min(limit);
    }
    span.start..span.end
}
