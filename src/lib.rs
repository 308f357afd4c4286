//! A parser generator: compiles a textual grammar description into an in-memory, packrat-memoized
//! parser over an expression-combinator algebra (sequence, choice, repetition, operator-precedence
//! climbing, lookahead, `recover` fallbacks) and drives it with an explicit heap-allocated call
//! stack rather than host recursion, so deep grammars over long input never overflow the Rust
//! stack.
//!
//! Grounded on the teacher crate's layering (`ql` surface syntax → `ir`/`compiler` lowering →
//! `engine` bytecode driver), re-targeted from tree-sitter queries to a general-purpose PEG
//! grammar language (see `TEACHER.txt`, `DESIGN.md`).

pub mod algebra;
pub mod compiler;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod facade;
pub mod metagrammar;
pub mod program;
pub mod span;
pub mod token;
pub mod value;

pub use compiler::compile_grammar;
pub use error::{GrammarError, InternalError, MetaSyntaxError, ParseError};
pub use facade::{Grammar, GrammarBuilder, Rule};
pub use value::{Node, Value};
