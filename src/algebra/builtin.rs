//! Named transform and predicate functions usable from `Apply`/`Where`.
//!
//! Design note §9 warns against letting `Apply`'s transform (and, by the same reasoning, `Where`'s
//! predicate) carry a host-language closure in the `Expression` tree: that would make the IR
//! neither `Clone` nor safely shareable across parse invocations. This crate instead binds a
//! small, fixed set of named functions that a grammar's `PARAM(args)` transform-call syntax
//! resolves against at grammar-compile time (see `compiler::resolve_builtin`), mirroring how the
//! original Python source bound plain callables (`int`, `BinaryOperation`, …) in its initial
//! environment — except here the set is closed and enumerable rather than arbitrary host code.
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Returns its argument unchanged.
    Identity,
    /// Parses a `Text` value as a base-10 integer.
    ParseInt,
    /// Concatenates a `List` of `Text` values into one `Text`.
    Concat,
    /// Given a 2-element list, keeps the first element.
    First,
    /// Given a 2-element list, keeps the second element.
    Second,
    /// Predicate: true iff the value is not `Null` and not an empty list/text.
    IsNotEmpty,
    /// Predicate: logical negation of [`Builtin::IsNotEmpty`]-style truthiness.
    Not,
}

impl Builtin {
    pub fn by_name(name: &str) -> Option<Builtin> {
        Some(match name {
            "identity" => Builtin::Identity,
            "int" => Builtin::ParseInt,
            "concat" => Builtin::Concat,
            "first" => Builtin::First,
            "second" => Builtin::Second,
            "is_not_empty" => Builtin::IsNotEmpty,
            "not" => Builtin::Not,
            _ => return None,
        })
    }

    /// Applies this function as a value transform (used by `Apply`).
    pub fn apply(self, input: Value) -> Value {
        match self {
            Builtin::Identity => input,
            Builtin::ParseInt => match &input {
                Value::Text(s) => s.parse::<i64>().map(Value::Int).unwrap_or(Value::Null),
                _ => Value::Null,
            },
            Builtin::Concat => match input {
                Value::List(items) => {
                    let mut out = String::new();
                    for item in items {
                        if let Value::Text(s) = item {
                            out.push_str(&s);
                        }
                    }
                    Value::Text(out)
                }
                other => other,
            },
            Builtin::First => match input {
                Value::List(mut items) if !items.is_empty() => items.swap_remove(0),
                other => other,
            },
            Builtin::Second => match input {
                Value::List(items) if items.len() > 1 => items.into_iter().nth(1).unwrap(),
                _ => Value::Null,
            },
            Builtin::IsNotEmpty => Value::Bool(input.is_truthy()),
            Builtin::Not => Value::Bool(!input.is_truthy()),
        }
    }

    /// Applies this function as a boolean predicate (used by `Where`).
    pub fn test(self, input: &Value) -> bool {
        self.apply(input.clone()).is_truthy()
    }
}
