//! The parse-tree value model (C4).
//!
//! Grounded on the teacher's `engine::value::Value` (a serde-friendly tagged result tree) and its
//! `ir` node-shape conventions, adapted to this crate's untyped-but-structured result: generic
//! scalars and lists, `class`-built named-field records, and the three operator-precedence node
//! shapes.

use std::fmt;

use indexmap::IndexMap;

/// A value produced by running a compiled grammar against input text.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a value: `Opt` on inner failure, `Skip`'s result, `Where`'s rejected case.
    Null,
    /// A matched slice of source text (from `StrLit`/`RegexLit`/token rules).
    Text(String),
    /// An ordered, possibly empty, list (from `Seq` without a constructor, `List`, `Alt`).
    List(Vec<Value>),
    /// A `class`-built record with named fields in declaration order.
    Node(Node),
    /// A generic binary operator application, from `LeftAssoc`/`RightAssoc`/`NonAssoc` levels.
    Infix(Box<Infix>),
    /// A prefix operator application, from a `Prefix` level.
    Prefix(Box<Prefix>),
    /// A postfix operator application, from a `Postfix` level.
    Postfix(Box<Postfix>),
    /// An integer produced by a built-in transform (e.g. the `int` conversion).
    Int(i64),
    /// A boolean produced by a built-in predicate or literal.
    Bool(bool),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Node(n) => write!(f, "{n}"),
            Value::Infix(i) => write!(f, "Infix({}, {:?}, {})", i.left, i.op, i.right),
            Value::Prefix(p) => write!(f, "Prefix({:?}, {})", p.op, p.right),
            Value::Postfix(p) => write!(f, "Postfix({}, {:?})", p.left, p.op),
        }
    }
}

/// A `class`-constructed record: a type name plus an ordered field map.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Node {
    pub type_name: String,
    pub fields: IndexMap<String, Value>,
}

impl Node {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Infix {
    pub left: Value,
    pub op: Value,
    pub right: Value,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Prefix {
    pub op: Value,
    pub right: Value,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Postfix {
    pub left: Value,
    pub op: Value,
}
