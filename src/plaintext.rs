//! Plaintext kinds and their string rendering.
//!
//! Every plaintext travels in the envelope's `p` field as a string:
//! text as-is, integers in base 10, booleans as `true`/`false`, and
//! documents as compact JSON text.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{CodecError, Result};

/// JSON object stored in a `jsonb` column.
pub type Document = Map<String, Value>;

/// The closed set of plaintext kinds the codec renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaintextKind {
    Text,
    Integer,
    Boolean,
    Document,
}

impl fmt::Display for PlaintextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaintextKind::Text => "text",
            PlaintextKind::Integer => "integer",
            PlaintextKind::Boolean => "boolean",
            PlaintextKind::Document => "document",
        };
        f.write_str(name)
    }
}

/// A typed application value that can ride in an envelope.
///
/// The implementing type decides how `p` is parsed on read; the codec
/// never infers the kind from the envelope itself.
pub trait Plaintext: Sized {
    const KIND: PlaintextKind;

    /// Render to the string stored in `p`.
    fn render(&self) -> Result<String>;

    /// Parse the string found in `p`.
    fn parse(p: &str) -> Result<Self>;
}

impl Plaintext for String {
    const KIND: PlaintextKind = PlaintextKind::Text;

    fn render(&self) -> Result<String> {
        Ok(self.clone())
    }

    fn parse(p: &str) -> Result<Self> {
        Ok(p.to_string())
    }
}

impl Plaintext for i64 {
    const KIND: PlaintextKind = PlaintextKind::Integer;

    fn render(&self) -> Result<String> {
        Ok(self.to_string())
    }

    fn parse(p: &str) -> Result<Self> {
        p.parse::<i64>()
            .map_err(|e| CodecError::MalformedNumber(format!("{:?}: {}", p, e)))
    }
}

impl Plaintext for bool {
    const KIND: PlaintextKind = PlaintextKind::Boolean;

    fn render(&self) -> Result<String> {
        Ok(if *self { "true" } else { "false" }.to_string())
    }

    fn parse(p: &str) -> Result<Self> {
        match p {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(CodecError::MalformedBoolean(other.to_string())),
        }
    }
}

impl Plaintext for Document {
    const KIND: PlaintextKind = PlaintextKind::Document;

    fn render(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn parse(p: &str) -> Result<Self> {
        serde_json::from_str::<Document>(p).map_err(|e| CodecError::MalformedDocument(e.to_string()))
    }
}

// ============================================================================
// PlaintextValue — dynamically typed plaintext
// ============================================================================

/// A plaintext whose kind is only known at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaintextValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Document(Document),
}

impl PlaintextValue {
    pub fn kind(&self) -> PlaintextKind {
        match self {
            PlaintextValue::Text(_) => PlaintextKind::Text,
            PlaintextValue::Integer(_) => PlaintextKind::Integer,
            PlaintextValue::Boolean(_) => PlaintextKind::Boolean,
            PlaintextValue::Document(_) => PlaintextKind::Document,
        }
    }

    pub fn render(&self) -> Result<String> {
        match self {
            PlaintextValue::Text(s) => s.render(),
            PlaintextValue::Integer(n) => n.render(),
            PlaintextValue::Boolean(b) => b.render(),
            PlaintextValue::Document(d) => d.render(),
        }
    }

    /// Parse `p` as the given kind.
    pub fn parse(kind: PlaintextKind, p: &str) -> Result<Self> {
        Ok(match kind {
            PlaintextKind::Text => PlaintextValue::Text(p.to_string()),
            PlaintextKind::Integer => PlaintextValue::Integer(i64::parse(p)?),
            PlaintextKind::Boolean => PlaintextValue::Boolean(bool::parse(p)?),
            PlaintextKind::Document => PlaintextValue::Document(Document::parse(p)?),
        })
    }

    /// Classify an arbitrary JSON value.
    ///
    /// Floats, arrays, null and integers outside `i64` have no envelope
    /// rendering and fail with `UnsupportedType`.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(PlaintextValue::Text(s.clone())),
            Value::Bool(b) => Ok(PlaintextValue::Boolean(*b)),
            Value::Object(map) => Ok(PlaintextValue::Document(map.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(PlaintextValue::Integer)
                .ok_or_else(|| CodecError::UnsupportedType(format!("number {}", n))),
            Value::Array(_) => Err(CodecError::UnsupportedType("array".to_string())),
            Value::Null => Err(CodecError::UnsupportedType("null".to_string())),
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            PlaintextValue::Text(s) => Value::String(s),
            PlaintextValue::Integer(n) => Value::from(n),
            PlaintextValue::Boolean(b) => Value::Bool(b),
            PlaintextValue::Document(d) => Value::Object(d),
        }
    }
}

impl TryFrom<Value> for PlaintextValue {
    type Error = CodecError;

    fn try_from(value: Value) -> Result<Self> {
        PlaintextValue::from_json(&value)
    }
}

impl From<String> for PlaintextValue {
    fn from(s: String) -> Self {
        PlaintextValue::Text(s)
    }
}

impl From<&str> for PlaintextValue {
    fn from(s: &str) -> Self {
        PlaintextValue::Text(s.to_string())
    }
}

impl From<i64> for PlaintextValue {
    fn from(n: i64) -> Self {
        PlaintextValue::Integer(n)
    }
}

impl From<bool> for PlaintextValue {
    fn from(b: bool) -> Self {
        PlaintextValue::Boolean(b)
    }
}

impl From<Document> for PlaintextValue {
    fn from(d: Document) -> Self {
        PlaintextValue::Document(d)
    }
}
