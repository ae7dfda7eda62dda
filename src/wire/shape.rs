//! Shape tags: the descriptor-level view of a parameter or result type.
//!
//! Every [`WireCodec`](super::WireCodec) reports its `Shape`. The action
//! registry records the shape of each declared parameter, and the dispatcher
//! checks a request body against those shapes before any argument is decoded.

use std::fmt;

use super::error::DecodeError;
use super::{WireObject, WireValue};

/// Wire shape of a declared parameter or result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Any wire value (JSON passthrough).
    Any,
    /// Only `null` (void results).
    Null,
    Bool,
    Integer,
    Float,
    /// A character carried as its integer code point.
    Char,
    String,
    /// A JSON object passed through untouched.
    Object,
    /// A JSON array passed through untouched.
    Array,
    Enum {
        name: &'static str,
        members: &'static [&'static str],
    },
    /// A record with its own mapping constructor.
    DataObject(&'static str),
    List(Box<Shape>),
    Set(Box<Shape>),
    /// String-keyed mapping.
    Map(Box<Shape>),
    /// Missing or null is accepted.
    Optional(Box<Shape>),
}

impl Shape {
    /// Check a wire value against this shape.
    ///
    /// This is structural: number widths and code-point validity are left to
    /// the typed decoder.
    pub fn check(&self, value: &WireValue) -> Result<(), DecodeError> {
        match self {
            Shape::Any => Ok(()),
            Shape::Null => expect(value.is_null(), "null", value),
            Shape::Bool => expect(value.is_boolean(), "boolean", value),
            Shape::Integer => expect(value.is_i64() || value.is_u64(), "integer", value),
            Shape::Float => expect(value.is_number(), "number", value),
            Shape::Char => expect(value.is_u64(), "character code point", value),
            Shape::String => expect(value.is_string(), "string", value),
            Shape::Object | Shape::DataObject(_) => expect(value.is_object(), "object", value),
            Shape::Array => expect(value.is_array(), "array", value),
            Shape::Enum { name, members } => {
                let literal = value
                    .as_str()
                    .ok_or_else(|| DecodeError::mismatch("enum literal", value))?;
                if members.iter().any(|member| *member == literal) {
                    Ok(())
                } else {
                    Err(DecodeError::InvalidEnumLiteral {
                        enum_name: *name,
                        literal: literal.to_string(),
                    })
                }
            }
            Shape::List(element) | Shape::Set(element) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| DecodeError::mismatch("array", value))?;
                for (index, item) in items.iter().enumerate() {
                    element.check(item).map_err(|e| e.at_index(index))?;
                }
                Ok(())
            }
            Shape::Map(element) => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| DecodeError::mismatch("object", value))?;
                for (key, item) in entries {
                    element.check(item).map_err(|e| e.in_field(key.as_str()))?;
                }
                Ok(())
            }
            Shape::Optional(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.check(value)
                }
            }
        }
    }

    /// Check the named field of a request body against this shape.
    ///
    /// An absent field passes for the shapes whose codecs supply a value
    /// when the field is missing.
    pub fn check_field(&self, name: &str, body: &WireObject) -> Result<(), DecodeError> {
        match body.get(name) {
            Some(value) => self.check(value).map_err(|e| e.in_field(name)),
            None if matches!(self, Shape::Optional(_) | Shape::Any | Shape::Null) => Ok(()),
            None => Err(DecodeError::MissingField(name.to_string())),
        }
    }
}

fn expect(ok: bool, expected: &'static str, value: &WireValue) -> Result<(), DecodeError> {
    if ok {
        Ok(())
    } else {
        Err(DecodeError::mismatch(expected, value))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => write!(f, "any"),
            Shape::Null => write!(f, "null"),
            Shape::Bool => write!(f, "boolean"),
            Shape::Integer => write!(f, "integer"),
            Shape::Float => write!(f, "float"),
            Shape::Char => write!(f, "char"),
            Shape::String => write!(f, "string"),
            Shape::Object => write!(f, "object"),
            Shape::Array => write!(f, "array"),
            Shape::Enum { name, .. } => write!(f, "enum {}", name),
            Shape::DataObject(name) => write!(f, "{}", name),
            Shape::List(element) => write!(f, "list<{}>", element),
            Shape::Set(element) => write!(f, "set<{}>", element),
            Shape::Map(element) => write!(f, "map<string, {}>", element),
            Shape::Optional(inner) => write!(f, "{}?", inner),
        }
    }
}
