//! Decode and encode errors for wire values.

use std::error::Error;
use std::fmt;

use super::WireValue;

/// Error raised when a wire value does not have the shape a decoder expects.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// A declared argument is absent from the request body.
    MissingField(String),
    /// The wire value has the wrong JSON type.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A number does not fit the target width.
    OutOfRange {
        expected: &'static str,
        value: String,
    },
    /// A string does not name any member of the target enum.
    InvalidEnumLiteral {
        enum_name: &'static str,
        literal: String,
    },
    /// An integer is not a valid character code point.
    InvalidChar(u64),
    /// An argument was read that the action never declared.
    UndeclaredParameter(String),
    /// A record rejected its wire mapping.
    Invalid(String),
    /// The failure happened inside a named field.
    Field {
        name: String,
        source: Box<DecodeError>,
    },
    /// The failure happened at a collection index.
    Element {
        index: usize,
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Build a `TypeMismatch` from the value that was actually found.
    pub fn mismatch(expected: &'static str, found: &WireValue) -> Self {
        DecodeError::TypeMismatch {
            expected,
            found: kind_of(found),
        }
    }

    /// Wrap this error with the field it occurred in.
    pub fn in_field(self, name: impl Into<String>) -> Self {
        DecodeError::Field {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Wrap this error with the collection index it occurred at.
    pub fn at_index(self, index: usize) -> Self {
        DecodeError::Element {
            index,
            source: Box::new(self),
        }
    }
}

/// Human-readable JSON type name for error messages.
pub(crate) fn kind_of(value: &WireValue) -> &'static str {
    match value {
        WireValue::Null => "null",
        WireValue::Bool(_) => "boolean",
        WireValue::Number(n) if n.is_f64() => "float",
        WireValue::Number(_) => "integer",
        WireValue::String(_) => "string",
        WireValue::Array(_) => "array",
        WireValue::Object(_) => "object",
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingField(name) => write!(f, "missing field `{}`", name),
            DecodeError::TypeMismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            DecodeError::OutOfRange { expected, value } => {
                write!(f, "value {} out of range for {}", value, expected)
            }
            DecodeError::InvalidEnumLiteral { enum_name, literal } => {
                write!(f, "invalid enum literal `{}` for {}", literal, enum_name)
            }
            DecodeError::InvalidChar(code) => write!(f, "invalid character code point {}", code),
            DecodeError::UndeclaredParameter(name) => {
                write!(f, "parameter `{}` is not declared by this action", name)
            }
            DecodeError::Invalid(msg) => write!(f, "invalid record: {}", msg),
            DecodeError::Field { name, source } => write!(f, "field `{}`: {}", name, source),
            DecodeError::Element { index, source } => write!(f, "[{}]: {}", index, source),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DecodeError::Field { source, .. } | DecodeError::Element { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }
}

/// Error raised when a native value has no wire representation.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// JSON numbers cannot carry NaN or the infinities.
    NonFiniteFloat(f64),
    /// A record's serializer refused it.
    Record {
        record: &'static str,
        message: String,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::NonFiniteFloat(value) => {
                write!(f, "cannot encode non-finite number {}", value)
            }
            EncodeError::Record { record, message } => {
                write!(f, "cannot encode {}: {}", record, message)
            }
        }
    }
}

impl Error for EncodeError {}
