//! Wire values: the JSON-compatible tree every argument and result crosses
//! the bus as.
//!
//! Native types implement [`WireCodec`] to convert to and from a
//! [`WireValue`]. Implementations are provided for primitives, `char`
//! (carried as its integer code point), strings, JSON objects/arrays,
//! `Option<T>`, and the collections `Vec<T>`, `HashSet<T>` and
//! `HashMap<String, T>`. Enums and records opt in through the
//! [`wire_enum!`](crate::wire_enum) and [`data_object!`](crate::data_object)
//! macros.
//!
//! ## Example
//!
//! ```
//! use service_proxy::wire::{WireCodec, WireValue};
//!
//! let wire = 'A'.encode();
//! assert_eq!(wire, WireValue::from(65));
//! assert_eq!(char::decode(&wire).unwrap(), 'A');
//! ```

mod codec;
mod error;
mod shape;

pub use codec::{DataObject, WireCodec};
pub use error::{DecodeError, EncodeError};
pub use shape::Shape;

/// A JSON-compatible wire value.
pub type WireValue = serde_json::Value;

/// A wire mapping from string keys to wire values (a JSON object).
pub type WireObject = serde_json::Map<String, WireValue>;

/// Implement [`WireCodec`] for a fieldless enum.
///
/// Variants travel as their exact, case-sensitive names. Decoding an unknown
/// name fails with [`DecodeError::InvalidEnumLiteral`].
///
/// ```
/// use service_proxy::wire::{WireCodec, WireValue};
///
/// #[derive(Debug, PartialEq)]
/// enum Colour { Red, Green }
///
/// service_proxy::wire_enum!(Colour { Red, Green });
///
/// assert_eq!(Colour::Green.encode(), WireValue::from("Green"));
/// assert_eq!(Colour::decode(&WireValue::from("Red")).unwrap(), Colour::Red);
/// assert!(Colour::decode(&WireValue::from("red")).is_err());
/// ```
#[macro_export]
macro_rules! wire_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::wire::WireCodec for $ty {
            fn encode(&self) -> $crate::wire::WireValue {
                match self {
                    $( $ty::$variant => $crate::wire::WireValue::String(
                        ::std::string::String::from(stringify!($variant)),
                    ), )+
                }
            }

            fn decode(
                value: &$crate::wire::WireValue,
            ) -> ::std::result::Result<Self, $crate::wire::DecodeError> {
                let literal = value
                    .as_str()
                    .ok_or_else(|| $crate::wire::DecodeError::mismatch("enum literal", value))?;
                match literal {
                    $( stringify!($variant) => Ok($ty::$variant), )+
                    other => Err($crate::wire::DecodeError::InvalidEnumLiteral {
                        enum_name: stringify!($ty),
                        literal: other.to_string(),
                    }),
                }
            }

            fn shape() -> $crate::wire::Shape {
                $crate::wire::Shape::Enum {
                    name: stringify!($ty),
                    members: &[$(stringify!($variant)),+],
                }
            }
        }
    };
}

/// Implement [`WireCodec`] for a record ("data object").
///
/// Two forms:
///
/// - `data_object!(Type)` delegates to the type's [`DataObject`]
///   implementation (a hand-written constructor from a wire mapping).
/// - `data_object!(serde Type)` goes through the type's serde
///   `Serialize`/`Deserialize` derive.
///
/// Either way the record travels as a wire mapping. A serde record whose
/// serializer fails reports [`EncodeError::Record`] from `try_encode`.
#[macro_export]
macro_rules! data_object {
    (serde $ty:ty) => {
        impl $crate::wire::WireCodec for $ty {
            fn encode(&self) -> $crate::wire::WireValue {
                $crate::wire::WireCodec::try_encode(self).unwrap_or_else(|err| {
                    $crate::__private::tracing::warn!(error = %err, "record failed to encode");
                    $crate::wire::WireValue::Null
                })
            }

            fn try_encode(
                &self,
            ) -> ::std::result::Result<$crate::wire::WireValue, $crate::wire::EncodeError> {
                $crate::__private::serde_json::to_value(self).map_err(|err| {
                    $crate::wire::EncodeError::Record {
                        record: stringify!($ty),
                        message: err.to_string(),
                    }
                })
            }

            fn decode(
                value: &$crate::wire::WireValue,
            ) -> ::std::result::Result<Self, $crate::wire::DecodeError> {
                if !value.is_object() {
                    return Err($crate::wire::DecodeError::mismatch("object", value));
                }
                $crate::__private::serde_json::from_value(value.clone())
                    .map_err(|err| $crate::wire::DecodeError::Invalid(err.to_string()))
            }

            fn shape() -> $crate::wire::Shape {
                $crate::wire::Shape::DataObject(stringify!($ty))
            }
        }
    };
    ($ty:ty) => {
        impl $crate::wire::WireCodec for $ty {
            fn encode(&self) -> $crate::wire::WireValue {
                $crate::wire::WireValue::Object($crate::wire::DataObject::to_json(self))
            }

            fn decode(
                value: &$crate::wire::WireValue,
            ) -> ::std::result::Result<Self, $crate::wire::DecodeError> {
                match value {
                    $crate::wire::WireValue::Object(json) => {
                        <$ty as $crate::wire::DataObject>::from_json(json)
                    }
                    other => Err($crate::wire::DecodeError::mismatch("object", other)),
                }
            }

            fn shape() -> $crate::wire::Shape {
                $crate::wire::Shape::DataObject(stringify!($ty))
            }
        }
    };
}
