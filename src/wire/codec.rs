//! `WireCodec`: conversion between native values and wire values.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use super::error::{DecodeError, EncodeError};
use super::shape::Shape;
use super::{WireObject, WireValue};

/// Conversion between a native value and its wire representation.
///
/// `decode` is total over well-formed input and returns a typed
/// [`DecodeError`] for anything else; it never panics.
///
/// `encode` is the infallible form. Values with no wire representation
/// (non-finite floats, records whose serializer fails) encode as `null`
/// there; `try_encode` reports them as an [`EncodeError`] instead, and is
/// what the dispatch and client paths use.
pub trait WireCodec: Sized {
    /// Encode this value as a wire value.
    fn encode(&self) -> WireValue;

    /// Encode this value, failing if it has no wire representation.
    fn try_encode(&self) -> Result<WireValue, EncodeError> {
        Ok(self.encode())
    }

    /// Decode a wire value into this type.
    fn decode(value: &WireValue) -> Result<Self, DecodeError>;

    /// The descriptor shape of this type.
    fn shape() -> Shape;

    /// Value to use when the field is absent from the request body.
    ///
    /// `None` means the field is required.
    fn missing() -> Option<Self> {
        None
    }
}

/// A record that converts to and from a wire mapping.
///
/// Pair with [`data_object!`](crate::data_object) to make the record usable
/// as a parameter or result.
pub trait DataObject: Sized {
    /// Construct the record from its wire mapping.
    fn from_json(json: &WireObject) -> Result<Self, DecodeError>;

    /// Convert the record to its wire mapping.
    fn to_json(&self) -> WireObject;
}

macro_rules! signed_codec {
    ($($ty:ty),+) => {$(
        impl WireCodec for $ty {
            fn encode(&self) -> WireValue {
                WireValue::from(*self)
            }

            fn decode(value: &WireValue) -> Result<Self, DecodeError> {
                let wide = match (value.as_i64(), value.as_u64()) {
                    (Some(wide), _) => wide,
                    (None, Some(big)) => {
                        return Err(DecodeError::OutOfRange {
                            expected: stringify!($ty),
                            value: big.to_string(),
                        })
                    }
                    (None, None) => return Err(DecodeError::mismatch("integer", value)),
                };
                <$ty>::try_from(wide).map_err(|_| DecodeError::OutOfRange {
                    expected: stringify!($ty),
                    value: wide.to_string(),
                })
            }

            fn shape() -> Shape {
                Shape::Integer
            }
        }
    )+};
}

macro_rules! unsigned_codec {
    ($($ty:ty),+) => {$(
        impl WireCodec for $ty {
            fn encode(&self) -> WireValue {
                WireValue::from(*self)
            }

            fn decode(value: &WireValue) -> Result<Self, DecodeError> {
                let wide = value
                    .as_u64()
                    .ok_or_else(|| DecodeError::mismatch("unsigned integer", value))?;
                <$ty>::try_from(wide).map_err(|_| DecodeError::OutOfRange {
                    expected: stringify!($ty),
                    value: wide.to_string(),
                })
            }

            fn shape() -> Shape {
                Shape::Integer
            }
        }
    )+};
}

signed_codec!(i8, i16, i32, i64);
unsigned_codec!(u8, u16, u32, u64);

fn finite(value: f64) -> Result<WireValue, EncodeError> {
    serde_json::Number::from_f64(value)
        .map(WireValue::Number)
        .ok_or(EncodeError::NonFiniteFloat(value))
}

impl WireCodec for f64 {
    fn encode(&self) -> WireValue {
        WireValue::from(*self)
    }

    fn try_encode(&self) -> Result<WireValue, EncodeError> {
        finite(*self)
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        value
            .as_f64()
            .ok_or_else(|| DecodeError::mismatch("number", value))
    }

    fn shape() -> Shape {
        Shape::Float
    }
}

impl WireCodec for f32 {
    fn encode(&self) -> WireValue {
        WireValue::from(f64::from(*self))
    }

    fn try_encode(&self) -> Result<WireValue, EncodeError> {
        finite(f64::from(*self))
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        // Narrowing, as a cast from the wider float would.
        f64::decode(value).map(|wide| wide as f32)
    }

    fn shape() -> Shape {
        Shape::Float
    }
}

impl WireCodec for bool {
    fn encode(&self) -> WireValue {
        WireValue::Bool(*self)
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        value
            .as_bool()
            .ok_or_else(|| DecodeError::mismatch("boolean", value))
    }

    fn shape() -> Shape {
        Shape::Bool
    }
}

/// Characters travel as their integer code point.
impl WireCodec for char {
    fn encode(&self) -> WireValue {
        WireValue::from(u32::from(*self))
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        let code = value
            .as_u64()
            .ok_or_else(|| DecodeError::mismatch("character code point", value))?;
        u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or(DecodeError::InvalidChar(code))
    }

    fn shape() -> Shape {
        Shape::Char
    }
}

impl WireCodec for String {
    fn encode(&self) -> WireValue {
        WireValue::String(self.clone())
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DecodeError::mismatch("string", value))
    }

    fn shape() -> Shape {
        Shape::String
    }
}

/// Void results reply with `null`.
impl WireCodec for () {
    fn encode(&self) -> WireValue {
        WireValue::Null
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        if value.is_null() {
            Ok(())
        } else {
            Err(DecodeError::mismatch("null", value))
        }
    }

    fn shape() -> Shape {
        Shape::Null
    }

    fn missing() -> Option<Self> {
        Some(())
    }
}

/// Any JSON value, passed through untouched.
impl WireCodec for WireValue {
    fn encode(&self) -> WireValue {
        self.clone()
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        Ok(value.clone())
    }

    fn shape() -> Shape {
        Shape::Any
    }

    fn missing() -> Option<Self> {
        Some(WireValue::Null)
    }
}

/// A JSON object, passed through untouched.
impl WireCodec for WireObject {
    fn encode(&self) -> WireValue {
        WireValue::Object(self.clone())
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| DecodeError::mismatch("object", value))
    }

    fn shape() -> Shape {
        Shape::Object
    }
}

/// Boxed values: missing or `null` decode to `None`.
impl<T: WireCodec> WireCodec for Option<T> {
    fn encode(&self) -> WireValue {
        match self {
            Some(value) => value.encode(),
            None => WireValue::Null,
        }
    }

    fn try_encode(&self) -> Result<WireValue, EncodeError> {
        match self {
            Some(value) => value.try_encode(),
            None => Ok(WireValue::Null),
        }
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::decode(value).map(Some)
        }
    }

    fn shape() -> Shape {
        Shape::Optional(Box::new(T::shape()))
    }

    fn missing() -> Option<Self> {
        Some(None)
    }
}

/// Ordered list: element order is preserved both ways.
impl<T: WireCodec> WireCodec for Vec<T> {
    fn encode(&self) -> WireValue {
        WireValue::Array(self.iter().map(WireCodec::encode).collect())
    }

    fn try_encode(&self) -> Result<WireValue, EncodeError> {
        encode_elements(self.iter())
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        decode_elements(value)
    }

    fn shape() -> Shape {
        Shape::List(Box::new(T::shape()))
    }
}

/// Set: travels as an array; duplicates collapse on decode and the encoded
/// order is whatever the set iterates in.
impl<T: WireCodec + Eq + Hash> WireCodec for HashSet<T> {
    fn encode(&self) -> WireValue {
        WireValue::Array(self.iter().map(WireCodec::encode).collect())
    }

    fn try_encode(&self) -> Result<WireValue, EncodeError> {
        encode_elements(self.iter())
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        decode_elements(value)
    }

    fn shape() -> Shape {
        Shape::Set(Box::new(T::shape()))
    }
}

impl<T: WireCodec> WireCodec for HashMap<String, T> {
    fn encode(&self) -> WireValue {
        WireValue::Object(
            self.iter()
                .map(|(key, value)| (key.clone(), value.encode()))
                .collect(),
        )
    }

    fn try_encode(&self) -> Result<WireValue, EncodeError> {
        self.iter()
            .map(|(key, value)| Ok((key.clone(), value.try_encode()?)))
            .collect::<Result<WireObject, EncodeError>>()
            .map(WireValue::Object)
    }

    fn decode(value: &WireValue) -> Result<Self, DecodeError> {
        let entries = value
            .as_object()
            .ok_or_else(|| DecodeError::mismatch("object", value))?;
        entries
            .iter()
            .map(|(key, item)| {
                T::decode(item)
                    .map(|decoded| (key.clone(), decoded))
                    .map_err(|e| e.in_field(key.as_str()))
            })
            .collect()
    }

    fn shape() -> Shape {
        Shape::Map(Box::new(T::shape()))
    }
}

fn encode_elements<'a, T: WireCodec + 'a>(
    items: impl Iterator<Item = &'a T>,
) -> Result<WireValue, EncodeError> {
    items
        .map(WireCodec::try_encode)
        .collect::<Result<Vec<_>, _>>()
        .map(WireValue::Array)
}

fn decode_elements<T, C>(value: &WireValue) -> Result<C, DecodeError>
where
    T: WireCodec,
    C: FromIterator<T>,
{
    let items = value
        .as_array()
        .ok_or_else(|| DecodeError::mismatch("array", value))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| T::decode(item).map_err(|e| e.at_index(index)))
        .collect()
}
