use std::fmt;

use crate::wire::DecodeError;

/// Failure code carried by every failure reply.
///
/// The convention does not distinguish failure categories on the wire:
/// protocol, decode and application failures all use this code and differ
/// only in their message.
pub const FAILURE_CODE: i32 = -1;

/// A failure as it travels on the bus: a numeric code and a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub code: i32,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A failure with the generic [`FAILURE_CODE`].
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(FAILURE_CODE, message)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for ServiceError {}

impl From<DecodeError> for ServiceError {
    fn from(err: DecodeError) -> Self {
        ServiceError::generic(err.to_string())
    }
}
