//! Event-bus service proxies.
//!
//! A service is exposed at a bus address behind a [`proxy::Dispatcher`].
//! Callers send messages whose `action` header names the operation and
//! whose body carries the arguments by name; the dispatcher decodes the
//! arguments through the [`wire`] codec, invokes the service, and replies
//! with exactly one success or failure, or nothing for fluent actions.
//! Actions may return another service, which is registered under a fresh
//! address that the caller then talks to directly.
//!
//! - [`wire`]: JSON wire values and typed codecs
//! - [`bus`]: the transport contract and an in-memory bus
//! - [`proxy`]: action registry, dispatcher, replies, clients

pub mod bus;
mod error;
pub mod proxy;
pub mod wire;

pub use error::{ServiceError, FAILURE_CODE};
pub use proxy::{
    create_proxy, register_service, CallArgs, CallError, DeliveryOptions, Interface, ProxyClient,
    Reply, ServiceHandle,
};
pub use wire::{DecodeError, EncodeError, WireCodec, WireValue};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
    pub use tracing;
}
