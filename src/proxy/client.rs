//! Client Stub: the caller side of the message convention.
//!
//! A [`ProxyClient`] encodes a call into an `action` header plus a body of
//! named arguments, sends it to one address, and decodes the reply into a
//! typed result or a [`CallError`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use service_proxy::bus::{InMemoryBus, Message, Replier, Transport};
//! use service_proxy::proxy::{CallArgs, ProxyClient};
//!
//! let bus = Arc::new(InMemoryBus::new());
//! bus.register("adder", Arc::new(|message: Message, replier: Replier| {
//!     let a = message.body["a"].as_i64().unwrap_or(0);
//!     let b = message.body["b"].as_i64().unwrap_or(0);
//!     replier.reply((a + b).into());
//! })).unwrap();
//!
//! let client = ProxyClient::new(bus, "adder");
//! let sum: i64 = client.call("add", CallArgs::new().arg("a", 2).arg("b", 3)).unwrap();
//! assert_eq!(sum, 5);
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::thread;

use crate::bus::{BusError, Message, Outcome, ReplyMessage, Transport, ACTION_HEADER};
use crate::error::{ServiceError, FAILURE_CODE};
use crate::wire::{DecodeError, EncodeError, WireCodec, WireObject, WireValue};

use super::options::DeliveryOptions;

/// Named arguments for one call.
///
/// An argument that fails to encode is remembered, and the call made with
/// these arguments fails with [`CallError::Encode`] without being sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    body: WireObject,
    /// First argument that failed to encode
    failed: Option<(String, EncodeError)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument. Uses builder pattern: returns `self` for chaining.
    pub fn arg<T: WireCodec>(mut self, name: &str, value: T) -> Self {
        match value.try_encode() {
            Ok(encoded) => {
                self.body.insert(name.to_string(), encoded);
            }
            Err(err) => {
                if self.failed.is_none() {
                    self.failed = Some((name.to_string(), err));
                }
            }
        }
        self
    }

    /// The request body these arguments encode to.
    pub fn into_body(self) -> Result<WireValue, CallError> {
        match self.failed {
            Some((name, err)) => Err(CallError::Encode { name, source: err }),
            None => Ok(WireValue::Object(self.body)),
        }
    }
}

impl From<WireObject> for CallArgs {
    fn from(body: WireObject) -> Self {
        Self { body, failed: None }
    }
}

/// Error type for client calls.
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    /// The service replied with a failure.
    Remote(ServiceError),
    /// The message could not be delivered or no reply arrived.
    Transport(BusError),
    /// The reply body did not decode into the expected type.
    Decode(DecodeError),
    /// A proxy-returning action replied without a child address.
    MissingProxyAddress(String),
    /// An argument had no wire representation; nothing was sent.
    Encode { name: String, source: EncodeError },
}

impl CallError {
    /// The failure code. Everything but a remote failure reports the
    /// generic code.
    pub fn code(&self) -> i32 {
        match self {
            CallError::Remote(err) => err.code,
            _ => FAILURE_CODE,
        }
    }

    /// The failure message; for remote failures, exactly as the service
    /// sent it.
    pub fn message(&self) -> String {
        match self {
            CallError::Remote(err) => err.message.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Remote(err) => write!(f, "remote failure: {}", err),
            CallError::Transport(err) => write!(f, "transport error: {}", err),
            CallError::Decode(err) => write!(f, "reply decode error: {}", err),
            CallError::MissingProxyAddress(action) => {
                write!(f, "reply to `{}` carries no proxy address", action)
            }
            CallError::Encode { name, source } => {
                write!(f, "argument `{}` failed to encode: {}", name, source)
            }
        }
    }
}

impl Error for CallError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CallError::Remote(err) => Some(err),
            CallError::Transport(err) => Some(err),
            CallError::Decode(err) => Some(err),
            CallError::MissingProxyAddress(_) => None,
            CallError::Encode { source, .. } => Some(source),
        }
    }
}

impl From<ServiceError> for CallError {
    fn from(err: ServiceError) -> Self {
        CallError::Remote(err)
    }
}

impl From<BusError> for CallError {
    fn from(err: BusError) -> Self {
        CallError::Transport(err)
    }
}

impl From<DecodeError> for CallError {
    fn from(err: DecodeError) -> Self {
        CallError::Decode(err)
    }
}

/// A client bound to one service address.
#[derive(Clone)]
pub struct ProxyClient {
    transport: Arc<dyn Transport>,
    address: String,
    options: DeliveryOptions,
}

impl ProxyClient {
    pub fn new(transport: Arc<dyn Transport>, address: impl Into<String>) -> Self {
        Self::with_options(transport, address, DeliveryOptions::default())
    }

    pub fn with_options(
        transport: Arc<dyn Transport>,
        address: impl Into<String>,
        options: DeliveryOptions,
    ) -> Self {
        Self {
            transport,
            address: address.into(),
            options,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn options(&self) -> &DeliveryOptions {
        &self.options
    }

    /// Send a call to a fluent or void action without waiting for a reply.
    pub fn send(&self, action: &str, args: CallArgs) -> Result<(), CallError> {
        tracing::trace!(address = %self.address, action, "send");
        self.transport
            .send(&self.address, self.message(action, args)?)?;
        Ok(())
    }

    /// Call an action and return the raw reply.
    pub fn request(&self, action: &str, args: CallArgs) -> Result<ReplyMessage, CallError> {
        tracing::trace!(address = %self.address, action, "request");
        let pending =
            self.transport
                .request(&self.address, self.message(action, args)?, self.options.timeout)?;
        match pending.wait()? {
            Outcome::Reply(reply) => Ok(reply),
            Outcome::Failure(err) => Err(CallError::Remote(err)),
        }
    }

    /// Call an action and decode its result.
    pub fn call<T: WireCodec>(&self, action: &str, args: CallArgs) -> Result<T, CallError> {
        let reply = self.request(action, args)?;
        Ok(T::decode(&reply.body)?)
    }

    /// Call an action that returns a child service, and bind a client to it.
    ///
    /// `P` is usually the caller's typed wrapper around [`ProxyClient`]; the
    /// child client inherits this client's delivery options.
    pub fn call_proxy<P: From<ProxyClient>>(
        &self,
        action: &str,
        args: CallArgs,
    ) -> Result<P, CallError> {
        let reply = self.request(action, args)?;
        let address = reply
            .proxy_address()
            .ok_or_else(|| CallError::MissingProxyAddress(action.to_string()))?;
        Ok(P::from(self.child(address)))
    }

    /// Call an action and hand its decoded result to `callback` once it
    /// arrives. The wait happens on a separate thread.
    ///
    /// Delivery errors are passed to the callback too, so it is called
    /// exactly once.
    pub fn call_with<T, F>(&self, action: &str, args: CallArgs, callback: F) -> thread::JoinHandle<()>
    where
        T: WireCodec + Send + 'static,
        F: FnOnce(Result<T, CallError>) + Send + 'static,
    {
        let sent = self.message(action, args).and_then(|message| {
            Ok(self
                .transport
                .request(&self.address, message, self.options.timeout)?)
        });
        thread::spawn(move || {
            let result = sent.and_then(|pending| match pending.wait()? {
                    Outcome::Reply(reply) => Ok(T::decode(&reply.body)?),
                    Outcome::Failure(err) => Err(CallError::Remote(err)),
                });
            callback(result);
        })
    }

    fn child(&self, address: &str) -> ProxyClient {
        ProxyClient {
            transport: Arc::clone(&self.transport),
            address: address.to_string(),
            options: self.options.clone(),
        }
    }

    fn message(&self, action: &str, args: CallArgs) -> Result<Message, CallError> {
        let body = args.into_body().map_err(|err| {
            tracing::warn!(address = %self.address, action, error = %err, "call not sent");
            err
        })?;
        let mut message = Message::new(body);
        for (name, value) in &self.options.headers {
            message.headers.insert(name.as_str(), value.as_str());
        }
        Ok(message.with_header(ACTION_HEADER, action))
    }
}

impl fmt::Debug for ProxyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyClient")
            .field("address", &self.address)
            .field("options", &self.options)
            .finish()
    }
}
