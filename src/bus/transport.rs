//! The transport contract the proxy core consumes.
//!
//! A transport delivers a [`Message`] to the [`Endpoint`] registered at an
//! address and routes the endpoint's single [`Outcome`] back to the sender.
//! Delivery, clustering and timeouts are the transport's business; the
//! dispatch core only needs `request`/`send` and endpoint registration.

use std::error::Error;
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ServiceError;
use crate::wire::WireValue;

use super::message::{Headers, Message, Outcome, ReplyMessage};

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Nothing is registered at the address.
    NoHandlers(String),
    /// An endpoint is already registered at the address.
    AddressInUse(String),
    /// No reply arrived before the timeout.
    Timeout { address: String, timeout: Duration },
    /// The endpoint finished handling the request without replying.
    NoReply(String),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::NoHandlers(address) => write!(f, "no handlers for address {}", address),
            BusError::AddressInUse(address) => write!(f, "address already in use: {}", address),
            BusError::Timeout { address, timeout } => write!(
                f,
                "timed out after {}ms waiting for a reply from {}",
                timeout.as_millis(),
                address
            ),
            BusError::NoReply(address) => {
                write!(f, "endpoint at {} completed without replying", address)
            }
        }
    }
}

impl Error for BusError {}

/// A receiver of messages registered at an address.
pub trait Endpoint: Send + Sync {
    /// Handle one inbound message.
    ///
    /// The endpoint may reply through `replier` now, later from another
    /// thread, or not at all (for messages that expect no reply).
    fn handle(&self, message: Message, replier: Replier);
}

impl<F> Endpoint for F
where
    F: Fn(Message, Replier) + Send + Sync,
{
    fn handle(&self, message: Message, replier: Replier) {
        self(message, replier)
    }
}

/// Trait for a message bus transport.
///
/// Implementations might include:
/// - `InMemoryBus` - For testing and single-process services
/// - a clustered event bus bridging several processes
pub trait Transport: Send + Sync {
    /// Send a request and return a handle to its eventual reply.
    fn request(
        &self,
        address: &str,
        message: Message,
        timeout: Duration,
    ) -> Result<PendingReply, BusError>;

    /// Send a message that expects no reply.
    fn send(&self, address: &str, message: Message) -> Result<(), BusError>;

    /// Register an endpoint at an address.
    fn register(&self, address: &str, endpoint: Arc<dyn Endpoint>) -> Result<(), BusError>;

    /// Remove the endpoint at an address. Returns `false` if nothing was
    /// registered there.
    fn unregister(&self, address: &str) -> bool;

    /// Addresses that currently have an endpoint.
    fn addresses(&self) -> Vec<String>;
}

type ReplySink = Box<dyn FnOnce(Outcome) + Send>;

/// Single-use handle for answering one request.
///
/// Consuming methods make a second reply impossible. Dropping a `Replier`
/// without using it sends nothing.
pub struct Replier {
    sink: Option<ReplySink>,
}

impl Replier {
    /// Create a replier that hands the outcome to `sink`.
    pub fn new<F>(sink: F) -> Self
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        Self {
            sink: Some(Box::new(sink)),
        }
    }

    /// A replier for messages nobody waits on.
    pub fn none() -> Self {
        Self { sink: None }
    }

    /// Whether the sender is waiting for a reply.
    pub fn expects_reply(&self) -> bool {
        self.sink.is_some()
    }

    /// Reply with a body.
    pub fn reply(self, body: WireValue) {
        self.reply_with_headers(body, Headers::new());
    }

    /// Reply with a body and headers.
    pub fn reply_with_headers(self, body: WireValue, headers: Headers) {
        self.deliver(Outcome::Reply(ReplyMessage { headers, body }));
    }

    /// Reply with a failure.
    pub fn fail(self, error: ServiceError) {
        self.deliver(Outcome::Failure(error));
    }

    fn deliver(mut self, outcome: Outcome) {
        if let Some(sink) = self.sink.take() {
            sink(outcome);
        }
    }
}

impl fmt::Debug for Replier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replier")
            .field("expects_reply", &self.expects_reply())
            .finish()
    }
}

/// Handle to the reply of an in-flight request.
#[derive(Debug)]
pub struct PendingReply {
    address: String,
    receiver: mpsc::Receiver<Outcome>,
    timeout: Duration,
}

impl PendingReply {
    /// Create a connected replier/pending-reply pair.
    pub fn channel(address: impl Into<String>, timeout: Duration) -> (Replier, PendingReply) {
        let (tx, rx) = mpsc::sync_channel(1);
        let replier = Replier::new(move |outcome| {
            // The caller may have given up waiting; that is not our error.
            let _ = tx.send(outcome);
        });
        let pending = PendingReply {
            address: address.into(),
            receiver: rx,
            timeout,
        };
        (replier, pending)
    }

    /// Block until the outcome arrives or the timeout elapses.
    pub fn wait(self) -> Result<Outcome, BusError> {
        match self.receiver.recv_timeout(self.timeout) {
            Ok(outcome) => Ok(outcome),
            Err(RecvTimeoutError::Timeout) => Err(BusError::Timeout {
                address: self.address,
                timeout: self.timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(BusError::NoReply(self.address)),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}
