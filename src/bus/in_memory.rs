//! In-memory bus for testing and single-process services.
//!
//! Delivery is synchronous: `request` and `send` invoke the target endpoint
//! on the caller's thread. Endpoints are free to reply later from any other
//! thread.
//!
//! The delivery log is off unless the bus is built with
//! [`InMemoryBus::recording`]. It keeps a copy of every message and never
//! shrinks on its own, so turn it on in tests only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use super::message::Message;
use super::transport::{BusError, Endpoint, PendingReply, Replier, Transport};

/// In-memory message bus.
///
/// Features:
/// - Thread-safe (can be shared across threads via `Clone`)
/// - Endpoints keyed by address; one endpoint per address
/// - Optionally records every delivered message for inspection
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use service_proxy::bus::{InMemoryBus, Message, Outcome, Replier, Transport};
/// use serde_json::json;
///
/// let bus = InMemoryBus::new();
/// bus.register("echo", Arc::new(|message: Message, replier: Replier| {
///     replier.reply(message.body);
/// })).unwrap();
///
/// let pending = bus
///     .request("echo", Message::new(json!({ "x": 1 })), Duration::from_secs(1))
///     .unwrap();
/// match pending.wait().unwrap() {
///     Outcome::Reply(reply) => assert_eq!(reply.body, json!({ "x": 1 })),
///     Outcome::Failure(err) => panic!("{}", err),
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBus {
    /// Registered endpoints
    endpoints: Arc<RwLock<HashMap<String, Arc<dyn Endpoint>>>>,
    /// Delivered messages, in delivery order; `None` unless recording
    log: Option<Arc<Mutex<Vec<(String, Message)>>>>,
}

impl InMemoryBus {
    /// Create a new in-memory bus. Deliveries are not recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus that records every delivered message for
    /// [`messages`](Self::messages) and [`messages_to`](Self::messages_to).
    pub fn recording() -> Self {
        Self {
            log: Some(Arc::default()),
            ..Self::default()
        }
    }

    /// Whether deliveries are being recorded.
    pub fn is_recording(&self) -> bool {
        self.log.is_some()
    }

    /// Whether an endpoint is registered at the address.
    pub fn is_registered(&self, address: &str) -> bool {
        self.endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(address)
    }

    /// Get all delivered messages with their target address. Empty unless
    /// the bus is recording.
    pub fn messages(&self) -> Vec<(String, Message)> {
        match &self.log {
            Some(log) => log.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            None => Vec::new(),
        }
    }

    /// Get the delivered messages sent to one address.
    pub fn messages_to(&self, address: &str) -> Vec<Message> {
        match &self.log {
            Some(log) => log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter(|(to, _)| to == address)
                .map(|(_, message)| message.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Clear the delivery log (useful for test cleanup).
    pub fn clear(&self) {
        if let Some(log) = &self.log {
            log.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    fn deliver(&self, address: &str, message: Message, replier: Replier) -> Result<(), BusError> {
        // Clone the endpoint out so the table lock is not held while it runs;
        // handlers register and unregister addresses themselves.
        let endpoint = self
            .endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
            .ok_or_else(|| BusError::NoHandlers(address.to_string()))?;

        if let Some(log) = &self.log {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((address.to_string(), message.clone()));
        }

        tracing::trace!(address, action = ?message.action_name(), "delivering message");
        endpoint.handle(message, replier);
        Ok(())
    }
}

impl Transport for InMemoryBus {
    fn request(
        &self,
        address: &str,
        message: Message,
        timeout: Duration,
    ) -> Result<PendingReply, BusError> {
        let (replier, pending) = PendingReply::channel(address, timeout);
        self.deliver(address, message, replier)?;
        Ok(pending)
    }

    fn send(&self, address: &str, message: Message) -> Result<(), BusError> {
        self.deliver(address, message, Replier::none())
    }

    fn register(&self, address: &str, endpoint: Arc<dyn Endpoint>) -> Result<(), BusError> {
        let mut endpoints = self
            .endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if endpoints.contains_key(address) {
            return Err(BusError::AddressInUse(address.to_string()));
        }
        endpoints.insert(address.to_string(), endpoint);
        tracing::debug!(address, "endpoint registered");
        Ok(())
    }

    fn unregister(&self, address: &str) -> bool {
        let removed = self
            .endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(address)
            .is_some();
        if removed {
            tracing::debug!(address, "endpoint unregistered");
        }
        removed
    }

    fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self
            .endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        addresses.sort();
        addresses
    }
}
