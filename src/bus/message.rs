//! Messages exchanged over the bus.

use crate::error::ServiceError;
use crate::wire::WireValue;

/// Header naming the action a request invokes.
pub const ACTION_HEADER: &str = "action";

/// Reply header carrying the address of a freshly registered child proxy.
pub const PROXY_ADDRESS_HEADER: &str = "proxyaddr";

/// Message headers. Names compare case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any existing value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A request sent to an address: headers plus a wire body.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub headers: Headers,
    pub body: WireValue,
}

impl Message {
    /// Create a message with no headers.
    pub fn new(body: WireValue) -> Self {
        Self {
            headers: Headers::new(),
            body,
        }
    }

    /// Create a message invoking `action` with the given body.
    pub fn action(action: impl Into<String>, body: WireValue) -> Self {
        Self::new(body).with_header(ACTION_HEADER, action)
    }

    /// Add a header to the message.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The `action` header, if present.
    pub fn action_name(&self) -> Option<&str> {
        self.headers.get(ACTION_HEADER)
    }
}

/// A successful reply: headers plus a wire body.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplyMessage {
    pub headers: Headers,
    pub body: WireValue,
}

impl ReplyMessage {
    pub fn new(body: WireValue) -> Self {
        Self {
            headers: Headers::new(),
            body,
        }
    }

    /// The child proxy address, for replies to proxy-returning actions.
    pub fn proxy_address(&self) -> Option<&str> {
        self.headers.get(PROXY_ADDRESS_HEADER)
    }
}

/// The terminal outcome of a request.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Reply(ReplyMessage),
    Failure(ServiceError),
}
