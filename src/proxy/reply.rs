//! Result Reply Adapter: the single-fire completion handed to services.
//!
//! A [`Reply<T>`] is the service-side end of one request. Exactly one of
//! [`succeed`](Reply::succeed) / [`fail`](Reply::fail) can fire, because both
//! consume the reply. A reply dropped without either sends a failure, so a
//! request whose action has a result always receives exactly one outcome.
//!
//! The dispatcher keeps a [`Responder`] on the same slot. If argument
//! decoding fails before the service is invoked, the responder reports the
//! decode failure instead of the dropped-reply failure.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use crate::bus::Replier;
use crate::error::ServiceError;
use crate::wire::DecodeError;

use super::registrar::Registrar;

/// Message sent when a `Reply` is dropped without completion.
pub const DROPPED_REPLY: &str = "reply dropped without completion";

type Encoder<T> = Box<dyn FnOnce(T, Replier) + Send>;

struct Slot {
    replier: Option<Replier>,
    /// Set once the action has been invoked successfully.
    armed: bool,
    /// Set when the reply was dropped before the slot was armed.
    abandoned: bool,
}

type SharedSlot = Arc<Mutex<Slot>>;

fn lock(slot: &SharedSlot) -> std::sync::MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Completion handle for one request whose action produces a result.
///
/// Call from any thread, at most once; the reply is delivered whenever the
/// service gets to it.
///
/// ```ignore
/// fn string_handler(&self, reply: Reply<String>) {
///     std::thread::spawn(move || reply.succeed("foobar".to_string()));
/// }
/// ```
pub struct Reply<T> {
    slot: SharedSlot,
    encode: Option<Encoder<T>>,
    action: Arc<str>,
    _result: PhantomData<fn(T)>,
}

impl<T> Reply<T> {
    /// Complete the request successfully.
    pub fn succeed(mut self, value: T) {
        if let Some(replier) = self.take() {
            if let Some(encode) = self.encode.take() {
                encode(value, replier);
            }
        }
    }

    /// Fail the request. The message is delivered verbatim with the generic
    /// failure code.
    pub fn fail(mut self, message: impl Into<String>) {
        if let Some(replier) = self.take() {
            replier.fail(ServiceError::generic(message));
        }
    }

    /// Complete from a `Result`, failing with the error's display text.
    pub fn complete<E: fmt::Display>(self, result: Result<T, E>) {
        match result {
            Ok(value) => self.succeed(value),
            Err(err) => self.fail(err.to_string()),
        }
    }

    /// The action this reply answers.
    pub fn action(&self) -> &str {
        &self.action
    }

    fn take(&mut self) -> Option<Replier> {
        lock(&self.slot).replier.take()
    }
}

impl<T> Drop for Reply<T> {
    fn drop(&mut self) {
        let broken = {
            let mut slot = lock(&self.slot);
            if slot.replier.is_none() {
                return;
            }
            if slot.armed {
                slot.replier.take()
            } else {
                slot.abandoned = true;
                None
            }
        };
        if let Some(replier) = broken {
            tracing::warn!(action = %self.action, "{}", DROPPED_REPLY);
            replier.fail(ServiceError::generic(DROPPED_REPLY));
        }
    }
}

impl<T> fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("action", &self.action)
            .field("pending", &lock(&self.slot).replier.is_some())
            .finish()
    }
}

/// Dispatcher-side end of a request's reply slot.
pub(crate) struct Responder {
    slot: SharedSlot,
    registrar: Registrar,
    action: Arc<str>,
}

impl Responder {
    pub(crate) fn new(replier: Replier, registrar: Registrar, action: Arc<str>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                replier: Some(replier),
                armed: false,
                abandoned: false,
            })),
            registrar,
            action,
        }
    }

    /// Create the typed reply for this request.
    pub(crate) fn reply<T, F>(&self, encode: F) -> Reply<T>
    where
        F: FnOnce(T, Replier) + Send + 'static,
    {
        Reply {
            slot: Arc::clone(&self.slot),
            encode: Some(Box::new(encode)),
            action: Arc::clone(&self.action),
            _result: PhantomData,
        }
    }

    pub(crate) fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    /// Settle the slot once the action's invoke step has returned.
    ///
    /// On success the slot is armed, so a later drop of the reply reports a
    /// broken reply. On a decode failure the failure is sent, unless the
    /// service already completed the reply.
    pub(crate) fn settle(self, result: Result<(), DecodeError>) {
        let (replier, error) = {
            let mut slot = lock(&self.slot);
            match result {
                Ok(()) if slot.abandoned => (
                    slot.replier.take(),
                    ServiceError::generic(DROPPED_REPLY),
                ),
                Ok(()) => {
                    slot.armed = true;
                    return;
                }
                Err(err) => (slot.replier.take(), ServiceError::from(err)),
            }
        };
        match replier {
            Some(replier) => {
                tracing::warn!(action = %self.action, error = %error.message, "request failed");
                replier.fail(error);
            }
            None => {
                tracing::warn!(
                    action = %self.action,
                    error = %error.message,
                    "reply already completed; failure not delivered"
                );
            }
        }
    }
}
