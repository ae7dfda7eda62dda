//! Dispatcher: the endpoint that turns inbound messages into service calls.

use std::fmt;
use std::sync::Arc;

use crate::bus::{Endpoint, Message, Replier, ACTION_HEADER};
use crate::error::ServiceError;
use crate::wire::{DecodeError, WireObject, WireValue};

use super::interface::{Args, Interface};
use super::registrar::Registrar;
use super::reply::Responder;

/// Failure message for a request without an `action` header.
pub const ACTION_NOT_SPECIFIED: &str = "action not specified";

/// Prefix of the failure message for a request naming an unknown action.
pub const INVALID_ACTION: &str = "invalid action";

/// Routes messages at one address to a service through its interface.
///
/// Per message:
/// 1. Read the `action` header; fail if absent.
/// 2. Look the action up by exact name; fail if unknown.
/// 3. Check every declared parameter against the body, by name.
/// 4. Invoke the service. Its reply, if the action has one, arrives later.
/// 5. Unregister this address if the action closes the service.
///
/// Steps 1 to 3 fail synchronously with the generic failure code and never
/// reach the service.
pub struct Dispatcher<S> {
    interface: Arc<Interface<S>>,
    service: Arc<S>,
    address: String,
    registrar: Registrar,
}

impl<S: Send + Sync + 'static> Dispatcher<S> {
    pub fn new(
        interface: Arc<Interface<S>>,
        service: Arc<S>,
        address: impl Into<String>,
        registrar: Registrar,
    ) -> Self {
        Self {
            interface,
            service,
            address: address.into(),
            registrar,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn interface(&self) -> &Arc<Interface<S>> {
        &self.interface
    }

    /// Handle one inbound message.
    pub fn dispatch(&self, message: Message, replier: Replier) {
        let Message { headers, body } = message;
        let Some(action) = headers.get(ACTION_HEADER) else {
            tracing::warn!(address = %self.address, "{}", ACTION_NOT_SPECIFIED);
            replier.fail(ServiceError::generic(ACTION_NOT_SPECIFIED));
            return;
        };

        let Some(recipe) = self.interface.lookup(action) else {
            tracing::warn!(address = %self.address, action, "{}", INVALID_ACTION);
            replier.fail(ServiceError::generic(format!("{}: {}", INVALID_ACTION, action)));
            return;
        };

        tracing::debug!(
            address = %self.address,
            interface = self.interface.name(),
            action,
            "dispatching"
        );

        let body = match body_object(body) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(action, error = %err, "malformed request body");
                replier.fail(ServiceError::from(err));
                return;
            }
        };

        if let Err(err) = recipe.check(&body) {
            tracing::warn!(action, error = %err, "argument decoding failed");
            replier.fail(ServiceError::from(err));
            return;
        }

        let responder = Responder::new(replier, self.registrar.clone(), recipe.shared_name());
        let args = Args::new(&body, recipe.params());
        let result = recipe.invoke(&self.service, &args, &responder);
        let invoked = result.is_ok();
        responder.settle(result);

        if invoked && recipe.closes() {
            self.registrar.unregister(&self.address);
        }
    }
}

/// A request body is an object of named arguments. A null body stands for
/// an action with no arguments.
fn body_object(body: WireValue) -> Result<WireObject, DecodeError> {
    match body {
        WireValue::Object(map) => Ok(map),
        WireValue::Null => Ok(WireObject::new()),
        other => Err(DecodeError::mismatch("object", &other)),
    }
}

impl<S: Send + Sync + 'static> Endpoint for Dispatcher<S> {
    fn handle(&self, message: Message, replier: Replier) {
        self.dispatch(message, replier);
    }
}

impl<S> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("address", &self.address)
            .field("interface", &self.interface.name())
            .finish()
    }
}
