//! Action Registry: the per-interface table of action recipes.
//!
//! An [`Interface<S>`] is built once, when a service is exposed, from a chain
//! of action declarations. Each action records its ordered parameters (name
//! and wire [`Shape`]), its result kind, whether it closes the service, and
//! the thunk that decodes arguments and invokes the service. The table is
//! immutable afterwards and is shared read-only by every dispatch.
//!
//! ## Example
//!
//! ```
//! use service_proxy::proxy::{Interface, Reply};
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     fn greet(&self, name: String) -> String {
//!         format!("hello {}", name)
//!     }
//! }
//!
//! let interface = Interface::<Greeter>::builder("Greeter")
//!     .action("greet")
//!     .param::<String>("name")
//!     .returns(|svc, args, reply: Reply<String>| {
//!         let name: String = args.get("name")?;
//!         reply.succeed(svc.greet(name));
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(interface.actions().collect::<Vec<_>>(), vec!["greet"]);
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::bus::{Headers, Replier, PROXY_ADDRESS_HEADER};
use crate::error::ServiceError;
use crate::wire::{DecodeError, Shape, WireCodec, WireObject, WireValue};

use super::reply::{Reply, Responder};

type Invoke<S> =
    Box<dyn Fn(&Arc<S>, &Args<'_>, &Responder) -> Result<(), DecodeError> + Send + Sync>;

/// A declared action parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub shape: Shape,
}

/// What an action hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultKind {
    /// Void or fluent: no reply is sent.
    None,
    /// A single wire value (scalars, records, collections).
    Value(Shape),
    /// A child service, registered under a fresh address.
    Proxy(&'static str),
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::None => write!(f, "none"),
            ResultKind::Value(shape) => write!(f, "{}", shape),
            ResultKind::Proxy(interface) => write!(f, "proxy {}", interface),
        }
    }
}

/// Errors detected while building an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    /// Two actions share a name. Overloading is not supported.
    DuplicateAction {
        interface: &'static str,
        action: String,
    },
    /// An action declares the same parameter twice.
    DuplicateParameter { action: String, param: String },
}

impl fmt::Display for InterfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceError::DuplicateAction { interface, action } => write!(
                f,
                "interface {} declares action `{}` more than once",
                interface, action
            ),
            InterfaceError::DuplicateParameter { action, param } => write!(
                f,
                "action `{}` declares parameter `{}` more than once",
                action, param
            ),
        }
    }
}

impl Error for InterfaceError {}

/// Decoded view of a request body, restricted to an action's declared
/// parameters.
pub struct Args<'a> {
    body: &'a WireObject,
    params: &'a [Param],
}

impl<'a> Args<'a> {
    pub(crate) fn new(body: &'a WireObject, params: &'a [Param]) -> Self {
        Self { body, params }
    }

    /// Decode the named argument.
    ///
    /// Arguments are looked up by name, never by position.
    pub fn get<T: WireCodec>(&self, name: &str) -> Result<T, DecodeError> {
        if !self.params.iter().any(|param| param.name == name) {
            return Err(DecodeError::UndeclaredParameter(name.to_string()));
        }
        match self.body.get(name) {
            Some(value) => T::decode(value).map_err(|e| e.in_field(name)),
            None => T::missing().ok_or_else(|| DecodeError::MissingField(name.to_string())),
        }
    }

    /// The raw request body.
    pub fn body(&self) -> &WireObject {
        self.body
    }
}

/// Registry entry for one action.
pub struct Recipe<S> {
    name: Arc<str>,
    params: Vec<Param>,
    result: ResultKind,
    closes: bool,
    invoke: Invoke<S>,
}

impl<S> Recipe<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn result(&self) -> &ResultKind {
        &self.result
    }

    /// Whether invoking this action closes the service it runs on.
    pub fn closes(&self) -> bool {
        self.closes
    }

    /// Check every declared parameter against the body, in declared order.
    pub fn check(&self, body: &WireObject) -> Result<(), DecodeError> {
        self.params
            .iter()
            .try_for_each(|param| param.shape.check_field(&param.name, body))
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub(crate) fn invoke(
        &self,
        service: &Arc<S>,
        args: &Args<'_>,
        responder: &Responder,
    ) -> Result<(), DecodeError> {
        (self.invoke)(service, args, responder)
    }
}

impl<S> fmt::Debug for Recipe<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipe")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("result", &self.result)
            .field("closes", &self.closes)
            .finish()
    }
}

/// An immutable table of actions for service type `S`.
pub struct Interface<S> {
    name: &'static str,
    recipes: HashMap<String, Recipe<S>>,
    order: Vec<String>,
}

impl<S: Send + Sync + 'static> Interface<S> {
    /// Start declaring an interface.
    pub fn builder(name: &'static str) -> InterfaceBuilder<S> {
        InterfaceBuilder {
            name,
            recipes: Vec::new(),
        }
    }
}

impl<S> Interface<S> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up an action by exact name.
    pub fn lookup(&self, action: &str) -> Option<&Recipe<S>> {
        self.recipes.get(action)
    }

    /// Action names in declaration order.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<S> fmt::Debug for Interface<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("name", &self.name)
            .field("actions", &self.order)
            .finish()
    }
}

/// Builder for an [`Interface`]. Uses builder pattern: each action
/// declaration returns the builder for chaining.
pub struct InterfaceBuilder<S> {
    name: &'static str,
    recipes: Vec<Recipe<S>>,
}

impl<S: Send + Sync + 'static> InterfaceBuilder<S> {
    /// Declare an action. Finish it with one of the terminal methods on
    /// [`ActionBuilder`].
    pub fn action(self, name: &str) -> ActionBuilder<S> {
        ActionBuilder {
            parent: self,
            name: Arc::from(name),
            params: Vec::new(),
            closes: false,
        }
    }

    /// Freeze the table.
    pub fn build(self) -> Result<Arc<Interface<S>>, InterfaceError> {
        let mut recipes = HashMap::with_capacity(self.recipes.len());
        let mut order = Vec::with_capacity(self.recipes.len());

        for recipe in self.recipes {
            for (index, param) in recipe.params.iter().enumerate() {
                if recipe.params[..index].iter().any(|p| p.name == param.name) {
                    return Err(InterfaceError::DuplicateParameter {
                        action: recipe.name().to_string(),
                        param: param.name.clone(),
                    });
                }
            }
            if recipes.contains_key(recipe.name()) {
                return Err(InterfaceError::DuplicateAction {
                    interface: self.name,
                    action: recipe.name().to_string(),
                });
            }
            order.push(recipe.name().to_string());
            recipes.insert(recipe.name().to_string(), recipe);
        }

        Ok(Arc::new(Interface {
            name: self.name,
            recipes,
            order,
        }))
    }

    fn push(mut self, recipe: Recipe<S>) -> Self {
        self.recipes.push(recipe);
        self
    }
}

/// Declaration of one action, in progress.
pub struct ActionBuilder<S> {
    parent: InterfaceBuilder<S>,
    name: Arc<str>,
    params: Vec<Param>,
    closes: bool,
}

impl<S: Send + Sync + 'static> ActionBuilder<S> {
    /// Declare the next parameter. Its shape comes from `T`.
    pub fn param<T: WireCodec>(mut self, name: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            shape: T::shape(),
        });
        self
    }

    /// Mark this action as the one that closes the service. The service's
    /// address is unregistered once the action has been invoked.
    pub fn closes(mut self) -> Self {
        self.closes = true;
        self
    }

    /// Finish a void or fluent action: no reply is sent.
    pub fn fluent<F>(self, f: F) -> InterfaceBuilder<S>
    where
        F: Fn(&Arc<S>, &Args<'_>) -> Result<(), DecodeError> + Send + Sync + 'static,
    {
        self.finish(
            ResultKind::None,
            Box::new(move |service: &Arc<S>, args: &Args<'_>, _responder: &Responder| {
                f(service, args)
            }),
        )
    }

    /// Finish an action whose result is delivered later through a
    /// [`Reply<T>`].
    ///
    /// Lists keep their order on the wire, sets travel as arrays in
    /// iteration order, and characters travel as code points. A result with
    /// no wire representation is replied as a failure.
    pub fn returns<T, F>(self, f: F) -> InterfaceBuilder<S>
    where
        T: WireCodec + Send + 'static,
        F: Fn(&Arc<S>, &Args<'_>, Reply<T>) -> Result<(), DecodeError> + Send + Sync + 'static,
    {
        self.finish(
            ResultKind::Value(T::shape()),
            Box::new(move |service: &Arc<S>, args: &Args<'_>, responder: &Responder| {
                let reply = responder.reply(|value: T, replier: Replier| {
                    match value.try_encode() {
                        Ok(encoded) => replier.reply(encoded),
                        Err(err) => {
                            tracing::error!(error = %err, "result failed to encode");
                            replier.fail(ServiceError::generic(err.to_string()));
                        }
                    }
                });
                f(service, args, reply)
            }),
        )
    }

    /// Finish an action whose result is another service.
    ///
    /// The child is registered under a fresh address with its own dispatcher
    /// over `child`, and the caller receives that address in the
    /// `proxyaddr` reply header with a null body.
    pub fn returns_proxy<C, F>(self, child: Arc<Interface<C>>, f: F) -> InterfaceBuilder<S>
    where
        C: Send + Sync + 'static,
        F: Fn(&Arc<S>, &Args<'_>, Reply<Arc<C>>) -> Result<(), DecodeError>
            + Send
            + Sync
            + 'static,
    {
        let kind = ResultKind::Proxy(child.name());
        self.finish(
            kind,
            Box::new(move |service: &Arc<S>, args: &Args<'_>, responder: &Responder| {
                let registrar = responder.registrar().clone();
                let child = Arc::clone(&child);
                let reply = responder.reply(move |handle: Arc<C>, replier: Replier| {
                    match registrar.register(child, handle) {
                        Ok(address) => replier.reply_with_headers(
                            WireValue::Null,
                            Headers::new().with(PROXY_ADDRESS_HEADER, address),
                        ),
                        Err(err) => {
                            tracing::error!(error = %err, "child proxy registration failed");
                            replier.fail(ServiceError::generic(err.to_string()));
                        }
                    }
                });
                f(service, args, reply)
            }),
        )
    }

    fn finish(self, result: ResultKind, invoke: Invoke<S>) -> InterfaceBuilder<S> {
        let recipe = Recipe {
            name: self.name,
            params: self.params,
            result,
            closes: self.closes,
            invoke,
        };
        self.parent.push(recipe)
    }
}
