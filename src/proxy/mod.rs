//! Service proxies: expose a service on the bus and call it by action name.
//!
//! ## Architecture
//!
//! ```text
//!  caller                                   service side
//! ┌─────────────┐  action + named args  ┌────────────┐   ┌──────────────┐
//! │ ProxyClient │ ────────────────────▶ │ Dispatcher │──▶│ Interface<S> │
//! └─────────────┘                       └────────────┘   │   (recipes)  │
//!        ▲                                    │          └──────────────┘
//!        │        reply / failure             ▼
//!        └─────────────────────────────── Reply<T> ◀── service method
//!                                             │
//!                                             ▼ returns a child service
//!                                        Registrar ── new address ──▶ Dispatcher
//! ```
//!
//! - [`Interface`]: the immutable action table, declared once per service
//!   type with [`Interface::builder`].
//! - [`Dispatcher`]: the bus endpoint. Looks actions up by name, checks
//!   arguments, invokes the service.
//! - [`Reply`]: the single-fire completion a service answers through.
//! - [`Registrar`]: registers child services under generated addresses.
//! - [`ProxyClient`]: encodes calls and decodes replies.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use service_proxy::bus::InMemoryBus;
//! use service_proxy::proxy::{self, CallArgs, Interface, Reply};
//!
//! struct Greeter;
//!
//! let interface = Interface::<Greeter>::builder("Greeter")
//!     .action("greet")
//!     .param::<String>("name")
//!     .returns(|_, args, reply: Reply<String>| {
//!         let name: String = args.get("name")?;
//!         reply.succeed(format!("hello {}", name));
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! let bus = Arc::new(InMemoryBus::new());
//! let handle = proxy::register_service(bus.clone(), interface, Arc::new(Greeter), "greeter").unwrap();
//!
//! let client = proxy::create_proxy(bus, "greeter");
//! let greeting: String = client.call("greet", CallArgs::new().arg("name", "bob".to_string())).unwrap();
//! assert_eq!(greeting, "hello bob");
//!
//! handle.unregister();
//! ```

mod client;
mod dispatcher;
mod helper;
mod interface;
mod options;
mod registrar;
mod reply;

pub use client::{CallArgs, CallError, ProxyClient};
pub use dispatcher::{Dispatcher, ACTION_NOT_SPECIFIED, INVALID_ACTION};
pub use helper::{create_proxy, create_proxy_with_options, register_service, ServiceHandle};
pub use interface::{
    ActionBuilder, Args, Interface, InterfaceBuilder, InterfaceError, Param, Recipe, ResultKind,
};
pub use options::{DeliveryOptions, DEFAULT_TIMEOUT};
pub use registrar::{Registrar, RegistrarError};
pub use reply::{Reply, DROPPED_REPLY};

// HTTP gateway (requires "http" feature)
#[cfg(feature = "http")]
pub mod http;
