//! Message bus: the transport the proxies ride on.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  request(address, Message)  ┌──────────────────────┐
//! │ ProxyClient  │ ──────────────────────────▶ │      Transport       │
//! │ (caller)     │ ◀────────────────────────── │  register/unregister │
//! └──────────────┘   PendingReply → Outcome    └──────────────────────┘
//!                                                         │
//!                                                         ▼
//!                                              ┌──────────────────────┐
//!                                              │ Endpoint at address  │
//!                                              │ handle(msg, Replier) │
//!                                              └──────────────────────┘
//! ```
//!
//! ## Message convention
//!
//! - Header `action` names the operation to invoke.
//! - The body is a JSON object with one field per argument.
//! - A reply carries a single wire value; a failure carries a code and a
//!   message.
//! - Replies to proxy-returning actions carry the child address in the
//!   `proxyaddr` header.

mod in_memory;
mod message;
mod transport;

pub use in_memory::InMemoryBus;
pub use message::{Headers, Message, Outcome, ReplyMessage, ACTION_HEADER, PROXY_ADDRESS_HEADER};
pub use transport::{BusError, Endpoint, PendingReply, Replier, Transport};
