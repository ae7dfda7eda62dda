//! Sub-Proxy Registrar: binds child services to generated addresses.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::bus::{BusError, Transport};

use super::dispatcher::Dispatcher;
use super::interface::Interface;

/// Fresh addresses tried before a registration gives up.
const MAX_ATTEMPTS: usize = 3;

/// Error type for child registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrarError {
    /// Every generated address was already taken.
    Collision { attempts: usize },
    /// The transport refused the endpoint.
    Bus(BusError),
    /// The owning service has been torn down; no new children are taken.
    Closed,
}

impl fmt::Display for RegistrarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrarError::Collision { attempts } => write!(
                f,
                "no free proxy address after {} attempts",
                attempts
            ),
            RegistrarError::Bus(e) => write!(f, "proxy registration failed: {}", e),
            RegistrarError::Closed => write!(f, "owning service has been unregistered"),
        }
    }
}

impl Error for RegistrarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegistrarError::Bus(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BusError> for RegistrarError {
    fn from(err: BusError) -> Self {
        RegistrarError::Bus(err)
    }
}

#[derive(Default)]
struct Table {
    /// Child address → interface name
    children: HashMap<String, &'static str>,
    /// Set by `unregister_all`; later registrations are refused.
    closed: bool,
}

/// Table of child proxies spawned under one exposed service.
///
/// Clones share the table. Register and unregister hold the table's write
/// lock across the transport call, so each address transition is atomic with
/// respect to the others. Once [`unregister_all`](Self::unregister_all) has
/// run, the table is closed and [`register`](Self::register) fails with
/// [`RegistrarError::Closed`].
#[derive(Clone)]
pub struct Registrar {
    transport: Arc<dyn Transport>,
    table: Arc<RwLock<Table>>,
}

impl Registrar {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            table: Arc::new(RwLock::new(Table::default())),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Register `service` under a freshly generated address and return it.
    ///
    /// The child gets its own dispatcher over `interface`, sharing this
    /// registrar so its own children are tracked in the same table.
    pub fn register<C>(
        &self,
        interface: Arc<Interface<C>>,
        service: Arc<C>,
    ) -> Result<String, RegistrarError>
    where
        C: Send + Sync + 'static,
    {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if table.closed {
            tracing::warn!(
                interface = interface.name(),
                "child proxy refused: owning service is gone"
            );
            return Err(RegistrarError::Closed);
        }

        for _ in 0..MAX_ATTEMPTS {
            let address = Uuid::new_v4().to_string();
            if table.children.contains_key(&address) {
                continue;
            }

            let dispatcher = Dispatcher::new(
                Arc::clone(&interface),
                Arc::clone(&service),
                address.clone(),
                self.clone(),
            );
            match self.transport.register(&address, Arc::new(dispatcher)) {
                Ok(()) => {
                    table.children.insert(address.clone(), interface.name());
                    tracing::debug!(
                        address = %address,
                        interface = interface.name(),
                        "child proxy registered"
                    );
                    return Ok(address);
                }
                Err(BusError::AddressInUse(taken)) => {
                    tracing::warn!(address = %taken, "generated proxy address collided; retrying");
                }
                Err(err) => return Err(RegistrarError::Bus(err)),
            }
        }

        Err(RegistrarError::Collision {
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Unregister the endpoint at `address`.
    ///
    /// Returns `false` if nothing was registered there; unregistering twice
    /// is a no-op.
    pub fn unregister(&self, address: &str) -> bool {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let tracked = table.children.remove(address).is_some();
        let removed = self.transport.unregister(address);
        if removed {
            tracing::debug!(address, child = tracked, "proxy unregistered");
        }
        removed || tracked
    }

    /// Unregister every child proxy and close the table. Returns how many
    /// were removed.
    pub fn unregister_all(&self) -> usize {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.closed = true;
        let count = table.children.len();
        for (address, _) in table.children.drain() {
            self.transport.unregister(&address);
        }
        if count > 0 {
            tracing::debug!(count, "child proxies torn down");
        }
        count
    }

    /// Addresses of the live child proxies.
    pub fn children(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self
            .table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .children
            .keys()
            .cloned()
            .collect();
        addresses.sort();
        addresses
    }

    pub fn contains(&self, address: &str) -> bool {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .children
            .contains_key(address)
    }

    /// Whether [`unregister_all`](Self::unregister_all) has closed the table.
    pub fn is_closed(&self) -> bool {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }
}

impl fmt::Debug for Registrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registrar")
            .field("children", &self.children())
            .finish()
    }
}
