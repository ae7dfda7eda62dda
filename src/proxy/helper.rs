//! Helpers for exposing services on a transport and creating clients for
//! them.

use std::sync::Arc;

use crate::bus::{BusError, Transport};

use super::client::ProxyClient;
use super::dispatcher::Dispatcher;
use super::interface::Interface;
use super::options::DeliveryOptions;
use super::registrar::Registrar;

/// Register `service` at `address`, dispatching through `interface`.
///
/// Child proxies the service hands out are tracked by the returned handle.
pub fn register_service<S>(
    transport: Arc<dyn Transport>,
    interface: Arc<Interface<S>>,
    service: Arc<S>,
    address: &str,
) -> Result<ServiceHandle, BusError>
where
    S: Send + Sync + 'static,
{
    let registrar = Registrar::new(Arc::clone(&transport));
    let dispatcher = Dispatcher::new(interface, service, address, registrar.clone());
    transport.register(address, Arc::new(dispatcher))?;
    tracing::info!(address, "service registered");
    Ok(ServiceHandle {
        address: address.to_string(),
        registrar,
    })
}

/// Create a client for the service at `address` with default options.
pub fn create_proxy(transport: Arc<dyn Transport>, address: &str) -> ProxyClient {
    ProxyClient::new(transport, address)
}

/// Create a client for the service at `address`.
pub fn create_proxy_with_options(
    transport: Arc<dyn Transport>,
    address: &str,
    options: DeliveryOptions,
) -> ProxyClient {
    ProxyClient::with_options(transport, address, options)
}

/// A service registered with [`register_service`].
#[derive(Debug)]
pub struct ServiceHandle {
    address: String,
    registrar: Registrar,
}

impl ServiceHandle {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    /// Addresses of the child proxies still registered.
    pub fn children(&self) -> Vec<String> {
        self.registrar.children()
    }

    /// Remove the service's endpoint and every child proxy it spawned.
    /// Returns the number of children torn down.
    pub fn unregister(self) -> usize {
        let children = self.registrar.unregister_all();
        self.registrar.unregister(&self.address);
        tracing::info!(address = %self.address, children, "service unregistered");
        children
    }
}
