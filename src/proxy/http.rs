//! HTTP gateway: forwards HTTP requests onto the bus using the action
//! convention.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `POST /:address`: send a request to the service at `address`. The
//!   `action` request header names the action, the JSON body carries the
//!   named arguments. The reply body comes back as JSON; a child proxy
//!   address is copied into the `proxyaddr` response header.
//! - `GET /health`: returns `{ "ok": true, "addresses": [...] }`.
//!
//! ## Status codes
//!
//! | Outcome | Status |
//! | --- | --- |
//! | reply | 200 |
//! | action produces no reply | 202 |
//! | no endpoint at the address | 404 |
//! | timed out | 504 |
//! | failure reply | 500, body `{ "code", "message" }` |
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use service_proxy::bus::InMemoryBus;
//! use service_proxy::proxy::{self, http};
//!
//! let bus = Arc::new(InMemoryBus::new());
//! proxy::register_service(bus.clone(), interface, service, "greeter")?;
//!
//! // Get the router to compose with other axum routes
//! let app = http::router(bus.clone());
//!
//! // Or serve directly
//! http::serve(bus, "0.0.0.0:3000").await?;
//! ```

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::bus::{BusError, Message, Outcome, Transport, PROXY_ADDRESS_HEADER};
use crate::error::{ServiceError, FAILURE_CODE};

use super::options::DeliveryOptions;

struct Gateway {
    transport: Arc<dyn Transport>,
    options: DeliveryOptions,
}

/// Build an axum `Router` that forwards requests onto `transport`.
pub fn router(transport: Arc<dyn Transport>) -> Router {
    router_with_options(transport, DeliveryOptions::default())
}

/// Like [`router`], with the timeout and extra headers from `options`.
pub fn router_with_options(transport: Arc<dyn Transport>, options: DeliveryOptions) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/:address", post(request_handler))
        .with_state(Arc::new(Gateway { transport, options }))
}

/// Serve the gateway over HTTP at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve(transport: Arc<dyn Transport>, addr: &str) -> Result<(), std::io::Error> {
    let app = router(transport);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http gateway listening");
    axum::serve(listener, app).await
}

/// `GET /health`: returns `{ "ok": true, "addresses": [...] }`.
async fn health_handler(State(gateway): State<Arc<Gateway>>) -> impl IntoResponse {
    Json(json!({ "ok": true, "addresses": gateway.transport.addresses() }))
}

/// `POST /:address`: forward the request and wait for its outcome.
async fn request_handler(
    State(gateway): State<Arc<Gateway>>,
    Path(address): Path<String>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Response {
    let body = body.map(|Json(value)| value).unwrap_or(Value::Null);
    let message = message_from_headers(&headers, &gateway.options, body);

    let waiting = Arc::clone(&gateway);
    let target = address.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        waiting
            .transport
            .request(&target, message, waiting.options.timeout)?
            .wait()
    })
    .await;

    match outcome {
        Ok(Ok(Outcome::Reply(reply))) => {
            let mut response_headers = HeaderMap::new();
            if let Some(child) = reply.proxy_address() {
                if let Ok(value) = HeaderValue::from_str(child) {
                    response_headers.insert(PROXY_ADDRESS_HEADER, value);
                }
            }
            (StatusCode::OK, response_headers, Json(reply.body)).into_response()
        }
        Ok(Ok(Outcome::Failure(err))) => failure(StatusCode::INTERNAL_SERVER_ERROR, &err),
        Ok(Err(BusError::NoReply(_))) => StatusCode::ACCEPTED.into_response(),
        Ok(Err(err @ BusError::NoHandlers(_))) => {
            failure(StatusCode::NOT_FOUND, &ServiceError::generic(err.to_string()))
        }
        Ok(Err(err @ BusError::Timeout { .. })) => {
            failure(StatusCode::GATEWAY_TIMEOUT, &ServiceError::generic(err.to_string()))
        }
        Ok(Err(err)) => failure(StatusCode::BAD_GATEWAY, &ServiceError::generic(err.to_string())),
        Err(join) => {
            tracing::error!(%address, error = %join, "gateway request task failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ServiceError::new(FAILURE_CODE, "gateway request task failed"),
            )
        }
    }
}

fn failure(status: StatusCode, err: &ServiceError) -> Response {
    (status, Json(json!({ "code": err.code, "message": err.message }))).into_response()
}

/// Build the bus message. Option headers first, then request headers, so a
/// request can override a default.
fn message_from_headers(headers: &HeaderMap, options: &DeliveryOptions, body: Value) -> Message {
    let mut message = Message::new(body);
    for (name, value) in &options.headers {
        message.headers.insert(name.as_str(), value.as_str());
    }
    for (name, value) in headers.iter() {
        if !is_forwarded(name.as_str()) {
            continue;
        }
        if let Ok(v) = value.to_str() {
            message.headers.insert(name.as_str(), v);
        }
    }
    message
}

/// Hop-by-hop and HTTP framing headers stay at the gateway.
fn is_forwarded(name: &str) -> bool {
    !matches!(
        name,
        "host"
            | "connection"
            | "content-length"
            | "content-type"
            | "accept"
            | "accept-encoding"
            | "user-agent"
            | "transfer-encoding"
    )
}
