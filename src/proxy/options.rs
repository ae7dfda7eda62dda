//! Delivery options for client calls.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default time a client waits for a reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-client delivery configuration.
///
/// Loadable from JSON:
///
/// ```
/// use std::time::Duration;
/// use service_proxy::proxy::DeliveryOptions;
///
/// let options: DeliveryOptions =
///     serde_json::from_str(r#"{ "timeout_ms": 500, "headers": { "tenant": "t1" } }"#).unwrap();
/// assert_eq!(options.timeout, Duration::from_millis(500));
/// assert_eq!(options.headers["tenant"], "t1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryOptions {
    /// How long a call waits for its reply.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
    /// Extra headers added to every message.
    pub headers: BTreeMap<String, String>,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            headers: BTreeMap::new(),
        }
    }
}

impl DeliveryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
