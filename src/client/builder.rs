use super::config::{ClientConfig, DEFAULT_TIMEOUT_MS};
use super::RestClient;
use crate::headers::HeaderPolicy;
use crate::transport::Transport;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`RestClient`].
///
/// Keep this surface area small: a transport, a header policy, and a default timeout.
pub struct RestClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    policy: HeaderPolicy,
    timeout: Option<Duration>,
}

impl Default for RestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RestClientBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            policy: HeaderPolicy::default(),
            timeout: None,
        }
    }

    /// Use a custom transport instead of the shared reqwest one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the header policy wholesale (built-in defaults included).
    pub fn header_policy(mut self, policy: HeaderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn default_header(
        mut self,
        host: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.policy.set_default_header(host, name, value);
        self
    }

    /// Default batch timeout used by [`RestClient::execute`] and [`RestClient::run`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Layer a loaded [`ClientConfig`] on top of the current settings.
    pub fn config(mut self, config: &ClientConfig) -> Self {
        config.apply_to(&mut self.policy);
        if let Some(t) = config.timeout() {
            self.timeout = Some(t);
        }
        self
    }

    /// Build the client.
    ///
    /// Without an explicit timeout, `REST_BATCH_TIMEOUT_MS` is consulted
    /// before falling back to five seconds.
    pub fn build(self) -> Result<RestClient> {
        let transport = match self.transport {
            Some(t) => t,
            None => crate::transport::shared()?,
        };
        let timeout = self.timeout.unwrap_or_else(|| {
            let ms = std::env::var("REST_BATCH_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_TIMEOUT_MS);
            Duration::from_millis(ms)
        });

        Ok(RestClient {
            transport,
            policy: Arc::new(self.policy),
            timeout,
        })
    }
}
