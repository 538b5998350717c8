//! Client configuration file.
//!
//! ```yaml
//! timeout_ms: 3000
//! user_agent: my-service/2.1
//! headers:
//!   "*":
//!     Accept: application/json
//!   api.example.com:
//!     Authorization: Bearer abc
//! ```

use crate::headers::{HeaderPolicy, ANY_HOST, USER_AGENT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// host -> header name -> value; `*` applies to every host.
    #[serde(default)]
    pub headers: BTreeMap<String, BTreeMap<String, String>>,
}

impl ClientConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::configuration(format!("invalid client config: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded client config");
        Self::from_yaml_str(&content)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Apply this config on top of `policy`.
    pub fn apply_to(&self, policy: &mut HeaderPolicy) {
        if let Some(ua) = &self.user_agent {
            policy.set_default_header(ANY_HOST, USER_AGENT, ua.clone());
        }
        for (host, headers) in &self.headers {
            policy.add_default_headers(host, headers.clone());
        }
    }

    pub fn header_policy(&self) -> HeaderPolicy {
        let mut policy = HeaderPolicy::default();
        self.apply_to(&mut policy);
        policy
    }
}
