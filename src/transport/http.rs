use super::{Exchange, Transport, TransportError};
use crate::headers::CONTENT_LENGTH;
use crate::request::TransportHandle;
use crate::response::ResponseInfo;
use crate::{Error, Result};
use reqwest::redirect::Policy;
use reqwest::Proxy;
use std::env;
use std::time::{Duration, Instant};

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build with defaults, honouring the `REST_BATCH_*` environment knobs.
    pub fn from_env() -> Result<Self> {
        let connect_timeout_secs = env::var("REST_BATCH_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);
        let max_redirects = env::var("REST_BATCH_MAX_REDIRECTS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(10);

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .redirect(Policy::limited(max_redirects));

        if let Ok(proxy_url) = env::var("REST_BATCH_PROXY_URL") {
            match Proxy::all(&proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!(proxy = %proxy_url, error = %e, "ignoring invalid proxy URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

fn method_of(handle: &TransportHandle) -> reqwest::Method {
    use crate::request::Method;
    match handle.method() {
        Method::Head => reqwest::Method::HEAD,
        Method::Get => reqwest::Method::GET,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Patch => reqwest::Method::PATCH,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn exchange(
        &self,
        handle: &TransportHandle,
    ) -> std::result::Result<Exchange, TransportError> {
        let start = Instant::now();
        let mut req = self.client.request(method_of(handle), handle.url().clone());
        for (name, value) in handle.headers().iter() {
            // reqwest derives the length from the body itself
            if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
                continue;
            }
            req = req.header(name, value);
        }
        if handle.method().carries_body() {
            req = req.body(handle.body().clone());
        }
        if let Some(t) = handle.timeout() {
            req = req.timeout(t);
        }

        let resp = req.send().await?;

        let status = resp.status();
        let status_line = format!(
            "{:?} {} {}",
            resp.version(),
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        let effective_url = resp.url().clone();
        let headers: Vec<(String, String)> = resp
            .headers()
            .iter()
            .map(|(n, v)| {
                (
                    n.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let http_version = format!("{:?}", resp.version());

        let body = resp.bytes().await?;

        let info = ResponseInfo {
            content_type,
            http_version: Some(http_version),
            size_upload: handle.body().len(),
            total_time: start.elapsed(),
            redirected: effective_url != *handle.url(),
            ..ResponseInfo::default()
        };

        Ok(Exchange::from_parts(
            effective_url,
            status.as_u16(),
            status_line.trim_end(),
            headers.iter().map(|(n, v)| (n.as_str(), v.as_str())),
            &body,
            info,
        ))
    }
}
