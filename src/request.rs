//! Request description and its frozen transport handle.

use crate::codec::{self, Body};
use crate::headers::{HeaderPolicy, HeaderSet, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use crate::transport::Transport;
use crate::{BatchExecutor, Error, Response, Result};
use base64::Engine;
use bytes::Bytes;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Identity of a [`Request`]. Clones of a request share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Head,
    Get,
    Options,
    Patch,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Methods whose body is encoded and sent.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Patch | Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HEAD" => Ok(Method::Head),
            "GET" => Ok(Method::Get),
            "OPTIONS" => Ok(Method::Options),
            "PATCH" => Ok(Method::Patch),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::configuration(format!(
                "unsupported HTTP method '{}'",
                other
            ))),
        }
    }
}

/// Immutable snapshot of a request, ready for the transport.
#[derive(Debug)]
pub struct TransportHandle {
    request_id: RequestId,
    method: Method,
    url: Url,
    headers: HeaderSet,
    body: Bytes,
    timeout: Option<Duration>,
}

impl TransportHandle {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn header_lines(&self) -> Vec<String> {
        self.headers.to_lines()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Per-request cap forwarded to the transport; the batch deadline still applies.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// One HTTP call: method and URL fixed at construction, headers and body
/// editable until [`Request::build_transport_handle`] freezes them.
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    method: Method,
    url: Url,
    headers: HeaderSet,
    body: Body,
    timeout: Option<Duration>,
    handle: OnceLock<Arc<TransportHandle>>,
}

impl Request {
    /// Build a request using the built-in default headers.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        Self::with_policy(method, url, &HeaderPolicy::default())
    }

    /// Build a request whose initial headers come from `policy` for the URL's host.
    pub fn with_policy(method: Method, url: &str, policy: &HeaderPolicy) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::InvalidUrl {
                url: url.to_string(),
                reason: "URL has no host".to_string(),
            })?
            .to_string();

        Ok(Self {
            id: RequestId::new(),
            method,
            url: parsed,
            headers: policy.resolve(&host),
            body: Body::Empty,
            timeout: None,
            handle: OnceLock::new(),
        })
    }

    pub fn head(url: &str) -> Result<Self> {
        Self::new(Method::Head, url)
    }

    pub fn get(url: &str) -> Result<Self> {
        Self::new(Method::Get, url)
    }

    pub fn options(url: &str) -> Result<Self> {
        Self::new(Method::Options, url)
    }

    pub fn delete(url: &str) -> Result<Self> {
        Self::new(Method::Delete, url)
    }

    pub fn post(url: &str, body: impl Into<Body>) -> Result<Self> {
        let mut req = Self::new(Method::Post, url)?;
        req.set_body(body);
        Ok(req)
    }

    pub fn put(url: &str, body: impl Into<Body>) -> Result<Self> {
        let mut req = Self::new(Method::Put, url)?;
        req.set_body(body);
        Ok(req)
    }

    pub fn patch(url: &str, body: impl Into<Body>) -> Result<Self> {
        let mut req = Self::new(Method::Patch, url)?;
        req.set_body(body);
        Ok(req)
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_frozen(&self) -> bool {
        self.handle.get().is_some()
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        if self.reject_if_frozen("set_header") {
            return self;
        }
        self.headers.set(name, value);
        self
    }

    pub fn add_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if self.reject_if_frozen("add_headers") {
            return self;
        }
        self.headers.extend(headers);
        self
    }

    pub fn set_body(&mut self, body: impl Into<Body>) -> &mut Self {
        if self.reject_if_frozen("set_body") {
            return self;
        }
        self.body = body.into();
        self
    }

    /// Advisory per-request timeout. The batch-wide timeout given to `run` always applies.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        if self.reject_if_frozen("set_timeout") {
            return self;
        }
        self.timeout = Some(timeout);
        self
    }

    pub fn bearer_auth(&mut self, token: &str) -> &mut Self {
        self.set_header(AUTHORIZATION, format!("Bearer {}", token))
    }

    pub fn basic_auth(&mut self, user: &str, password: &str) -> &mut Self {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, password));
        self.set_header(AUTHORIZATION, format!("Basic {}", encoded))
    }

    /// Freeze headers and body into a transport handle.
    ///
    /// Idempotent: later calls return the cached handle without re-encoding.
    pub fn build_transport_handle(&self) -> Arc<TransportHandle> {
        self.handle.get_or_init(|| Arc::new(self.freeze())).clone()
    }

    fn freeze(&self) -> TransportHandle {
        let mut headers = self.headers.clone();
        let body = if self.method.carries_body() {
            let encoded = codec::encode(&self.body, headers.get(CONTENT_TYPE));
            headers.set(CONTENT_LENGTH, encoded.len().to_string());
            encoded
        } else {
            Bytes::new()
        };
        tracing::debug!(
            request_id = %self.id,
            method = %self.method,
            url = %self.url,
            body_len = body.len(),
            "built transport handle"
        );
        TransportHandle {
            request_id: self.id,
            method: self.method,
            url: self.url.clone(),
            headers,
            body,
            timeout: self.timeout,
        }
    }

    fn reject_if_frozen(&self, op: &str) -> bool {
        if self.is_frozen() {
            tracing::warn!(request_id = %self.id, op, "request already dispatched, change ignored");
            return true;
        }
        false
    }

    /// Run this request alone on the shared default transport.
    pub async fn execute(self, timeout: Duration) -> Result<Response> {
        let transport = crate::transport::shared()?;
        self.execute_with(transport, timeout).await
    }

    /// Run this request alone on `transport`.
    pub async fn execute_with(
        self,
        transport: Arc<dyn Transport>,
        timeout: Duration,
    ) -> Result<Response> {
        let mut executor = BatchExecutor::new(transport);
        let response = executor.register(self)?;
        executor.run(timeout).await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{TYPE_JSON, TYPE_X_WWW_FORM_URLENCODED, USER_AGENT};
    use serde_json::json;

    #[test]
    fn invalid_url_is_rejected() {
        let err = Request::get("not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));

        let err = Request::get("mailto:someone@example.com").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { ref reason, .. } if reason.contains("host")));
    }

    #[test]
    fn defaults_resolved_at_construction() {
        let mut policy = HeaderPolicy::default();
        policy.set_default_header("api.test", "X-Api-Key", "k1");
        let mut req = Request::with_policy(Method::Get, "https://api.test/v1", &policy).unwrap();
        assert_eq!(req.header("x-api-key"), Some("k1"));
        assert_eq!(req.header(CONTENT_TYPE), Some(TYPE_JSON));

        req.set_header("X-API-KEY", "k2");
        assert_eq!(req.header("x-api-key"), Some("k2"));
        assert_eq!(req.headers().len(), 3);
        assert!(req.header(USER_AGENT).is_some());
    }

    #[test]
    fn json_post_sets_content_length() {
        let req = Request::post("http://localhost/users", json!({"a": 1})).unwrap();
        let handle = req.build_transport_handle();
        assert_eq!(handle.body().as_ref(), br#"{"a":1}"#);
        assert_eq!(handle.headers().get(CONTENT_LENGTH), Some("7"));
    }

    #[test]
    fn form_post() {
        let mut req = Request::post("http://localhost/form", json!({"a": "x y", "b": "1"})).unwrap();
        req.set_header(CONTENT_TYPE, TYPE_X_WWW_FORM_URLENCODED);
        let handle = req.build_transport_handle();
        assert_eq!(handle.body().as_ref(), b"a=x%20y&b=1");
        assert_eq!(handle.headers().get(CONTENT_LENGTH), Some("11"));
    }

    #[test]
    fn get_never_sends_body_or_length() {
        let mut req = Request::get("http://localhost/").unwrap();
        req.set_body("ignored");
        let handle = req.build_transport_handle();
        assert!(handle.body().is_empty());
        assert!(!handle.headers().contains(CONTENT_LENGTH));
    }

    #[test]
    fn build_transport_handle_is_idempotent() {
        let req = Request::put("http://localhost/x", json!({"k": "v"})).unwrap();
        let first = req.build_transport_handle();
        let second = req.build_transport_handle();
        assert!(Arc::ptr_eq(&first, &second));
        let lengths = second
            .header_lines()
            .iter()
            .filter(|l| l.to_ascii_lowercase().starts_with("content-length:"))
            .count();
        assert_eq!(lengths, 1);
    }

    #[test]
    fn mutation_after_freeze_is_ignored() {
        let mut req = Request::patch("http://localhost/x", "one").unwrap();
        let handle = req.build_transport_handle();
        req.set_body("two").set_header("X-Late", "1");
        assert!(req.is_frozen());
        assert!(req.header("x-late").is_none());
        assert_eq!(handle.body().as_ref(), b"one");
    }

    #[test]
    fn timeout_hint_is_frozen_into_the_handle() {
        let mut req = Request::get("http://localhost/slow").unwrap();
        req.set_timeout(Duration::from_millis(100));
        assert_eq!(req.timeout(), Some(Duration::from_millis(100)));
        assert_eq!(
            req.build_transport_handle().timeout(),
            Some(Duration::from_millis(100))
        );

        let plain = Request::get("http://localhost/fast").unwrap();
        assert!(plain.build_transport_handle().timeout().is_none());
    }

    #[test]
    fn auth_helpers() {
        let mut req = Request::get("http://localhost/").unwrap();
        req.basic_auth("user", "pass");
        assert_eq!(req.header(AUTHORIZATION), Some("Basic dXNlcjpwYXNz"));
        req.bearer_auth("tok");
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer tok"));
    }

    #[test]
    fn clones_share_identity() {
        let req = Request::delete("http://localhost/1").unwrap();
        let copy = req.clone();
        assert_eq!(req.id(), copy.id());
        assert_ne!(req.id(), Request::delete("http://localhost/1").unwrap().id());
    }

    #[test]
    fn method_parsing() {
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert!("TRACE".parse::<Method>().is_err());
        assert!(Method::Post.carries_body());
        assert!(!Method::Head.carries_body());
    }
}
