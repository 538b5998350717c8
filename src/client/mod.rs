//! Thin facade over [`BatchExecutor`] that carries a header policy, a
//! transport and a default timeout.

mod builder;
mod config;

pub use builder::RestClientBuilder;
pub use config::{ClientConfig, DEFAULT_TIMEOUT_MS};

use crate::batch::BatchExecutor;
use crate::codec::Body;
use crate::headers::HeaderPolicy;
use crate::request::{Method, Request};
use crate::response::Response;
use crate::transport::Transport;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct RestClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) policy: Arc<HeaderPolicy>,
    pub(crate) timeout: Duration,
}

impl RestClient {
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::new()
    }

    pub fn policy(&self) -> &HeaderPolicy {
        &self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Request with this client's default headers for the URL's host.
    pub fn request(&self, method: Method, url: &str) -> Result<Request> {
        Request::with_policy(method, url, &self.policy)
    }

    pub fn head(&self, url: &str) -> Result<Request> {
        self.request(Method::Head, url)
    }

    pub fn get(&self, url: &str) -> Result<Request> {
        self.request(Method::Get, url)
    }

    pub fn options(&self, url: &str) -> Result<Request> {
        self.request(Method::Options, url)
    }

    pub fn delete(&self, url: &str) -> Result<Request> {
        self.request(Method::Delete, url)
    }

    pub fn post(&self, url: &str, body: impl Into<Body>) -> Result<Request> {
        self.with_body(Method::Post, url, body)
    }

    pub fn put(&self, url: &str, body: impl Into<Body>) -> Result<Request> {
        self.with_body(Method::Put, url, body)
    }

    pub fn patch(&self, url: &str, body: impl Into<Body>) -> Result<Request> {
        self.with_body(Method::Patch, url, body)
    }

    fn with_body(&self, method: Method, url: &str, body: impl Into<Body>) -> Result<Request> {
        let mut req = self.request(method, url)?;
        req.set_body(body);
        Ok(req)
    }

    /// Fresh executor on this client's transport.
    pub fn batch(&self) -> BatchExecutor {
        BatchExecutor::new(self.transport())
    }

    /// Run one request with the default timeout.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        request.execute_with(self.transport(), self.timeout).await
    }

    /// Run `requests` as one batch with the default timeout.
    pub async fn run<I>(&self, requests: I) -> Result<Vec<Response>>
    where
        I: IntoIterator<Item = Request>,
    {
        let mut batch = self.batch();
        for request in requests {
            batch.register(request)?;
        }
        batch.run(self.timeout).await
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
