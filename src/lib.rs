//! # rest-batch
//!
//! Concurrent HTTP request batches with a shared timeout.
//!
//! ## Overview
//!
//! Register any number of independent requests on a [`BatchExecutor`], run
//! them together, and inspect each [`Response`] once the whole batch has
//! completed or the deadline has passed. Every request gets its own result
//! slot: a DNS failure or a timeout in one request never disturbs another.
//!
//! ## Key Features
//!
//! - **One deadline per batch**: requests still in flight when it elapses are
//!   aborted and recorded as transport errors (`http_status() == 0`).
//! - **Ordered results**: responses come back in registration order, whatever
//!   the completion order.
//! - **Single-task multiplexing**: all exchanges are driven by the task that
//!   calls [`BatchExecutor::run`]; no task or thread per request.
//! - **Per-host default headers** via [`HeaderPolicy`], overridable per request.
//! - **Body encoding** chosen by `Content-Type` at dispatch time: JSON,
//!   `application/x-www-form-urlencoded`, or pass-through text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rest_batch::{RestClient, Request};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> rest_batch::Result<()> {
//!     let client = RestClient::builder()
//!         .default_header("api.example.com", "Authorization", "Bearer token")
//!         .build()?;
//!
//!     let mut batch = client.batch();
//!     let list = batch.register(client.get("https://api.example.com/users")?)?;
//!     let create = batch.register(client.post("https://api.example.com/users", json!({"name": "Jo"}))?)?;
//!
//!     batch.run(client.timeout()).await?;
//!
//!     if list.is_success() {
//!         println!("{:?}", list.body()?);
//!     }
//!     println!("create -> {} {:?}", create.http_status(), create.error());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Executor, state machine and multiplexer |
//! | [`request`] | Request description and frozen transport handle |
//! | [`response`] | Result slot, header lookup and body decoding |
//! | [`headers`] | Header sets, per-host defaults, well-known names |
//! | [`codec`] | Request body model and wire encoding |
//! | [`transport`] | Transport trait and the reqwest implementation |
//! | [`client`] | Client facade, builder and YAML configuration |

pub mod batch;
pub mod client;
pub mod codec;
pub mod headers;
pub mod request;
pub mod response;
pub mod transport;

pub use batch::{BatchExecutor, BatchState, BatchSummary};
pub use client::{ClientConfig, RestClient, RestClientBuilder};
pub use codec::{Body, StructuredBody};
pub use headers::{HeaderPolicy, HeaderSet};
pub use request::{Method, Request, RequestId, TransportHandle};
pub use response::{Payload, Response, ResponseInfo};
pub use transport::{Exchange, ReqwestTransport, Transport, TransportError};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::Error;
