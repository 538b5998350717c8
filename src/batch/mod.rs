//! Concurrent batch execution.
//!
//! # Batch Module
//!
//! A [`BatchExecutor`] collects requests, dispatches them together through a
//! [`Multiplexer`], and waits until every one has reached a terminal state
//! (success, transport error, or the shared deadline). Each request's
//! [`crate::Response`] is populated in place, so a failure in one request never
//! affects its siblings.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchExecutor`] | Registration, dispatch, deadline, result harvesting |
//! | [`BatchState`] | `Idle` → `Running` → `Draining` → `Done` |
//! | [`BatchSummary`] | Succeeded / failed / timed-out counts |
//! | [`Multiplexer`] | Drives all in-flight exchanges on the calling task |
//!
//! ## Example
//!
//! ```rust,no_run
//! use rest_batch::{BatchExecutor, Request};
//! use std::time::Duration;
//!
//! # async fn demo() -> rest_batch::Result<()> {
//! let mut batch = BatchExecutor::with_default_transport()?;
//! let users = batch.register(Request::get("https://jsonplaceholder.typicode.com/users")?)?;
//! let posts = batch.register(Request::get("https://jsonplaceholder.typicode.com/posts")?)?;
//!
//! batch.run(Duration::from_secs(5)).await?;
//!
//! for r in [&users, &posts] {
//!     println!("{} -> {}", r.request_url(), r.http_status());
//! }
//! # Ok(())
//! # }
//! ```

mod executor;
mod multiplexer;

pub use executor::{BatchExecutor, BatchState, BatchSummary};
pub use multiplexer::{Completion, Multiplexer};
