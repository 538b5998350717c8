//! Batch executor.

use super::multiplexer::Multiplexer;
use crate::request::{Request, RequestId};
use crate::response::Response;
use crate::transport::{self, Exchange, Transport, TransportError};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lifecycle of one executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Requests may be registered; nothing dispatched.
    Idle,
    /// All handles submitted to the multiplexer.
    Running,
    /// Multiplexer quiescent or deadline hit; results being harvested.
    Draining,
    /// Every response populated and every handle released.
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub pending: usize,
}

/// Owns an ordered batch of (request, response) pairs and runs them
/// concurrently under one shared deadline.
pub struct BatchExecutor {
    transport: Arc<dyn Transport>,
    requests: Vec<Request>,
    responses: Vec<Response>,
    registered: HashSet<RequestId>,
    state: BatchState,
}

impl BatchExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            requests: Vec::new(),
            responses: Vec::new(),
            registered: HashSet::new(),
            state: BatchState::Idle,
        }
    }

    /// Executor on the shared default reqwest transport.
    pub fn with_default_transport() -> Result<Self> {
        Ok(Self::new(transport::shared()?))
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Add `request` to the batch and return its (still empty) response.
    pub fn register(&mut self, request: Request) -> Result<Response> {
        let id = request.id();
        if !self.registered.insert(id) {
            return Err(Error::DuplicateRequest { id });
        }
        if self.state != BatchState::Idle {
            warn!(request_id = %id, state = ?self.state, "registering on an executor that already ran");
        }
        let response = Response::new(&request);
        debug!(request_id = %id, method = %request.method(), url = %request.url(), "registered request");
        self.requests.push(request);
        self.responses.push(response.clone());
        Ok(response)
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn summary(&self) -> BatchSummary {
        let mut s = BatchSummary {
            total: self.responses.len(),
            ..BatchSummary::default()
        };
        for r in &self.responses {
            match r.error() {
                None => s.pending += 1,
                Some("") => s.succeeded += 1,
                Some(_) if r.timed_out() => s.timed_out += 1,
                Some(_) => s.failed += 1,
            }
        }
        s
    }

    /// Dispatch every registered request and wait until all have completed
    /// or `timeout` has elapsed. Responses come back in registration order.
    ///
    /// Request-level failures, timeouts included, are recorded in the
    /// matching response; they never make this call fail.
    pub async fn run(&mut self, timeout: Duration) -> Result<Vec<Response>> {
        if self.requests.is_empty() {
            return Ok(Vec::new());
        }
        let pending: Vec<(&Request, &Response)> = self
            .requests
            .iter()
            .zip(&self.responses)
            .filter(|(_, response)| !response.is_populated())
            .collect();
        if pending.is_empty() {
            warn!(
                requests = self.requests.len(),
                "batch already ran, returning existing responses"
            );
            return Ok(self.responses.clone());
        }

        let started = Instant::now();
        // `None` when the timeout is too large to represent: wait without a deadline.
        let deadline = tokio::time::Instant::now().checked_add(timeout);
        let mut mux = Multiplexer::new(Arc::clone(&self.transport));
        for (request, response) in pending {
            let handle = request.build_transport_handle();
            response.attach_handle(Arc::clone(&handle));
            mux.submit(handle);
        }
        self.state = BatchState::Running;
        debug!(in_flight = mux.in_flight(), ?timeout, "batch running");

        let mut completed: HashMap<RequestId, std::result::Result<Exchange, TransportError>> =
            HashMap::with_capacity(self.requests.len());
        while !mux.is_idle() {
            let next = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, mux.next_completed()).await,
                None => Ok(mux.next_completed().await),
            };
            match next {
                Ok(Some((id, result))) => {
                    debug!(
                        request_id = %id,
                        ok = result.is_ok(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "request completed"
                    );
                    completed.insert(id, result);
                }
                Ok(None) => break,
                Err(_) => {
                    let aborted = mux.abort_all();
                    warn!(aborted = aborted.len(), ?timeout, "batch deadline elapsed");
                    for id in aborted {
                        completed.insert(id, Err(TransportError::Timeout { elapsed: timeout }));
                    }
                }
            }
        }
        drop(mux);
        self.state = BatchState::Draining;

        for response in self.responses.iter().filter(|r| !r.is_populated()) {
            let result = completed.remove(&response.request_id()).unwrap_or_else(|| {
                Err(TransportError::Other(
                    "no completion recorded for request".to_string(),
                ))
            });
            response.set_result(result);
        }
        self.state = BatchState::Done;

        let summary = self.summary();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            timed_out = summary.timed_out,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch finished"
        );
        Ok(self.responses.clone())
    }

    /// Blocking variant of [`BatchExecutor::run`] for synchronous callers.
    ///
    /// Fails with [`Error::Configuration`] when called from inside an async runtime.
    pub fn run_blocking(&mut self, timeout: Duration) -> Result<Vec<Response>> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::configuration(
                "run_blocking called from within an async runtime; use run().await",
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(timeout))
    }
}
