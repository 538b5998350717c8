//! Single-task fan-in over many in-flight exchanges.

use crate::request::{RequestId, TransportHandle};
use crate::transport::{Exchange, Transport, TransportError};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

pub type Completion = (RequestId, Result<Exchange, TransportError>);

/// Runs every submitted handle concurrently on the polling task.
///
/// Dropping the multiplexer cancels whatever is still pending.
pub struct Multiplexer {
    transport: Arc<dyn Transport>,
    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
    in_flight: HashSet<RequestId>,
}

impl Multiplexer {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            pending: FuturesUnordered::new(),
            in_flight: HashSet::new(),
        }
    }

    pub fn submit(&mut self, handle: Arc<TransportHandle>) {
        let id = handle.request_id();
        let transport = Arc::clone(&self.transport);
        self.in_flight.insert(id);
        self.pending.push(Box::pin(async move {
            let result = transport.exchange(&handle).await;
            (id, result)
        }));
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Drive pending exchanges until one completes. `None` once idle.
    pub async fn next_completed(&mut self) -> Option<Completion> {
        let (id, result) = self.pending.next().await?;
        self.in_flight.remove(&id);
        Some((id, result))
    }

    /// Cancel everything still pending, returning the affected ids.
    pub fn abort_all(&mut self) -> Vec<RequestId> {
        self.pending.clear();
        self.in_flight.drain().collect()
    }
}
