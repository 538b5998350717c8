//! In-memory transport with per-path behaviour for deterministic timing tests.

use rest_batch::{Exchange, ResponseInfo, Transport, TransportError, TransportHandle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Paths of the form `/delay/<ms>` sleep before answering,
/// `/fail` errors immediately, everything else answers at once.
#[derive(Default)]
pub struct ScriptedTransport {
    pub calls: AtomicUsize,
    pub max_concurrent: AtomicUsize,
    current: AtomicUsize,
    pub seen_bodies: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(&self, handle: &TransportHandle) -> Result<Exchange, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        self.seen_bodies
            .lock()
            .unwrap()
            .push(handle.body().to_vec());

        let path = handle.url().path().to_string();
        let result = if path == "/fail" {
            Err(TransportError::Other("Could not resolve host".to_string()))
        } else {
            if let Some(ms) = path.strip_prefix("/delay/").and_then(|s| s.parse::<u64>().ok()) {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            Ok(Exchange::from_parts(
                handle.url().clone(),
                200,
                "HTTP/1.1 200 OK",
                [("Content-Type", "application/json")],
                format!(r#"{{"path":"{}"}}"#, path).as_bytes(),
                ResponseInfo {
                    content_type: Some("application/json".to_string()),
                    ..ResponseInfo::default()
                },
            ))
        };
        self.current.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
