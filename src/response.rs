//! Result slot bound to one request.
//!
//! A [`Response`] is handed out at registration time and stays in the
//! "not yet run" state until the executor populates it exactly once.
//! Handles are cheap to clone; all clones observe the same result.

use crate::headers::{HeaderSet, TYPE_JSON};
use crate::request::{Method, Request, RequestId, TransportHandle};
use crate::transport::{Exchange, TransportError};
use crate::{Error, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

/// Transport metadata for a completed exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseInfo {
    pub content_type: Option<String>,
    /// Length of the status line plus header block in the raw payload.
    pub header_size: usize,
    pub size_upload: usize,
    pub size_download: usize,
    pub total_time: Duration,
    pub http_version: Option<String>,
    pub redirected: bool,
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Raw(Bytes),
    /// JSON content type with a blank body (e.g. a HEAD response).
    Empty,
}

#[derive(Debug)]
struct Outcome {
    error: String,
    effective_url: Url,
    http_status: i32,
    info: ResponseInfo,
    headers: Option<Vec<String>>,
    raw_body: Bytes,
    timed_out: bool,
}

#[derive(Debug)]
struct Slot {
    request_id: RequestId,
    method: Method,
    request_url: Url,
    sent: OnceLock<Arc<TransportHandle>>,
    outcome: OnceLock<Outcome>,
}

#[derive(Debug, Clone)]
pub struct Response {
    slot: Arc<Slot>,
}

impl Response {
    /// Empty result slot bound to `request`.
    pub fn new(request: &Request) -> Self {
        Self {
            slot: Arc::new(Slot {
                request_id: request.id(),
                method: request.method(),
                request_url: request.url().clone(),
                sent: OnceLock::new(),
                outcome: OnceLock::new(),
            }),
        }
    }

    /// Record the frozen handle that was dispatched for this response.
    pub(crate) fn attach_handle(&self, handle: Arc<TransportHandle>) {
        let _ = self.slot.sent.set(handle);
    }

    /// Populate from a completed (or failed) exchange.
    ///
    /// Only the first call has an effect; returns whether this call stored the result.
    pub fn set_result(&self, result: std::result::Result<Exchange, TransportError>) -> bool {
        let outcome = match result {
            Ok(exchange) => Self::parse_exchange(exchange),
            Err(e) => Outcome {
                error: e.to_string(),
                effective_url: self.slot.request_url.clone(),
                http_status: 0,
                info: ResponseInfo::default(),
                headers: None,
                raw_body: Bytes::new(),
                timed_out: e.is_timeout(),
            },
        };
        let stored = self.slot.outcome.set(outcome).is_ok();
        if !stored {
            tracing::warn!(request_id = %self.slot.request_id, "response already populated, result dropped");
        }
        stored
    }

    fn parse_exchange(exchange: Exchange) -> Outcome {
        let Exchange {
            effective_url,
            status,
            raw,
            info,
        } = exchange;
        let split = info.header_size.min(raw.len());
        let block = String::from_utf8_lossy(&raw[..split]).replace('\r', "");
        let mut headers: Vec<String> = block.split('\n').map(str::to_string).collect();
        while headers.last().is_some_and(|l| l.is_empty()) {
            headers.pop();
        }
        Outcome {
            error: String::new(),
            effective_url,
            http_status: i32::from(status),
            info,
            headers: Some(headers),
            raw_body: raw.slice(split..),
            timed_out: false,
        }
    }

    fn outcome(&self) -> Option<&Outcome> {
        self.slot.outcome.get()
    }

    pub fn request_id(&self) -> RequestId {
        self.slot.request_id
    }

    pub fn method(&self) -> Method {
        self.slot.method
    }

    pub fn request_url(&self) -> &Url {
        &self.slot.request_url
    }

    /// The request exactly as it was handed to the transport, once dispatched.
    pub fn sent_request(&self) -> Option<&TransportHandle> {
        self.slot.sent.get().map(Arc::as_ref)
    }

    /// Headers that went out with the request, `Content-Length` included.
    pub fn sent_headers(&self) -> Option<&HeaderSet> {
        self.sent_request().map(TransportHandle::headers)
    }

    pub fn is_populated(&self) -> bool {
        self.outcome().is_some()
    }

    /// `None` before the run, empty on success, the transport message otherwise.
    pub fn error(&self) -> Option<&str> {
        self.outcome().map(|o| o.error.as_str())
    }

    pub fn effective_url(&self) -> Option<&Url> {
        self.outcome().map(|o| &o.effective_url)
    }

    /// `-1` before the run, `0` after a transport error, otherwise the HTTP status.
    pub fn http_status(&self) -> i32 {
        self.outcome().map_or(-1, |o| o.http_status)
    }

    pub fn info(&self) -> Option<&ResponseInfo> {
        self.outcome().map(|o| &o.info)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.info().and_then(|i| i.content_type.as_deref())
    }

    /// Raw header lines; the first one is the status line.
    pub fn headers(&self) -> Option<&[String]> {
        self.outcome().and_then(|o| o.headers.as_deref())
    }

    pub fn status_line(&self) -> Option<&str> {
        self.headers()
            .and_then(|h| h.first())
            .map(String::as_str)
    }

    /// First header whose name matches case-insensitively, value trimmed.
    pub fn header(&self, name: &str) -> Option<&str> {
        let lines = self.headers()?;
        lines.iter().skip(1).find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    pub fn raw_body(&self) -> Option<&Bytes> {
        self.outcome().map(|o| &o.raw_body)
    }

    pub fn text(&self) -> Option<Cow<'_, str>> {
        self.raw_body().map(|b| String::from_utf8_lossy(b))
    }

    pub fn timed_out(&self) -> bool {
        self.outcome().is_some_and(|o| o.timed_out)
    }

    pub fn is_success(&self) -> bool {
        self.outcome()
            .is_some_and(|o| o.error.is_empty() && (200..300).contains(&o.http_status))
    }

    fn is_json(&self) -> bool {
        self.content_type()
            .and_then(|ct| ct.get(..TYPE_JSON.len()))
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(TYPE_JSON))
    }

    /// Body decoded according to the response content type.
    pub fn body(&self) -> Result<Payload> {
        let raw = self.raw_body().ok_or(Error::NotRun)?;
        if !self.is_json() {
            return Ok(Payload::Raw(raw.clone()));
        }
        let trimmed = trim_ascii(raw);
        if trimmed.is_empty() {
            return Ok(Payload::Empty);
        }
        Ok(Payload::Json(serde_json::from_slice(trimmed)?))
    }

    /// Deserialize the raw body as JSON regardless of the declared content type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self.raw_body().ok_or(Error::NotRun)?;
        Ok(serde_json::from_slice(trim_ascii(raw))?)
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
