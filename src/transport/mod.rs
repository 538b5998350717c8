//! Transport boundary.
//!
//! A [`Transport`] turns one frozen [`TransportHandle`] into an [`Exchange`]:
//! the raw header block plus body, the final URL, and metadata. Concurrency is
//! not the transport's concern; the batch multiplexer drives many exchanges
//! at once on a single task.

mod http;

pub use http::ReqwestTransport;

use crate::request::TransportHandle;
use crate::response::ResponseInfo;
use crate::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(&self, handle: &TransportHandle) -> std::result::Result<Exchange, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Operation timed out after {} milliseconds", .elapsed.as_millis())]
    Timeout { elapsed: Duration },

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Timeout { .. } => true,
            TransportError::Http(e) => e.is_timeout(),
            TransportError::Other(_) => false,
        }
    }
}

/// Completed payload of one handle, as reported by the transport.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub effective_url: Url,
    pub status: u16,
    /// Header block immediately followed by the body; `info.header_size`
    /// marks the split.
    pub raw: Bytes,
    pub info: ResponseInfo,
}

impl Exchange {
    /// Assemble the raw wire layout from an already parsed response.
    ///
    /// `info.header_size` is overwritten with the length of the rendered block.
    pub fn from_parts<'a, I>(
        effective_url: Url,
        status: u16,
        status_line: &str,
        headers: I,
        body: &[u8],
        mut info: ResponseInfo,
    ) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut raw = BytesMut::new();
        raw.put_slice(status_line.as_bytes());
        raw.put_slice(b"\r\n");
        for (name, value) in headers {
            raw.put_slice(name.as_bytes());
            raw.put_slice(b": ");
            raw.put_slice(value.as_bytes());
            raw.put_slice(b"\r\n");
        }
        raw.put_slice(b"\r\n");
        info.header_size = raw.len();
        info.size_download = body.len();
        raw.put_slice(body);

        Self {
            effective_url,
            status,
            raw: raw.freeze(),
            info,
        }
    }
}

static SHARED: Lazy<std::result::Result<Arc<ReqwestTransport>, String>> =
    Lazy::new(|| ReqwestTransport::from_env().map(Arc::new).map_err(|e| e.to_string()));

/// Process-wide default transport, built from the environment on first use.
pub fn shared() -> Result<Arc<dyn Transport>> {
    match &*SHARED {
        Ok(t) => Ok(t.clone() as Arc<dyn Transport>),
        Err(msg) => Err(Error::configuration(msg.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_renders_wire_layout() {
        let url = Url::parse("http://localhost/x").unwrap();
        let ex = Exchange::from_parts(
            url,
            201,
            "HTTP/1.1 201 Created",
            [("content-type", "text/plain"), ("x-id", "7")],
            b"hello",
            ResponseInfo::default(),
        );
        let text = std::str::from_utf8(&ex.raw).unwrap();
        assert_eq!(
            text,
            "HTTP/1.1 201 Created\r\ncontent-type: text/plain\r\nx-id: 7\r\n\r\nhello"
        );
        assert_eq!(ex.info.header_size, text.len() - 5);
        assert_eq!(ex.info.size_download, 5);
    }

    #[test]
    fn timeout_message_mentions_milliseconds() {
        let err = TransportError::Timeout {
            elapsed: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Operation timed out after 250 milliseconds");
        assert!(err.is_timeout());
        assert!(!TransportError::Other("x".into()).is_timeout());
    }
}
