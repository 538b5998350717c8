use crate::request::RequestId;
use crate::transport::TransportError;
use thiserror::Error;

/// Unified error type for rest-batch.
///
/// Request-level I/O failures never show up here while a batch runs: they are
/// recovered into the bound [`crate::Response`]. What remains are programmer
/// errors, configuration problems, and decoding failures raised on demand.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request {id} is already registered with this executor")]
    DuplicateRequest { id: RequestId },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response has not been populated yet")]
    NotRun,

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// True for errors caused by misuse of the API rather than by the network or the peer.
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Error::InvalidUrl { .. } | Error::DuplicateRequest { .. })
    }
}
