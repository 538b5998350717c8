//! Request body model and wire encoding.
//!
//! Bodies stay untyped until a transport handle is built; only then is the
//! `Content-Type` header consulted to pick an encoding.

use crate::headers::{TYPE_JSON, TYPE_TEXT_JSON, TYPE_X_WWW_FORM_URLENCODED};
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// RFC 3986 unreserved characters stay literal, everything else is escaped.
const RFC3986_RESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A caller type that can be sent both as a structured mapping and as text.
///
/// JSON and form encodings use [`StructuredBody::fields`]; any other content
/// type falls back to the `Display` representation.
pub trait StructuredBody: fmt::Display + fmt::Debug + Send + Sync {
    fn fields(&self) -> Map<String, Value>;
}

/// Untyped request payload.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    /// Number or boolean, sent as its textual form.
    Scalar(Value),
    /// JSON object or array.
    Structured(Value),
    Object(Arc<dyn StructuredBody>),
}

impl Body {
    /// Build a body from any serializable value.
    pub fn from_serialize<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Body::from)
    }

    pub fn object(value: impl StructuredBody + 'static) -> Self {
        Body::Object(Arc::new(value))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Body::Empty,
            Value::String(s) => Body::Text(s),
            v @ (Value::Bool(_) | Value::Number(_)) => Body::Scalar(v),
            v @ (Value::Array(_) | Value::Object(_)) => Body::Structured(v),
        }
    }
}

impl From<Map<String, Value>> for Body {
    fn from(map: Map<String, Value>) -> Self {
        Body::Structured(Value::Object(map))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl<T: Into<Body>> From<Option<T>> for Body {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Json,
    Form,
    Other,
}

fn encoding_for(content_type: Option<&str>) -> Encoding {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    match essence.as_deref() {
        Some(TYPE_JSON) | Some(TYPE_TEXT_JSON) => Encoding::Json,
        Some(TYPE_X_WWW_FORM_URLENCODED) => Encoding::Form,
        _ => Encoding::Other,
    }
}

/// Encode `body` for the wire according to `content_type`.
///
/// Structured bodies with a content type that is neither JSON nor form
/// encoding produce an empty payload.
pub fn encode(body: &Body, content_type: Option<&str>) -> Bytes {
    match body {
        Body::Empty => Bytes::new(),
        Body::Text(s) => Bytes::from(s.clone()),
        Body::Scalar(v) => Bytes::from(scalar_text(v)),
        Body::Structured(v) => match encoding_for(content_type) {
            Encoding::Json => json_bytes(v),
            Encoding::Form => Bytes::from(form_encode(entries(v))),
            Encoding::Other => {
                tracing::warn!(
                    content_type = content_type.unwrap_or("<none>"),
                    "structured body has no encoding for this content type, sending empty payload"
                );
                Bytes::new()
            }
        },
        Body::Object(obj) => match encoding_for(content_type) {
            Encoding::Json => json_bytes(&Value::Object(obj.fields())),
            Encoding::Form => {
                let fields = obj.fields();
                Bytes::from(form_encode(fields.iter().map(|(k, v)| (k.clone(), v))))
            }
            Encoding::Other => Bytes::from(obj.to_string()),
        },
    }
}

/// Percent-encode pairs as `k=v&k2=v2` using RFC 3986 escaping (`%20`, never `+`).
pub fn form_encode<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (String, &'a Value)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(&k, RFC3986_RESERVED),
                utf8_percent_encode(&form_value(v), RFC3986_RESERVED)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

fn json_bytes(value: &Value) -> Bytes {
    // Serializing a Value cannot fail: all keys are strings.
    Bytes::from(serde_json::to_vec(value).unwrap_or_default())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn form_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        // nested values travel as compact JSON
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
