//! Request body abstraction
//!
//! A body is either absent, fully buffered in memory, or backed by a
//! streaming reader. Methods that send a body (POST, PUT) need the full
//! content up front, which only buffered bodies can provide; streaming
//! bodies are reported as non-seekable.

use std::fmt;
use std::io::Read;

use bytes::Bytes;

/// Request body
pub enum Body {
    /// No body
    Empty,
    /// Fully buffered body; can be materialized any number of times
    Buffered(Bytes),
    /// One-shot streaming body; cannot be materialized up front
    Streaming(Box<dyn Read + Send>),
}

impl Body {
    /// Create an empty body
    pub fn empty() -> Self {
        Body::Empty
    }

    /// Create a streaming body from a reader
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Body::Streaming(Box::new(reader))
    }

    /// Build a form-urlencoded body from key/value pairs
    ///
    /// Values are trimmed and percent-encoded, pairs joined with `&`:
    /// `[("a", "1"), ("b", "x y")]` becomes `a=1&b=x%20y`.
    pub fn from_form(pairs: &[(&str, &str)]) -> Self {
        let encoded = pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value.trim())))
            .collect::<Vec<_>>()
            .join("&");

        Body::Buffered(Bytes::from(encoded))
    }

    /// Whether the full content can be produced without consuming a stream
    pub fn is_seekable(&self) -> bool {
        !matches!(self, Body::Streaming(_))
    }

    /// Materialize the full body content
    ///
    /// Returns `None` for streaming bodies; an empty body materializes to
    /// zero bytes.
    pub fn materialize(&self) -> Option<Bytes> {
        match self {
            Body::Empty => Some(Bytes::new()),
            Body::Buffered(bytes) => Some(bytes.clone()),
            Body::Streaming(_) => None,
        }
    }

    /// Whether the body is known to be empty
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Buffered(bytes) => bytes.is_empty(),
            Body::Streaming(_) => false,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Empty
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => write!(f, "Body::Empty"),
            Body::Buffered(bytes) => write!(f, "Body::Buffered({} bytes)", bytes.len()),
            Body::Streaming(_) => write!(f, "Body::Streaming"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Buffered(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Buffered(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Buffered(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::Buffered(Bytes::from_static(text.as_bytes()))
    }
}
