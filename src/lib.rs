//! Courier - a synchronous HTTP client layered over a blocking transfer engine
//!
//! This crate translates a structured HTTP request into a flat table of
//! transfer options, hands that table to a blocking [`TransferEngine`] for a
//! single transfer, and parses the raw wire result back into a structured
//! [`Response`]. Failures are classified into a small typed taxonomy
//! ([`Error`]) before any parsing is attempted.
//!
//! # Architecture
//!
//! The engine boundary is a trait, so the same client code drives the
//! built-in socket engine ([`NativeEngine`]) or any injected replacement:
//!
//! - [`translate`] turns a [`Request`] into [`TransferOptions`]
//! - [`TransferEngine::perform`] runs exactly one blocking transfer
//! - [`parser`] splits the raw payload into headers and body using the
//!   engine-reported byte offsets
//!
//! # Examples
//!
//! ```no_run
//! use courier::{Client, Method, Request, Uri};
//!
//! let uri: Uri = "http://httpbin.org/get".parse().unwrap();
//! let request = Request::builder(uri).method(Method::Get).build();
//!
//! let mut client = Client::new();
//! let response = client.send(request).unwrap();
//! assert_eq!(response.status(), 200);
//! ```

pub mod body;
pub mod client;
pub mod engine;
pub mod headers;
pub mod message;
pub mod native;
pub mod options;
pub mod parser;
pub mod translate;
pub mod uri;

pub use body::Body;
pub use client::Client;
pub use engine::{EngineCode, EngineError, RawTransfer, TransferEngine, TransferInfo};
pub use headers::Headers;
pub use message::{Method, Request, Response};
pub use native::NativeEngine;
pub use options::{OptionValue, TransferOption, TransferOptions};
pub use uri::Uri;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Client error taxonomy
///
/// Every failure a [`Client::send`] call can produce falls into one of
/// three kinds. None of them is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller-supplied request is invalid. Raised before any network
    /// activity; always avoidable by the caller.
    #[error("{message}")]
    Request {
        request: Box<Request>,
        message: String,
        code: u16,
    },

    /// Connectivity, DNS, TLS handshake or timeout failure during the
    /// transfer. Carries the original request for diagnostics. The caller
    /// may retry at its own discretion; this layer never does.
    #[error("{message}")]
    Network {
        request: Box<Request>,
        message: String,
        status: u16,
    },

    /// A malformed transfer option or an unclassified transfer failure.
    #[error("{message} (engine code {code})")]
    Client { message: String, code: i32 },
}

impl Error {
    /// The request that triggered this error, when one is carried.
    pub fn request(&self) -> Option<&Request> {
        match self {
            Error::Request { request, .. } | Error::Network { request, .. } => Some(request),
            Error::Client { .. } => None,
        }
    }

    /// The status code associated with this error, when one is carried.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Request { code, .. } => Some(*code),
            Error::Network { status, .. } => Some(*status),
            Error::Client { .. } => None,
        }
    }
}

/// CRLF line ending
pub const CRLF: &str = "\r\n";

/// LF line ending
pub const LF: &str = "\n";

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default HTTPS port
pub const DEFAULT_HTTPS_PORT: u16 = 443;
