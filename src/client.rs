//! HTTP client
//!
//! Ties the pieces together: translates a request into transfer options,
//! runs one blocking transfer on the engine, classifies failures and
//! parses the raw result into a response.

use log::debug;

use crate::engine::{EngineError, TransferEngine, TransferInfo};
use crate::message::{Request, Response};
use crate::native::NativeEngine;
use crate::options::{OptionValue, TransferOption, TransferOptions};
use crate::{parser, translate, Error, Result};

/// Synchronous HTTP client
///
/// Holds a base option table and a transfer engine. Every [`send`] call
/// translates into a fresh copy of the base table, so per-request
/// overrides (method flags, body payload) never leak into the next call.
/// `send` blocks the calling thread for the duration of the transfer;
/// the exclusive borrow makes concurrent reuse a compile error rather
/// than a data race.
///
/// [`send`]: Client::send
pub struct Client<E: TransferEngine = NativeEngine> {
    engine: E,
    options: TransferOptions,
    info: Option<TransferInfo>,
}

impl Client<NativeEngine> {
    /// Create a client backed by the built-in socket engine
    pub fn new() -> Self {
        Client::with_engine(NativeEngine::new())
    }
}

impl Default for Client<NativeEngine> {
    fn default() -> Self {
        Client::new()
    }
}

impl<E: TransferEngine> Client<E> {
    /// Create a client with an injected transfer engine
    pub fn with_engine(engine: E) -> Self {
        Client {
            engine,
            options: TransferOptions::base(),
            info: None,
        }
    }

    /// Send a request and block until the response is parsed
    ///
    /// Exactly one transfer is attempted; no retries, no redirects.
    pub fn send(&mut self, request: Request) -> Result<Response> {
        let mut options = self.options.clone();

        if let Err(e) = translate::apply(&request, &mut options) {
            return Err(Error::Request {
                request: Box::new(request),
                message: e.message,
                code: e.code,
            });
        }

        match self.engine.perform(&options) {
            Ok(raw) => {
                self.info = Some(raw.info.clone());
                Ok(parser::resolve(&raw))
            }
            Err(error) => {
                self.info = error.info.clone();
                Err(classify(error, request))
            }
        }
    }

    /// Transfer metadata from the most recent `send`, available on
    /// success and on transfer failure alike
    pub fn info(&self) -> Option<&TransferInfo> {
        self.info.as_ref()
    }

    /// Set a single base option
    pub fn set_option(&mut self, key: TransferOption, value: impl Into<OptionValue>) {
        self.options.set(key, value);
    }

    /// Get a base option value
    pub fn get_option(&self, key: TransferOption) -> Option<&OptionValue> {
        self.options.get(key)
    }

    /// Merge a table of options into the base table; new values win
    pub fn set_options(&mut self, options: TransferOptions) {
        self.options.merge(options);
    }

    /// Snapshot of the current base option table
    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Shorthand for the credentials option
    pub fn set_basic_authentication(&mut self, username: &str, password: &str) {
        self.options
            .set(TransferOption::Credentials, format!("{}:{}", username, password));
    }
}

/// Classify an engine failure into the error taxonomy
///
/// Connectivity codes become [`Error::Network`] with a fixed status of
/// 500 and the original request attached; everything else is a local
/// problem reported as [`Error::Client`] with the raw code.
fn classify(error: EngineError, request: Request) -> Error {
    debug!("transfer failed: {} (code {})", error.message, error.code.as_raw());

    if error.code.is_network() {
        Error::Network {
            request: Box::new(request),
            message: error.message,
            status: 500,
        }
    } else {
        Error::Client {
            message: error.message,
            code: error.code.as_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::engine::{EngineCode, RawTransfer};
    use crate::message::Method;
    use crate::uri::Uri;
    use bytes::Bytes;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Engine double: records every option table it sees and replays
    /// canned outcomes.
    struct MockEngine {
        seen: Rc<RefCell<Vec<TransferOptions>>>,
        outcome: fn() -> std::result::Result<RawTransfer, EngineError>,
    }

    fn ok_transfer() -> std::result::Result<RawTransfer, EngineError> {
        let header_block = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n";
        let payload = format!("{}hi", header_block);
        Ok(RawTransfer {
            payload: Bytes::from(payload),
            info: TransferInfo {
                status: 200,
                header_size: header_block.len(),
                size_download: 2,
                request_header: Some("GET / HTTP/1.1\r\n\r\n".to_string()),
            },
        })
    }

    fn mock_client(
        outcome: fn() -> std::result::Result<RawTransfer, EngineError>,
    ) -> (Client<MockEngine>, Rc<RefCell<Vec<TransferOptions>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let engine = MockEngine {
            seen: Rc::clone(&seen),
            outcome,
        };
        (Client::with_engine(engine), seen)
    }

    impl TransferEngine for MockEngine {
        fn perform(
            &mut self,
            options: &TransferOptions,
        ) -> std::result::Result<RawTransfer, EngineError> {
            self.seen.borrow_mut().push(options.clone());
            (self.outcome)()
        }
    }

    fn get(uri: &str) -> Request {
        Request::builder(uri.parse::<Uri>().unwrap()).build()
    }

    #[test]
    fn test_send_parses_response() {
        let (mut client, _) = mock_client(ok_transfer);
        let response = client.send(get("http://example.com/")).unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("Content-Type"), Some("text/plain"));
        assert_eq!(response.body().as_ref(), b"hi");
    }

    #[test]
    fn test_send_captures_info() {
        let (mut client, _) = mock_client(ok_transfer);
        assert!(client.info().is_none());

        client.send(get("http://example.com/")).unwrap();

        let info = client.info().unwrap();
        assert_eq!(info.status, 200);
        assert_eq!(info.size_download, 2);
        assert!(info.request_header.is_some());
    }

    #[test]
    fn test_overrides_do_not_leak_across_sends() {
        let (mut client, seen) = mock_client(ok_transfer);

        let uri: Uri = "http://example.com/submit".parse().unwrap();
        let post = Request::builder(uri).method(Method::Post).body("x=1").build();
        client.send(post).unwrap();
        client.send(get("http://example.com/")).unwrap();

        let seen = seen.borrow();
        assert!(seen[0].is_enabled(TransferOption::Post));
        assert!(seen[0].contains(TransferOption::BodyPayload));
        // The second transfer saw a table translated from the base,
        // without the first call's POST overrides.
        assert!(seen[1].is_enabled(TransferOption::HttpGet));
        assert!(!seen[1].contains(TransferOption::Post));
        assert!(!seen[1].contains(TransferOption::BodyPayload));
        // And the stored base table itself was never touched.
        assert!(!client.options().contains(TransferOption::Post));
        assert!(!client.options().contains(TransferOption::Url));
    }

    #[test]
    fn test_configured_options_reach_engine() {
        let (mut client, seen) = mock_client(ok_transfer);
        client.set_option(TransferOption::Timeout, 30u64);
        client.set_option(TransferOption::UserAgent, "courier-test");

        client.send(get("http://example.com/")).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0].get(TransferOption::Timeout).unwrap().as_int(), Some(30));
        assert_eq!(
            seen[0].get(TransferOption::UserAgent).unwrap().as_text(),
            Some("courier-test")
        );
        // Base defaults are carried too.
        assert!(seen[0].is_enabled(TransferOption::ForbidReuse));
        assert!(seen[0].is_enabled(TransferOption::FreshConnect));
    }

    #[test]
    fn test_option_api() {
        let (mut client, _) = mock_client(ok_transfer);

        client.set_option(TransferOption::ConnectTimeout, 1u64);
        assert_eq!(
            client.get_option(TransferOption::ConnectTimeout).unwrap().as_int(),
            Some(1)
        );

        let mut batch = TransferOptions::new();
        batch.set(TransferOption::ConnectTimeout, 5u64);
        batch.set(TransferOption::Timeout, 10u64);
        client.set_options(batch);

        assert_eq!(
            client.get_option(TransferOption::ConnectTimeout).unwrap().as_int(),
            Some(5)
        );
        assert_eq!(client.get_option(TransferOption::Timeout).unwrap().as_int(), Some(10));
    }

    #[test]
    fn test_basic_authentication_shorthand() {
        let (mut client, _) = mock_client(ok_transfer);
        client.set_basic_authentication("john", "s3cr3t");

        assert_eq!(
            client.get_option(TransferOption::Credentials).unwrap().as_text(),
            Some("john:s3cr3t")
        );
    }

    #[test]
    fn test_non_seekable_body_fails_before_engine() {
        let (mut client, seen) = mock_client(ok_transfer);

        let uri: Uri = "http://example.com/submit".parse().unwrap();
        let request = Request::builder(uri)
            .method(Method::Post)
            .body(Body::from_reader(std::io::Cursor::new(b"s".to_vec())))
            .build();

        let err = client.send(request).unwrap_err();
        match err {
            Error::Request { message, code, request } => {
                assert_eq!(message, "Request body is not seekable");
                assert_eq!(code, 400);
                assert_eq!(request.method(), Method::Post);
            }
            other => panic!("expected Request error, got {:?}", other),
        }
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_resolve_failure_classifies_as_network() {
        let (mut client, _) = mock_client(|| {
            Err(EngineError::new(
                EngineCode::CouldNotResolveHost,
                "Could not resolve host: nope.invalid",
            ))
        });

        let err = client.send(get("http://nope.invalid/")).unwrap_err();
        match err {
            Error::Network { status, request, message } => {
                assert_eq!(status, 500);
                assert_eq!(request.uri().host(), "nope.invalid");
                assert!(message.contains("nope.invalid"));
            }
            other => panic!("expected Network error, got {:?}", other),
        }
    }

    #[test]
    fn test_timeout_classifies_as_network() {
        let (mut client, _) = mock_client(|| {
            Err(EngineError::new(EngineCode::OperationTimedOut, "Timed out"))
        });

        let err = client.send(get("http://example.com/")).unwrap_err();
        assert!(matches!(err, Error::Network { status: 500, .. }));
    }

    #[test]
    fn test_unclassified_failure_is_client_error() {
        let (mut client, _) = mock_client(|| {
            Err(EngineError::new(EngineCode::Other(23), "Write failed"))
        });

        let err = client.send(get("http://example.com/")).unwrap_err();
        match err {
            Error::Client { message, code } => {
                assert_eq!(message, "Write failed");
                assert_eq!(code, 23);
            }
            other => panic!("expected Client error, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_info_still_captured() {
        let (mut client, _) = mock_client(|| {
            Err(EngineError::new(EngineCode::RecvError, "Receive failure").with_info(
                TransferInfo {
                    request_header: Some("GET / HTTP/1.1\r\n\r\n".to_string()),
                    ..TransferInfo::default()
                },
            ))
        });

        let _ = client.send(get("http://example.com/")).unwrap_err();
        assert!(client.info().unwrap().request_header.is_some());
    }

    #[test]
    fn test_bad_option_is_client_error() {
        let (mut client, _) = mock_client(|| {
            Err(EngineError::new(EngineCode::BadOption, "Malformed target URL"))
        });

        let err = client.send(get("http://example.com/")).unwrap_err();
        assert!(matches!(err, Error::Client { code: 48, .. }));
    }
}
