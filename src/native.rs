//! Built-in socket transfer engine
//!
//! A blocking [`TransferEngine`] over plain TCP and OpenSSL TLS. Every
//! call opens a fresh connection, writes one request assembled from the
//! option table, reads the response until the peer closes, and reports
//! the byte offsets needed to split the payload. The connection is
//! dropped on every exit path.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace};
use openssl::ssl::{SslConnector, SslMethod, SslStream, SslVerifyMode};
use socket2::{Domain, Protocol, Socket, Type};

use crate::engine::{EngineCode, EngineError, RawTransfer, TransferEngine, TransferInfo};
use crate::options::{TransferOption, TransferOptions};
use crate::uri::Uri;
use crate::{CRLF, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT};

/// Blocking TCP/TLS transfer engine
#[derive(Debug, Default)]
pub struct NativeEngine;

impl NativeEngine {
    /// Create a new engine
    pub fn new() -> Self {
        NativeEngine
    }
}

impl TransferEngine for NativeEngine {
    fn perform(&mut self, options: &TransferOptions) -> Result<RawTransfer, EngineError> {
        let plan = TransferPlan::from_options(options)?;

        debug!("{} {}:{}{}", plan.method, plan.uri.host(), plan.port, plan.uri.path_and_query());

        // Header text is captured before connecting so failure paths can
        // still report what would have gone out.
        let request_header = plan.request_header();
        let info_on_failure = || TransferInfo {
            request_header: request_header.clone(),
            ..TransferInfo::default()
        };

        let mut conn = connect(&plan).map_err(|e| e.with_info(info_on_failure()))?;

        let wire = plan.to_wire();
        conn.write_all(&wire).map_err(|e| {
            EngineError::new(io_code(&e, EngineCode::SendError), format!("Send failure: {}", e))
                .with_info(info_on_failure())
        })?;

        let mut payload = Vec::with_capacity(8192);
        conn.read_to_end(&mut payload).map_err(|e| {
            EngineError::new(io_code(&e, EngineCode::RecvError), format!("Receive failure: {}", e))
                .with_info(info_on_failure())
        })?;

        let (status, header_size) = split_metadata(&payload)
            .ok_or_else(|| {
                EngineError::new(EngineCode::RecvError, "Malformed response header")
                    .with_info(info_on_failure())
            })?;

        // A no-body transfer keeps only the header block; anything a
        // misbehaving peer sends after it is dropped.
        if plan.no_body {
            payload.truncate(header_size);
        }

        let size_download = payload.len() - header_size;
        trace!("transfer done: status {}, {} header bytes, {} body bytes", status, header_size, size_download);

        let payload = if plan.capture_headers {
            Bytes::from(payload)
        } else {
            Bytes::from(payload.split_off(header_size))
        };

        Ok(RawTransfer {
            payload,
            info: TransferInfo {
                status,
                header_size: if plan.capture_headers { header_size } else { 0 },
                size_download,
                request_header,
            },
        })
    }
}

/// Everything the engine needs for one transfer, resolved from the
/// option table up front so malformed options fail before any I/O.
#[derive(Debug)]
struct TransferPlan {
    uri: Uri,
    port: u16,
    method: String,
    header_lines: Vec<String>,
    body: Option<Bytes>,
    user_agent: Option<String>,
    credentials: Option<String>,
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
    verify_peer: bool,
    verify_host: bool,
    no_body: bool,
    capture_headers: bool,
    capture_request_header: bool,
}

impl TransferPlan {
    fn from_options(options: &TransferOptions) -> Result<Self, EngineError> {
        let bad = |msg: String| EngineError::new(EngineCode::BadOption, msg);

        let url = options
            .get(TransferOption::Url)
            .and_then(|v| v.as_text())
            .ok_or_else(|| bad("No target URL set".to_string()))?;
        let uri = Uri::parse(url).map_err(|e| bad(format!("Malformed target URL: {}", e)))?;

        let port = match options.get(TransferOption::Port) {
            Some(value) => value
                .as_int()
                .and_then(|n| u16::try_from(n).ok())
                .ok_or_else(|| bad("Malformed port option".to_string()))?,
            None => uri.resolve_port(),
        };

        let method = if let Some(value) = options.get(TransferOption::CustomRequest) {
            value
                .as_text()
                .ok_or_else(|| bad("Malformed custom-method option".to_string()))?
                .to_string()
        } else if options.is_enabled(TransferOption::Post) {
            "POST".to_string()
        } else {
            "GET".to_string()
        };

        let header_lines = options
            .get(TransferOption::HeaderLines)
            .and_then(|v| v.as_lines())
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        let body = options
            .get(TransferOption::BodyPayload)
            .and_then(|v| v.as_payload())
            .cloned();

        // Zero means no timeout, matching the convention of the classic
        // transfer libraries; std rejects zero-duration stream timeouts.
        let seconds = |key: TransferOption| -> Option<Duration> {
            options
                .get(key)
                .and_then(|v| v.as_int())
                .filter(|&n| n > 0)
                .map(Duration::from_secs)
        };

        Ok(TransferPlan {
            port,
            method,
            header_lines,
            body,
            user_agent: options
                .get(TransferOption::UserAgent)
                .and_then(|v| v.as_text())
                .map(str::to_string),
            credentials: options
                .get(TransferOption::Credentials)
                .and_then(|v| v.as_text())
                .map(str::to_string),
            connect_timeout: seconds(TransferOption::ConnectTimeout),
            timeout: seconds(TransferOption::Timeout),
            verify_peer: options
                .get(TransferOption::SslVerifyPeer)
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
            verify_host: options
                .get(TransferOption::SslVerifyHost)
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
            no_body: options.is_enabled(TransferOption::NoBody),
            capture_headers: options.is_enabled(TransferOption::CaptureHeaders),
            capture_request_header: options.is_enabled(TransferOption::CaptureRequestHeader),
            uri,
        })
    }

    fn has_header(&self, name: &str) -> bool {
        let prefix = format!("{}:", name);
        self.header_lines
            .iter()
            .any(|line| line.len() >= prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(&prefix))
    }

    /// The outgoing header block, request line included
    fn header_block(&self) -> String {
        let mut block = format!("{} {} HTTP/1.1{}", self.method, self.uri.path_and_query(), CRLF);

        if !self.has_header("Host") {
            let default_port = if self.uri.scheme() == "https" {
                DEFAULT_HTTPS_PORT
            } else {
                DEFAULT_HTTP_PORT
            };
            if self.port == default_port {
                block.push_str(&format!("Host: {}{}", self.uri.authority_host(), CRLF));
            } else {
                block.push_str(&format!("Host: {}:{}{}", self.uri.authority_host(), self.port, CRLF));
            }
        }

        if let Some(ref agent) = self.user_agent {
            if !self.has_header("User-Agent") {
                block.push_str(&format!("User-Agent: {}{}", agent, CRLF));
            }
        }

        if let Some(ref credentials) = self.credentials {
            if !self.has_header("Authorization") {
                let token = openssl::base64::encode_block(credentials.as_bytes());
                block.push_str(&format!("Authorization: Basic {}{}", token, CRLF));
            }
        }

        for line in &self.header_lines {
            block.push_str(line);
            block.push_str(CRLF);
        }

        if let Some(ref body) = self.body {
            if !self.has_header("Content-Length") {
                block.push_str(&format!("Content-Length: {}{}", body.len(), CRLF));
            }
        }

        // One transfer per connection
        block.push_str("Connection: close");
        block.push_str(CRLF);
        block.push_str(CRLF);
        block
    }

    fn request_header(&self) -> Option<String> {
        self.capture_request_header.then(|| self.header_block())
    }

    fn to_wire(&self) -> Vec<u8> {
        let mut wire = self.header_block().into_bytes();
        if let Some(ref body) = self.body {
            wire.extend_from_slice(body);
        }
        wire
    }
}

/// Established connection, plain or TLS
enum Conn {
    Plain(TcpStream),
    Tls(Box<SslStream<TcpStream>>),
}

impl Conn {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Conn::Plain(stream) => stream.write_all(buf),
            Conn::Tls(stream) => stream.write_all(buf),
        }
    }

    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> std::io::Result<usize> {
        match self {
            Conn::Plain(stream) => stream.read_to_end(buf),
            Conn::Tls(stream) => stream.read_to_end(buf),
        }
    }
}

fn connect(plan: &TransferPlan) -> Result<Conn, EngineError> {
    let host = plan.uri.host();

    let addrs: Vec<SocketAddr> = (host, plan.port)
        .to_socket_addrs()
        .map_err(|e| {
            EngineError::new(
                EngineCode::CouldNotResolveHost,
                format!("Could not resolve host: {} ({})", host, e),
            )
        })?
        .collect();

    let stream = connect_any(&addrs, plan.connect_timeout, host)?;
    stream.set_read_timeout(plan.timeout).ok();
    stream.set_write_timeout(plan.timeout).ok();

    if plan.uri.scheme() != "https" {
        return Ok(Conn::Plain(stream));
    }

    let tls_err =
        |e: String| EngineError::new(EngineCode::SslConnectError, format!("SSL connect error: {}", e));

    let mut builder =
        SslConnector::builder(SslMethod::tls()).map_err(|e| tls_err(e.to_string()))?;
    if !plan.verify_peer {
        builder.set_verify(SslVerifyMode::NONE);
    }
    let mut config = builder
        .build()
        .configure()
        .map_err(|e| tls_err(e.to_string()))?;
    if !plan.verify_host {
        config.set_verify_hostname(false);
    }

    let stream = config
        .connect(host, stream)
        .map_err(|e| tls_err(e.to_string()))?;

    Ok(Conn::Tls(Box::new(stream)))
}

fn connect_any(
    addrs: &[SocketAddr],
    timeout: Option<Duration>,
    host: &str,
) -> Result<TcpStream, EngineError> {
    let mut last_error = None;

    for addr in addrs {
        let attempt = (|| -> std::io::Result<TcpStream> {
            let socket = Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP))?;
            match timeout {
                Some(d) => socket.connect_timeout(&(*addr).into(), d)?,
                None => socket.connect(&(*addr).into())?,
            }
            Ok(socket.into())
        })();

        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    match last_error {
        Some(e) => Err(EngineError::new(
            io_code(&e, EngineCode::CouldNotConnect),
            format!("Could not connect to {}: {}", host, e),
        )),
        None => Err(EngineError::new(
            EngineCode::CouldNotResolveHost,
            format!("Could not resolve host: {}", host),
        )),
    }
}

/// Map a timed-out I/O error onto the timeout code, anything else onto
/// the given default.
fn io_code(error: &std::io::Error, default: EngineCode) -> EngineCode {
    match error.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            EngineCode::OperationTimedOut
        }
        _ => default,
    }
}

/// Extract the status code and header block length from a raw payload
fn split_metadata(payload: &[u8]) -> Option<(u16, usize)> {
    let header_size = find_terminator(payload, b"\r\n\r\n")
        .or_else(|| find_terminator(payload, b"\n\n"))?;

    let line_end = payload
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(payload.len());
    let status_line = String::from_utf8_lossy(&payload[..line_end]);
    let status = status_line.split_whitespace().nth(1)?.parse::<u16>().ok()?;

    Some((status, header_size))
}

fn find_terminator(payload: &[u8], terminator: &[u8]) -> Option<usize> {
    payload
        .windows(terminator.len())
        .position(|w| w == terminator)
        .map(|pos| pos + terminator.len())
}
