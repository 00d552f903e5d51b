//! HTTP message types
//!
//! Request and response descriptors plus the method enum. Requests are
//! consumed by [`crate::Client::send`]; responses are produced from raw
//! transfer results.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::body::Body;
use crate::headers::Headers;
use crate::uri::Uri;

/// Error returned for an unrecognized method token
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid request method: {0}")]
pub struct InvalidMethod(pub String);

/// HTTP request methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
    Connect,
    Options,
}

impl Method {
    /// Convert the method to its token text
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
        }
    }
}

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "PATCH" => Ok(Method::Patch),
            "CONNECT" => Ok(Method::Connect),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP request descriptor
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: Headers,
    body: Body,
}

impl Request {
    /// Create a new request with the given method and target
    pub fn new(method: Method, uri: Uri) -> Self {
        Request {
            method,
            uri,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Create a builder for a request against the given target
    pub fn builder(uri: Uri) -> RequestBuilder {
        RequestBuilder {
            method: Method::Get,
            uri,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Get the request method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Get the target URI
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Get the headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get mutable headers
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Get the body
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Set the body
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }
}

/// Builder for HTTP requests
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    uri: Uri,
    headers: Headers,
    body: Body,
}

impl RequestBuilder {
    /// Set the method (defaults to GET)
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Append a header value
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the request
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// HTTP response descriptor
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Create a builder for a response
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the body as text (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Builder for HTTP responses
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: Option<u16>,
    headers: Headers,
    body: Bytes,
}

impl ResponseBuilder {
    /// Set the status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Replace the full header map
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Append a header value
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the response
    pub fn build(self) -> Response {
        Response {
            status: self.status.unwrap_or(200),
            headers: self.headers,
            body: self.body,
        }
    }
}
