//! Transfer option table
//!
//! The flat key/value table handed to the transfer engine. The client
//! keeps one table as its base configuration; every send translates into
//! a fresh copy of it, so per-request overrides never leak across calls.

use std::collections::BTreeMap;

use bytes::Bytes;

/// Transfer engine setting keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferOption {
    /// Max seconds to establish the connection
    ConnectTimeout,
    /// Max seconds for the full transfer
    Timeout,
    /// Validate the peer certificate
    SslVerifyPeer,
    /// Validate the certificate hostname
    SslVerifyHost,
    /// Outgoing User-Agent header value
    UserAgent,
    /// `user:password` for basic authentication
    Credentials,
    /// Fully formatted outgoing header lines, replaced every call
    HeaderLines,
    /// Resolved outgoing URL
    Url,
    /// Resolved outgoing port
    Port,
    /// Plain GET transfer
    HttpGet,
    /// POST transfer primitive
    Post,
    /// Method token override on top of the transfer primitive
    CustomRequest,
    /// Suppress the response body (HEAD)
    NoBody,
    /// Raw bytes sent as the request body
    BodyPayload,
    /// Include the response header block in the returned payload
    CaptureHeaders,
    /// Record the outgoing request header text for diagnostics
    CaptureRequestHeader,
    /// Return the transfer result as an in-memory buffer
    ReturnTransfer,
    /// Close the connection when the transfer finishes
    ForbidReuse,
    /// Never reuse a cached connection
    FreshConnect,
}

/// Transfer option values
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(u64),
    Text(String),
    Lines(Vec<String>),
    Payload(Bytes),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            OptionValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_lines(&self) -> Option<&[String]> {
        match self {
            OptionValue::Lines(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn as_payload(&self) -> Option<&Bytes> {
        match self {
            OptionValue::Payload(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<u64> for OptionValue {
    fn from(n: u64) -> Self {
        OptionValue::Int(n)
    }
}

impl From<u16> for OptionValue {
    fn from(n: u16) -> Self {
        OptionValue::Int(n.into())
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(lines: Vec<String>) -> Self {
        OptionValue::Lines(lines)
    }
}

impl From<Bytes> for OptionValue {
    fn from(bytes: Bytes) -> Self {
        OptionValue::Payload(bytes)
    }
}

/// Option table handed to the transfer engine
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOptions {
    table: BTreeMap<TransferOption, OptionValue>,
}

impl TransferOptions {
    /// Create an empty table
    pub fn new() -> Self {
        TransferOptions {
            table: BTreeMap::new(),
        }
    }

    /// The base table every client starts from: response headers captured
    /// in the payload, outgoing header text recorded, result buffered in
    /// memory, and one fresh connection per transfer.
    pub fn base() -> Self {
        let mut options = TransferOptions::new();
        options.set(TransferOption::CaptureHeaders, true);
        options.set(TransferOption::CaptureRequestHeader, true);
        options.set(TransferOption::ReturnTransfer, true);
        options.set(TransferOption::ForbidReuse, true);
        options.set(TransferOption::FreshConnect, true);
        options
    }

    /// Set an option
    pub fn set(&mut self, key: TransferOption, value: impl Into<OptionValue>) {
        self.table.insert(key, value.into());
    }

    /// Get an option value
    pub fn get(&self, key: TransferOption) -> Option<&OptionValue> {
        self.table.get(&key)
    }

    /// Check if an option is set
    pub fn contains(&self, key: TransferOption) -> bool {
        self.table.contains_key(&key)
    }

    /// Remove an option, returning its previous value
    pub fn remove(&mut self, key: TransferOption) -> Option<OptionValue> {
        self.table.remove(&key)
    }

    /// Merge another table into this one; values from `other` win
    pub fn merge(&mut self, other: TransferOptions) {
        self.table.extend(other.table);
    }

    /// Whether an option is set to true
    pub fn is_enabled(&self, key: TransferOption) -> bool {
        self.get(key).and_then(OptionValue::as_bool).unwrap_or(false)
    }

    /// Iterate over all set options
    pub fn iter(&self) -> impl Iterator<Item = (TransferOption, &OptionValue)> {
        self.table.iter().map(|(k, v)| (*k, v))
    }

    /// Number of set options
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for TransferOptions {
    fn default() -> Self {
        TransferOptions::new()
    }
}

impl FromIterator<(TransferOption, OptionValue)> for TransferOptions {
    fn from_iter<T: IntoIterator<Item = (TransferOption, OptionValue)>>(iter: T) -> Self {
        TransferOptions {
            table: iter.into_iter().collect(),
        }
    }
}
