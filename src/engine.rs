//! Transfer engine boundary
//!
//! The engine is the blocking "perform one HTTP transfer" primitive. It
//! consumes a fully resolved option table and returns the raw wire result
//! plus the metadata needed to split it, or a low-level error carrying a
//! classification code. The built-in implementation lives in
//! [`crate::native`]; tests inject their own.

use bytes::Bytes;

use crate::options::TransferOptions;

/// Blocking HTTP transfer primitive
///
/// One call performs exactly one transfer: no retries, no connection
/// reuse. Implementations must release every acquired resource before
/// returning, on success and failure alike.
pub trait TransferEngine {
    fn perform(&mut self, options: &TransferOptions) -> Result<RawTransfer, EngineError>;
}

/// Raw result of one successful transfer
#[derive(Debug, Clone)]
pub struct RawTransfer {
    /// Header block concatenated with the body, as delivered by the engine
    pub payload: Bytes,
    /// Metadata describing the payload
    pub info: TransferInfo,
}

/// Transfer metadata, available regardless of outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferInfo {
    /// Numeric response status
    pub status: u16,
    /// Byte length of the header block at the start of the payload
    pub header_size: usize,
    /// Byte length of the body at the end of the payload
    pub size_download: usize,
    /// Raw outgoing request header text, for diagnostics
    pub request_header: Option<String>,
}

/// Low-level failure codes reported by a transfer engine
///
/// The numeric values follow the convention of the classic transfer
/// libraries, so engines wrapping one can pass codes through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCode {
    /// The proxy host could not be resolved
    CouldNotResolveProxy,
    /// The target host could not be resolved
    CouldNotResolveHost,
    /// The connection attempt failed
    CouldNotConnect,
    /// The transfer exceeded its time budget
    OperationTimedOut,
    /// The TLS handshake failed
    SslConnectError,
    /// An option value could not be applied
    BadOption,
    /// Sending request data failed
    SendError,
    /// Receiving response data failed
    RecvError,
    /// Any other engine-specific code
    Other(i32),
}

impl EngineCode {
    /// The raw numeric code
    pub fn as_raw(self) -> i32 {
        match self {
            EngineCode::CouldNotResolveProxy => 5,
            EngineCode::CouldNotResolveHost => 6,
            EngineCode::CouldNotConnect => 7,
            EngineCode::OperationTimedOut => 28,
            EngineCode::SslConnectError => 35,
            EngineCode::BadOption => 48,
            EngineCode::SendError => 55,
            EngineCode::RecvError => 56,
            EngineCode::Other(code) => code,
        }
    }

    /// Whether this code signals a connectivity failure (DNS, connect,
    /// timeout or TLS handshake) rather than a local problem
    pub fn is_network(self) -> bool {
        matches!(
            self,
            EngineCode::CouldNotResolveProxy
                | EngineCode::CouldNotResolveHost
                | EngineCode::CouldNotConnect
                | EngineCode::OperationTimedOut
                | EngineCode::SslConnectError
        )
    }
}

/// Transfer engine failure
///
/// Metadata gathered before the failure is carried along, so diagnostics
/// stay available even when the transfer itself produced no result.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    pub code: EngineCode,
    pub message: String,
    pub info: Option<TransferInfo>,
}

impl EngineError {
    /// Create a new engine error
    pub fn new(code: EngineCode, message: impl Into<String>) -> Self {
        EngineError {
            code,
            message: message.into(),
            info: None,
        }
    }

    /// Attach the metadata gathered before the failure
    pub fn with_info(mut self, info: TransferInfo) -> Self {
        self.info = Some(info);
        self
    }
}
