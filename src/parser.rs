//! Raw transfer parsing
//!
//! Splits the combined header+body payload of a [`RawTransfer`] into a
//! structured [`Response`] using the engine-reported byte offsets.

use bytes::Bytes;

use crate::engine::RawTransfer;
use crate::headers::Headers;
use crate::message::Response;
use crate::{CRLF, LF};

/// Pick the header line separator for a payload
///
/// CRLF wins when it appears anywhere in the payload, otherwise LF. The
/// scan deliberately covers the whole payload, not just the header block:
/// an LF-separated header block followed by a body that happens to contain
/// CRLF selects CRLF splitting. This mirrors the behavior of the system
/// this layer was modeled on.
pub fn detect_newline(payload: &[u8]) -> &'static str {
    if payload.windows(2).any(|w| w == b"\r\n") {
        CRLF
    } else {
        LF
    }
}

/// Build a structured response from a raw transfer result
///
/// The header block is the first `header_size` bytes of the payload and
/// the body is the last `size_download` bytes; a zero download size always
/// yields an empty body. Parsing is total: malformed header lines are
/// dropped rather than reported.
pub fn resolve(raw: &RawTransfer) -> Response {
    let payload = &raw.payload;
    let info = &raw.info;

    let newline = detect_newline(payload);

    let header_end = info.header_size.min(payload.len());
    let header_block = String::from_utf8_lossy(&payload[..header_end]);

    let body = if info.size_download == 0 {
        Bytes::new()
    } else {
        let start = payload.len().saturating_sub(info.size_download);
        raw.payload.slice(start..)
    };

    Response::builder()
        .status(info.status)
        .headers(Headers::parse_block(&header_block, newline))
        .body(body)
        .build()
}
