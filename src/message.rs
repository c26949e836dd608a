//! Chat messages and the wire format
//!
//! The wire format is deliberately primitive: a datagram payload is the raw
//! UTF-8 bytes of `"<username>: <text>"`. No length prefix, no checksum
//! beyond UDP's own, no versioning. Receivers read into a fixed
//! [`MAX_PAYLOAD`]-byte buffer, so anything longer arrives silently
//! truncated.

use chrono::{DateTime, Local};
use std::fmt;
use std::net::SocketAddr;

/// Fixed receive buffer size in bytes
///
/// Payloads longer than this are truncated at the receiver, not dropped.
pub const MAX_PAYLOAD: usize = 1024;

/// Encode a chat line as a datagram payload
///
/// Produces the raw UTF-8 bytes of `"<username>: <text>"`.
pub fn encode_line(username: &str, text: &str) -> Vec<u8> {
    format!("{username}: {text}").into_bytes()
}

/// One received chat message
///
/// Built at receive time from raw datagram bytes, delivered once, and
/// discarded. Nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Address the datagram arrived from
    pub sender: SocketAddr,
    /// Decoded payload text (invalid UTF-8 is replaced, not rejected)
    pub text: String,
    /// Local receive time, second resolution when displayed
    pub received_at: DateTime<Local>,
    /// Whether the payload filled the receive buffer and may have been cut
    pub truncated: bool,
}

impl ChatMessage {
    /// Build a message from the filled prefix of a receive buffer
    ///
    /// `len` is the byte count returned by the receive call. A payload that
    /// fills the buffer completely is flagged as possibly truncated; the
    /// discarded tail is unrecoverable under UDP.
    pub fn from_datagram(buf: &[u8], len: usize, sender: SocketAddr) -> Self {
        let len = len.min(buf.len());
        Self {
            sender,
            text: String::from_utf8_lossy(&buf[..len]).into_owned(),
            received_at: Local::now(),
            truncated: len == buf.len(),
        }
    }
}

impl fmt::Display for ChatMessage {
    /// Formats as `[recv HH:MM:SS] [<sender-ip>] <text>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[recv {}] [{}] {}",
            self.received_at.format("%H:%M:%S"),
            self.sender.ip(),
            self.text
        )
    }
}

/// Current wall-clock time as `HH:MM:SS`, for send confirmations
pub(crate) fn clock_stamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
