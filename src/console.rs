//! Console input handling
//!
//! Boundary glue between the terminal and the outbound path: username
//! resolution at startup and line-by-line classification of chat input.
//! Kept free of socket code so the rules are testable without a terminal.

use std::time::{SystemTime, UNIX_EPOCH};

/// Typing this line (any letter case, surrounding whitespace ignored)
/// ends the chat session
pub const EXIT_SENTINEL: &str = "exit";

/// What to do with one line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
    /// Hand the line to the outbound path
    Send(String),
    /// Blank after trimming; discard and keep reading
    Skip,
    /// The exit sentinel; stop without sending
    Quit,
}

/// Classify one line of console input
///
/// The sentinel check and the blank check both apply to the trimmed line;
/// a line that is sent is forwarded exactly as typed.
pub fn classify_line(line: &str) -> LineAction {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineAction::Skip;
    }
    if trimmed.eq_ignore_ascii_case(EXIT_SENTINEL) {
        return LineAction::Quit;
    }
    LineAction::Send(line.to_string())
}

/// Resolve the username typed at the prompt
///
/// Whitespace is trimmed; an empty answer falls back to a generated
/// default.
pub fn resolve_username(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        default_username()
    } else {
        trimmed.to_string()
    }
}

/// Generate a default username of the form `User<0-999>`
///
/// The suffix is the millisecond clock modulo 1000; good enough to tell
/// two anonymous participants apart on a small network.
pub fn default_username() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("User{}", millis % 1000)
}
