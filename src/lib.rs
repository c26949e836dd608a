//! # ztalk
//!
//! A minimal plaintext chat for small trusted networks, built on raw UDP.
//! Two addressing modes: multicast (one send reaches every group member)
//! and unicast (explicit per-peer fan-out). Designed for LANs and virtual
//! overlay networks such as ZeroTier, whose adapter is auto-detected so
//! multicast traffic actually crosses the overlay.
//!
//! There is no framing, no retransmission, no ordering across senders, and
//! no crypto: datagrams carry the raw UTF-8 bytes of
//! `"<username>: <message>"` and that is the whole protocol.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ztalk::{ChatConfig, ChatNode};
//!
//! #[tokio::main]
//! async fn main() -> ztalk::Result<()> {
//!     let node = ChatNode::new(ChatConfig::default());
//!     node.run_multicast().await
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod console;
pub mod error;
pub mod iface;
pub mod message;
pub mod multicast;
pub mod node;
pub mod session;
pub mod unicast;

// Re-export main types
pub use config::{
    ChatConfig, DEFAULT_GROUP, DEFAULT_MULTICAST_PORT, DEFAULT_MULTICAST_TTL,
    DEFAULT_OVERLAY_MARKER, DEFAULT_UNICAST_PORT,
};
pub use console::{classify_line, default_username, resolve_username, LineAction, EXIT_SENTINEL};
pub use error::{ConfigError, Error, NetworkError, Result};
pub use iface::{select_overlay_interface, IfaceCandidate, OverlayInterface};
pub use message::{encode_line, ChatMessage, MAX_PAYLOAD};
pub use multicast::{MulticastReceiver, MulticastSender};
pub use node::ChatNode;
pub use session::{ReceiverState, SenderState};
pub use unicast::{UnicastReceiver, UnicastSender};
