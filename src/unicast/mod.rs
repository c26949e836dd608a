//! Unicast transport
//!
//! No group addressing: each participant runs a receiver on the fixed
//! unicast port, and every outgoing line is fanned out as one independent
//! datagram per configured peer. Delivery to one peer never depends on
//! delivery to another.

mod receiver;
mod sender;

pub use receiver::UnicastReceiver;
pub use sender::UnicastSender;
