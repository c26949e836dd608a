//! Unicast send session with per-peer fan-out

use crate::config::ChatConfig;
use crate::error::{NetworkError, Result};
use crate::message::encode_line;
use crate::session::SenderState;
use parking_lot::RwLock;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::warn;

/// Sends chat lines to a configured set of peers, one datagram each
///
/// Fan-out is explicit iteration, not multicast replication: every line is
/// encoded once and sent independently to each peer on the fixed unicast
/// port. An unreachable peer is logged and skipped; the remaining peers
/// still get the message.
pub struct UnicastSender {
    peers: Vec<IpAddr>,
    port: u16,
    socket: UdpSocket,
    state: Arc<RwLock<SenderState>>,
}

impl UnicastSender {
    /// Bind an ephemeral send socket for the configured peer set
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid (including an empty peer
    /// list) or the bind itself fails.
    pub async fn bind(config: &ChatConfig) -> Result<Self> {
        config.validate_unicast_sender()?;

        let state = Arc::new(RwLock::new(SenderState::Created));
        *state.write() = SenderState::Initializing;
        let address = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
        let socket = UdpSocket::bind(address)
            .await
            .map_err(|e| NetworkError::BindFailed {
                address: address.to_string(),
                source: e,
            })?;

        *state.write() = SenderState::Running;
        Ok(Self {
            peers: config.peers.clone(),
            port: config.unicast_port,
            socket,
            state,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> SenderState {
        *self.state.read()
    }

    /// The configured peer set
    pub fn peers(&self) -> &[IpAddr] {
        &self.peers
    }

    /// Send one chat line to every configured peer
    ///
    /// The payload is encoded once; each peer gets an identical datagram.
    /// Per-peer failures are logged and skipped. Returns how many sends
    /// succeeded.
    pub async fn send_line(&self, username: &str, text: &str) -> usize {
        let payload = encode_line(username, text);
        let mut delivered = 0;

        for peer in &self.peers {
            let target = SocketAddr::new(*peer, self.port);
            match self.socket.send_to(&payload, target).await {
                Ok(_) => delivered += 1,
                Err(e) => warn!(peer = %target, error = %e, "send failed"),
            }
        }

        delivered
    }

    /// Close the session
    pub fn close(&self) {
        *self.state.write() = SenderState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_requires_peers() {
        let config = ChatConfig::default();
        assert!(UnicastSender::bind(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_bind_with_peers() {
        let config = ChatConfig::default().add_peer("127.0.0.1".parse().unwrap());
        let sender = UnicastSender::bind(&config).await.unwrap();
        assert_eq!(sender.state(), SenderState::Running);
        assert_eq!(sender.peers().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_abort_fanout() {
        // An IPv6 peer cannot be reached from the IPv4 socket; the
        // remaining IPv4 peer must still be attempted and succeed.
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = ChatConfig::default()
            .with_unicast_port(port)
            .with_peers(vec!["::1".parse().unwrap(), "127.0.0.1".parse().unwrap()]);

        let sender = UnicastSender::bind(&config).await.unwrap();
        let delivered = sender.send_line("Alice", "hello").await;
        assert_eq!(delivered, 1);

        let mut buf = [0u8; 64];
        let (len, _) = listener.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"Alice: hello");
    }
}
