//! Multicast send session

use crate::config::ChatConfig;
use crate::error::{NetworkError, Result};
use crate::iface::select_overlay_interface;
use crate::message::encode_line;
use crate::session::SenderState;
use parking_lot::RwLock;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{info, warn};

/// Sends chat lines to the multicast group
///
/// Binds an ephemeral UDP socket, scopes egress to the detected overlay
/// interface when one exists, and sets the outbound TTL to maximum scope so
/// datagrams survive the overlay's virtual hops. Scoping and TTL failures
/// are logged, never fatal. The sender never receives on its socket.
pub struct MulticastSender {
    group: Ipv4Addr,
    port: u16,
    socket: UdpSocket,
    state: Arc<RwLock<SenderState>>,
}

impl MulticastSender {
    /// Bind and configure a send socket
    ///
    /// # Errors
    ///
    /// Only the bind itself can fail; every socket option has a logged
    /// fallback.
    pub async fn bind(config: &ChatConfig) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(RwLock::new(SenderState::Created));
        *state.write() = SenderState::Initializing;

        let bind_err = |e| NetworkError::BindFailed {
            address: "0.0.0.0:0".to_string(),
            source: e,
        };

        let socket = bind_ephemeral().map_err(bind_err)?;

        match select_overlay_interface(&config.overlay_marker) {
            Some(ovl) => match socket.set_multicast_if_v4(&ovl.ipv4) {
                Ok(()) => info!(iface = %ovl.name, "multicast egress scoped to overlay interface"),
                Err(e) => warn!(
                    iface = %ovl.name,
                    error = %e,
                    "could not scope egress to overlay interface, using default route"
                ),
            },
            None => info!("no overlay interface detected, using default route"),
        }

        if let Err(e) = socket.set_multicast_ttl_v4(config.multicast_ttl) {
            warn!(ttl = config.multicast_ttl, error = %e, "could not set multicast TTL");
        }

        socket.set_nonblocking(true).map_err(bind_err)?;
        let socket = UdpSocket::from_std(socket.into()).map_err(bind_err)?;

        *state.write() = SenderState::Running;
        Ok(Self {
            group: config.group,
            port: config.multicast_port,
            socket,
            state,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> SenderState {
        *self.state.read()
    }

    /// Send one chat line to the group as a single datagram
    pub async fn send_line(&self, username: &str, text: &str) -> Result<()> {
        let payload = encode_line(username, text);
        let target = SocketAddrV4::new(self.group, self.port);
        self.socket
            .send_to(&payload, target)
            .await
            .map_err(|e| NetworkError::SendFailed {
                target: target.to_string(),
                source: e,
            })?;
        Ok(())
    }

    /// Close the session
    ///
    /// The socket itself closes when the sender is dropped.
    pub fn close(&self) {
        *self.state.write() = SenderState::Closed;
    }
}

fn bind_ephemeral() -> std::io::Result<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0).into())?;
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_reaches_running() {
        let sender = MulticastSender::bind(&ChatConfig::default()).await.unwrap();
        assert_eq!(sender.state(), SenderState::Running);

        sender.close();
        assert_eq!(sender.state(), SenderState::Closed);
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_config() {
        let config = ChatConfig::default().with_group(Ipv4Addr::new(10, 0, 0, 1));
        assert!(MulticastSender::bind(&config).await.is_err());
    }
}
