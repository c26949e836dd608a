//! Unicast receive session

use crate::config::ChatConfig;
use crate::error::{NetworkError, Result};
use crate::message::{ChatMessage, MAX_PAYLOAD};
use crate::session::ReceiverState;
use parking_lot::RwLock;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

/// Receives chat messages addressed directly to this host
///
/// Binds the fixed unicast port and converts inbound datagrams into
/// [`ChatMessage`] events. No group membership is involved. Single-use,
/// like its multicast counterpart, but the two share no socket logic.
pub struct UnicastReceiver {
    port: u16,
    state: Arc<RwLock<ReceiverState>>,
    received: Arc<AtomicU64>,
    local_port: Arc<RwLock<Option<u16>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl UnicastReceiver {
    /// Create a receiver in the `Created` state
    pub fn new(config: &ChatConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            port: config.unicast_port,
            state: Arc::new(RwLock::new(ReceiverState::Created)),
            received: Arc::new(AtomicU64::new(0)),
            local_port: Arc::new(RwLock::new(None)),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Port the socket actually bound, once listening
    ///
    /// Differs from the configured port only when bound ephemerally.
    pub fn local_port(&self) -> Option<u16> {
        *self.local_port.read()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReceiverState {
        *self.state.read()
    }

    /// Number of messages received so far
    pub fn messages_received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Request the receive loop to stop
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Run the session to completion
    pub async fn run(&self, events: mpsc::UnboundedSender<ChatMessage>) -> Result<()> {
        self.run_on_port(self.port, events).await
    }

    /// Like [`run`](Self::run) but binding an explicit port
    ///
    /// Port 0 binds an ephemeral port; `local_port` reports the choice.
    /// Used by tests that cannot claim the fixed chat port.
    pub async fn run_on_port(
        &self,
        port: u16,
        events: mpsc::UnboundedSender<ChatMessage>,
    ) -> Result<()> {
        if self.state() != ReceiverState::Created {
            return Err(NetworkError::InvalidState {
                component: "UnicastReceiver",
                expected: "Created",
            }
            .into());
        }
        *self.state.write() = ReceiverState::Initializing;

        let address = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        let socket = UdpSocket::bind(address)
            .await
            .map_err(|e| NetworkError::BindFailed {
                address: address.to_string(),
                source: e,
            })?;
        if let Ok(local) = socket.local_addr() {
            *self.local_port.write() = Some(local.port());
        }

        *self.state.write() = ReceiverState::Listening;
        info!(port = self.local_port().unwrap_or(port), "listening for unicast messages");

        let mut shutdown = self.shutdown_rx.clone();
        let mut buf = [0u8; MAX_PAYLOAD];
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                result = socket.recv_from(&mut buf) => match result {
                    Ok((len, sender)) => {
                        let msg = ChatMessage::from_datagram(&buf, len, sender);
                        self.received.fetch_add(1, Ordering::Relaxed);
                        if events.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) if is_transient(&e) => continue,
                    Err(e) => {
                        error!(error = %e, "fatal receive error");
                        break;
                    }
                },
            }
        }

        // No group membership to release in unicast mode
        *self.state.write() = ReceiverState::Stopping;
        *self.state.write() = ReceiverState::Closed;
        info!(
            messages = self.received.load(Ordering::Relaxed),
            "unicast receiver closed"
        );
        Ok(())
    }
}

fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_receiver_is_created() {
        let receiver = UnicastReceiver::new(&ChatConfig::default());
        assert_eq!(receiver.state(), ReceiverState::Created);
        assert_eq!(receiver.messages_received(), 0);
    }

    #[tokio::test]
    async fn test_run_rejects_reuse() {
        let receiver = UnicastReceiver::new(&ChatConfig::default());
        *receiver.state.write() = ReceiverState::Closed;

        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        assert!(receiver.run(events_tx).await.is_err());
    }
}
