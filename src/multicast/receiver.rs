//! Multicast receive session

use crate::config::ChatConfig;
use crate::error::{NetworkError, Result};
use crate::iface::{select_overlay_interface, OverlayInterface};
use crate::message::{ChatMessage, MAX_PAYLOAD};
use crate::multicast::GroupMembership;
use crate::session::ReceiverState;
use parking_lot::RwLock;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Receives chat messages from the multicast group
///
/// Binds the fixed chat port, joins the group (scoped to the detected
/// overlay interface when possible), and converts every inbound datagram
/// into a [`ChatMessage`] on the events channel. Single-use: `run` drives
/// the session from `Created` to `Closed` exactly once.
///
/// # Examples
///
/// ```no_run
/// use ztalk::{ChatConfig, MulticastReceiver};
/// use tokio::sync::mpsc;
///
/// # async fn example() -> ztalk::Result<()> {
/// let receiver = MulticastReceiver::new(ChatConfig::default());
/// let (events_tx, mut events_rx) = mpsc::unbounded_channel();
///
/// tokio::spawn(async move {
///     while let Some(msg) = events_rx.recv().await {
///         println!("{msg}");
///     }
/// });
///
/// receiver.run(events_tx).await?;
/// # Ok(())
/// # }
/// ```
pub struct MulticastReceiver {
    config: ChatConfig,
    state: Arc<RwLock<ReceiverState>>,
    received: Arc<AtomicU64>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl MulticastReceiver {
    /// Create a receiver in the `Created` state
    pub fn new(config: ChatConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            state: Arc::new(RwLock::new(ReceiverState::Created)),
            received: Arc::new(AtomicU64::new(0)),
            shutdown_tx,
            shutdown_rx,
        }
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
    ///
    /// Safe to call from any task, any number of times. The loop observes
    /// the signal at its next `select` wakeup, leaves the group, and closes
    /// the socket.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Run the session to completion
    ///
    /// Delivers received messages on `events` until stopped, the events
    /// consumer goes away, or a fatal receive error occurs. Fatal receive
    /// errors are logged and end the loop; only setup failures (bind, join)
    /// are returned as errors.
    pub async fn run(&self, events: mpsc::UnboundedSender<ChatMessage>) -> Result<()> {
        if self.state() != ReceiverState::Created {
            return Err(NetworkError::InvalidState {
                component: "MulticastReceiver",
                expected: "Created",
            }
            .into());
        }
        *self.state.write() = ReceiverState::Initializing;

        let socket = bind_listener(self.config.multicast_port)?;
        let iface = select_overlay_interface(&self.config.overlay_marker);
        let mut membership = self.join_group(&socket, iface.as_ref())?;

        *self.state.write() = ReceiverState::Listening;
        info!(
            group = %self.config.group,
            port = self.config.multicast_port,
            "listening for multicast messages"
        );

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
                            // Consumer gone; nothing left to deliver to
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

        *self.state.write() = ReceiverState::Stopping;
        if let Err(e) = membership.leave(&socket) {
            warn!(error = %e, "failed to leave multicast group");
        }

        *self.state.write() = ReceiverState::Closed;
        info!(
            messages = self.received.load(Ordering::Relaxed),
            "multicast receiver closed"
        );
        Ok(())
    }

    /// Join the group, preferring a join scoped to the overlay interface
    ///
    /// A failed scoped join falls back to an unscoped join; only a failure
    /// of both is fatal to startup.
    fn join_group(
        &self,
        socket: &UdpSocket,
        iface: Option<&OverlayInterface>,
    ) -> Result<GroupMembership> {
        let mut membership = GroupMembership::new(self.config.group);

        if let Some(ovl) = iface {
            match membership.join(socket, Some(ovl.ipv4)) {
                Ok(()) => {
                    info!(iface = %ovl.name, "joined group on overlay interface");
                    return Ok(membership);
                }
                Err(e) => {
                    warn!(
                        iface = %ovl.name,
                        error = %e,
                        "scoped join failed, falling back to default interface"
                    );
                }
            }
        }

        membership
            .join(socket, None)
            .map_err(|e| NetworkError::JoinFailed {
                group: self.config.group,
                source: e,
            })?;
        info!("joined group on default interface");
        Ok(membership)
    }
}

/// Bind a reusable nonblocking UDP socket on the fixed chat port
fn bind_listener(port: u16) -> Result<UdpSocket> {
    let address = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);

    let bind = || -> std::io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        // Several chat nodes on one machine share the port
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.bind(&address.into())?;
        socket.set_nonblocking(true)?;
        UdpSocket::from_std(socket.into())
    };

    bind().map_err(|e| {
        NetworkError::BindFailed {
            address: address.to_string(),
            source: e,
        }
        .into()
    })
}

fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::Interrupted
    )
}
