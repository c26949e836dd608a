//! Multicast transport
//!
//! One logical group endpoint shared by all participants: a send reaches
//! every node that joined the group. The receiver and sender are independent
//! unidirectional sessions that never share a socket.

mod receiver;
mod sender;

pub use receiver::MulticastReceiver;
pub use sender::MulticastSender;

use std::net::Ipv4Addr;
use tokio::net::UdpSocket;

/// Tracks one socket's multicast group membership
///
/// Membership is held from join until an explicit leave. Joining an already
/// joined group is a no-op, so one socket never accumulates duplicate
/// memberships (and never receives a datagram twice).
#[derive(Debug)]
pub(crate) struct GroupMembership {
    group: Ipv4Addr,
    scope: Option<Ipv4Addr>,
    joined: bool,
}

impl GroupMembership {
    pub(crate) fn new(group: Ipv4Addr) -> Self {
        Self {
            group,
            scope: None,
            joined: false,
        }
    }

    /// Join the group, optionally scoped to a local interface address
    pub(crate) fn join(&mut self, socket: &UdpSocket, scope: Option<Ipv4Addr>) -> std::io::Result<()> {
        if self.joined {
            return Ok(());
        }
        socket.join_multicast_v4(self.group, scope.unwrap_or(Ipv4Addr::UNSPECIFIED))?;
        self.joined = true;
        self.scope = scope;
        Ok(())
    }

    /// Leave the group on the same scope it was joined with
    pub(crate) fn leave(&mut self, socket: &UdpSocket) -> std::io::Result<()> {
        if !self.joined {
            return Ok(());
        }
        socket.leave_multicast_v4(self.group, self.scope.unwrap_or(Ipv4Addr::UNSPECIFIED))?;
        self.joined = false;
        Ok(())
    }

    pub(crate) fn is_joined(&self) -> bool {
        self.joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_membership_join_is_idempotent() {
        let socket = UdpSocket::bind("0.0.0.0:0").await.unwrap();
        let mut membership = GroupMembership::new(Ipv4Addr::new(239, 255, 42, 98));

        if membership.join(&socket, None).is_err() {
            // No multicast-capable interface in this environment
            return;
        }
        assert!(membership.is_joined());

        // Second join must be a no-op, not a second OS-level membership
        membership.join(&socket, None).unwrap();
        assert!(membership.is_joined());

        membership.leave(&socket).unwrap();
        assert!(!membership.is_joined());
    }

    #[tokio::test]
    async fn test_membership_leave_without_join_is_noop() {
        let socket = UdpSocket::bind("0.0.0.0:0").await.unwrap();
        let mut membership = GroupMembership::new(Ipv4Addr::new(239, 255, 42, 98));

        membership.leave(&socket).unwrap();
        assert!(!membership.is_joined());
    }
}
