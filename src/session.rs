//! Socket session lifecycle states
//!
//! Every sender and receiver owns exactly one datagram socket and walks a
//! one-way state machine from creation to close. Sessions are single-use:
//! once `Closed`, the object is not reusable.

/// State of a receive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Session created, no socket yet
    Created,
    /// Binding the socket and (multicast only) joining the group
    Initializing,
    /// Receive loop is running
    Listening,
    /// Leaving the group / tearing down
    Stopping,
    /// Socket closed; terminal
    Closed,
}

/// State of a send session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// Session created, no socket yet
    Created,
    /// Binding the socket and applying socket options
    Initializing,
    /// Ready to send
    Running,
    /// Socket closed; terminal
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_comparable() {
        assert_eq!(ReceiverState::Created, ReceiverState::Created);
        assert_ne!(ReceiverState::Listening, ReceiverState::Closed);
        assert_ne!(SenderState::Running, SenderState::Closed);
    }
}
