//! Common test helpers and utilities
//!
//! Shared fixtures for the integration tests: ephemeral-port plumbing and
//! timeout-guarded channel reads, so no test can hang the suite.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use ztalk::{ChatMessage, UnicastReceiver};

/// How long any single test wait is allowed to take
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait until a receiver running on an ephemeral port reports its bind
pub async fn wait_for_port(receiver: &UnicastReceiver) -> u16 {
    timeout(TEST_TIMEOUT, async {
        loop {
            if let Some(port) = receiver.local_port() {
                return port;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("receiver never bound")
}

/// Receive the next chat message or fail the test
pub async fn recv_next(rx: &mut mpsc::UnboundedReceiver<ChatMessage>) -> ChatMessage {
    timeout(TEST_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("events channel closed early")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_generous() {
        assert!(TEST_TIMEOUT >= Duration::from_secs(1));
    }
}
