//! Integration tests for the unicast transport
//!
//! Everything here runs over loopback with ephemeral or probed ports, so
//! the suite works on machines with no multicast-capable network.

mod common;

use common::{recv_next, wait_for_port, TEST_TIMEOUT};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;
use ztalk::{ChatConfig, ReceiverState, UnicastReceiver, UnicastSender, MAX_PAYLOAD};

/// Spawn a unicast receiver on an ephemeral port; returns it with its port
/// and events channel
async fn spawn_receiver() -> (
    Arc<UnicastReceiver>,
    u16,
    mpsc::UnboundedReceiver<ztalk::ChatMessage>,
    tokio::task::JoinHandle<ztalk::Result<()>>,
) {
    let receiver = Arc::new(UnicastReceiver::new(&ChatConfig::default()));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let task = {
        let receiver = Arc::clone(&receiver);
        tokio::spawn(async move { receiver.run_on_port(0, events_tx).await })
    };
    let port = wait_for_port(&receiver).await;
    (receiver, port, events_rx, task)
}

#[tokio::test]
async fn test_end_to_end_send_and_receive() {
    let (receiver, port, mut events_rx, task) = spawn_receiver().await;

    let config = ChatConfig::default()
        .with_unicast_port(port)
        .add_peer(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let sender = UnicastSender::bind(&config).await.unwrap();

    assert_eq!(sender.send_line("Alice", "hello").await, 1);

    let msg = recv_next(&mut events_rx).await;
    assert_eq!(msg.text, "Alice: hello");
    assert!(!msg.truncated);
    assert_eq!(msg.sender.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    // Display carries timestamp, sender address, and payload
    let line = msg.to_string();
    assert!(line.contains("127.0.0.1"));
    assert!(line.contains("Alice: hello"));

    receiver.stop();
    task.await.unwrap().unwrap();
    assert_eq!(receiver.state(), ReceiverState::Closed);
    assert_eq!(receiver.messages_received(), 1);
}

#[tokio::test]
async fn test_fanout_reaches_every_peer_exactly_once() {
    // Three distinct loopback addresses sharing one port, so the fan-out
    // produces three distinguishable endpoints
    let first = UdpSocket::bind("127.0.0.2:0").await.unwrap();
    let port = first.local_addr().unwrap().port();
    let second = UdpSocket::bind(("127.0.0.3", port)).await.unwrap();
    let third = UdpSocket::bind(("127.0.0.4", port)).await.unwrap();
    let listeners = [first, second, third];

    let peers: Vec<IpAddr> = vec![
        "127.0.0.2".parse().unwrap(),
        "127.0.0.3".parse().unwrap(),
        "127.0.0.4".parse().unwrap(),
    ];
    let config = ChatConfig::default()
        .with_unicast_port(port)
        .with_peers(peers);
    let sender = UnicastSender::bind(&config).await.unwrap();

    let delivered = sender.send_line("Bob", "to everyone").await;
    assert_eq!(delivered, 3);

    let mut buf = [0u8; MAX_PAYLOAD];
    for listener in &listeners {
        let (len, _) = timeout(TEST_TIMEOUT, listener.recv_from(&mut buf))
            .await
            .expect("peer never got the datagram")
            .unwrap();
        assert_eq!(&buf[..len], b"Bob: to everyone");
    }

    // Exactly one datagram per peer, not more
    for listener in &listeners {
        let extra = timeout(
            std::time::Duration::from_millis(200),
            listener.recv_from(&mut buf),
        )
        .await;
        assert!(extra.is_err(), "peer received a duplicate datagram");
    }
}

#[tokio::test]
async fn test_oversized_payload_arrives_truncated() {
    let (receiver, port, mut events_rx, task) = spawn_receiver().await;

    let config = ChatConfig::default()
        .with_unicast_port(port)
        .add_peer(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let sender = UnicastSender::bind(&config).await.unwrap();

    // "Alice: " plus 2000 bytes of body is roughly double the buffer
    let body = "x".repeat(2000);
    assert_eq!(sender.send_line("Alice", &body).await, 1);

    let msg = recv_next(&mut events_rx).await;
    assert_eq!(msg.text.len(), MAX_PAYLOAD);
    assert!(msg.truncated);
    assert!(msg.text.starts_with("Alice: xxx"));

    receiver.stop();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_messages_arrive_in_typed_order_from_one_sender() {
    let (receiver, port, mut events_rx, task) = spawn_receiver().await;

    let config = ChatConfig::default()
        .with_unicast_port(port)
        .add_peer(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let sender = UnicastSender::bind(&config).await.unwrap();

    for i in 0..5 {
        sender.send_line("Alice", &format!("line {i}")).await;
    }

    // Loopback does not reorder; a single sender's lines stay FIFO
    for i in 0..5 {
        let msg = recv_next(&mut events_rx).await;
        assert_eq!(msg.text, format!("Alice: line {i}"));
    }

    receiver.stop();
    task.await.unwrap().unwrap();
    assert_eq!(receiver.messages_received(), 5);
}

#[tokio::test]
async fn test_stop_is_effective_from_another_task() {
    let (receiver, _port, _events_rx, task) = spawn_receiver().await;

    let stopper = Arc::clone(&receiver);
    tokio::spawn(async move { stopper.stop() });

    timeout(TEST_TIMEOUT, task)
        .await
        .expect("receiver did not stop")
        .unwrap()
        .unwrap();
    assert_eq!(receiver.state(), ReceiverState::Closed);
}
