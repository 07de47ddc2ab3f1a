//! Transport Layer Tests
//!
//! Uses real loopback connections for TCP.

use super::*;
use crate::framing::MessageFramer;
use crate::TransportError;
use settings::FramingSettings;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[tokio::test]
async fn test_tcp_outbound_writes_raw_json() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        received
    });

    let conn = TcpConnection::connect("127.0.0.1", addr.port()).await.unwrap();
    let outbound = TcpOutbound::new(conn, 1024);
    outbound.send(br#"{"id":0}"#).await.unwrap();
    outbound.send(br#"{"id":1}"#).await.unwrap();

    let info = outbound.transport_info();
    assert_eq!(info.transport_type, TransportType::Tcp);
    assert_eq!(info.messages_sent, 2);
    assert_eq!(info.bytes_sent, 16);

    outbound.close().await.unwrap();
    assert!(!outbound.is_healthy());
    assert!(matches!(
        outbound.send(b"{}").await,
        Err(TransportError::Closed { .. })
    ));

    let received = server_task.await.unwrap();
    assert_eq!(received, br#"{"id":0}{"id":1}"#.to_vec());
}

#[tokio::test]
async fn test_tcp_outbound_rejects_oversized() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

    let conn = TcpConnection::connect("127.0.0.1", addr.port()).await.unwrap();
    let outbound = TcpOutbound::new(conn, 4);
    assert!(matches!(
        outbound.send(b"{\"big\":1}").await,
        Err(TransportError::Protocol { .. })
    ));
    accept.await.unwrap();
}

#[tokio::test]
async fn test_receive_message_frames_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"{\"host\":\"a\",").await.unwrap();
        stream.write_all(b"\"port\":1}").await.unwrap();
    });

    let mut conn = TcpConnection::connect("127.0.0.1", addr.port()).await.unwrap();
    let mut framer = MessageFramer::new(&FramingSettings::default());
    let reply = conn.receive_message(&mut framer).await.unwrap();
    assert_eq!(&reply[..], b"{\"host\":\"a\",\"port\":1}");
    assert_eq!(conn.stats().bytes_received, reply.len() as u64);

    server_task.await.unwrap();
}

#[tokio::test]
async fn test_connect_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = TcpConnection::connect("127.0.0.1", port).await.unwrap_err();
    assert!(matches!(err, TransportError::Network { .. }));
}

#[tokio::test]
async fn test_memory_outbound_records_and_fails_on_demand() {
    let outbound = MemoryOutbound::new();
    outbound.send(br#"{"id":2}"#).await.unwrap();
    assert_eq!(outbound.json_messages(), vec![serde_json::json!({"id": 2})]);

    outbound.set_failing(true);
    assert!(outbound.send(b"{}").await.is_err());
    outbound.set_failing(false);

    assert_eq!(outbound.take().len(), 1);
    assert!(outbound.messages().is_empty());

    outbound.close().await.unwrap();
    assert!(!outbound.is_healthy());
    assert!(outbound.send(b"{}").await.is_err());
}
