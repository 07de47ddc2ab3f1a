//! TCP Transport Implementation
//!
//! Messages on the wire are bare JSON objects with no length prefix; readers
//! recover boundaries with [`MessageFramer`](crate::MessageFramer).

use super::{Outbound, TransportInfo, TransportType};
use crate::framing::{read_one_message, MessageFramer};
use crate::{Result, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// TCP connection wrapper with traffic accounting
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    connected_at: Instant,
    last_activity: Instant,
    bytes_sent: u64,
    bytes_received: u64,
    messages_sent: u64,
}

impl TcpConnection {
    pub(crate) fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        let now = Instant::now();
        Self {
            stream,
            peer_addr,
            connected_at: now,
            last_activity: now,
            bytes_sent: 0,
            bytes_received: 0,
            messages_sent: 0,
        }
    }

    /// Open a connection to `host:port`
    ///
    /// The host may be a name or an address literal; resolution failures and
    /// refusals both surface as `Network` errors.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        info!("Connecting to TCP peer at {}:{}", host, port);

        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| TransportError::network_with_source("Failed to connect to TCP peer", e))?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let peer_addr = stream
            .peer_addr()
            .map_err(|e| TransportError::network_with_source("Failed to get peer address", e))?;

        info!("Successfully connected to TCP peer at {}", peer_addr);
        Ok(Self::new(stream, peer_addr))
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Write one message and flush
    pub async fn send_message(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(data)
            .await
            .map_err(|e| TransportError::network_with_source("Failed to write message", e))?;

        self.stream
            .flush()
            .await
            .map_err(|e| TransportError::network_with_source("Failed to flush TCP stream", e))?;

        self.bytes_sent += data.len() as u64;
        self.messages_sent += 1;
        self.last_activity = Instant::now();

        debug!(
            peer = %self.peer_addr,
            bytes = data.len(),
            total_sent = self.bytes_sent,
            "Sent message over TCP"
        );

        Ok(())
    }

    /// Fill `buf` exactly; used for fixed-size greetings
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream.read_exact(buf).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                TransportError::closed(format!("peer closed after fewer than {} bytes", buf.len()))
            } else {
                TransportError::network_with_source("Failed to read from TCP peer", e)
            }
        })?;

        self.bytes_received += buf.len() as u64;
        self.last_activity = Instant::now();
        Ok(())
    }

    /// Read until one framed message arrives
    pub async fn receive_message(&mut self, framer: &mut MessageFramer) -> Result<Bytes> {
        let message = read_one_message(&mut self.stream, framer).await?;
        self.bytes_received += message.len() as u64;
        self.last_activity = Instant::now();

        debug!(
            peer = %self.peer_addr,
            bytes = message.len(),
            "Received message over TCP"
        );
        Ok(message)
    }

    pub fn stats(&self) -> TcpConnectionStats {
        TcpConnectionStats {
            peer_addr: self.peer_addr,
            connected_duration: self.connected_at.elapsed(),
            last_activity: self.last_activity.elapsed(),
            bytes_sent: self.bytes_sent,
            bytes_received: self.bytes_received,
        }
    }

    pub fn into_split(self) -> (OwnedReadHalf, OwnedWriteHalf) {
        self.stream.into_split()
    }

    pub async fn shutdown(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            warn!("Error shutting down TCP connection: {}", e);
        }
        info!("Closed TCP connection to {}", self.peer_addr);
    }
}

/// TCP connection statistics
#[derive(Debug, Clone)]
pub struct TcpConnectionStats {
    pub peer_addr: SocketAddr,
    pub connected_duration: Duration,
    pub last_activity: Duration,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Outbound sink over an established connection
pub struct TcpOutbound {
    connection: Mutex<Option<TcpConnection>>,
    peer_addr: SocketAddr,
    max_message_size: usize,
}

impl TcpOutbound {
    pub fn new(connection: TcpConnection, max_message_size: usize) -> Self {
        Self {
            peer_addr: connection.peer_addr(),
            connection: Mutex::new(Some(connection)),
            max_message_size,
        }
    }

    /// Get connection statistics
    pub async fn stats(&self) -> Option<TcpConnectionStats> {
        let guard = self.connection.lock().await;
        guard.as_ref().map(|conn| conn.stats())
    }
}

#[async_trait]
impl Outbound for TcpOutbound {
    async fn send(&self, message: &[u8]) -> Result<()> {
        if message.len() > self.max_message_size {
            return Err(TransportError::protocol(format!(
                "Message size {} exceeds maximum {}",
                message.len(),
                self.max_message_size
            )));
        }

        let mut guard = self.connection.lock().await;
        match guard.as_mut() {
            Some(connection) => connection.send_message(message).await,
            None => Err(TransportError::closed("outbound connection")),
        }
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.connection.lock().await;
        if let Some(mut connection) = guard.take() {
            connection.shutdown().await;
        }
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        match self.connection.try_lock() {
            Ok(guard) => guard.is_some(),
            // Held by an in-flight send
            Err(_) => true,
        }
    }

    fn transport_info(&self) -> TransportInfo {
        let (messages_sent, bytes_sent) = match self.connection.try_lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|c| (c.messages_sent, c.bytes_sent))
                .unwrap_or_default(),
            Err(_) => (0, 0),
        };
        TransportInfo {
            transport_type: TransportType::Tcp,
            remote_address: Some(self.peer_addr.to_string()),
            messages_sent,
            bytes_sent,
        }
    }
}
