//! Outbound Transport Layer
//!
//! The session writes flush messages through an [`Outbound`] sink. TCP is the
//! production transport; the in-memory sink records messages for callers that
//! drive the dispatcher without a peer.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod tcp;

#[cfg(test)]
mod tests;

pub use memory::MemoryOutbound;
pub use tcp::{TcpConnection, TcpConnectionStats, TcpOutbound};

/// Write side of a session
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Send one complete message
    async fn send(&self, message: &[u8]) -> Result<()>;

    /// Stop accepting messages; later sends fail with `Closed`
    async fn close(&self) -> Result<()>;

    /// Check if transport is healthy
    fn is_healthy(&self) -> bool;

    /// Get transport-specific information
    fn transport_info(&self) -> TransportInfo;
}

/// Transport type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportType {
    Tcp,
    Memory,
}

/// Transport information for monitoring
#[derive(Debug, Clone)]
pub struct TransportInfo {
    pub transport_type: TransportType,
    pub remote_address: Option<String>,
    pub messages_sent: u64,
    pub bytes_sent: u64,
}
