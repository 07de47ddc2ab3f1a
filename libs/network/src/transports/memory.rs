//! In-process outbound sink
//!
//! Records every sent message in order. Useful for driving an RPC dispatcher
//! or a session's flush path without a peer.

use super::{Outbound, TransportInfo, TransportType};
use crate::{Result, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct MemoryOutbound {
    sent: Mutex<Vec<Bytes>>,
    closed: AtomicBool,
    failing: AtomicBool,
}

impl MemoryOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with a network error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    pub fn messages(&self) -> Vec<Bytes> {
        self.sent.lock().clone()
    }

    /// Remove and return everything sent so far
    pub fn take(&self) -> Vec<Bytes> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Sent messages parsed as JSON; unparsable entries are skipped
    pub fn json_messages(&self) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .filter_map(|m| serde_json::from_slice(m).ok())
            .collect()
    }
}

#[async_trait]
impl Outbound for MemoryOutbound {
    async fn send(&self, message: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::closed("memory outbound"));
        }
        if self.failing.load(Ordering::Acquire) {
            return Err(TransportError::network("memory outbound set to fail"));
        }
        self.sent.lock().push(Bytes::copy_from_slice(message));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    fn transport_info(&self) -> TransportInfo {
        let sent = self.sent.lock();
        TransportInfo {
            transport_type: TransportType::Memory,
            remote_address: None,
            messages_sent: sent.len() as u64,
            bytes_sent: sent.iter().map(|m| m.len() as u64).sum(),
        }
    }
}
