//! Live synchronization session
//!
//! A [`Session`] owns the shared registry, the outbound sink and the single
//! read-loop task that frames inbound traffic and applies it to the registry
//! in stream order. Readiness is a coarse record count: bootstrap returns once
//! the registry holds `min_records` entries.

use crate::bootstrap::{control_phase, exchange_greeting, Redirect};
use crate::framing::MessageFramer;
use crate::transports::{Outbound, TcpConnection, TcpOutbound};
use crate::{Result, TransportError};
use serde_json::Value;
use settings::{FramingSettings, SessionSettings, SyncConfig};
use state::{RecordEvent, Registry, SharedRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub struct Session {
    registry: SharedRegistry,
    outbound: Arc<dyn Outbound>,
    redirect: Option<Redirect>,
    read_task: JoinHandle<()>,
    running: Arc<AtomicBool>,
    size: watch::Receiver<usize>,
    // Dropping the write half would half-close the inbound socket
    _inbound_writer: Option<OwnedWriteHalf>,
}

impl Session {
    /// Bootstrap a session from configuration and wait for readiness
    pub async fn connect(config: &SyncConfig) -> Result<Self> {
        let redirect = control_phase(&config.rendezvous, &config.framing).await?;

        let mut inbound = TcpConnection::connect(&redirect.host, redirect.port)
            .await
            .map_err(|e| TransportError::handshake_with_source("Failed to open inbound socket", e))?;
        let mut outbound = TcpConnection::connect(&redirect.host, redirect.port)
            .await
            .map_err(|e| {
                TransportError::handshake_with_source("Failed to open outbound socket", e)
            })?;

        exchange_greeting(
            &mut outbound,
            &mut inbound,
            &config.session,
            &redirect.security_key,
        )
        .await?;

        let (reader, writer) = inbound.into_split();
        let outbound = Arc::new(TcpOutbound::new(outbound, config.framing.max_message_size));
        let mut session = Self::start(reader, outbound, Registry::shared(), &config.framing);
        session.redirect = Some(redirect);
        session._inbound_writer = Some(writer);

        session.wait_ready(&config.session).await?;
        info!(records = session.registry.lock().len(), "Session ready");
        Ok(session)
    }

    /// Start the read loop over an already-established inbound stream
    pub fn start<R>(
        reader: R,
        outbound: Arc<dyn Outbound>,
        registry: SharedRegistry,
        framing: &FramingSettings,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let initial = registry.lock().len();
        let (size_tx, size) = watch::channel(initial);
        let running = Arc::new(AtomicBool::new(true));
        let read_task = tokio::spawn(read_loop(
            reader,
            registry.clone(),
            MessageFramer::new(framing),
            framing.read_buffer_size,
            size_tx,
            running.clone(),
        ));

        Self {
            registry,
            outbound,
            redirect: None,
            read_task,
            running,
            size,
            _inbound_writer: None,
        }
    }

    /// Wait until the registry holds `settings.min_records` records
    pub async fn wait_ready(&self, settings: &SessionSettings) -> Result<()> {
        let mut size = self.size.clone();
        let min = settings.min_records;
        let wait = async move {
            size.wait_for(|n| *n >= min)
                .await
                .map(|_| ())
                .map_err(|_| TransportError::closed("read loop ended before session was ready"))
        };

        match settings.ready_timeout() {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| TransportError::timeout("session readiness", as_millis(limit)))?,
            None => wait.await,
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn outbound(&self) -> Arc<dyn Outbound> {
        self.outbound.clone()
    }

    /// Redirect negotiated during bootstrap, if this session bootstrapped
    pub fn redirect(&self) -> Option<&Redirect> {
        self.redirect.as_ref()
    }

    /// Change events for every applied update, in application order
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.registry.lock().subscribe()
    }

    /// Send record `id`'s pending fields; `Ok(false)` for an unknown id
    ///
    /// Pending state is cleared before the write, so a failed send loses it.
    pub async fn flush(&self, id: usize) -> Result<bool> {
        flush_record(&self.registry, &*self.outbound, id).await
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the read loop and close the outbound sink
    pub async fn close(&self) -> Result<()> {
        self.read_task.abort();
        self.running.store(false, Ordering::Release);
        self.outbound.close().await?;
        info!("Session closed");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.read_task.abort();
    }
}

/// Flush record `id` from `registry` through `outbound`
pub async fn flush_record<O>(registry: &SharedRegistry, outbound: &O, id: usize) -> Result<bool>
where
    O: Outbound + ?Sized,
{
    let Some(message) = registry.lock().flush(id) else {
        debug!(id, "Flush of unknown record skipped");
        return Ok(false);
    };

    let bytes = serde_json::to_vec(&message)
        .map_err(|e| TransportError::protocol_with_source("Failed to encode flush", e))?;
    outbound.send(&bytes).await?;
    debug!(id, bytes = bytes.len(), "Flushed record");
    Ok(true)
}

async fn read_loop<R>(
    mut reader: R,
    registry: SharedRegistry,
    mut framer: MessageFramer,
    read_buffer_size: usize,
    size: watch::Sender<usize>,
    running: Arc<AtomicBool>,
) where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; read_buffer_size.max(1)];
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => {
                info!("Peer closed inbound stream");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "Inbound read failed");
                break;
            }
        };

        for message in framer.push(&chunk[..n]) {
            let value: Value = match serde_json::from_slice(&message) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        error = %e,
                        text = %String::from_utf8_lossy(&message),
                        "Dropping unparsable message"
                    );
                    continue;
                }
            };

            let len = {
                let mut registry = registry.lock();
                if let Err(e) = registry.update(&value) {
                    warn!(error = %e, "Dropping rejected update");
                }
                registry.len()
            };
            size.send_if_modified(|current| {
                let grew = *current != len;
                *current = len;
                grew
            });
        }
    }

    running.store(false, Ordering::Release);
}

fn as_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
