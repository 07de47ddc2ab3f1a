//! Session bootstrap handshake
//!
//! Two phases:
//!
//! 1. Control: a short-lived connection to the rendezvous host carries one
//!    [`ControlRequest`] and one [`Redirect`] reply.
//! 2. Data: two connections to the redirect address. The peer sends a
//!    fixed-size greeting on the outbound connection; the client stamps the
//!    format tag and security key into it and writes it back on the inbound
//!    connection.
//!
//! Neither phase bounds its reads; a silent peer blocks here.

use crate::framing::MessageFramer;
use crate::transports::TcpConnection;
use crate::{Result, TransportError};
use serde::{Deserialize, Deserializer, Serialize};
use settings::{FramingSettings, RendezvousConfig, SessionSettings};
use tracing::{debug, info};

/// Credentials and capabilities announced in the control phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRequest {
    pub password: String,
    pub can_render: bool,
}

impl From<&RendezvousConfig> for ControlRequest {
    fn from(config: &RendezvousConfig) -> Self {
        Self {
            password: config.password.clone(),
            can_render: config.can_render,
        }
    }
}

/// Where the data phase connects, and the key it presents
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Redirect {
    pub host: String,
    #[serde(deserialize_with = "port_from_text_or_number")]
    pub port: u16,
    #[serde(rename = "securityKey")]
    pub security_key: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(u16),
    Text(String),
}

fn port_from_text_or_number<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match PortRepr::deserialize(deserializer)? {
        PortRepr::Number(port) => Ok(port),
        PortRepr::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port {text:?}"))),
    }
}

impl Redirect {
    pub fn parse(message: &[u8]) -> Result<Self> {
        serde_json::from_slice(message)
            .map_err(|e| TransportError::handshake_with_source("Malformed redirect reply", e))
    }
}

/// Run the control phase against the configured rendezvous host
///
/// An unreachable host is reported as `CouldNotConnect`; every later failure
/// is a `Handshake` error.
pub async fn control_phase(
    rendezvous: &RendezvousConfig,
    framing: &FramingSettings,
) -> Result<Redirect> {
    let mut control = TcpConnection::connect(&rendezvous.host, rendezvous.port)
        .await
        .map_err(|e| match e {
            TransportError::Network {
                source: Some(source),
                ..
            } => TransportError::CouldNotConnect {
                host: rendezvous.host.clone(),
                port: rendezvous.port,
                source: Some(source),
            },
            other => other,
        })?;

    let request = serde_json::to_vec(&ControlRequest::from(rendezvous))
        .map_err(|e| TransportError::handshake_with_source("Failed to encode control request", e))?;
    control
        .send_message(&request)
        .await
        .map_err(|e| TransportError::handshake_with_source("Failed to send control request", e))?;

    let mut framer = MessageFramer::new(framing);
    let reply = control
        .receive_message(&mut framer)
        .await
        .map_err(|e| TransportError::handshake_with_source("No redirect reply", e))?;
    control.shutdown().await;

    let redirect = Redirect::parse(&reply)?;
    info!(
        host = %redirect.host,
        port = redirect.port,
        "Control phase complete"
    );
    Ok(redirect)
}

/// Stamp the format tag and security key into a peer greeting
///
/// Byte 0 becomes the format tag; the key's bytes are copied verbatim starting
/// at the configured offset. A key that overruns the greeting is rejected.
pub fn splice_greeting(greeting: &mut [u8], settings: &SessionSettings, key: &str) -> Result<()> {
    let offset = settings.security_key_offset;
    let end = offset
        .checked_add(key.len())
        .filter(|&end| !greeting.is_empty() && end <= greeting.len())
        .ok_or_else(|| {
            TransportError::handshake(format!(
                "security key of {} bytes does not fit a {}-byte greeting at offset {}",
                key.len(),
                greeting.len(),
                offset
            ))
        })?;

    greeting[0] = settings.format_tag;
    greeting[offset..end].copy_from_slice(key.as_bytes());
    Ok(())
}

/// Read the peer greeting on `outbound`, stamp it, and echo it on `inbound`
pub async fn exchange_greeting(
    outbound: &mut TcpConnection,
    inbound: &mut TcpConnection,
    settings: &SessionSettings,
    key: &str,
) -> Result<Vec<u8>> {
    let mut greeting = vec![0u8; settings.greeting_len];
    outbound
        .read_exact(&mut greeting)
        .await
        .map_err(|e| TransportError::handshake_with_source("Failed to read peer greeting", e))?;
    debug!(bytes = greeting.len(), "Received peer greeting");

    splice_greeting(&mut greeting, settings, key)?;

    inbound
        .send_message(&greeting)
        .await
        .map_err(|e| TransportError::handshake_with_source("Failed to send greeting", e))?;
    debug!("Sent client greeting");
    Ok(greeting)
}
