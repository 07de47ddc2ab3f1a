//! Client Configuration Module
//!
//! Provides configuration loading for synchronization clients. Supports an
//! optional TOML file with `STATESYNC_`-prefixed environment overrides
//! (`STATESYNC_SESSION__MIN_RECORDS=40`). Every section has defaults, so an
//! empty configuration is valid.

use crate::protocol;
use anyhow::{Context, Result};
use config_rs::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Main client configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    pub rendezvous: RendezvousConfig,
    pub session: SessionSettings,
    pub framing: FramingSettings,
    pub rpc: RpcSettings,
    pub logging: LoggingConfig,
}

/// Control-phase endpoint and credentials
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RendezvousConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// Announced to the peer as `canRender`
    pub can_render: bool,
}

/// Data-phase and readiness settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    /// Registry size at which bootstrap returns
    pub min_records: usize,
    /// Bound on the readiness wait; `None` waits indefinitely
    pub ready_timeout_ms: Option<u64>,
    pub greeting_len: usize,
    pub security_key_offset: usize,
    pub format_tag: u8,
}

/// How the framer finds message boundaries
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FramingMode {
    /// Balanced `{`/`}` counting; braces inside strings desynchronize
    #[default]
    BraceCount,
    /// Ignores braces inside JSON string literals
    StringAware,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FramingSettings {
    pub mode: FramingMode,
    pub max_message_size: usize,
    pub read_buffer_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RpcSettings {
    pub rpc_record_id: usize,
    pub plugin_record_id: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            host: protocol::rendezvous::DEFAULT_HOST.to_string(),
            port: protocol::rendezvous::DEFAULT_PORT,
            password: String::new(),
            can_render: false,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            min_records: protocol::readiness::DEFAULT_MIN_RECORDS,
            ready_timeout_ms: None,
            greeting_len: protocol::greeting::DEFAULT_LEN,
            security_key_offset: protocol::greeting::SECURITY_KEY_OFFSET,
            format_tag: protocol::greeting::FORMAT_TAG_ASCII,
        }
    }
}

impl SessionSettings {
    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for FramingSettings {
    fn default() -> Self {
        Self {
            mode: FramingMode::default(),
            max_message_size: protocol::framing::DEFAULT_MAX_MESSAGE_SIZE,
            read_buffer_size: protocol::framing::DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            rpc_record_id: protocol::RPC_RECORD_ID,
            plugin_record_id: protocol::rpc::DEFAULT_PLUGIN_RECORD_ID,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl SyncConfig {
    /// Load configuration from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading client config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("STATESYNC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;
        let parsed: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        debug!(?parsed, "Configuration loaded");
        Ok(parsed)
    }

    /// Parse configuration from a TOML string, without environment overrides
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_complete() {
        let config = SyncConfig::default();
        assert_eq!(config.rpc.rpc_record_id, 0);
        assert_eq!(config.session.greeting_len, 100);
        assert_eq!(config.session.ready_timeout(), None);
        assert_eq!(config.framing.mode, FramingMode::BraceCount);
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("client.toml");

        let config_content = r#"
[rendezvous]
host = "viz01"
password = "s3cret"
can_render = true

[session]
min_records = 40
ready_timeout_ms = 2500

[framing]
mode = "string_aware"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = SyncConfig::load(Some(&config_path)).unwrap();

        assert_eq!(config.rendezvous.host, "viz01");
        assert_eq!(config.rendezvous.port, protocol::rendezvous::DEFAULT_PORT);
        assert!(config.rendezvous.can_render);
        assert_eq!(config.session.min_records, 40);
        assert_eq!(
            config.session.ready_timeout(),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(config.framing.mode, FramingMode::StringAware);
        assert_eq!(config.rpc, RpcSettings::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(SyncConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_from_toml_partial_section() {
        let config = SyncConfig::from_toml("[rpc]\nplugin_record_id = 3\n").unwrap();
        assert_eq!(config.rpc.plugin_record_id, 3);
        assert_eq!(config.rpc.rpc_record_id, 0);
    }
}
