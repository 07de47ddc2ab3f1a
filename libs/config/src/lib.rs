//! # Client Configuration
//!
//! Centralized configuration and constants for state synchronization clients,
//! so the codec, session and RPC layers agree on one set of values.
//!
//! ## Features
//!
//! - **Protocol Constants**: greeting layout, RPC record id, framing limits
//! - **Client Configuration**: rendezvous, session readiness, framing, RPC
//! - **Logging**: one `tracing-subscriber` setup for every binary
//!
//! ## Usage
//!
//! ```rust,no_run
//! use settings::{init_tracing, SyncConfig};
//!
//! let config = SyncConfig::load(None)?;
//! init_tracing(&config.logging)?;
//! let offset = settings::protocol::greeting::SECURITY_KEY_OFFSET;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod logging;
pub mod protocol;
pub mod sync_config;

// Re-export commonly used types
pub use logging::init_tracing;
pub use sync_config::{
    FramingMode, FramingSettings, LoggingConfig, RendezvousConfig, RpcSettings, SessionSettings,
    SyncConfig,
};
