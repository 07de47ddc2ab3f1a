//! Protocol constants for the state synchronization handshake and RPC channel
//!
//! Values a peer and client must agree on. Deployment-dependent values
//! (readiness threshold, plugin record id) are defaults only; the
//! configuration layer can override them.

/// Record id used purely as the remote-procedure command channel
pub const RPC_RECORD_ID: usize = 0;

/// Greeting exchange on the data sockets
pub mod greeting {
    /// Size of the greeting buffer the peer sends and expects back
    pub const DEFAULT_LEN: usize = 100;

    /// Byte offset at which the security key is spliced in
    pub const SECURITY_KEY_OFFSET: usize = 6;

    /// Format tag written to byte 0: textual (ASCII) representation
    pub const FORMAT_TAG_ASCII: u8 = 0;
}

/// Session readiness
pub mod readiness {
    /// Registry size at which bootstrap is considered complete
    ///
    /// Matches the record count of the reference viewer deployment.
    pub const DEFAULT_MIN_RECORDS: usize = 124;
}

/// Default rendezvous endpoint
pub mod rendezvous {
    pub const DEFAULT_HOST: &str = "localhost";
    pub const DEFAULT_PORT: u16 = 5600;
}

/// Remote procedure channel defaults
pub mod rpc {
    /// Record holding the plugin name/type/enabled arrays
    pub const DEFAULT_PLUGIN_RECORD_ID: usize = 14;
}

/// Framing limits
pub mod framing {
    /// Largest partial message kept before the framer declares desync
    pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

    /// Socket read chunk size
    pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;
}
