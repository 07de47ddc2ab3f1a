//! Session Networking
//!
//! Framing, bootstrap handshake and the live session that keeps a
//! [`Registry`](state::Registry) synchronized with a remote peer.
//!
//! ## Lifecycle
//!
//! ```text
//! control phase ──► Redirect ──► data phase (greeting exchange)
//!                                     │
//!                      inbound socket ─┴─► read loop ─► MessageFramer ─► Registry::update
//!                      outbound socket ◄── Session::flush(id) ◄── Registry::flush
//! ```
//!
//! Transport failures end the session; a malformed or rejected message is
//! logged and dropped while the read loop continues.

pub mod bootstrap;
pub mod error;
pub mod framing;
pub mod session;
pub mod transports;

pub use bootstrap::{control_phase, exchange_greeting, splice_greeting, ControlRequest, Redirect};
pub use error::{Result, SessionError, TransportError};
pub use framing::{read_one_message, MessageFramer};
pub use session::{flush_record, Session};
pub use transports::{
    MemoryOutbound, Outbound, TcpConnection, TcpOutbound, TransportInfo, TransportType,
};
