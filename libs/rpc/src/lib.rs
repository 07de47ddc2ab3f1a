//! # Remote Procedure Dispatch
//!
//! Remote procedures ride on the command record (id 0 by default): a call
//! stages the procedure code and its arguments as pending fields, then
//! flushes the record through the session's outbound sink.
//!
//! Procedures that name a plugin resolve it against the plugin record first.
//! An unknown or disabled plugin name skips the call and reports `false`.

pub mod dispatcher;
pub mod error;
pub mod resolve;
pub mod types;

pub use dispatcher::{fields, RpcDispatcher};
pub use error::{RpcError, RpcResult};
pub use resolve::{enabled_features, resolve_feature};
pub use types::{FeatureKind, RpcType};
