//! RPC error types

use network::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    /// The command record has not arrived from the peer yet
    #[error("RPC record {id} is not available")]
    NotReady { id: usize },

    /// An argument was refused by the command record; nothing was sent
    #[error("{rpc} rejected argument {field}")]
    Rejected { rpc: &'static str, field: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type RpcResult<T> = std::result::Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_pass_through() {
        let err: RpcError = TransportError::closed("outbound").into();
        assert_eq!(err.to_string(), "Connection closed: outbound");
    }

    #[test]
    fn rejection_names_procedure_and_field() {
        let err = RpcError::Rejected {
            rpc: "AddPlotRPC",
            field: "plotType".to_string(),
        };
        assert_eq!(err.to_string(), "AddPlotRPC rejected argument plotType");
    }
}
