use ostinato_midi::EndpointId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The transport layer refused or failed a connect/disconnect request.
    #[error("transport failure: {0}")]
    Transport(String),

    /// No endpoint with this id in the current snapshot.
    #[error("unknown endpoint {0}")]
    UnknownEndpoint(EndpointId),
}
