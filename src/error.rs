use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("sentinels must be a non-empty list of valid host:port values")]
    InvalidSentinels,

    #[error("master_name must be a valid non-empty name")]
    InvalidMasterName,

    #[error("client is not connected to a master")]
    NotConnected,

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("ERR Protocol error: {0}")]
    Protocol(String),

    /// Error reply from the server, passed through verbatim
    #[error("{0}")]
    Server(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
