use thiserror::Error;

/// Represents the errors that can surface from the session server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Transport failure on one connection. Terminates only that
    /// connection; the disconnect transition runs and the process keeps
    /// serving everyone else.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A wire payload could not be decoded or encoded.
    #[error("Message error: {0}")]
    Message(#[from] crate::server::message::MessageError),

    /// An outbound queue was already closed.
    #[error("Client error: {0}")]
    Client(#[from] crate::server::client::ClientError),

    /// An invalid or inconsistent configuration was detected.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Connection(err.to_string())
    }
}
