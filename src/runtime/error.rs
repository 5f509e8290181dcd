use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("task canceled")]
    Canceled,

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::Canceled
    }
}
