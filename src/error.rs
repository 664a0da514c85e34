use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("A drag is already in progress")]
    DragInProgress,

    #[error("No active drag")]
    NoActiveDrag,

    #[error("Index {index} out of range for column of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Source error: {0}")]
    SourceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}
