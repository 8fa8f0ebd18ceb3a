use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("read failed for key {key}: {message}")]
    Read { key: String, message: String },

    #[error("write failed for key {key}: {message}")]
    Write { key: String, message: String },

    #[error("delete failed for key {key}: {message}")]
    Delete { key: String, message: String },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
