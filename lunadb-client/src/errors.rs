use lunadb_core::ApplyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Bridge error ({status}): {message}")]
    Bridge { status: u16, message: String },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Transaction authored at version {actual}, session is at {expected}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
