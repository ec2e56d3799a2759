use std::result::Result as StdResult;

use thiserror::Error;

/// Error type shared by the bookkeeping, storage and directory layers.
#[derive(Debug, Error)]
pub enum CajaError {
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Comanda {0} is validated and cannot be modified")]
    Immutable(String),
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("A submission is already in flight")]
    SubmissionInFlight,
    #[error("Remote service error: {0}")]
    Remote(String),
}

pub type Result<T> = StdResult<T, CajaError>;

impl From<std::io::Error> for CajaError {
    fn from(err: std::io::Error) -> Self {
        CajaError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CajaError {
    fn from(err: serde_json::Error) -> Self {
        CajaError::Serde(err.to_string())
    }
}

impl From<csv::Error> for CajaError {
    fn from(err: csv::Error) -> Self {
        CajaError::Storage(err.to_string())
    }
}
