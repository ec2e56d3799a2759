pub mod comanda_service;
pub mod submission;

pub use comanda_service::ComandaService;
pub use submission::{MovementSubmitter, SubmissionTicket};

use crate::errors::CajaError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Caja(#[from] CajaError),
    #[error("{0}")]
    Invalid(String),
}
