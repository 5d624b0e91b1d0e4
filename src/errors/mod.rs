// Error types for the panel: domain errors from provisioning and the
// HTTP-boundary AppError that wraps them.
use thiserror::Error;

pub mod provision;
pub mod response;

pub use provision::{
    ConfigurationFault, ProvisionError, ProvisionResult, RuntimeError, StoreError, StoreResult,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Provision error: {0}")]
    Provision(#[from] ProvisionError),
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
