use redis::RedisError;
use std::io;
use thiserror::Error;

/// Which part of a create-service request the catalog rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationFault {
    #[error("unknown service type {0:?}")]
    ServiceType(String),

    #[error("method {method:?} is not permitted for {service_type}")]
    Method { service_type: String, method: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("No rows updated for user {0}")]
    NotUpdated(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Container command failed: {0}")]
    CommandFailed(String),
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationFault),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("User {0} already has a service")]
    AlreadyProvisioned(String),

    #[error("No available port in {from}..={to}")]
    NoAvailablePort { from: u16, to: u16 },

    #[error("Provisioning error: {0}")]
    Provisioning(#[from] RuntimeError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl ProvisionError {
    /// Message shown to the panel user; internal causes stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            ProvisionError::InvalidConfiguration(ConfigurationFault::ServiceType(_)) => {
                "Invalid service type!"
            }
            ProvisionError::InvalidConfiguration(ConfigurationFault::Method { .. }) => {
                "Invalid encryption method!"
            }
            ProvisionError::UserNotFound(_) => "User has been removed!",
            ProvisionError::AlreadyProvisioned(_) => "Service already created!",
            ProvisionError::NoAvailablePort { .. } => {
                "Failed to create service, no available port!"
            }
            ProvisionError::Provisioning(_) => "Failed to create service!",
            ProvisionError::Persistence(_) => "Failed to update user info!",
        }
    }
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;
