use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use super::service::ServiceState;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserStatus {
    #[default]
    Inactive,
    Active,
}

impl UserStatus {
    pub fn code(&self) -> u8 {
        match self {
            UserStatus::Inactive => 0,
            UserStatus::Active => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(UserStatus::Inactive),
            1 => Some(UserStatus::Active),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String, // bcrypt, never the plain password
    pub status: UserStatus,
    pub package_used: f64,  // GB transferred so far
    pub package_limit: u64, // GB allowed
    pub expired: NaiveDate,
    pub service: ServiceState,
}
