use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The relay variants a user can provision.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceType {
    #[default]
    #[serde(rename = "SS")]
    Ss,
    #[serde(rename = "SSR")]
    Ssr,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Ss => "SS",
            ServiceType::Ssr => "SSR",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SS" => Ok(ServiceType::Ss),
            "SSR" => Ok(ServiceType::Ssr),
            other => Err(other.to_string()),
        }
    }
}

/// A relay that has been started and recorded on the user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedService {
    pub container_id: String,
    pub port: u16,
    pub password: String,
    pub method: String,
    pub service_type: ServiceType,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub enum ServiceState {
    #[default]
    Unprovisioned,
    Provisioned(ProvisionedService),
}

impl ServiceState {
    pub fn is_provisioned(&self) -> bool {
        matches!(self, ServiceState::Provisioned(_))
    }

    pub fn provisioned(&self) -> Option<&ProvisionedService> {
        match self {
            ServiceState::Provisioned(service) => Some(service),
            ServiceState::Unprovisioned => None,
        }
    }
}

/// Returned to the panel after a successful create-service request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceResult {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub password: String,
    pub method: String,
    pub service_type: ServiceType,
    pub package_limit: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_type_names_match_form_values() {
        assert_eq!("SS".parse::<ServiceType>(), Ok(ServiceType::Ss));
        assert_eq!("SSR".parse::<ServiceType>(), Ok(ServiceType::Ssr));
        assert!("ss".parse::<ServiceType>().is_err());
        assert_eq!(serde_json::to_string(&ServiceType::Ssr).unwrap(), "\"SSR\"");
    }
}
