use serde::Serialize;
use super::service::ServiceType;
use super::user::User;

/// What the panel shows about the signed-in user. Built per request and never
/// written back, so display defaults here do not touch the stored record.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub host: String,
    pub username: String,
    pub status: u8,
    pub package_used: String,
    pub package_limit: u64,
    pub package_left: String,
    pub package_left_percent: String,
    pub service_port: Option<u16>,
    pub service_pwd: Option<String>,
    pub service_method: String,
    pub service_type: ServiceType,
    pub expired: String,
    pub service_url: Option<String>,
}

impl UserInfo {
    pub fn render(
        user: &User,
        host: &str,
        default_method: &str,
        service_url: Option<String>,
    ) -> Self {
        let service = user.service.provisioned();
        Self {
            id: user.id.clone(),
            host: host.to_string(),
            username: user.username.clone(),
            status: user.status.code(),
            package_used: format!("{:.2}", user.package_used),
            package_limit: user.package_limit,
            package_left: format!("{:.2}", package_left(user.package_limit, user.package_used)),
            package_left_percent: package_left_percent(user.package_limit, user.package_used),
            service_port: service.map(|s| s.port),
            service_pwd: service.map(|s| s.password.clone()),
            service_method: service
                .map(|s| s.method.clone())
                .unwrap_or_else(|| default_method.to_string()),
            service_type: service.map(|s| s.service_type).unwrap_or_default(),
            expired: user.expired.format("%Y-%m-%d").to_string(),
            service_url,
        }
    }
}

pub fn package_left(limit: u64, used: f64) -> f64 {
    limit as f64 - used
}

/// Remaining quota as a percentage with two decimals, `"0"` for a zero limit.
pub fn package_left_percent(limit: u64, used: f64) -> String {
    if limit == 0 {
        return "0".to_string();
    }
    format!("{:.2}", package_left(limit, used) / limit as f64 * 100.0)
}
