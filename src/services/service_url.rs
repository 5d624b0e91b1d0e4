use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use crate::models::ServiceType;

/// Shareable client link for a relay, as understood by SS/SSR clients.
pub fn service_url(service_type: ServiceType, host: &str, port: u16, method: &str, password: &str) -> String {
    match service_type {
        ServiceType::Ss => {
            let plain = format!("{}:{}@{}:{}", method, password, host, port);
            format!("ss://{}", STANDARD.encode(plain))
        }
        ServiceType::Ssr => {
            let plain = format!(
                "{}:{}:origin:{}:plain:{}",
                host,
                port,
                method,
                URL_SAFE_NO_PAD.encode(password)
            );
            format!("ssr://{}", URL_SAFE_NO_PAD.encode(plain))
        }
    }
}
