use crate::errors::ConfigurationFault;
use crate::models::ServiceType;

const SS_METHODS: &[&str] = &[
    "aes-256-cfb",
    "aes-128-gcm",
    "aes-192-gcm",
    "aes-256-gcm",
    "chacha20-ietf-poly1305",
];

const SSR_METHODS: &[&str] = &["aes-256-cfb", "aes-256-ctr", "chacha20", "chacha20-ietf"];

/// Cipher methods each service type accepts. Built once at startup and shared
/// read-only; the first method of the default type is the display default.
#[derive(Debug, Clone)]
pub struct MethodCatalog {
    entries: Vec<(ServiceType, Vec<String>)>,
}

impl MethodCatalog {
    pub fn new(entries: Vec<(ServiceType, Vec<String>)>) -> Self {
        Self { entries }
    }

    pub fn standard() -> Self {
        let owned = |methods: &[&str]| methods.iter().map(|m| m.to_string()).collect();
        Self::new(vec![
            (ServiceType::Ss, owned(SS_METHODS)),
            (ServiceType::Ssr, owned(SSR_METHODS)),
        ])
    }

    pub fn service_types(&self) -> Vec<ServiceType> {
        self.entries.iter().map(|(service_type, _)| *service_type).collect()
    }

    pub fn methods(&self, service_type: ServiceType) -> &[String] {
        self.entries
            .iter()
            .find(|(t, _)| *t == service_type)
            .map(|(_, methods)| methods.as_slice())
            .unwrap_or(&[])
    }

    pub fn default_method(&self) -> &str {
        self.methods(ServiceType::default())
            .first()
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Checks a raw type/method pair from a request against the catalog.
    pub fn validate(&self, service_type: &str, method: &str) -> Result<ServiceType, ConfigurationFault> {
        let parsed: ServiceType = service_type
            .parse()
            .map_err(ConfigurationFault::ServiceType)?;

        let methods = self
            .entries
            .iter()
            .find(|(t, _)| *t == parsed)
            .map(|(_, methods)| methods)
            .ok_or_else(|| ConfigurationFault::ServiceType(service_type.to_string()))?;

        if !methods.iter().any(|m| m == method) {
            return Err(ConfigurationFault::Method {
                service_type: service_type.to_string(),
                method: method.to_string(),
            });
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_permitted_pairs() {
        let catalog = MethodCatalog::standard();
        assert_eq!(catalog.validate("SS", "aes-256-gcm"), Ok(ServiceType::Ss));
        assert_eq!(catalog.validate("SSR", "chacha20"), Ok(ServiceType::Ssr));
    }

    #[test]
    fn rejects_unknown_type() {
        let catalog = MethodCatalog::standard();
        assert_eq!(
            catalog.validate("VMESS", "aes-256-cfb"),
            Err(ConfigurationFault::ServiceType("VMESS".into()))
        );
    }

    #[test]
    fn rejects_method_of_the_other_type() {
        let catalog = MethodCatalog::standard();
        assert!(matches!(
            catalog.validate("SS", "aes-256-ctr"),
            Err(ConfigurationFault::Method { .. })
        ));
        assert!(matches!(
            catalog.validate("SSR", "aes-128-gcm"),
            Err(ConfigurationFault::Method { .. })
        ));
    }

    #[test]
    fn type_missing_from_catalog_is_rejected() {
        let catalog = MethodCatalog::new(vec![(ServiceType::Ss, vec!["aes-256-cfb".into()])]);
        assert!(matches!(
            catalog.validate("SSR", "aes-256-cfb"),
            Err(ConfigurationFault::ServiceType(_))
        ));
        assert!(catalog.methods(ServiceType::Ssr).is_empty());
    }

    #[test]
    fn default_method_is_first_ss_method() {
        assert_eq!(MethodCatalog::standard().default_method(), "aes-256-cfb");
    }
}
