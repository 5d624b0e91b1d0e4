use serde::Deserialize;
use std::path::Path;

use crate::services::PortRange;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub host: HostConfig,
    pub container: ContainerConfig,
    pub user: UserConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// The machine the relay containers are published on.
#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    pub address: String,
    pub port_from: u16,
    pub port_to: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContainerConfig {
    pub binary: String,
    pub ss_image: String,
    pub ssr_image: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub default_package_limit: u64, // in GB
    pub valid_days: i64,
}

impl Config {
    /// Loads `config/default` unless another file is given, then applies
    /// `APP__SECTION__KEY` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path),
            None => config::File::with_name("config/default"),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn port_range(&self) -> PortRange {
        PortRange::new(self.host.port_from, self.host.port_to)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.host.port_from == 0 || self.host.port_from > self.host.port_to {
            return Err(config::ConfigError::Message(format!(
                "invalid service port range {}..={}",
                self.host.port_from, self.host.port_to
            )));
        }
        if self.user.valid_days < 0 {
            return Err(config::ConfigError::Message(
                "user.valid_days must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 5000,
        },
        redis: RedisConfig {
            url: "redis://127.0.0.1/".into(),
        },
        host: HostConfig {
            address: "relay.example.com".into(),
            port_from: 5001,
            port_to: 5003,
        },
        container: ContainerConfig {
            binary: "docker".into(),
            ss_image: "goignite/ss-libev".into(),
            ssr_image: "goignite/ssr".into(),
        },
        user: UserConfig {
            default_package_limit: 100,
            valid_days: 30,
        },
    }
}
