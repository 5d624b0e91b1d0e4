//! Container runtime used to run relay servers.
//!
//! The production implementation shells out to the `docker` CLI:
//! - `docker run -d ...` to create and start a relay container
//! - `docker rm -f ID` to remove it again

use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use tokio::process::Command;
use tracing::{debug, warn};
use crate::config::ContainerConfig;
use crate::errors::RuntimeError;
use crate::models::ServiceType;

const GENERATED_PASSWORD_LEN: usize = 16;

/// What to run: one relay of `service_type` listening on `port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRequest {
    pub service_type: ServiceType,
    pub name: String,
    pub method: String,
    /// Generated by the runtime when absent.
    pub password: Option<String>,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedContainer {
    pub id: String,
    pub port: u16,
    pub password: String,
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn create_and_start(&self, request: &ContainerRequest) -> Result<StartedContainer, RuntimeError>;

    async fn remove(&self, container_id: &str) -> Result<(), RuntimeError>;
}

pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct DockerRuntime {
    config: ContainerConfig,
}

impl DockerRuntime {
    pub fn new(config: ContainerConfig) -> Self {
        Self { config }
    }

    fn image(&self, service_type: ServiceType) -> &str {
        match service_type {
            ServiceType::Ss => &self.config.ss_image,
            ServiceType::Ssr => &self.config.ssr_image,
        }
    }

    fn container_name(request: &ContainerRequest) -> String {
        format!("relay-{}", request.name)
    }

    /// Drops whatever a failed `docker run` left under the container name.
    /// Errors are logged only.
    async fn discard_failed_run(&self, request: &ContainerRequest) {
        let name = Self::container_name(request);
        if let Err(e) = self.remove(&name).await {
            warn!(container = %name, "Cleanup after failed run did not succeed: {}", e);
        }
    }

    /// Arguments for `docker run`. The image entrypoint is the relay server,
    /// so everything after the image name goes to the server.
    fn run_args(&self, request: &ContainerRequest, password: &str) -> Vec<String> {
        let port = request.port.to_string();
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            Self::container_name(request),
            "--restart".to_string(),
            "always".to_string(),
            "-p".to_string(),
            format!("{port}:{port}/tcp"),
            "-p".to_string(),
            format!("{port}:{port}/udp"),
            self.image(request.service_type).to_string(),
        ];

        match request.service_type {
            ServiceType::Ss => args.extend([
                "-s".to_string(),
                "0.0.0.0".to_string(),
                "-p".to_string(),
                port,
                "-k".to_string(),
                password.to_string(),
                "-m".to_string(),
                request.method.clone(),
                "-u".to_string(),
                "--fast-open".to_string(),
            ]),
            ServiceType::Ssr => args.extend([
                "-p".to_string(),
                port,
                "-k".to_string(),
                password.to_string(),
                "-m".to_string(),
                request.method.clone(),
                "-O".to_string(),
                "origin".to_string(),
                "-o".to_string(),
                "plain".to_string(),
            ]),
        }
        args
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create_and_start(&self, request: &ContainerRequest) -> Result<StartedContainer, RuntimeError> {
        let password = request.password.clone().unwrap_or_else(generate_password);
        debug!(name = %request.name, port = request.port, service_type = %request.service_type, "Starting relay container");

        let output = Command::new(&self.config.binary)
            .args(self.run_args(request, &password))
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // A rejected port binding still leaves a created container behind,
            // and its name would block every retry.
            self.discard_failed_run(request).await;
            return Err(RuntimeError::CommandFailed(format!(
                "{} run for {} failed: {}",
                self.config.binary, request.name, stderr
            )));
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            self.discard_failed_run(request).await;
            return Err(RuntimeError::CommandFailed(format!(
                "{} run for {} printed no container id",
                self.config.binary, request.name
            )));
        }

        debug!(container_id = %id, "Relay container started");
        Ok(StartedContainer {
            id,
            port: request.port,
            password,
        })
    }

    async fn remove(&self, container_id: &str) -> Result<(), RuntimeError> {
        let output = Command::new(&self.config.binary)
            .args(["rm", "-f", container_id])
            .output()
            .await?;

        if output.status.success() {
            debug!(container_id = container_id, "Relay container removed");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(container_id = container_id, "Container removal failed");
        Err(RuntimeError::CommandFailed(format!(
            "{} rm -f {} failed: {}",
            self.config.binary,
            container_id,
            stderr.trim()
        )))
    }
}
