//! Creates a user's relay: validate, pick a port, start a container, record
//! it on the user. A container whose record cannot be written is removed
//! again before the error is returned.

use std::sync::Arc;
use crate::errors::{ProvisionError, ProvisionResult, StoreError};
use crate::models::{ProvisionedService, ServiceResult, ServiceType};
use super::catalog::MethodCatalog;
use super::port_allocator::{allocate_port, PortRange};
use super::runtime::{ContainerRequest, ContainerRuntime, StartedContainer};
use super::store::UserStore;

/// A started container that is not yet recorded on its user. Must end in
/// either `commit` or `rollback`.
#[must_use]
struct PendingService {
    container: StartedContainer,
    method: String,
    service_type: ServiceType,
}

impl PendingService {
    fn descriptor(&self) -> ProvisionedService {
        ProvisionedService {
            container_id: self.container.id.clone(),
            port: self.container.port,
            password: self.container.password.clone(),
            method: self.method.clone(),
            service_type: self.service_type,
        }
    }

    /// Writes the service onto the user. On failure the pending service is
    /// handed back so the caller can roll it back.
    async fn commit(
        self,
        store: &dyn UserStore,
        user_id: &str,
    ) -> Result<ProvisionedService, (Self, StoreError)> {
        let service = self.descriptor();
        match store.assign_service(user_id, &service).await {
            Ok(0) => Err((self, StoreError::NotUpdated(user_id.to_string()))),
            Ok(_) => Ok(service),
            Err(e) => Err((self, e)),
        }
    }

    /// Removes the container. Failures are logged only.
    async fn rollback(self, runtime: &dyn ContainerRuntime) {
        let container_id = &self.container.id;
        tracing::warn!("Removing container {} after failed update", container_id);
        if let Err(e) = runtime.remove(container_id).await {
            tracing::error!("Failed to remove container {}: {}", container_id, e);
        }
    }
}

pub struct Provisioner {
    catalog: Arc<MethodCatalog>,
    ports: PortRange,
    host: String,
    store: Arc<dyn UserStore>,
    runtime: Arc<dyn ContainerRuntime>,
}

impl Provisioner {
    pub fn new(
        catalog: Arc<MethodCatalog>,
        ports: PortRange,
        host: String,
        store: Arc<dyn UserStore>,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Self {
        Self {
            catalog,
            ports,
            host,
            store,
            runtime,
        }
    }

    pub async fn create_service(
        &self,
        user_id: &str,
        service_type: &str,
        method: &str,
    ) -> ProvisionResult<ServiceResult> {
        let service_type = self.catalog.validate(service_type, method)?;

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ProvisionError::UserNotFound(user_id.to_string()))?;
        if user.service.is_provisioned() {
            return Err(ProvisionError::AlreadyProvisioned(user_id.to_string()));
        }

        let used_ports = self.store.list_used_ports().await?;
        let port = allocate_port(&used_ports, self.ports)?;
        tracing::debug!("Allocated port {} for user {}", port, user_id);

        let request = ContainerRequest {
            service_type,
            name: user.username.to_lowercase(),
            method: method.to_string(),
            password: None,
            port,
        };
        let container = self.runtime.create_and_start(&request).await.map_err(|e| {
            tracing::error!("Create {} service for user {} failed: {}", service_type, user_id, e);
            ProvisionError::Provisioning(e)
        })?;

        let pending = PendingService {
            container,
            method: method.to_string(),
            service_type,
        };
        let service = match pending.commit(self.store.as_ref(), user_id).await {
            Ok(service) => service,
            Err((pending, e)) => {
                tracing::error!("Update user {} failed: {}", user_id, e);
                pending.rollback(self.runtime.as_ref()).await;
                return Err(ProvisionError::Persistence(e));
            }
        };

        tracing::info!(
            "Created {} service on port {} for user {}",
            service.service_type,
            service.port,
            user_id
        );
        Ok(ServiceResult {
            id: service.container_id,
            host: self.host.clone(),
            port: service.port,
            password: service.password,
            method: service.method,
            service_type: service.service_type,
            package_limit: user.package_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigurationFault;
    use crate::models::{ServiceState, User, UserStatus};
    use crate::services::runtime::fake::RecordingRuntime;
    use crate::services::store::memory::MemoryUserStore;
    use chrono::NaiveDate;
    use std::sync::atomic::Ordering;

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.into(),
            username: username.into(),
            password_hash: String::new(),
            status: UserStatus::Inactive,
            package_used: 0.0,
            package_limit: 100,
            expired: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            service: ServiceState::Unprovisioned,
        }
    }

    async fn setup(runtime: RecordingRuntime, ports: PortRange) -> (Arc<Provisioner>, Arc<MemoryUserStore>, Arc<RecordingRuntime>) {
        let store = Arc::new(MemoryUserStore::default());
        store.insert(user("1", "Alice")).await;
        store.insert(user("2", "bob")).await;
        let runtime = Arc::new(runtime);
        let provisioner = Provisioner::new(
            Arc::new(MethodCatalog::standard()),
            ports,
            "relay.example.com".into(),
            store.clone(),
            runtime.clone(),
        );
        (Arc::new(provisioner), store, runtime)
    }

    fn ports() -> PortRange {
        PortRange::new(5001, 5003)
    }

    #[tokio::test]
    async fn creates_service_and_records_it() {
        let (provisioner, store, runtime) = setup(RecordingRuntime::default(), ports()).await;

        let result = provisioner.create_service("1", "SS", "aes-256-gcm").await.unwrap();
        assert_eq!(result.port, 5001);
        assert_eq!(result.host, "relay.example.com");
        assert_eq!(result.package_limit, 100);
        assert_eq!(result.service_type, ServiceType::Ss);

        let created = runtime.created.lock().unwrap().clone();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "alice");
        assert_eq!(created[0].port, 5001);

        let stored = store.get_user("1").await.unwrap().unwrap();
        assert_eq!(stored.status, UserStatus::Active);
        let service = stored.service.provisioned().unwrap();
        assert_eq!(service.container_id, result.id);
        assert_eq!(service.password, result.password);
        assert_eq!(service.method, "aes-256-gcm");
        assert!(runtime.removed_ids().is_empty());
    }

    #[tokio::test]
    async fn second_user_gets_next_port() {
        let (provisioner, _, _) = setup(RecordingRuntime::default(), ports()).await;
        provisioner.create_service("1", "SS", "aes-256-cfb").await.unwrap();
        let second = provisioner.create_service("2", "SSR", "chacha20").await.unwrap();
        assert_eq!(second.port, 5002);
    }

    #[tokio::test]
    async fn invalid_method_touches_nothing() {
        let (provisioner, store, runtime) = setup(RecordingRuntime::default(), ports()).await;

        let err = provisioner.create_service("1", "SS", "chacha20").await.unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::InvalidConfiguration(ConfigurationFault::Method { .. })
        ));

        let err = provisioner.create_service("1", "HTTP", "aes-256-cfb").await.unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::InvalidConfiguration(ConfigurationFault::ServiceType(_))
        ));

        assert_eq!(store.call_count(), 0);
        assert_eq!(runtime.created_count(), 0);
        assert!(runtime.removed_ids().is_empty());
    }

    #[tokio::test]
    async fn second_create_is_rejected() {
        let (provisioner, _, runtime) = setup(RecordingRuntime::default(), ports()).await;
        provisioner.create_service("1", "SS", "aes-256-cfb").await.unwrap();

        let err = provisioner.create_service("1", "SSR", "chacha20").await.unwrap_err();
        assert!(matches!(err, ProvisionError::AlreadyProvisioned(ref id) if id == "1"));
        assert_eq!(runtime.created_count(), 1);
    }

    #[tokio::test]
    async fn unknown_user_is_reported() {
        let (provisioner, _, runtime) = setup(RecordingRuntime::default(), ports()).await;
        let err = provisioner.create_service("99", "SS", "aes-256-cfb").await.unwrap_err();
        assert!(matches!(err, ProvisionError::UserNotFound(_)));
        assert_eq!(runtime.created_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_ports_start_nothing() {
        let (provisioner, _, runtime) =
            setup(RecordingRuntime::default(), PortRange::new(5001, 5001)).await;
        provisioner.create_service("1", "SS", "aes-256-cfb").await.unwrap();

        let err = provisioner.create_service("2", "SS", "aes-256-cfb").await.unwrap_err();
        assert!(matches!(err, ProvisionError::NoAvailablePort { from: 5001, to: 5001 }));
        assert_eq!(runtime.created_count(), 1);
    }

    #[tokio::test]
    async fn runtime_failure_leaves_user_untouched() {
        let runtime = RecordingRuntime::default();
        runtime.fail_create.store(true, Ordering::SeqCst);
        let (provisioner, store, runtime) = setup(runtime, ports()).await;

        let err = provisioner.create_service("1", "SS", "aes-256-cfb").await.unwrap_err();
        assert!(matches!(err, ProvisionError::Provisioning(_)));

        let stored = store.get_user("1").await.unwrap().unwrap();
        assert_eq!(stored.service, ServiceState::Unprovisioned);
        assert!(runtime.removed_ids().is_empty());
    }

    #[tokio::test]
    async fn failed_update_removes_the_started_container() {
        let (provisioner, store, runtime) = setup(RecordingRuntime::default(), ports()).await;
        store.fail_assign.store(true, Ordering::SeqCst);

        let err = provisioner.create_service("1", "SS", "aes-256-cfb").await.unwrap_err();
        assert!(matches!(err, ProvisionError::Persistence(StoreError::NotUpdated(_))));
        assert_eq!(runtime.removed_ids(), vec!["container-0".to_string()]);
    }

    #[tokio::test]
    async fn store_error_on_update_removes_the_started_container() {
        let (provisioner, store, runtime) = setup(RecordingRuntime::default(), ports()).await;
        store.break_assign.store(true, Ordering::SeqCst);

        let err = provisioner.create_service("1", "SSR", "chacha20").await.unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Persistence(StoreError::Corrupt { ref key, .. }) if key == "user:1"
        ));

        assert_eq!(runtime.created_count(), 1);
        assert_eq!(runtime.removed_ids(), vec!["container-0".to_string()]);

        let stored = store.get_user("1").await.unwrap().unwrap();
        assert_eq!(stored.service, ServiceState::Unprovisioned);
    }

    #[tokio::test]
    async fn removal_failure_does_not_mask_persistence_error() {
        let runtime = RecordingRuntime::default();
        runtime.fail_remove.store(true, Ordering::SeqCst);
        let (provisioner, store, runtime) = setup(runtime, ports()).await;
        store.fail_assign.store(true, Ordering::SeqCst);

        let err = provisioner.create_service("1", "SS", "aes-256-cfb").await.unwrap_err();
        assert!(matches!(err, ProvisionError::Persistence(_)));
        assert_eq!(runtime.removed_ids().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_creates_for_one_user_commit_once() {
        // Both requests pass the precondition check before either starts its
        // container, so the conditional update decides the winner.
        let (provisioner, store, runtime) =
            setup(RecordingRuntime::with_barrier(2), ports()).await;

        let first = {
            let provisioner = provisioner.clone();
            tokio::spawn(async move { provisioner.create_service("1", "SS", "aes-256-cfb").await })
        };
        let second = {
            let provisioner = provisioner.clone();
            tokio::spawn(async move { provisioner.create_service("1", "SSR", "chacha20").await })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(
            loser,
            ProvisionError::Persistence(_) | ProvisionError::AlreadyProvisioned(_)
        ));

        assert_eq!(runtime.created_count(), 2);
        let removed = runtime.removed_ids();
        assert_eq!(removed.len(), 1);
        assert_ne!(removed[0], winners[0].id);

        let stored = store.get_user("1").await.unwrap().unwrap();
        assert_eq!(stored.service.provisioned().unwrap().container_id, winners[0].id);
    }
}
