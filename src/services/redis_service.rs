use async_trait::async_trait;
use chrono::NaiveDate;
use redis::{AsyncCommands, Client, Script};
use std::collections::HashMap;
use std::sync::Arc;
use crate::errors::{StoreError, StoreResult};
use crate::models::{ProvisionedService, ServiceState, User, UserStatus};
use super::store::UserStore;

const USED_PORTS_KEY: &str = "service_ports";

// KEYS[1] user hash, KEYS[2] used-port set.
// ARGV: status, service_id, service_port, service_pwd, service_method, service_type
const ASSIGN_SERVICE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
local current = redis.call('HGET', KEYS[1], 'service_id')
if current and current ~= '' then
    return 0
end
redis.call('HSET', KEYS[1],
    'status', ARGV[1],
    'service_id', ARGV[2],
    'service_port', ARGV[3],
    'service_pwd', ARGV[4],
    'service_method', ARGV[5],
    'service_type', ARGV[6])
redis.call('SADD', KEYS[2], ARGV[3])
return 1
"#;

// KEYS[1] user hash, KEYS[2] username index. ARGV[1] id, then field/value pairs.
const CREATE_USER_SCRIPT: &str = r#"
if redis.call('SETNX', KEYS[2], ARGV[1]) == 0 then
    return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV, 2))
return 1
"#;

pub struct RedisService {
    client: Arc<Client>,
}

impl RedisService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

impl Clone for RedisService {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone()
        }
    }
}

fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

fn username_key(username: &str) -> String {
    format!("username:{}", username)
}

/// Flattens a user into hash fields. Service fields are empty strings while
/// unprovisioned.
pub(crate) fn user_to_fields(user: &User) -> Vec<(&'static str, String)> {
    let service = user.service.provisioned();
    vec![
        ("id", user.id.clone()),
        ("username", user.username.clone()),
        ("password_hash", user.password_hash.clone()),
        ("status", user.status.code().to_string()),
        ("package_used", user.package_used.to_string()),
        ("package_limit", user.package_limit.to_string()),
        ("expired", user.expired.format("%Y-%m-%d").to_string()),
        ("service_id", service.map(|s| s.container_id.clone()).unwrap_or_default()),
        ("service_port", service.map(|s| s.port.to_string()).unwrap_or_default()),
        ("service_pwd", service.map(|s| s.password.clone()).unwrap_or_default()),
        ("service_method", service.map(|s| s.method.clone()).unwrap_or_default()),
        ("service_type", service.map(|s| s.service_type.to_string()).unwrap_or_default()),
    ]
}

pub(crate) fn user_from_fields(key: &str, fields: &HashMap<String, String>) -> StoreResult<User> {
    let corrupt = |reason: String| StoreError::Corrupt {
        key: key.to_string(),
        reason,
    };
    let text = |name: &str| fields.get(name).cloned().unwrap_or_default();
    let required = |name: &str| {
        fields
            .get(name)
            .cloned()
            .ok_or_else(|| corrupt(format!("missing field {}", name)))
    };

    let status_code: u8 = required("status")?
        .parse()
        .map_err(|e| corrupt(format!("status: {}", e)))?;
    let status = UserStatus::from_code(status_code)
        .ok_or_else(|| corrupt(format!("unknown status {}", status_code)))?;

    let package_used: f64 = match fields.get("package_used") {
        Some(v) if !v.is_empty() => v.parse().map_err(|e| corrupt(format!("package_used: {}", e)))?,
        _ => 0.0,
    };
    let package_limit: u64 = match fields.get("package_limit") {
        Some(v) if !v.is_empty() => v.parse().map_err(|e| corrupt(format!("package_limit: {}", e)))?,
        _ => 0,
    };
    let expired = NaiveDate::parse_from_str(&required("expired")?, "%Y-%m-%d")
        .map_err(|e| corrupt(format!("expired: {}", e)))?;

    let service_id = text("service_id");
    let service = if service_id.is_empty() {
        ServiceState::Unprovisioned
    } else {
        ServiceState::Provisioned(ProvisionedService {
            container_id: service_id,
            port: text("service_port")
                .parse()
                .map_err(|e| corrupt(format!("service_port: {}", e)))?,
            password: text("service_pwd"),
            method: text("service_method"),
            service_type: text("service_type")
                .parse()
                .map_err(|t| corrupt(format!("service_type {:?}", t)))?,
        })
    };

    Ok(User {
        id: required("id")?,
        username: required("username")?,
        password_hash: text("password_hash"),
        status,
        package_used,
        package_limit,
        expired,
        service,
    })
}

#[async_trait]
impl UserStore for RedisService {
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        let mut conn = self.client.get_async_connection().await?;
        let key = user_key(id);
        let fields: HashMap<String, String> = conn.hgetall(&key).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        user_from_fields(&key, &fields).map(Some)
    }

    async fn find_user_id(&self, username: &str) -> StoreResult<Option<String>> {
        let mut conn = self.client.get_async_connection().await?;
        Ok(conn.get(username_key(username)).await?)
    }

    async fn create_user(&self, user: &User) -> StoreResult<bool> {
        let mut conn = self.client.get_async_connection().await?;
        let script = Script::new(CREATE_USER_SCRIPT);
        let mut invocation = script.prepare_invoke();
        invocation
            .key(user_key(&user.id))
            .key(username_key(&user.username))
            .arg(&user.id);
        for (field, value) in user_to_fields(user) {
            invocation.arg(field).arg(value);
        }
        let created: i64 = invocation.invoke_async(&mut conn).await?;
        Ok(created == 1)
    }

    async fn list_used_ports(&self) -> StoreResult<Vec<u16>> {
        let mut conn = self.client.get_async_connection().await?;
        Ok(conn.smembers(USED_PORTS_KEY).await?)
    }

    async fn assign_service(&self, id: &str, service: &ProvisionedService) -> StoreResult<u64> {
        let mut conn = self.client.get_async_connection().await?;
        let affected: u64 = Script::new(ASSIGN_SERVICE_SCRIPT)
            .key(user_key(id))
            .key(USED_PORTS_KEY)
            .arg(UserStatus::Active.code().to_string())
            .arg(&service.container_id)
            .arg(service.port)
            .arg(&service.password)
            .arg(&service.method)
            .arg(service.service_type.as_str())
            .invoke_async(&mut conn)
            .await?;
        Ok(affected)
    }
}
