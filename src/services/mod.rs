mod redis_service;
mod catalog;
mod port_allocator;
mod provisioner;
mod service_url;
pub(crate) mod runtime;
pub(crate) mod store;

pub use redis_service::RedisService;
pub use catalog::MethodCatalog;
pub use port_allocator::PortRange;
pub use provisioner::Provisioner;
pub use runtime::DockerRuntime;
pub use service_url::service_url;
pub use store::UserStore;
