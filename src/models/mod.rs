mod user;
mod forms;
mod service;
mod response;
mod user_info;

pub use user::{User, UserStatus};
pub use forms::{LoginForm, SignupForm, CreateServiceForm};
pub use service::{ServiceType, ServiceState, ProvisionedService, ServiceResult};
pub use response::ApiResponse;
pub use user_info::UserInfo;
