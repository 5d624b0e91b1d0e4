use std::sync::Arc;
use crate::config::Config;
use crate::services::{MethodCatalog, Provisioner, UserStore};

// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub provisioner: Arc<Provisioner>,
    pub catalog: Arc<MethodCatalog>,
    pub config: Config,
    pub bcrypt_cost: u32,
}
