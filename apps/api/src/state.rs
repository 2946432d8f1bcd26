use std::sync::Arc;

use tessera_application::RoleService;
use tessera_infrastructure::InMemoryCallerDirectory;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub role_service: RoleService,
    pub caller_directory: Arc<InMemoryCallerDirectory>,
    pub redis_client: Option<redis::Client>,
}
