use std::sync::Arc;

use crate::auth::SigningKey;
use crate::config::ServerConfig;
use crate::identity::IdentityService;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityService,
    pub signing_key: Arc<SigningKey>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(identity: IdentityService, signing_key: SigningKey, config: ServerConfig) -> Self {
        Self {
            identity,
            signing_key: Arc::new(signing_key),
            config: Arc::new(config),
        }
    }
}
