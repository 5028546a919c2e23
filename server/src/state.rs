//! Application state shared by every handler.

use std::sync::Arc;

use crate::auth::{JwtConfig, JwtManager};
use crate::config::Config;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let jwt = JwtManager::new(
            JwtConfig::new(config.secret_key.clone())
                .with_expiration_hours(config.session_ttl_hours),
        );

        Self {
            config: Arc::new(config),
            store,
            jwt,
        }
    }
}
