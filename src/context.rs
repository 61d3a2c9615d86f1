use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{Clock, RemoteSession};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub session: Arc<dyn RemoteSession>,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    pub fn new(config: AppConfig, session: Arc<dyn RemoteSession>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            session,
            clock,
        }
    }
}
