use std::sync::Arc;

use crate::common::notify::Notifier;
use crate::config::settings::AppConfig;
use crate::infrastructure::http::client::MediaApi;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub api: MediaApi,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(config: AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        let api = MediaApi::new(config.api_base_url.clone());

        Self {
            config,
            api,
            notifier,
        }
    }
}
