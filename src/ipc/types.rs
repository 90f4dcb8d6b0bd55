use std::sync::Arc;

use serde::Deserialize;

use crate::config::AppConfig;
use crate::service::DataService;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: AppConfig,
    pub service: Arc<DataService>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let service = Arc::new(DataService::from_config(&config));
        Self { config, service }
    }
}
