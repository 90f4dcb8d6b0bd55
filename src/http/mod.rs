mod assets;
mod error;
mod handlers;
mod middleware;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;

use crate::config::AppConfig;
use crate::service::DataService;

pub use error::ApiError;

pub const DASHBOARD_PAGE: &str = "index.html";

#[derive(Clone)]
pub struct HttpState {
    pub service: Arc<DataService>,
    pub public_dir: PathBuf,
    pub cors_allowed_origins: Arc<Vec<String>>,
}

impl HttpState {
    pub fn new(service: Arc<DataService>, config: &AppConfig) -> Self {
        let public_dir = service.store().paths().public_dir().to_path_buf();
        Self {
            service,
            public_dir,
            cors_allowed_origins: Arc::new(config.cors_allowed_origins.clone()),
        }
    }
}

pub fn build_router(state: HttpState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(assets::dashboard_handler))
        .route("/api/health", get(handlers::health_handler))
        .route("/api/stats", get(handlers::stats_handler))
        .route(
            "/api/:collection",
            get(handlers::list_handler).post(handlers::create_handler),
        )
        .route(
            "/api/:collection/:id",
            axum::routing::put(handlers::update_handler).delete(handlers::delete_handler),
        )
        .fallback(assets::static_handler)
        .layer(from_fn_with_state(state.clone(), middleware::cors_middleware))
        .layer(from_fn(middleware::request_tracing_middleware))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
