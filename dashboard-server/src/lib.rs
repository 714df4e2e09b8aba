pub mod config;
pub mod pages;
pub mod proxy;
pub mod transport;

use crate::config::ServerConfig;
use crate::pages::{pages_router, PageState};
use crate::proxy::proxy_router;
use crate::transport::ReqwestTransport;
use axum::{routing::get, Router};
use dashboard_core::probe::default_targets;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub fn build_router(config: &ServerConfig) -> Result<Router, reqwest::Error> {
    let backend = ReqwestTransport::new(&config.backend_origin, config.timeout)?;
    let upstream = ReqwestTransport::without_redirects(&config.backend_origin, config.timeout)?;
    let loopback = ReqwestTransport::new(&config.self_origin(), config.timeout)?;
    let probe_targets = Arc::new(default_targets(
        &config.backend_origin,
        &config.external_probe_url,
    ));

    let mut app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(proxy_router(upstream))
        .merge(pages_router(PageState {
            backend,
            loopback,
            probe_targets,
        }));

    if let Some(dir) = &config.ui_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    Ok(app.layer(TraceLayer::new_for_http()))
}
