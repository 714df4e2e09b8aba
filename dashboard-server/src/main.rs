use dashboard_server::config::ServerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    let app = match dashboard_server::build_router(&config) {
        Ok(app) => app,
        Err(err) => {
            tracing::error!("failed to build http client: {err}");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind {}: {err}", config.bind);
            std::process::exit(1);
        }
    };

    tracing::info!(
        bind = %config.bind,
        backend = %config.backend_origin,
        ui = ?config.ui_dir,
        "dashboard-server listening"
    );

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("server stopped: {err}");
        std::process::exit(1);
    }
}
