use std::net::SocketAddr;

use axum::http::{header, HeaderValue, Method};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{error, info, warn};

use crm_api::{build_router, AppState};
use crm_infrastructure::Store;
use crm_shared::config::{AppConfig, AppSettings, LogFormat, LogSettings};
use crm_shared::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (.env is read inside)
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            let fallback = LogSettings { level: "info".into(), format: LogFormat::Pretty, directory: None };
            let _guard = init_telemetry(&fallback)?;
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Held for the process lifetime so buffered file logs are flushed
    let _guard = init_telemetry(&config.log)?;
    info!("{} starting ({} environment)", config.app.name, config.app.env);

    // Storage
    let store = Store::connect(&config.database).await.map_err(|e| {
        error!("Failed to initialise store: {}", e);
        e
    })?;

    let state = AppState::new(&config, store.users, store.leads);

    if let Some((name, email, password)) = config.bootstrap.admin() {
        state.auth.ensure_admin(name, email, password).await?;
    } else {
        warn!("No bootstrap admin configured");
    }

    let app = build_router(state, &config.app.api_prefix)
        .layer(cors_layer(&config.app)?)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()));

    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}

/// Any origin when none are configured.
fn cors_layer(settings: &AppSettings) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_DISPOSITION]);

    if settings.cors_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }
    let origins = settings
        .cors_origins
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(origins))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
