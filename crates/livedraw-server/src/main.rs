//! LiveDraw server binary.

use livedraw_server::{AppState, ServerConfig, router};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "livedraw_server=info,livedraw_core=info,tower_http=info".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env();
    let addr = config.addr;
    info!("Serving static files from {}", config.static_dir.display());

    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("LiveDraw server listening on {}", addr);
    axum::serve(listener, app).await
}
