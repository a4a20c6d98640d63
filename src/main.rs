use fast_tracker::{router, spawn_background_sync, AppState, Config};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let data_dir = config
        .data_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = data_dir {
        fs::create_dir_all(parent).await?;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("backend at {}", config.api_base_url);

    let state = AppState::new(config).await;
    spawn_background_sync(state.clone());

    let app = router(state);

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
