//! Main entry point for the UpBox server binary

use anyhow::Result;
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use upbox_core::{create_app, run_server, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());
    info!("Content directory: {}", config.storage.content_dir.display());
    info!("Credential file: {}", config.storage.credential_file.display());

    config.create_directories()
        .map_err(|e| anyhow::anyhow!("Failed to create directories: {}", e))?;

    let addr: SocketAddr = config.bind_address().parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let state = AppState::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize application state: {}", e))?;

    let auth = state.auth.clone();
    let uses_default = tokio::task::spawn_blocking(move || {
        auth.initialize()?;
        auth.is_default_password()
    })
    .await??;

    if uses_default {
        warn!("The default password is still active - change it under Settings after logging in!");
    }

    info!("App: {} v{}", state.app_name, state.version);

    let app = create_app(state);

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let default_level = if cfg!(debug_assertions) {
                "debug"
            } else {
                "info"
            };

            format!(
                "{}={level},upbox_core={level},tower_http=debug,axum=debug",
                env!("CARGO_CRATE_NAME").replace('-', "_"),
                level = default_level
            ).into()
        });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
