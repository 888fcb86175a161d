// Standalone HTTP server for the browser UI.
// Use: cargo run --bin voxbox-server

use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use voxbox::config::AppConfig;
use voxbox::engines::gtranslate::GoogleTranslateTts;
use voxbox::engines::{detect_offline_engine, CloudEngine};
use voxbox::http_server;
use voxbox::orchestrator::Converter;

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

/// Try to bind to a port, returning the actual port used
async fn try_bind_port(start_port: u16) -> u16 {
    let mut port = start_port;
    for _ in 0..10 {
        match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
            Ok(listener) => {
                // Successfully bound, drop the listener so the server can use it
                drop(listener);
                return port;
            }
            Err(_) => {
                warn!("Port {} is in use, trying {}...", port, port + 1);
                port += 1;
            }
        }
    }
    // Return the last tried port, let the server fail with a clear message
    port
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let config = AppConfig::load().context("Failed to load configuration")?;
    match AppConfig::config_path() {
        Some(path) if path.exists() => info!("Config: {}", path.display()),
        _ => info!("Config: defaults (no config file found)"),
    }

    if let Some(dir) = &config.offline.temp_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create temp dir {}", dir.display()))?;
    }

    let offline = detect_offline_engine(&config.offline)?;
    match &offline {
        Some(engine) => info!("Offline engine: {}", engine.name()),
        None => warn!("Offline engine: none detected, cloud conversion only"),
    }

    let cloud = GoogleTranslateTts::new(&config.cloud).context("Failed to build cloud engine")?;
    info!("Cloud engine: {}", cloud.name());

    let converter = Arc::new(Converter::new(
        offline,
        Box::new(cloud),
        config.offline.temp_dir.clone(),
    ));
    info!("Voice catalog: {} voices", converter.catalog().len());

    let preferred_port: u16 = env::var("VOXBOX_HTTP_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.server.port);

    let port = try_bind_port(preferred_port).await;

    info!("UI:  http://localhost:{}/", port);
    info!("API: http://localhost:{}/api", port);

    http_server::run_http_server(converter, port).await;
    Ok(())
}
