//! Murmur server binary.
//!
//! Starts the speech proxy with structured logging and graceful shutdown on
//! SIGTERM/SIGINT.

use murmur_server::{app, config, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Config file used when neither the command line nor the environment names one.
const DEFAULT_CONFIG_PATH: &str = "murmur.toml";

/// Picks the config file and reports where the choice came from.
///
/// The first CLI argument wins over `MURMUR_CONFIG_PATH`; blank values are skipped.
fn pick_config_path(cli_arg: Option<String>, env_var: Option<String>) -> (String, &'static str) {
    let usable = |value: &String| !value.trim().is_empty();
    if let Some(path) = cli_arg.filter(usable) {
        return (path, "cli-arg");
    }
    if let Some(path) = env_var.filter(usable) {
        return (path, "env-var");
    }
    (DEFAULT_CONFIG_PATH.to_string(), "default")
}

fn resolve_config_path() -> (String, &'static str) {
    pick_config_path(
        std::env::args().nth(1),
        std::env::var("MURMUR_CONFIG_PATH").ok(),
    )
}

#[tokio::main]
async fn main() {
    let (config_path, config_source) = resolve_config_path();

    let config = config::load_config(Some(config_path.as_str()))
        .expect("failed to load configuration; the server cannot start without valid config");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = %config_path,
        "resolved startup configuration path"
    );

    let state = AppState::from_config(&config);
    if state.access_code.is_some() {
        tracing::info!("access code required for speech endpoints");
    }

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting murmur server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("murmur server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
