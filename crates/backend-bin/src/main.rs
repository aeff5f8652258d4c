// ============================
// crates/backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the students service.
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use students_backend_lib::{
    config::{LogFormat, Settings},
    router, AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "students-server", version, about = "Student identity and session service")]
struct Cli {
    /// TOML config file; `config.toml` in the working directory if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    init_tracing(&settings);

    let state = Arc::new(AppState::from_settings(settings.clone())?);
    let cleanup = state.sessions.clone().spawn_cleanup(settings.auth.cleanup_interval());

    let app = router::create_router(state);

    let listener = TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    info!(addr = %settings.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    info!("server stopped");
    Ok(())
}

/// `RUST_LOG` overrides the configured level
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match settings.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
