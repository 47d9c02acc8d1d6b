//! skosrecd: the reconciliation service over HTTP.
//!
//! Routes are listed in [`skos_reconcile::server`].
//!
//! Build and run: `cargo run --features server --bin skosrecd`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use miette::IntoDiagnostic;

use skos_reconcile::config::ServiceConfig;
use skos_reconcile::dispatch::Dispatcher;
use skos_reconcile::server::{ServerState, router};
use skos_reconcile::vocab::VocabularyClient;

#[derive(Parser)]
#[command(name = "skosrecd", version, about = "SKOS reconciliation service")]
struct Args {
    /// Path to a TOML service config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vocabulary API base URL (overrides config and environment).
    #[arg(long)]
    api_url: Option<String>,

    /// Address to bind.
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    tracing::info!("skosrecd shutting down");
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = ServiceConfig::resolve(args.config.as_deref(), args.api_url.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let addr = format!("{}:{}", config.bind, config.port);
    let client = VocabularyClient::new(&config)?;
    tracing::info!(api = %config.api_base_url, "skosrecd initialized");

    let state = Arc::new(ServerState::new(Dispatcher::new(config, client)));
    let app = router(state);

    tracing::info!("skosrecd listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await.into_diagnostic()?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;
    Ok(())
}
