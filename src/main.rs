use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use focusd::config::{Config, DEFAULT_DATA_DIR, resolve_path};
use focusd::handlers::auth::SignedTokenIdentity;
use focusd::server::{self, AppState};
use focusd::store::{
    EventStore, FeedbackStore, FileDatabase, SessionStore, TaskStore, UserStore,
};

/// Fallback used when no token secret is configured. Fine on a developer
/// laptop, never in production.
const INSECURE_DEV_SECRET: &str = "insecure-dev-secret";

/// focusd - backend service for focus-session and activity tracking
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "focusd.yaml")]
    config: String,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config).await?;

    // CLI port overrides config
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let config_path = Path::new(&args.config);
    let data_dir = match &config.store.path {
        Some(path) => resolve_path(config_path, path),
        None => resolve_path(config_path, Path::new(DEFAULT_DATA_DIR)),
    };

    let secret = match config.auth.token_secret.clone() {
        Some(secret) => secret,
        None => {
            warn!("no auth.token_secret configured; using the insecure development secret");
            INSECURE_DEV_SECRET.to_string()
        }
    };

    let db: Arc<FileDatabase> = Arc::new(FileDatabase::open(&data_dir).await?);
    info!(data_dir = %data_dir.display(), "document store opened");

    let state = AppState {
        users: UserStore::new(db.clone()),
        sessions: SessionStore::new(db.clone()),
        events: EventStore::new(db.clone()),
        tasks: TaskStore::new(db.clone()),
        feedback: FeedbackStore::new(db),
        identity: Arc::new(SignedTokenIdentity::new(secret.into_bytes())),
        max_connections: config.server.max_connections,
    };

    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, "starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
