use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tower::{ServiceBuilder, service_fn};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use foodie::AppState;
use foodie::bootstrap::{ensure_root_admin, open_pool};
use foodie::handlers::http::build_api_router;
use foodie::security::TokenCodec;
use foodie::tower_middle::TimeoutLayer;
use shared::config::{LiveConfig, load_config};

/// Meal-planning HTTP service.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    // Validated by load_config; read once, never hot-reloaded.
    let secret = config
        .auth
        .resolved_jwt_secret()
        .context("No JWT secret configured")?;

    let db = open_pool(&config.database).await?;
    ensure_root_admin(&db, &config.auth).await?;

    let addr = config.server.addr();
    let timeout = config.server.request_timeout();
    let root_admin = config.auth.root_admin_name.clone();

    let live = LiveConfig::new(config);
    let state = AppState::new(db, TokenCodec::new(secret.as_bytes()), live.clone(), &root_admin);
    let router = Arc::new(build_api_router());

    spawn_reload_listener(args.config.clone(), live);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        };

        let router = router.clone();
        let state = state.clone();
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .service(service_fn(move |req: Request<Incoming>| {
                let router = router.clone();
                let state = state.clone();
                async move { router.serve(req, state).await }
            }));

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(TokioIo::new(stream), TowerToHyperService::new(service))
                .await
            {
                warn!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }

    state.db.close().await;
    info!("Server stopped");
    Ok(())
}

/// Re-read the config file on SIGHUP.  Only settings read per request
/// (body limit) change; the secret, database and bind address do not.
#[cfg(unix)]
fn spawn_reload_listener(path: PathBuf, live: LiveConfig) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                error!("Cannot listen for SIGHUP: {}", e);
                return;
            }
        };

        while hangup.recv().await.is_some() {
            reload(&path, &live).await;
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_listener(_path: PathBuf, _live: LiveConfig) {}

#[cfg_attr(not(unix), allow(dead_code))]
async fn reload(path: &Path, live: &LiveConfig) {
    match load_config(path) {
        Ok(config) => {
            live.reload(config).await;
            info!("Configuration reloaded from {}", path.display());
        }
        Err(e) => warn!("Keeping previous configuration: {}", e),
    }
}
