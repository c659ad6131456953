//! Subtrack Server
//!
//! Serves the subscription REST API:
//! - `/api/v1/subscriptions` CRUD and total-cost aggregation
//! - `/health` liveness
//! - `/swagger-ui` and `/q/openapi` documentation
//!
//! ## Configuration
//!
//! Read from `config.toml` (or the file named by `SUBTRACK_CONFIG`), then
//! overridden by `SUBTRACK_*` environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SUBTRACK_ENV` | `local` | `prod` switches logs to JSON |
//! | `SUBTRACK_HTTP_PORT` | `8080` | HTTP API port |
//! | `SUBTRACK_DATABASE_KIND` | `postgres` | `postgres` or `sqlite` |
//! | `SUBTRACK_DATABASE_URL` | - | Connection URL |
//! | `LOG_FORMAT` | - | `json` or `text`, overrides the env default |
//! | `RUST_LOG` | `info` | Log level |

use std::net::SocketAddr;

use anyhow::{Context, Result};
use st_common::logging::{init_logging, LogFormat};
use st_config::ConfigLoader;
use st_platform::app::build_app;
use st_platform::shared::database::open_repository;
use st_platform::SubscriptionService;
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{error, info, warn};
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, load_report) = ConfigLoader::new()
        .load_reported()
        .context("failed to load configuration")?;
    init_logging("st-server", LogFormat::for_env(&config.env));
    load_report.log();
    config.validate().context("invalid configuration")?;

    info!(env = %config.env, database = %config.database.kind, "Starting Subtrack Server");

    let repo = open_repository(&config.database)
        .await
        .context("failed to open subscription store")?;
    let service = SubscriptionService::new(repo);

    let (router, openapi) = build_app(service, config.http.request_timeout());
    let app = router.merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi));

    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .context("invalid HTTP listen address")?;
    let listener = TcpListener::bind(addr).await?;
    info!("API server listening on http://{}", addr);

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received, draining connections...");
        }
        result = &mut server => {
            // Server stopped on its own
            return result?.context("HTTP server failed");
        }
    }

    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(config.http.shutdown_timeout(), &mut server).await {
        Ok(Ok(Ok(()))) => info!("Subtrack Server shutdown complete"),
        Ok(Ok(Err(e))) => error!(error = %e, "HTTP server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "HTTP server task panicked"),
        Err(_) => {
            warn!(
                timeout_secs = config.http.shutdown_timeout().as_secs(),
                "Graceful shutdown timed out, aborting"
            );
            server.abort();
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
