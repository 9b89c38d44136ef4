use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::Parser;
use log::info;
use simple_logger::SimpleLogger;
use tokio::{net::TcpListener, signal};

use movie_review::{
    config::ServiceConfig,
    gateway::{GrpcMovieLookup, GrpcUserLookup},
    http::{ReviewServiceState, build_router},
    orchestrator::ReviewOrchestrator,
    repository::MongoReviewRepository,
    telemetry::init_otlp_metrics,
};

/// Parses configuration, activates logger and starts the review service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::parse();
    SimpleLogger::new().with_level(config.log_level).init()?;

    let meter_provider = if config.otlp_metrics {
        Some(init_otlp_metrics()?)
    } else {
        None
    };

    start_service(&config).await?;

    if let Some(provider) = meter_provider {
        provider.shutdown()?;
    }
    Ok(())
}

/// Connects storage and remote lookups, then serves the REST API until a shutdown signal arrives.
async fn start_service(config: &ServiceConfig) -> anyhow::Result<()> {
    let repository =
        MongoReviewRepository::connect(&config.mongodb_uri, &config.mongodb_database)
            .await
            .context("Failed to connect to MongoDB")?;
    let movies = GrpcMovieLookup::connect(&config.movie_endpoint())
        .await
        .context("Failed to connect to movie service")?;
    let users = GrpcUserLookup::connect(&config.user_endpoint())
        .await
        .context("Failed to connect to user service")?;

    let orchestrator =
        ReviewOrchestrator::new(Arc::new(repository), Arc::new(movies), Arc::new(users));
    let app = build_router(ReviewServiceState { orchestrator });

    let address = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(address).await?;
    info!("Review REST API: http://{}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Review service stopped.");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, on SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received, draining connections.");
}
