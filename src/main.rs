use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use bunnyfood_rs::{
    create_app, create_metrics_app, init_observability,
    observability::{DatabaseTracingMiddleware, Metrics},
    repositories::DynamoDbFoodRepository,
    services::FoodService,
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment()?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!(
        "DynamoDB table: {} in {}",
        config.database.table_name, config.database.region
    );

    let metrics = Arc::new(Metrics::new()?);

    let dynamodb_client = Arc::new(config.database.dynamodb_client().await);

    let food_repository = Arc::new(
        DynamoDbFoodRepository::new(
            dynamodb_client,
            config.database.table_name.clone(),
            config.database.region.clone(),
        )
        .with_tracer(DatabaseTracingMiddleware::new(metrics.clone())),
    );
    let food_service = Arc::new(FoodService::new(food_repository));

    let app = create_app(food_service, metrics.clone(), config.server.max_request_size);
    let metrics_app = create_metrics_app(metrics);

    let host = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);
    let metrics_addr = SocketAddr::new(host, config.observability.metrics_port);

    let listener = TcpListener::bind(addr).await?;
    let metrics_listener = TcpListener::bind(metrics_addr).await?;

    info!("Server listening on {}", addr);
    info!("Metrics listening on {}", metrics_addr);

    let metrics_server = tokio::spawn(async move {
        axum::serve(metrics_listener, metrics_app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match metrics_server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Metrics server error: {}", e),
        Err(e) => warn!("Metrics server task failed: {}", e),
    }

    shutdown_observability().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}
