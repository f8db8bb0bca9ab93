use items_service::config::ItemsConfig;
use items_service::services::init_metrics;
use items_service::startup::Application;
use items_service::SERVICE_NAME;
use service_core::error::AppError;
use service_core::observability::{init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = ItemsConfig::load()?;

    let otlp_enabled = init_tracing(
        SERVICE_NAME,
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics()?;

    tracing::info!(
        service = SERVICE_NAME,
        version = env!("CARGO_PKG_VERSION"),
        port = config.common.port,
        database = %config.mongodb.database,
        "Starting items service"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Startup failed, not serving");
        e
    })?;

    let result = app.run_until_stopped().await;

    if otlp_enabled {
        shutdown_tracing();
    }
    result?;

    tracing::info!("Service shutdown complete");
    Ok(())
}
