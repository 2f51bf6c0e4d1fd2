//! Fermix API - exoplanet candidate classification service
//!
//! Loads the trained model pair once at startup and serves predictions,
//! dataset pages and model statistics over HTTP.

use anyhow::Result;
use fermix_api::{
    api::{self, AppState, SERVICE_VERSION},
    config::{LogFormat, ServerConfig},
};
use fermix_lib::{DatasetStore, ModelCache, Predictor, ServingMetrics, StructuredLogger};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration decides the log format, so it is read first
    let config = ServerConfig::load()?;
    init_tracing(config.log_format);

    let default_variant = config.default_variant()?;
    let logger = StructuredLogger::new("fermix-api");
    logger.log_startup(
        SERVICE_VERSION,
        &config.models_dir.display().to_string(),
        config.api_port,
    );

    // Load models before accepting traffic; on failure the service still
    // starts and predictions answer 503
    let mut cache = ModelCache::new(config.artifact_paths());
    match cache.load() {
        Ok(()) => {
            if let (Ok(schema), Ok(metadata)) = (cache.schema(), cache.metadata()) {
                logger.log_models_loaded(schema.len(), &metadata.created_utc);
            }
        }
        Err(e) => logger.log_load_failure(&e.to_string()),
    }
    let metrics = ServingMetrics::new();
    metrics.set_models_loaded(cache.is_loaded());

    let datasets = DatasetStore::load(
        &config.sample_dataset_path(),
        &config.clean_dataset_path(),
        config.max_page_size,
    );

    let state = AppState::new(
        Predictor::new(Arc::new(cache)),
        Arc::new(datasets),
        config.clone(),
        default_variant,
    );
    let app_state = Arc::new(state);
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => info!("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "API server task panicked");
                    return Err(e.into());
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
