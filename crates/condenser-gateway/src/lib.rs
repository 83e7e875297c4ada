//! Condenser Gateway
//!
//! HTTP front door for the summarization pipeline. Accepts inline text or a
//! path to a text file, runs the convergence controller and returns the
//! formatted summary or a structured error.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod provider;

use condenser_domain::InferenceProvider;
use condenser_llm::LlmError;
use condenser_pipeline::{ConvergenceController, PipelineError};
use config::GatewayConfig;
use handlers::{create_router, AppState};
use provider::Backend;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Gateway error
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Inference backend could not be built or loaded
    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),

    /// Pipeline could not be constructed
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the application state for a backend and configuration
///
/// A `final_backend` runs the final pass over the converged text.
pub fn build_state(
    backend: Arc<Backend>,
    final_backend: Option<Arc<Backend>>,
    config: &GatewayConfig,
) -> Result<AppState, GatewayError> {
    let provider_name = backend.name().to_string();
    let mut controller = ConvergenceController::new(backend, config.pipeline.clone())?;
    if let Some(final_backend) = final_backend {
        info!("Final pass runs on provider {}", final_backend.name());
        controller = controller.with_final_provider(final_backend);
    }

    Ok(AppState {
        controller: Arc::new(controller),
        max_text_length: config.max_text_length,
        provider_name,
    })
}

/// Start the Gateway HTTP server
///
/// Builds and warms up the configured backend, serves until Ctrl+C, then
/// releases the backend.
pub async fn start_server(config: GatewayConfig) -> Result<(), GatewayError> {
    info!("Starting Condenser Gateway");
    info!("Bind address: {}", config.bind_addr());
    info!(
        "Provider: {} (model: {})",
        config.provider.kind.as_str(),
        config.provider.model
    );
    info!(
        "Concurrency: {}, max refinement rounds: {}",
        config.pipeline.max_concurrency, config.pipeline.max_refinement_rounds
    );

    let backend = Arc::new(Backend::from_config(&config.provider)?);
    warm_up(&backend).await?;

    let final_backend = match &config.final_provider {
        Some(provider) => {
            let final_backend = Arc::new(Backend::from_config(provider)?);
            warm_up(&final_backend).await?;
            Some(final_backend)
        }
        None => None,
    };

    let state = build_state(Arc::clone(&backend), final_backend.clone(), &config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Gateway listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::Server(e.to_string()))?;

    shutdown(backend).await;
    if let Some(final_backend) = final_backend {
        shutdown(final_backend).await;
    }

    Ok(())
}

async fn warm_up(backend: &Arc<Backend>) -> Result<(), GatewayError> {
    // HTTP backends block on their own calls, keep them off the async workers
    let warm = Arc::clone(backend);
    tokio::task::spawn_blocking(move || warm.warm_up())
        .await
        .map_err(|e| GatewayError::Server(e.to_string()))??;
    info!("Provider {} ready", backend.name());
    Ok(())
}

async fn shutdown(backend: Arc<Backend>) {
    info!("Shutting down provider {}", backend.name());
    match tokio::task::spawn_blocking(move || backend.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Provider shutdown failed: {}", e),
        Err(e) => warn!("Provider shutdown task failed: {}", e),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
