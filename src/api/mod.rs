//! HTTP layer - axum router, extractors and handlers.
//!
//! Handlers stay thin: they pull the caller and payload out of the request, call into
//! [`crate::core`], and let [`crate::errors::Error`] pick the status code.

/// Mapping of [`crate::errors::Error`] to HTTP responses
pub mod error;
/// Bearer-token and JSON payload extractors
pub mod extract;
/// Handlers grouped by resource
pub mod routes;

use crate::{
    config::AppConfig,
    core::{chatbot::Corpus, identity::IdentityVerifier},
    errors::Result,
};
use axum::{Router, routing::get};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// Shared data available to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Settings loaded at startup
    pub config: Arc<AppConfig>,
    /// Chatbot corpus, loaded once at startup
    pub corpus: Arc<Corpus>,
    /// Checks Google ID tokens during sign-in
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Bundles the startup resources; `config` and `corpus` are shared behind `Arc`.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        config: AppConfig,
        corpus: Corpus,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            corpus: Arc::new(corpus),
            verifier,
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState) -> Result<()> {
    let address = state.config.server.address();
    let app = router(state);

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
