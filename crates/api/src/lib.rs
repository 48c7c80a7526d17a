//! `api` crate — HTTP request façade over the operation engine.
//!
//! Routes:
//!   POST /api/v1/operations          — start a new operation
//!   GET  /api/v1/operations/latest   — status of the newest operation
//!   GET  /api/v1/operations/{id}     — status by id

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use engine::OperationProcessor;
use store::OperationStore;

pub mod handlers;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OperationStore>,
    pub processor: Arc<OperationProcessor>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/operations", post(handlers::operations::start))
        .route(
            "/api/v1/operations/latest",
            get(handlers::operations::check_latest),
        )
        .route("/api/v1/operations/:id", get(handlers::operations::check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the shutdown future resolves.
pub async fn serve(
    bind: &str,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("API server listening on {bind}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
