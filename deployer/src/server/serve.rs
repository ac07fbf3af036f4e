//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::DeployerError;
use crate::server::handlers::{
    create_application_handler, create_project_handler, deploy_application_handler,
    deploy_handler, get_environment_handler, health_handler, list_applications_handler,
    root_handler, set_env_var_handler, status_handler,
};
use crate::server::state::ServerState;

/// Build the API router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Service
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        // Discrete steps
        .route("/api/projects", post(create_project_handler))
        .route("/api/projects/{uuid}/environment", get(get_environment_handler))
        .route(
            "/api/applications",
            get(list_applications_handler).post(create_application_handler),
        )
        .route("/api/applications/{uuid}/envs", post(set_env_var_handler))
        .route("/api/applications/{uuid}/deploy", post(deploy_application_handler))
        .route("/api/applications/{uuid}/status", get(status_handler))
        // Full flow
        .route("/api/deploy", post(deploy_handler))
        // State and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), DeployerError>>, DeployerError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DeployerError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| DeployerError::ServerError(e.to_string()))
    });

    Ok(handle)
}
