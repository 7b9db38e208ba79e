pub mod auth;
pub mod error;
pub mod response;
pub mod routes;

use crate::core::GuardService;
use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router as AxumRouter};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use auth::AuthManager;
pub use error::ApiError;
pub use response::*;

/// Local HTTP relay in front of the wallet actions
pub struct RelayServer {
    service: GuardService,
    auth_manager: AuthManager,
    host: String,
    port: u16,
    api_path: String,
}

impl RelayServer {
    pub fn new(service: GuardService, host: String, port: u16, tokens: Vec<String>) -> Self {
        Self {
            service,
            auth_manager: AuthManager::new(tokens),
            host,
            port,
            api_path: "/api".to_string(),
        }
    }

    /// Build Axum router with all endpoints
    pub fn build_routes(&self) -> AxumRouter {
        // Public endpoints (no auth required)
        let public_routes = AxumRouter::new().route("/health", get(health_handler));

        let api_routes = AxumRouter::new()
            .route(
                &format!("{}/guard", self.api_path),
                post(routes::guard_action),
            )
            .route(
                &format!("{}/sendRequest", self.api_path),
                get(routes::send_request),
            )
            .route(
                &format!("{}/session", self.api_path),
                get(routes::session_status),
            )
            .with_state(self.service.clone())
            .layer(axum::middleware::from_fn_with_state(
                self.auth_manager.clone(),
                AuthManager::auth_middleware,
            ));

        // The demo page is served from another origin
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        AxumRouter::new()
            .merge(public_routes)
            .merge(api_routes)
            .layer(cors)
            .layer(axum::middleware::from_fn(logging_middleware))
    }

    /// Serve until `shutdown` fires
    pub async fn start(&self, shutdown: CancellationToken) -> Result<()> {
        let app = self.build_routes();
        let addr = format!("{}:{}", self.host, self.port);

        info!(
            "Starting relay on {} (Health: /health, API: {}/guard, auth: {})",
            addr,
            self.api_path,
            if self.auth_manager.is_enabled() {
                "bearer"
            } else {
                "off"
            }
        );

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .context("Failed to bind server")?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("Server error")?;

        Ok(())
    }
}

/// Health check handler
async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service: "guardrelay".to_string(),
        }),
    )
}

/// Logging middleware
async fn logging_middleware(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = uuid::Uuid::new_v4();

    let response = next.run(request).await;

    let status = response.status();
    tracing::info!(%request_id, "{} {} -> {}", method, uri, status);

    response
}
