//! Murmur HTTP API
//!
//! HTTP layer for Murmur, built with Axum.
//!
//! # Endpoints
//!
//! ## Presence
//! - `GET /api/v1/presence` - Connections currently in the room
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Chat connection
//!
//! # Example
//!
//! ```rust,ignore
//! use murmur::api::{serve, ApiConfig, AppState};
//! use murmur::chat::HubConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::default();
//!     let state = AppState::new(config.clone(), HubConfig::default());
//!     serve(state, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> ApiResult<Router> {
    let cors = cors_layer(&state.config)?;

    let api_routes = Router::new().route("/presence", get(routes::presence::list_presence));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Ok(Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state))
}

/// CORS policy from the configured origins; permissive when none are set
fn cors_layer(config: &ApiConfig) -> ApiResult<CorsLayer> {
    if config.cors_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Config(format!("Invalid CORS origin {:?}: {}", origin, e)))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state)?;

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Murmur listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Server(e.to_string()))?;

    tracing::info!("Murmur shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install signal handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ConnectionId, HubConfig};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, Arc<crate::chat::ChatHub>) {
        let state = AppState::new(ApiConfig::default(), HubConfig::default());
        let hub = Arc::clone(&state.hub);
        (build_router(state).unwrap(), hub)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _hub) = create_test_app();
        let (status, _) = get_json(app, "/health/live").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, hub) = create_test_app();
        let (tx, _rx) = mpsc::unbounded_channel();
        hub.connect(ConnectionId::from("a"), tx).await.unwrap();

        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["connections"], 1);
        assert_eq!(body["pending_handshakes"], 1);
    }

    #[tokio::test]
    async fn test_presence_listing() {
        let (app, hub) = create_test_app();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        hub.connect(ConnectionId::from("a"), tx_a).await.unwrap();
        hub.connect(ConnectionId::from("b"), tx_b).await.unwrap();

        let (status, body) = get_json(app, "/api/v1/presence").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["users"], serde_json::json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let (app, _hub) = create_test_app();
        let (status, _) = get_json(app, "/ws").await;
        assert!(status.is_client_error());
    }

    #[test]
    fn test_invalid_cors_origin() {
        let config = ApiConfig {
            cors_origins: vec!["bad\norigin".to_string()],
            ..ApiConfig::default()
        };
        let state = AppState::new(config, HubConfig::default());
        assert!(matches!(build_router(state), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_configured_cors_origins() {
        let config = ApiConfig {
            cors_origins: vec!["http://localhost:3000".to_string()],
            ..ApiConfig::default()
        };
        assert!(cors_layer(&config).is_ok());
    }
}
