//! # Sitepulse API Server
//!
//! HTTP API behind the personal site: feeds, activity counts and starred
//! repositories, each served from its own time-boxed cache.
//!
//! ## Endpoints
//!
//! - `GET /` - Health check
//! - `GET /feed/blog` - Latest blog posts (cached 12h)
//! - `GET /feed/github` - GitHub public activity (cached 1h)
//! - `GET /feed/misskey` - Latest Misskey notes (cache TTL configurable)
//! - `GET /count/activity` - Daily GitHub + Misskey activity (cached 12h)
//! - `GET /like/github` - Starred repositories (cached 1h)
//!
//! ## Example
//!
//! ```rust,ignore
//! use sitepulse_api::{ApiServer, ApiConfig};
//!
//! let config = ApiConfig::from_env()?;
//! let listen = config.listen.clone();
//! ApiServer::new(config).run(&listen).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{normalize_listen, ApiConfig, AppState, RouteCaches};

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server for sitepulse.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server with the given configuration.
    pub fn new(config: ApiConfig) -> Self {
        Self::with_state(AppState::new(config))
    }

    /// Creates a server around prepared state.
    pub fn with_state(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address.
    pub async fn run(self, listen: &str) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(listen).await?;

        info!("Sitepulse API server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let server = ApiServer::new(ApiConfig::default());

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "https://candinya.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let server = ApiServer::new(ApiConfig::default());

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/feed/blog")
                    .header(header::ORIGIN, "https://example.org")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    }
}
