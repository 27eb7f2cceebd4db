//! API route configuration.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(handlers::health_check))

        // Feeds
        .route("/feed/blog", get(handlers::feed_blog))
        .route("/feed/github", get(handlers::feed_github))
        .route("/feed/misskey", get(handlers::feed_misskey))

        // Activity counts (both paths share one cache)
        .route("/count/activity", get(handlers::count_activity))
        .route("/count/social-activity", get(handlers::count_activity))

        // Likes
        .route("/like/github", get(handlers::like_github))

        .with_state(state)
}
