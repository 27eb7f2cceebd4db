//! API route handlers.
//!
//! Every cached route follows the same shape: hand the route's fetch to its
//! [`CachedRoute`](sitepulse_cache::CachedRoute) and emit whatever bytes come
//! back as the JSON body.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use sitepulse_core::types::{ActivityResponse, BlogFeedItem, GithubFeedItem, MisskeyNoteItem};
use sitepulse_sources::{blog_items, github_items};

use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

fn json_body(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// GET /
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /feed/blog
pub async fn feed_blog(State(state): State<Arc<AppState>>) -> Result<Response> {
    let fetcher = state.clone();
    let body = state
        .caches
        .blog_feed
        .get_or_refresh(move || async move { fetcher.fetch_blog_feed().await })
        .await?;
    Ok(json_body(body))
}

/// GET /feed/github
pub async fn feed_github(State(state): State<Arc<AppState>>) -> Result<Response> {
    let fetcher = state.clone();
    let body = state
        .caches
        .github_feed
        .get_or_refresh(move || async move { fetcher.fetch_github_feed().await })
        .await?;
    Ok(json_body(body))
}

/// GET /feed/misskey
pub async fn feed_misskey(State(state): State<Arc<AppState>>) -> Result<Response> {
    let fetcher = state.clone();
    let body = state
        .caches
        .misskey_feed
        .get_or_refresh(move || async move { fetcher.fetch_misskey_feed().await })
        .await?;
    Ok(json_body(body))
}

/// GET /count/activity
pub async fn count_activity(State(state): State<Arc<AppState>>) -> Result<Response> {
    let fetcher = state.clone();
    let body = state
        .caches
        .activity
        .get_or_refresh(move || async move { fetcher.fetch_activity().await })
        .await?;
    Ok(json_body(body))
}

/// GET /like/github
pub async fn like_github(State(state): State<Arc<AppState>>) -> Result<Response> {
    let fetcher = state.clone();
    let body = state
        .caches
        .github_stars
        .get_or_refresh(move || async move { fetcher.fetch_github_stars().await })
        .await?;
    Ok(json_body(body))
}

impl AppState {
    /// Fresh blog items, bypassing the cache.
    pub async fn fetch_blog_feed(&self) -> Result<Vec<BlogFeedItem>> {
        let entries = self
            .feeds
            .fetch(&self.config.blog_feed_url)
            .await
            .map_err(|e| ApiError::upstream("Blog feed processing failed", e))?;

        Ok(blog_items(
            entries,
            self.config.feed_limit_blog,
            &self.config.blog_default_cover,
        ))
    }

    /// Fresh GitHub feed items, bypassing the cache.
    pub async fn fetch_github_feed(&self) -> Result<Vec<GithubFeedItem>> {
        let entries = self
            .feeds
            .fetch(&self.config.github_feed_url)
            .await
            .map_err(|e| ApiError::upstream("GitHub feed processing failed", e))?;

        Ok(github_items(entries, self.config.feed_limit_github))
    }

    /// Fresh Misskey notes, bypassing the cache.
    pub async fn fetch_misskey_feed(&self) -> Result<Vec<MisskeyNoteItem>> {
        self.misskey
            .recent_notes(self.config.feed_limit_misskey)
            .await
            .map_err(|e| ApiError::upstream("Misskey feed processing failed", e))
    }

    /// Fresh activity tallies, bypassing the cache.
    ///
    /// Both upstreams are queried concurrently; either failing fails the whole.
    pub async fn fetch_activity(&self) -> Result<ActivityResponse> {
        let days = self.config.count_days;

        let (github, misskey) = tokio::try_join!(
            async {
                self.github
                    .contribution_activity(days)
                    .await
                    .map_err(|e| ApiError::upstream("GitHub statistics failed", e))
            },
            async {
                self.misskey
                    .note_activity(days)
                    .await
                    .map_err(|e| ApiError::upstream("Misskey statistics failed", e))
            },
        )?;

        Ok(ActivityResponse {
            days,
            github,
            misskey,
        })
    }

    /// Fresh starred repository names, bypassing the cache.
    pub async fn fetch_github_stars(&self) -> Result<Vec<String>> {
        self.github
            .starred(self.config.like_limit_github)
            .await
            .map_err(|e| ApiError::upstream("GitHub stars request failed", e))
    }
}
