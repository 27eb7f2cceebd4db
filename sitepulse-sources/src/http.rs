//! Shared HTTP plumbing.

use std::time::Duration;

use serde::de::DeserializeOwned;

use sitepulse_core::constants::USER_AGENT;
use sitepulse_core::error::{Result, SitepulseError};

pub(crate) fn build_client(timeout_seconds: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to create HTTP client")
}

pub(crate) fn request_error(err: reqwest::Error) -> SitepulseError {
    if err.is_builder() {
        SitepulseError::RequestBuild(err.to_string())
    } else {
        SitepulseError::Network(err.to_string())
    }
}

/// Sends the request and rejects non-success statuses.
pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = request.send().await.map_err(request_error)?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(SitepulseError::UpstreamStatus { status, body });
    }

    Ok(response)
}

pub(crate) async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let bytes = send(request)
        .await?
        .bytes()
        .await
        .map_err(request_error)?;

    serde_json::from_slice(&bytes).map_err(|e| SitepulseError::ResponseParse(e.to_string()))
}
