//! Error types for sitepulse.
//!
//! Upstream adapters report one of a handful of failure classes. The HTTP
//! layer collapses all of them into a single internal-error response, so the
//! variants exist for logs and tests rather than for clients.

use thiserror::Error;

/// Result type alias using `SitepulseError`.
pub type Result<T> = std::result::Result<T, SitepulseError>;

/// Main error type for all sitepulse operations.
#[derive(Debug, Error)]
pub enum SitepulseError {
    // ═══════════════════════════════════════════════════════════════════════════
    // UPSTREAM ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The outbound request could not be constructed.
    #[error("Request build failed: {0}")]
    RequestBuild(String),

    /// The request could not be sent or the body could not be read.
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream answered with a non-success status.
    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The upstream body was not the expected shape.
    #[error("Response parse failed: {0}")]
    ResponseParse(String),

    /// The feed document could not be parsed as Atom or RSS.
    #[error("Feed parse failed: {0}")]
    FeedParse(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // LOCAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Encoding a response payload failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SitepulseError {
    /// Returns true if this error came from talking to an upstream service.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            SitepulseError::RequestBuild(_)
                | SitepulseError::Network(_)
                | SitepulseError::UpstreamStatus { .. }
                | SitepulseError::ResponseParse(_)
                | SitepulseError::FeedParse(_)
        )
    }

    /// Returns true if this is a startup configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, SitepulseError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SitepulseError::UpstreamStatus {
            status: 502,
            body: "bad gateway".into(),
        };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn test_error_classification() {
        assert!(SitepulseError::Network("reset".into()).is_upstream());
        assert!(SitepulseError::FeedParse("eof".into()).is_upstream());
        assert!(!SitepulseError::Config("missing".into()).is_upstream());
        assert!(SitepulseError::Config("missing".into()).is_config());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("invalid");
        let result: Result<serde_json::Value> = json_result.map_err(SitepulseError::from);
        assert!(matches!(result, Err(SitepulseError::Serialization(_))));
    }
}
