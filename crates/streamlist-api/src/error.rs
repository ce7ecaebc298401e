use thiserror::Error;

/// Top-level error type for the `streamlist-api` crate.
///
/// Covers every failure mode across the three backends: authentication,
/// transport, REST, typed query-graph, legacy query-graph, and decoding.
/// `streamlist-core` collapses all of these into a single provider failure.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token rejected by the backend (expired, revoked, wrong scope).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The operation needs an access token and none is configured.
    #[error("No access token configured for the {backend} backend")]
    MissingToken { backend: &'static str },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Rate limited by the backend. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── REST API ────────────────────────────────────────────────────
    /// Structured error from the REST API.
    #[error("REST API error (HTTP {status}): {message}")]
    Rest { status: u16, message: String },

    // ── Query-graph APIs ────────────────────────────────────────────
    /// `errors` array returned by the typed query-graph API.
    #[error("Graph API error: {}", .messages.join("; "))]
    Graph { messages: Vec<String> },

    /// Error reported by the legacy query-graph API.
    #[error("Legacy API error: {message}")]
    Legacy { message: String },

    /// A lookup asked for more ids than one request accepts.
    #[error("Too many ids in one lookup: {count} (max {max})")]
    TooManyIds { count: usize, max: usize },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the token has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error.
    ///
    /// Informational only: the core never retries, it falls through
    /// to the next configured backend.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Rest { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Build a `Deserialization` error with a short body preview.
    pub(crate) fn decode(err: &serde_json::Error, body: String) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_joins_messages() {
        let err = Error::Graph {
            messages: vec!["service timeout".into(), "partial failure".into()],
        };
        assert_eq!(
            err.to_string(),
            "Graph API error: service timeout; partial failure"
        );
    }

    #[test]
    fn rest_404_is_not_found() {
        let err = Error::Rest {
            status: 404,
            message: "Not Found".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }

    #[test]
    fn decode_preview_is_bounded() {
        let body = "x".repeat(1000);
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let Error::Deserialization { message, body } = Error::decode(&json_err, body) else {
            panic!("expected deserialization error");
        };
        assert!(message.len() < 300);
        assert_eq!(body.len(), 1000);
    }
}
