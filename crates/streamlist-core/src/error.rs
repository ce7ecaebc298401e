// ── Core error types ──
//
// Page loads never fail: provider, enrichment and resolution failures are
// absorbed by the engine. `CoreError` covers construction-time problems only
// (bad endpoints, unbuildable clients, inconsistent configuration).

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Construction errors ──────────────────────────────────────────
    #[error("Invalid endpoint URL for {backend}: {reason}")]
    InvalidEndpoint {
        backend: &'static str,
        reason: String,
    },

    #[error("TLS setup failed: {message}")]
    Tls { message: String },

    #[error("Authentication setup failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Plan errors ──────────────────────────────────────────────────
    #[error("Provider plan must contain at least one entry")]
    EmptyPlan,

    #[error("No provider configured for {listing}")]
    NoProvider { listing: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Store errors ─────────────────────────────────────────────────
    #[error("Local store error: {message}")]
    Store { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<streamlist_api::Error> for CoreError {
    fn from(err: streamlist_api::Error) -> Self {
        match err {
            streamlist_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            streamlist_api::Error::MissingToken { backend } => CoreError::AuthenticationFailed {
                message: format!("no token configured for {backend}"),
            },
            streamlist_api::Error::InvalidUrl(e) => CoreError::InvalidEndpoint {
                backend: "unknown",
                reason: e.to_string(),
            },
            streamlist_api::Error::Tls(message) => CoreError::Tls { message },
            streamlist_api::Error::Rest { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            other => CoreError::Api {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<crate::store::StoreError> for CoreError {
    fn from(err: crate::store::StoreError) -> Self {
        CoreError::Store {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_status_survives_conversion() {
        let err: CoreError = streamlist_api::Error::Rest {
            status: 503,
            message: "unavailable".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Api { status: Some(503), .. }));
    }

    #[test]
    fn missing_token_is_auth_failure() {
        let err: CoreError = streamlist_api::Error::MissingToken { backend: "rest" }.into();
        assert!(err.to_string().contains("rest"));
    }
}
