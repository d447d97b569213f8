// ── Core error types ──
//
// Errors surfaced by gatepass-core. Callers never see HTTP status codes
// or JSON parse failures directly; the `From<gatepass_api::Error>` impl
// folds transport failures into domain variants.

use thiserror::Error;

use crate::lifecycle::QrError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    #[error("Pass manager is not connected")]
    NotConnected,

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Visitor pass not found: {identifier}")]
    PassNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation} (requires {required})")]
    Unsupported { operation: String, required: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Could not render QR code: {0}")]
    Qr(#[from] QrError),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Network or backend failure the user may simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::Qr(_)
        ) || matches!(self, Self::Api { status: Some(s), .. } if *s >= 500 || *s == 429)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gatepass_api::Error> for CoreError {
    fn from(err: gatepass_api::Error) -> Self {
        match err {
            gatepass_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            gatepass_api::Error::Forbidden { message } => CoreError::Forbidden { message },
            gatepass_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            gatepass_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            gatepass_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            gatepass_api::Error::Api { status: 404, message } => {
                CoreError::PassNotFound { identifier: message }
            }
            gatepass_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            gatepass_api::Error::MissingPass { message } => CoreError::Api {
                message: message.unwrap_or_else(|| "Backend did not return a pass".into()),
                status: None,
            },
            gatepass_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
