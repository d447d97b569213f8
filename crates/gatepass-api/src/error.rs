use thiserror::Error;

/// Top-level error type for the `gatepass-api` crate.
///
/// Covers every failure mode of the REST surface: authentication,
/// transport, backend-reported errors, and response decoding.
/// `gatepass-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token rejected (missing, expired, or revoked).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Authenticated, but the role is not allowed to perform the call.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-success HTTP status with the backend's message, if any.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Pass creation answered 2xx but the body carried no `pass` object.
    #[error("Backend did not return a pass{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    MissingPass { message: Option<String> },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the token has expired
    /// and signing in again might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            status: 503,
            message: "maintenance".into(),
        };
        assert!(err.is_transient());
        assert!(!err.is_not_found());
    }

    #[test]
    fn missing_pass_message_is_optional() {
        let bare = Error::MissingPass { message: None };
        assert_eq!(bare.to_string(), "Backend did not return a pass");

        let with_msg = Error::MissingPass {
            message: Some("quota reached".into()),
        };
        assert_eq!(
            with_msg.to_string(),
            "Backend did not return a pass: quota reached"
        );
    }
}
