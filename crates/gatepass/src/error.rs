//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use gatepass_config::ConfigError;
use gatepass_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(gatepass::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             For a self-signed development server, try --insecure (-k)."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(gatepass::auth_failed),
        help(
            "Your token may have expired. Sign in again and store the new token:\n\
             gatepass config set-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No token configured for profile '{profile}'")]
    #[diagnostic(
        code(gatepass::no_token),
        help(
            "Store one with: gatepass config set-token --profile {profile}\n\
             Or set the GATEPASS_TOKEN environment variable."
        )
    )]
    NoToken { profile: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(gatepass::forbidden),
        help("Your role may not allow this operation.")
    )]
    Forbidden { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(gatepass::not_found),
        help("Run: gatepass {list_command} to see available {resource_type}es")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Pass {code} was rejected: {message}")]
    #[diagnostic(
        code(gatepass::pass_rejected),
        help("Do not admit the visitor. Ask the resident to issue a new pass.")
    )]
    PassRejected { code: String, message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(gatepass::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Unsupported ──────────────────────────────────────────────────
    #[error("Operation '{operation}' is not available to your role")]
    #[diagnostic(
        code(gatepass::unsupported),
        help("This command requires {required}. Check the role in your profile.")
    )]
    Unsupported { operation: String, required: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gatepass::validation))]
    Validation { field: String, reason: String },

    #[error("Could not render QR code: {message}")]
    #[diagnostic(
        code(gatepass::qr),
        help("Try a shorter visitor name; the pass was not created.")
    )]
    Qr { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(gatepass::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: gatepass config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(gatepass::no_config),
        help(
            "Create a profile with: gatepass config init\n\
             Or pass --server / set GATEPASS_SERVER.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(gatepass::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(gatepass::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(gatepass::timeout),
        help("Increase the timeout with --timeout or check the server.")
    )]
    Timeout,

    #[error("Internal error: {0}")]
    #[diagnostic(code(gatepass::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoToken { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::PassRejected { .. } => exit_code::REJECTED,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            Self::Unsupported { .. } | Self::Forbidden { .. } => exit_code::PERMISSION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoToken { profile } => CliError::NoToken { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Forbidden { message } => CliError::Forbidden { message },

            CoreError::NotConnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                source: "Pass manager is not connected".into(),
            },

            CoreError::Timeout { .. } => CliError::Timeout,

            CoreError::PassNotFound { identifier } => CliError::NotFound {
                resource_type: "pass".into(),
                identifier,
                list_command: "pass list".into(),
            },

            CoreError::Unsupported {
                operation,
                required,
            } => CliError::Unsupported {
                operation,
                required,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Qr(e) => CliError::Qr {
                message: e.to_string(),
            },

            CoreError::Api { message, status } => CliError::ApiError { status, message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
