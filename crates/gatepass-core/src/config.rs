// ── Runtime connection configuration ──
//
// These types describe how to reach the backend and who is calling it.
// They carry the bearer token and tuning knobs, but never touch disk.
// The CLI builds a `ClientConfig` from a profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::lifecycle::DEFAULT_CODE_LENGTH;
use crate::model::UserContext;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for gatepass_api::TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Everything [`PassManager`](crate::PassManager) needs to talk to one backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., `https://community.example.com`).
    pub url: Url,
    /// Bearer token issued at sign-in.
    pub token: SecretString,
    /// The signed-in user. Scopes every request.
    pub user: UserContext,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Length of generated pass codes.
    pub code_length: usize,
    /// Countdown display cadence.
    pub tick_interval: Duration,
    /// How often expired passes are dropped from the local list.
    pub sweep_interval: Duration,
    /// How often to reconcile with the backend (seconds). 0 = never.
    pub refresh_interval_secs: u64,
}

impl ClientConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
    pub const DEFAULT_SWEEP: Duration = Duration::from_secs(30);
    pub const DEFAULT_REFRESH_SECS: u64 = 60;

    /// Config with default tuning for the given backend and user.
    pub fn new(url: Url, token: SecretString, user: UserContext) -> Self {
        Self {
            url,
            token,
            user,
            tls: TlsVerification::default(),
            timeout: Self::DEFAULT_TIMEOUT,
            code_length: DEFAULT_CODE_LENGTH,
            tick_interval: Self::DEFAULT_TICK,
            sweep_interval: Self::DEFAULT_SWEEP,
            refresh_interval_secs: Self::DEFAULT_REFRESH_SECS,
        }
    }

    pub(crate) fn transport(&self) -> gatepass_api::TransportConfig {
        gatepass_api::TransportConfig {
            tls: (&self.tls).into(),
            timeout: self.timeout,
        }
    }
}
