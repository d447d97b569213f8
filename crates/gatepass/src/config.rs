//! CLI configuration: a thin layer over `gatepass_config` that applies
//! `GlobalOpts` overrides (`--server`, `--token`, `--role`, ...).

use secrecy::SecretString;

use gatepass_core::{ClientConfig, Role};

use crate::cli::{GlobalOpts, RoleArg};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use gatepass_config::{
    Config, Profile, config_path, load_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Resident => Self::Resident,
            RoleArg::Admin => Self::Admin,
            RoleArg::SuperAdmin => Self::SuperAdmin,
            RoleArg::Watchman => Self::Watchman,
        }
    }
}

/// Comma-separated profile names for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Build a `ClientConfig` from the config file, the active profile, and
/// CLI overrides. Flags win over the profile.
///
/// A config file that fails to parse is an error, not an empty config.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => Profile::default(),
    };

    // 1. Server (flag > env > profile)
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if profile.server.is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }

    // 2. Role and TLS
    if let Some(role) = global.role {
        profile.role = role.into();
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    // 3. Token (flag > token_env > keyring > plaintext)
    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => gatepass_config::resolve_token(&profile, &profile_name)?,
    };

    let client = gatepass_config::profile_to_client_config(&profile, &cfg.defaults, token)?;
    tracing::debug!(
        profile = %profile_name,
        server = %client.url,
        role = %client.user.role,
        timeout = ?client.timeout,
        tls = ?client.tls,
        "resolved client config"
    );
    Ok(client)
}
