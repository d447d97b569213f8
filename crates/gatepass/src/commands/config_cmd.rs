//! Config subcommand handlers.

use dialoguer::{Input, Select};

use gatepass_core::Role;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some(MASK.into());
        }
    }
    cfg
}

fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# failed to format config: {e}"))
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_token() -> Result<String, CliError> {
    let token = rpassword::prompt_password("Bearer token: ").map_err(prompt_err)?;
    let token = token.trim().to_owned();
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token)
}

/// Keyring or plaintext. Returns the token when it belongs in the file.
fn store_token_choice(profile_name: &str, token: String) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the token?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        gatepass_config::store_token(profile_name, &token)?;
        eprintln!("   ✓ token stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(token))
    }
}

fn optional(input: String) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

const ROLES: [Role; 4] = [Role::Resident, Role::Watchman, Role::Admin, Role::SuperAdmin];

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = output::render_single(global.output, &cfg, format_config, |c| {
                c.active_profile_name(None)
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config()?;
            let name = cfg.active_profile_name(profile.as_deref().or(global.profile.as_deref()));
            let token = prompt_token()?;
            gatepass_config::store_token(&name, &token)?;
            eprintln!("✓ Token stored in system keyring for profile '{name}'");
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    // Existing profiles are kept, so a file that does not parse stops here.
    let mut cfg = config::load_config()?;
    eprintln!("gatepass configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Backend URL")
        .validate_with(|s: &String| {
            gatepass_config::parse_server(s)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let labels: Vec<String> = ROLES.iter().map(ToString::to_string).collect();
    let role_idx = Select::new()
        .with_prompt("Role")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let role = ROLES.get(role_idx).copied().unwrap_or_default();

    let user_id: String = Input::new()
        .with_prompt("User id (optional)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let building_id: String = Input::new()
        .with_prompt("Building id (optional)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let token = store_token_choice(&profile_name, prompt_token()?)?;

    let profile = Profile {
        server: server.trim().to_owned(),
        token,
        role,
        user_id: optional(user_id),
        building_id: optional(building_id),
        ..Profile::default()
    };

    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    let written = config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", written.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Try it: gatepass pass list");
    Ok(())
}
