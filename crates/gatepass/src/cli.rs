//! Clap derive structures for the `gatepass` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gatepass -- visitor passes for residential communities
#[derive(Debug, Parser)]
#[command(
    name = "gatepass",
    version,
    about = "Create, watch, and verify visitor passes from the command line",
    long_about = "Residents issue short-lived visitor passes (a code plus a QR symbol,\n\
        valid for 30 minutes); watchmen and admins verify them at the gate.\n\n\
        The backend is the authority on validity. Countdowns shown here are\n\
        computed locally from each pass's absolute expiry.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "GATEPASS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, env = "GATEPASS_SERVER", global = true)]
    pub server: Option<String>,

    /// Bearer token (overrides keyring and profile)
    #[arg(long, env = "GATEPASS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Role of the signed-in user (overrides profile)
    #[arg(long, env = "GATEPASS_ROLE", global = true)]
    pub role: Option<RoleArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GATEPASS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "GATEPASS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "GATEPASS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Resident,
    Admin,
    SuperAdmin,
    Watchman,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, list, cancel, and watch visitor passes
    #[command(alias = "passes")]
    Pass(PassArgs),

    /// Verify a visitor's code at the gate (watchman / admin)
    Verify(VerifyArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PASSES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PassArgs {
    #[command(subcommand)]
    pub command: PassCommand,
}

#[derive(Debug, Subcommand)]
pub enum PassCommand {
    /// Generate a pass valid for 30 minutes and register it
    #[command(alias = "new")]
    Create {
        /// Visitor name (defaults to "Visitor")
        #[arg(long, short = 'n')]
        name: Option<String>,

        /// Write the QR symbol to a file (.png or .svg)
        #[arg(long)]
        qr_out: Option<PathBuf>,

        /// Draw the QR symbol in the terminal
        #[arg(long)]
        show_qr: bool,
    },

    /// List active passes
    #[command(alias = "ls")]
    List,

    /// Cancel a pass by id or code
    #[command(alias = "rm")]
    Cancel {
        /// Pass id or access code
        id: String,
    },

    /// Live countdown until expiry (all active passes if no id is given)
    Watch {
        /// Pass id or access code
        id: Option<String>,
    },

    /// Render a pass's QR symbol
    Qr {
        /// Pass id or access code
        id: String,

        /// Write to a file (.png or .svg) instead of the terminal
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VERIFY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Access code as read from the visitor (case and dashes ignored)
    pub code: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a profile with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Store a bearer token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
