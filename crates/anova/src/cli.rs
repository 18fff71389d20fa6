//! Clap derive structures for the `anova` CLI.
//!
//! Also compiled by `build.rs` for man pages, so this file depends on
//! nothing beyond clap and clap_complete.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// anova -- drive Anova precision cookers and ovens from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "anova",
    version,
    about = "Control Anova precision cookers and ovens from the terminal",
    long_about = "Connects to the Anova cloud with a personal access token, discovers the\n\
        cookers and ovens on the account, and opens an interactive menu to start\n\
        and stop cooks, watch device messages, and export telemetry.\n\n\
        Running without a subcommand starts the interactive menu.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "ANOVA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Personal access token (overrides the profile)
    #[arg(long, env = "ANOVA_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Device gateway URL, ws:// or wss:// (overrides the profile)
    #[arg(long, env = "ANOVA_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Device id or name (overrides the profile)
    #[arg(long, short = 'd', global = true)]
    pub device: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ANOVA_OUTPUT",
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
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive device menu (default)
    #[command(alias = "i")]
    Interactive,

    /// List the cookers and ovens on the account
    #[command(alias = "ls")]
    Devices,

    /// Request a telemetry export and print the download links
    Export(ExportArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EXPORT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// First day to export (YYYY-MM-DD, at most 90 days ago)
    #[arg(long)]
    pub start: String,

    /// Last day to export (YYYY-MM-DD, at most 14 days after start)
    #[arg(long)]
    pub end: String,
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
    /// Create or update a profile with guided setup
    Init,

    /// Display the current configuration (secrets masked)
    Show,

    /// Store a personal access token in the system keyring
    SetToken,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
