//! Configuration for the anova CLI.
//!
//! TOML profiles, token resolution (env + keyring + plaintext), and
//! translation to `anova_core::SessionConfig`. The CLI layers its
//! `GlobalOpts` overrides on top of what this crate resolves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use anova_core::{SessionConfig, TemperatureUnit};

/// Keyring service name; entries are keyed `{profile}/token`.
pub const KEYRING_SERVICE: &str = "anova";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use, honoring an explicit override.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// The named profile, or an empty one when it isn't configured.
    pub fn profile_or_default(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Display unit for temperatures.
    #[serde(default)]
    pub unit: TemperatureUnit,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            unit: TemperatureUnit::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A named account profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Gateway URL override (defaults to the public Anova gateway).
    pub endpoint: Option<String>,

    /// Personal access token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable holding the token.
    pub token_env: Option<String>,

    /// Device id or name to select without prompting.
    pub device: Option<String>,

    /// Display unit override.
    pub unit: Option<TemperatureUnit>,

    /// Seconds to wait for a command reply.
    pub command_timeout: Option<u64>,

    /// Seconds to wait for a telemetry export reply.
    pub export_timeout: Option<u64>,

    /// Seconds to wait for device lists during discovery.
    pub discovery_timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "anova", "anova").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("anova");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing files are fine) with `ANOVA_*` overrides,
/// e.g. `ANOVA_DEFAULTS__UNIT=F`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ANOVA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution (without CLI flags) ────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/token"),
    )?)
}

/// Resolve the token from the credential chain (no CLI flag step).
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store `token` in the system keyring for `profile_name`.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── SessionConfig translation ───────────────────────────────────────

/// Build a `SessionConfig` from a profile. Unset fields keep the
/// session defaults.
pub fn profile_to_session_config(profile: &Profile) -> Result<SessionConfig, ConfigError> {
    let mut config = SessionConfig::default();

    if let Some(ref endpoint) = profile.endpoint {
        config.endpoint = parse_endpoint(endpoint)?;
    }
    if let Some(secs) = profile.command_timeout {
        config.command_timeout = positive_secs("command_timeout", secs)?;
    }
    if let Some(secs) = profile.export_timeout {
        config.export_timeout = positive_secs("export_timeout", secs)?;
    }
    if let Some(secs) = profile.discovery_timeout {
        config.discovery_timeout = positive_secs("discovery_timeout", secs)?;
    }
    Ok(config)
}

/// Parse a gateway URL; only `ws://` and `wss://` are accepted.
pub fn parse_endpoint(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "endpoint".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("expected a ws:// or wss:// URL, got '{other}://'"),
        }),
    }
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
