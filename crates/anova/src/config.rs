//! CLI configuration: a thin layer over `anova_config`.
//!
//! Adds the `GlobalOpts` overrides (`--token`, `--endpoint`, `--device`)
//! and the interactive token prompt on top of the shared resolution.

use std::io::IsTerminal;

use secrecy::{ExposeSecret, SecretString};

use anova_core::{Session, SessionConfig, TemperatureUnit};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use anova_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Everything a device command needs, resolved from flags and config.
pub struct Resolved {
    pub profile_name: String,
    pub session: SessionConfig,
    /// `--device`, else the profile's default device.
    pub device: Option<String>,
    /// Display unit: profile, else `[defaults]`.
    pub unit: TemperatureUnit,
    profile: Profile,
}

impl Resolved {
    /// Build a session, asking for the token on a terminal when none is configured.
    pub fn open_session(&self, global: &GlobalOpts) -> Result<Session, CliError> {
        let token = resolve_token(global, &self.profile, &self.profile_name)?;
        Ok(Session::authenticate(
            token.expose_secret(),
            self.session.clone(),
        )?)
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Apply profile values, then CLI flag overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if global.profile.is_some() && !cfg.profiles.contains_key(&profile_name) {
        return Err(profile_not_found(&cfg, profile_name));
    }
    let profile = cfg.profile_or_default(&profile_name);

    let mut session = anova_config::profile_to_session_config(&profile)?;
    if let Some(ref endpoint) = global.endpoint {
        session.endpoint = anova_config::parse_endpoint(endpoint)?;
    }

    Ok(Resolved {
        device: global.device.clone().or_else(|| profile.device.clone()),
        unit: profile.unit.unwrap_or(cfg.defaults.unit),
        profile_name,
        session,
        profile,
    })
}

/// `--token` / `ANOVA_TOKEN`, then the profile chain, then a hidden prompt.
fn resolve_token(
    global: &GlobalOpts,
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, CliError> {
    if let Some(ref token) = global.token {
        return Ok(SecretString::from(token.clone()));
    }

    match anova_config::resolve_token(profile, profile_name) {
        Ok(token) => Ok(token),
        Err(anova_config::ConfigError::NoCredentials { .. }) if std::io::stdin().is_terminal() => {
            prompt_token()
        }
        Err(e) => Err(e.into()),
    }
}

/// Read a token without echo; rejects empty input.
pub fn prompt_token() -> Result<SecretString, CliError> {
    let token = rpassword::prompt_password("Personal access token: ")?;
    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(SecretString::from(token.to_owned()))
}

pub fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let available: Vec<_> = cfg.profiles.keys().cloned().collect();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}
