//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use secrecy::ExposeSecret;

use anova_core::{Session, SessionConfig, TemperatureUnit};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::prompt_err;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with plaintext tokens masked.
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
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "unit = \"{}\"", cfg.defaults.unit);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref endpoint) = p.endpoint {
            let _ = writeln!(out, "endpoint = \"{endpoint}\"");
        }
        if let Some(ref token) = p.token {
            let _ = writeln!(out, "token = \"{token}\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(ref device) = p.device {
            let _ = writeln!(out, "device = \"{device}\"");
        }
        if let Some(unit) = p.unit {
            let _ = writeln!(out, "unit = \"{unit}\"");
        }
        for (key, value) in [
            ("command_timeout", p.command_timeout),
            ("export_timeout", p.export_timeout),
            ("discovery_timeout", p.discovery_timeout),
        ] {
            if let Some(secs) = value {
                let _ = writeln!(out, "{key} = {secs}");
            }
        }
    }

    out
}

/// Reject tokens without the `anova-` prefix before they are stored.
fn check_token_format(token: &str) -> Result<(), CliError> {
    Session::authenticate(token, SessionConfig::default())?;
    Ok(())
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let token = match global.token {
                Some(ref token) => secrecy::SecretString::from(token.clone()),
                None => config::prompt_token()?,
            };
            check_token_format(token.expose_secret())?;
            anova_config::store_token(&profile_name, token.expose_secret())?;
            eprintln!("✓ Token for profile '{profile_name}' stored in the system keyring");
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(config::profile_not_found(&cfg, name));
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}

/// Guided setup: writes (or replaces) one profile and makes it the default.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("anova configuration");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let token = config::prompt_token()?;
    check_token_format(token.expose_secret())?;

    let storage = Select::new()
        .with_prompt("Where to store the token?")
        .items(&[
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
        ])
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let plaintext = if storage == 0 {
        anova_config::store_token(&profile_name, token.expose_secret())?;
        eprintln!("   ✓ Token stored in system keyring");
        None
    } else {
        Some(token.expose_secret().to_owned())
    };

    let device: String = Input::new()
        .with_prompt("Default device id or name (blank to choose each time)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let units = [TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit];
    let unit = Select::new()
        .with_prompt("Temperature unit")
        .items(&["Celsius", "Fahrenheit"])
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            token: plaintext,
            device: optional(&device),
            unit: units.get(unit).copied(),
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());
    let path = config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: anova devices");
    Ok(())
}
