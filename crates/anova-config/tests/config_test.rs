#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::ExposeSecret;

use anova_config::{
    Config, ConfigError, Profile, load_config_from, parse_endpoint, profile_to_session_config,
    resolve_token, save_config_to,
};
use anova_core::{SessionConfig, TemperatureUnit};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("config.toml")).unwrap();

    assert_eq!(config.default_profile.as_deref(), Some("default"));
    assert_eq!(config.defaults.output, "table");
    assert_eq!(config.defaults.unit, TemperatureUnit::Celsius);
    assert!(config.profiles.is_empty());
}

#[test]
fn test_profiles_parse_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_profile = "kitchen"

[defaults]
unit = "F"

[profiles.kitchen]
token_env = "KITCHEN_TOKEN"
device = "Kitchen Oven"
unit = "celsius"
command_timeout = 20
"#,
    )
    .unwrap();

    let config = load_config_from(&path).unwrap();

    assert_eq!(config.active_profile_name(None), "kitchen");
    assert_eq!(config.active_profile_name(Some("other")), "other");
    assert_eq!(config.defaults.unit, TemperatureUnit::Fahrenheit);
    let profile = &config.profiles["kitchen"];
    assert_eq!(profile.token_env.as_deref(), Some("KITCHEN_TOKEN"));
    assert_eq!(profile.device.as_deref(), Some("Kitchen Oven"));
    assert_eq!(profile.unit, Some(TemperatureUnit::Celsius));
    assert_eq!(profile.command_timeout, Some(20));
}

#[test]
fn test_save_then_load_preserves_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.profiles.insert(
        "default".into(),
        Profile {
            endpoint: Some("wss://gateway.test".into()),
            device: Some("c1".into()),
            unit: Some(TemperatureUnit::Fahrenheit),
            ..Profile::default()
        },
    );
    save_config_to(&path, &config).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[profiles.default]"));
    assert!(!written.contains("token"));

    assert_eq!(load_config_from(&path).unwrap(), config);
}

#[test]
fn test_profile_overrides_session_defaults() {
    let profile = Profile {
        endpoint: Some("ws://127.0.0.1:9000".into()),
        command_timeout: Some(3),
        export_timeout: Some(60),
        ..Profile::default()
    };

    let config = profile_to_session_config(&profile).unwrap();

    assert_eq!(config.endpoint.as_str(), "ws://127.0.0.1:9000/");
    assert_eq!(config.command_timeout, Duration::from_secs(3));
    assert_eq!(config.export_timeout, Duration::from_secs(60));
    assert_eq!(
        config.discovery_timeout,
        SessionConfig::default().discovery_timeout
    );
}

#[test]
fn test_invalid_profile_values_are_rejected() {
    let bad_scheme = Profile {
        endpoint: Some("https://devices.anovaculinary.io".into()),
        ..Profile::default()
    };
    assert!(matches!(
        profile_to_session_config(&bad_scheme),
        Err(ConfigError::Validation { .. })
    ));

    let zero_timeout = Profile {
        export_timeout: Some(0),
        ..Profile::default()
    };
    assert!(matches!(
        profile_to_session_config(&zero_timeout),
        Err(ConfigError::Validation { .. })
    ));

    assert!(parse_endpoint("not a url").is_err());
    assert!(parse_endpoint("wss://devices.anovaculinary.io").is_ok());
}

#[test]
fn test_plaintext_token_is_last_resort() {
    let profile = Profile {
        token: Some("anova-plaintext".into()),
        ..Profile::default()
    };
    let token = resolve_token(&profile, "anova-config-test-plaintext").unwrap();
    assert_eq!(token.expose_secret(), "anova-plaintext");
}

#[test]
fn test_missing_token_is_reported_per_profile() {
    let result = resolve_token(&Profile::default(), "anova-config-test-empty");
    assert!(matches!(
        result,
        Err(ConfigError::NoCredentials { ref profile }) if profile == "anova-config-test-empty"
    ));
}
