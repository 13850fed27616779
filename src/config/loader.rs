//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ConfigWarning, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A validated configuration plus the misconfigurations the gate will
/// enforce fail-closed.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GateConfig,
    pub warnings: Vec<ConfigWarning>,
}

/// Load configuration: defaults, then the TOML file (if any), then process
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GateConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    let warnings = validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(LoadedConfig { config, warnings })
}

/// Parse a TOML document into a configuration.
pub fn parse_config(content: &str) -> Result<GateConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay `GATE_*` variables obtained through `lookup` onto `config`.
pub fn apply_env_overrides<F>(config: &mut GateConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup("GATE_BIND_ADDRESS") {
        config.listener.bind_address = addr.trim().to_string();
    }

    override_bool(&lookup, "GATE_REQUIRE_API_KEY", &mut config.auth.require_api_key);
    if let Some(key) = lookup("GATE_API_KEY") {
        config.auth.api_key = key.trim().to_string();
    }

    override_bool(&lookup, "GATE_RATE_LIMIT_ENABLED", &mut config.rate_limit.enabled);
    override_f64(&lookup, "GATE_RATE_LIMIT_RPS", &mut config.rate_limit.requests_per_second);
    override_f64(&lookup, "GATE_RATE_LIMIT_BURST", &mut config.rate_limit.burst_size);

    if let Some(origins) = lookup("GATE_CORS_ALLOW_ORIGINS") {
        config.cors.allow_origins = parse_csv(&origins);
    }
    override_bool(&lookup, "GATE_CORS_ALLOW_CREDENTIALS", &mut config.cors.allow_credentials);
}

/// Split a comma separated list, dropping blank entries.
pub fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interpret common spellings of a boolean flag.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn override_bool<F>(lookup: &F, key: &str, target: &mut bool)
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else { return };
    match parse_bool(&raw) {
        Some(value) => *target = value,
        None => tracing::warn!(variable = key, keeping = *target, "Unrecognised boolean value"),
    }
}

// An unparseable number becomes NaN so the limiter refuses traffic
// instead of running with a value nobody configured.
fn override_f64<F>(lookup: &F, key: &str, target: &mut f64)
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else { return };
    *target = match raw.trim().parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            tracing::error!(variable = key, "Unparseable numeric value, rate limiter will fail closed");
            f64::NAN
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = parse_config(
            r#"
            [auth]
            api_key = "from-file"

            [rate_limit]
            requests_per_second = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.api_key, "from-file");
        assert!(config.auth.require_api_key);
        assert_eq!(config.rate_limit.requests_per_second, 0.5);
        assert_eq!(config.rate_limit.burst_size, 5.0);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(parse_config("[auth"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut config = GateConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("GATE_REQUIRE_API_KEY", "off"),
                ("GATE_API_KEY", "  expected  "),
                ("GATE_RATE_LIMIT_ENABLED", "YES"),
                ("GATE_RATE_LIMIT_RPS", "100"),
                ("GATE_RATE_LIMIT_BURST", "1"),
                ("GATE_CORS_ALLOW_ORIGINS", " https://a.example ,https://b.example,  ,"),
            ]),
        );

        assert!(!config.auth.require_api_key);
        assert_eq!(config.auth.api_key, "expected");
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.requests_per_second, 100.0);
        assert_eq!(config.rate_limit.burst_size, 1.0);
        assert_eq!(
            config.cors.allow_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn unparseable_rate_becomes_nan() {
        let mut config = GateConfig::default();
        apply_env_overrides(&mut config, env(&[("GATE_RATE_LIMIT_RPS", "not-a-number")]));
        assert!(config.rate_limit.requests_per_second.is_nan());
        assert!(!config.rate_limit.is_well_formed());
    }

    #[test]
    fn unrecognised_bool_keeps_default() {
        let mut config = GateConfig::default();
        apply_env_overrides(&mut config, env(&[("GATE_REQUIRE_API_KEY", "maybe")]));
        assert!(config.auth.require_api_key);
    }

    #[test]
    fn parse_bool_spellings() {
        for raw in ["1", "true", "Yes", " ON "] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "FALSE", "no", "off"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_csv_empty() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv(" , ,").is_empty());
    }
}
