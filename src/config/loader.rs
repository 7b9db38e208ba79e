use super::Config;
use crate::guard::request::parse_address;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Overrides `guard.api_key` when set
pub const API_KEY_VAR: &str = "ALTURA_API_KEY";
/// Overrides `guard.api_base` when set
pub const API_BASE_VAR: &str = "NEXT_PUBLIC_ALTURA_API";

/// Longest accepted poll deadline, liveness interval or request timeout
pub const MAX_DURATION_SECS: u64 = 86_400;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    finish(config)
}

/// Built-in defaults plus environment, for running without a config file
pub fn load_default() -> Result<Config> {
    finish(Config::default())
}

fn finish(config: Config) -> Result<Config> {
    let config = substitute_env_vars(config)?;
    validate_config(&config)?;
    Ok(config)
}

fn substitute_env_vars(mut config: Config) -> Result<Config> {
    config.guard.api_base = expand(&config.guard.api_base)
        .with_context(|| "Failed to resolve guard.api_base")?;

    if let Some(key) = &config.guard.api_key {
        config.guard.api_key = Some(expand(key).with_context(|| "Failed to resolve guard.api_key")?);
    }

    config.api.tokens = config
        .api
        .tokens
        .iter()
        .map(|t| expand(t))
        .collect::<Result<Vec<_>>>()
        .with_context(|| "Failed to resolve api.tokens")?;

    if let Ok(base) = std::env::var(API_BASE_VAR) {
        config.guard.api_base = base;
    }
    if let Ok(key) = std::env::var(API_KEY_VAR) {
        config.guard.api_key = Some(key);
    }

    Ok(config)
}

/// Replace a whole-value `${VAR}` placeholder with the variable's value
fn expand(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        return std::env::var(var_name)
            .with_context(|| format!("Environment variable {} is not set", var_name));
    }
    Ok(value.to_string())
}

fn validate_config(config: &Config) -> Result<()> {
    if config.guard.api_base.trim().is_empty() {
        anyhow::bail!("guard.api_base must be specified");
    }

    if config.guard.request_timeout_secs == 0 {
        anyhow::bail!("guard.request_timeout_secs must be greater than zero");
    }
    if config.guard.request_timeout_secs > MAX_DURATION_SECS {
        anyhow::bail!(
            "guard.request_timeout_secs must not exceed {}",
            MAX_DURATION_SECS
        );
    }

    let poll = &config.poll;
    if poll.initial_interval_ms == 0 || poll.max_interval_ms == 0 {
        anyhow::bail!("poll intervals must be greater than zero");
    }
    if poll.max_interval_ms > MAX_DURATION_SECS * 1000 {
        anyhow::bail!(
            "poll.max_interval_ms must not exceed {}",
            MAX_DURATION_SECS * 1000
        );
    }
    if poll.max_interval_ms < poll.initial_interval_ms {
        anyhow::bail!("poll.max_interval_ms must not be below poll.initial_interval_ms");
    }
    if !(poll.multiplier >= 1.0 && poll.multiplier.is_finite()) {
        anyhow::bail!("poll.multiplier must be at least 1.0");
    }
    if !(0.0..=1.0).contains(&poll.jitter) {
        anyhow::bail!("poll.jitter must be between 0 and 1");
    }
    if poll.deadline_secs == 0 || poll.deadline_secs > MAX_DURATION_SECS {
        anyhow::bail!(
            "poll.deadline_secs must be between 1 and {}",
            MAX_DURATION_SECS
        );
    }

    let liveness = config.session.liveness_interval_secs;
    if liveness == 0 || liveness > MAX_DURATION_SECS {
        anyhow::bail!(
            "session.liveness_interval_secs must be between 1 and {}",
            MAX_DURATION_SECS
        );
    }

    parse_address(&config.demo.recipient).context("Invalid demo.recipient")?;
    parse_address(&config.demo.token_contract).context("Invalid demo.token_contract")?;

    let valid_formats = ["pretty", "compact", "json"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        anyhow::bail!("Invalid logging format: {}", config.logging.format);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_minimal_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "guard:\n  api_base: http://localhost:4000\npoll:\n  initial_interval_ms: 500\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.poll.initial_interval_ms, 500);
        assert_eq!(config.poll.deadline_secs, 600);
        assert_eq!(config.session.liveness_interval_secs, 5);
        assert_eq!(config.demo.chain_id, 97);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_placeholder_substitution() {
        std::env::set_var("GUARDRELAY_TEST_RELAY_TOKEN", "secret-token");
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "api:\n  tokens:\n    - ${GUARDRELAY_TEST_RELAY_TOKEN}\n    - plain\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.api.tokens, vec!["secret-token", "plain"]);
    }

    #[test]
    fn test_missing_placeholder_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "api:\n  tokens:\n    - ${GUARDRELAY_TEST_DEFINITELY_UNSET}\n",
        )
        .unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_poll_settings() {
        let mut config = Config::default();
        config.poll.multiplier = 0.5;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.poll.jitter = 1.5;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.poll.max_interval_ms = 1;
        assert!(validate_config(&config).is_err());

        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validation_bounds_durations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, format!("poll:\n  deadline_secs: {}\n", u64::MAX)).unwrap();
        assert!(load_config(&path).is_err());

        let mut config = Config::default();
        config.poll.deadline_secs = MAX_DURATION_SECS;
        assert!(validate_config(&config).is_ok());
        config.poll.deadline_secs = MAX_DURATION_SECS + 1;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.session.liveness_interval_secs = u64::MAX;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.guard.request_timeout_secs = u64::MAX;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_demo_addresses() {
        let mut config = Config::default();
        config.demo.token_contract = "0x1234".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.demo.recipient = "not an address".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_large_approve_amount_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "demo:\n  approve_amount: \"20000000000000000000\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.demo.approve_amount > alloy_primitives::U256::from(u64::MAX));
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "poll: [not, a, map").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
