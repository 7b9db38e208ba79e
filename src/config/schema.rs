use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Altura Guard API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds between liveness checks while connected
    #[serde(default = "default_liveness_interval_secs")]
    pub liveness_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            liveness_interval_secs: default_liveness_interval_secs(),
        }
    }
}

/// Parameters of the three demo actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default = "default_recipient")]
    pub recipient: String,
    /// Native amount in wei
    #[serde(
        default = "default_transfer_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub transfer_amount: U256,
    #[serde(default = "default_token_contract")]
    pub token_contract: String,
    /// Token amount in the token's smallest unit
    #[serde(
        default = "default_approve_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub approve_amount: U256,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            message: default_message(),
            recipient: default_recipient(),
            transfer_amount: default_transfer_amount(),
            token_contract: default_token_contract(),
            approve_amount: default_approve_amount(),
        }
    }
}

/// Local relay server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer tokens accepted on `/api/*`; empty leaves the relay open
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            host: default_host(),
            port: default_port(),
            tokens: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default functions
fn default_api_base() -> String {
    "https://api.alturanft.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_initial_interval_ms() -> u64 {
    10_000
}

fn default_max_interval_ms() -> u64 {
    30_000
}

fn default_multiplier() -> f64 {
    1.5
}

fn default_jitter() -> f64 {
    0.1
}

fn default_deadline_secs() -> u64 {
    600
}

fn default_liveness_interval_secs() -> u64 {
    5
}

fn default_chain_id() -> u64 {
    97
}

fn default_message() -> String {
    "Altura Guard II Sign Message Demo".to_string()
}

fn default_recipient() -> String {
    "0x0000000000000000000000000000000000000000".to_string()
}

fn default_transfer_amount() -> U256 {
    U256::from(10_000_000_000_000_000u64)
}

fn default_token_contract() -> String {
    "0x78867BbEeF44f2326bF8DDd1941a4439382EF2A7".to_string()
}

fn default_approve_amount() -> U256 {
    U256::from(100_000_000_000_000_000u64)
}

fn default_api_enabled() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Amounts up to `u64::MAX` may be plain YAML integers; larger ones must be
/// quoted decimal (or `0x` hex) strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(u64),
    Text(String),
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    match RawAmount::deserialize(deserializer)? {
        RawAmount::Int(value) => Ok(U256::from(value)),
        RawAmount::Text(text) => U256::from_str(text.trim()).map_err(|e| {
            serde::de::Error::custom(format!("invalid amount {:?}: {}", text, e))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_amounts_accept_integers_and_strings() {
        let demo: DemoConfig = serde_yaml::from_str(
            "transfer_amount: 5\napprove_amount: \"20000000000000000000\"\n",
        )
        .unwrap();
        assert_eq!(demo.transfer_amount, U256::from(5));
        assert_eq!(
            demo.approve_amount,
            U256::from(20u64) * U256::from(1_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_demo_amount_defaults() {
        let demo: DemoConfig = serde_yaml::from_str("chain_id: 56").unwrap();
        assert_eq!(demo.transfer_amount, U256::from(10_000_000_000_000_000u64));
        assert_eq!(demo.approve_amount, U256::from(100_000_000_000_000_000u64));
    }

    #[test]
    fn test_demo_amount_rejects_garbage() {
        assert!(serde_yaml::from_str::<DemoConfig>("approve_amount: \"lots\"").is_err());
        assert!(serde_yaml::from_str::<DemoConfig>("approve_amount: -1").is_err());
    }
}
