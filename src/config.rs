//! Claimer configuration loader and runtime defaults.

use crate::error::{ClaimerError, ClaimerResult};
use crate::logic::CommissionRate;
use crate::networks::{NetworkName, DEFAULT_COMMISSION_ADDRESS};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config filename in the working directory
pub const DEFAULT_CONFIG_FILENAME: &str = "config.toml";

/// Environment variable overriding the config path
pub const CONFIG_ENV_VAR: &str = "ZRO_CLAIMER_CONFIG";

/// Where the commission recipient comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionMode {
    /// Fixed, well-known address
    #[default]
    Default,
    /// Assigned per account by the remote routing service
    Server,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClaimerConfig {
    pub threads: usize,
    pub max_retries: u32,
    pub commission_mode: CommissionMode,
    pub commission_bps: u32,
    pub commission_address: Address,
    pub commission_server_url: Option<String>,
    pub min_sleep_time: f64,
    pub max_sleep_time: f64,
    pub eth_price_usd: u64,
    pub paths: PathsConfig,
    pub endpoints: EndpointsConfig,
    pub timing: TimingConfig,
    /// Per-network RPC overrides keyed by network name
    pub rpc: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub accounts: PathBuf,
    pub eligibilities: PathBuf,
    pub claimed: PathBuf,
    pub paid_commission: PathBuf,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub airdrop_api: String,
    pub gas_api: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub balance_poll_secs: u64,
    pub receipt_timeout_secs: u64,
}

impl Default for ClaimerConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            max_retries: 3,
            commission_mode: CommissionMode::Default,
            commission_bps: CommissionRate::default().bps(),
            commission_address: DEFAULT_COMMISSION_ADDRESS,
            commission_server_url: None,
            min_sleep_time: 10.0,
            max_sleep_time: 30.0,
            eth_price_usd: 3500,
            paths: PathsConfig::default(),
            endpoints: EndpointsConfig::default(),
            timing: TimingConfig::default(),
            rpc: HashMap::new(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            accounts: PathBuf::from("accounts.json"),
            eligibilities: PathBuf::from("eligibilities.json"),
            claimed: PathBuf::from("claimed.json"),
            paid_commission: PathBuf::from("paid_commission.json"),
            log_file: Some(PathBuf::from("logs/zro_claimer.log")),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            airdrop_api: "https://www.layerzero.foundation".to_string(),
            gas_api: "https://gas-api.metaswap.codefi.network".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            balance_poll_secs: 10,
            receipt_timeout_secs: 300,
        }
    }
}

impl ClaimerConfig {
    /// Reject settings the dispatch loop or workflow cannot honour
    pub fn validate(&self) -> ClaimerResult<()> {
        if self.threads == 0 {
            return Err(ClaimerError::ConfigError(
                "threads must be at least 1".to_string(),
            ));
        }

        if self.min_sleep_time < 0.0 || self.max_sleep_time < 0.0 {
            return Err(ClaimerError::ConfigError(
                "sleep times cannot be negative".to_string(),
            ));
        }

        if self.min_sleep_time > self.max_sleep_time {
            return Err(ClaimerError::ConfigError(format!(
                "min_sleep_time ({}) exceeds max_sleep_time ({})",
                self.min_sleep_time, self.max_sleep_time
            )));
        }

        if self.commission_bps > 10_000 {
            return Err(ClaimerError::ConfigError(format!(
                "commission_bps cannot exceed 10000, got {}",
                self.commission_bps
            )));
        }

        if self.commission_mode == CommissionMode::Server
            && self.commission_server_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ClaimerError::ConfigError(
                "commission_mode = \"server\" requires commission_server_url".to_string(),
            ));
        }

        if self.timing.balance_poll_secs == 0 {
            return Err(ClaimerError::ConfigError(
                "timing.balance_poll_secs must be positive".to_string(),
            ));
        }

        if self.timing.receipt_timeout_secs == 0 {
            return Err(ClaimerError::ConfigError(
                "timing.receipt_timeout_secs must be positive".to_string(),
            ));
        }

        self.rpc_overrides().map(|_| ())
    }

    pub fn commission_rate(&self) -> CommissionRate {
        CommissionRate::from_bps(self.commission_bps)
    }

    pub fn balance_poll_interval(&self) -> Duration {
        Duration::from_secs(self.timing.balance_poll_secs)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.timing.receipt_timeout_secs)
    }

    /// RPC overrides with their keys resolved to networks
    pub fn rpc_overrides(&self) -> ClaimerResult<HashMap<NetworkName, String>> {
        self.rpc
            .iter()
            .map(|(key, url)| {
                NetworkName::ALL
                    .iter()
                    .find(|name| name.as_str().eq_ignore_ascii_case(key))
                    .map(|name| (*name, url.clone()))
                    .ok_or_else(|| {
                        ClaimerError::ConfigError(format!("Unknown network in [rpc]: '{}'", key))
                    })
            })
            .collect()
    }
}

/// Config path from the environment, or the default filename
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME))
}

/// Load the config from `path`, falling back to defaults if the default file is absent
pub fn load_config(path: Option<&Path>) -> ClaimerResult<ClaimerConfig> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

    if !config_path.exists() {
        if path.is_some() {
            return Err(ClaimerError::ConfigError(format!(
                "Configuration file not found: {}",
                config_path.display()
            )));
        }
        let config = ClaimerConfig::default();
        config.validate()?;
        return Ok(config);
    }

    load_config_strict(&config_path)
}

/// Load and validate the config at `path`; the file must exist
pub fn load_config_strict(path: &Path) -> ClaimerResult<ClaimerConfig> {
    if !path.exists() {
        return Err(ClaimerError::ConfigError(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path).map_err(|e| ClaimerError::ConfigLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let config: ClaimerConfig = toml::from_str(&raw).map_err(|e| ClaimerError::ConfigLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ClaimerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.commission_rate().bps(), 300);
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
threads = 4
max_retries = 5
commission_mode = "server"
commission_server_url = "http://router.local:25673"
min_sleep_time = 1.5
max_sleep_time = 3.0

[paths]
accounts = "wallets.json"

[timing]
balance_poll_secs = 2

[rpc]
arbitrum = "https://arb.example"
"#,
        );

        let config = load_config_strict(file.path()).unwrap();
        assert_eq!(config.threads, 4);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.commission_mode, CommissionMode::Server);
        assert_eq!(config.paths.accounts, PathBuf::from("wallets.json"));
        assert_eq!(config.paths.claimed, PathBuf::from("claimed.json"));
        assert_eq!(config.balance_poll_interval(), Duration::from_secs(2));
        assert_eq!(config.receipt_timeout(), Duration::from_secs(300));

        let overrides = config.rpc_overrides().unwrap();
        assert_eq!(overrides.get(&NetworkName::Arbitrum).map(String::as_str), Some("https://arb.example"));
    }

    #[test]
    fn test_server_mode_requires_url() {
        let file = write_config("commission_mode = \"server\"\n");
        let err = load_config_strict(file.path()).unwrap_err();
        assert!(err.to_string().contains("commission_server_url"));
    }

    #[test]
    fn test_rejects_inverted_sleep_range() {
        let file = write_config("min_sleep_time = 5.0\nmax_sleep_time = 1.0\n");
        assert!(load_config_strict(file.path()).is_err());
    }

    #[test]
    fn test_rejects_zero_threads() {
        let file = write_config("threads = 0\n");
        assert!(load_config_strict(file.path()).is_err());
    }

    #[test]
    fn test_rejects_zero_balance_poll_interval() {
        let file = write_config("[timing]\nbalance_poll_secs = 0\n");
        let err = load_config_strict(file.path()).unwrap_err();
        assert!(err.to_string().contains("balance_poll_secs"));
    }

    #[test]
    fn test_rejects_unknown_rpc_network() {
        let file = write_config("[rpc]\nSolana = \"https://sol.example\"\n");
        assert!(load_config_strict(file.path()).is_err());
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let result = load_config(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }
}
