//! Service configuration with TOML file support.
//!
//! ```toml
//! data_dir = "./data"
//! log_format = "json"
//!
//! [verification]
//! amount = "0.001"
//! timeout_minutes = 60
//!
//! [ledger]
//! endpoint = "http://127.0.0.1:8080"
//!
//! [discord]
//! guild_id = "1100000000000000000"
//! admin_user_id = "1100000000000000009"
//!
//! [[roles.collections]]
//! collection_id = 123
//! role_id = "1100000000000000001"
//! name = "Rare NFT Holder"
//! ```
//!
//! The Discord bot token is never read from this file; the daemon takes it
//! from the command line or the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use unqgate_roles::RoleRules;
use unqgate_types::TokenAmount;
use unqgate_verification::VerificationConfig;

use crate::NodeError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub verification: VerificationSection,

    #[serde(default)]
    pub ledger: LedgerSection,

    #[serde(default)]
    pub discord: DiscordSection,

    #[serde(default)]
    pub roles: RoleRules,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationSection {
    /// Amount asked for when `verify` is not given one.
    #[serde(default = "default_amount")]
    pub amount: TokenAmount,

    #[serde(default = "default_max_amount")]
    pub max_amount: TokenAmount,

    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,

    /// Recent blocks scanned per poll.
    #[serde(default = "default_scan_window")]
    pub scan_window: u64,

    /// How often expired attempts are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_ledger_call_timeout_secs")]
    pub ledger_call_timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSection {
    /// Base URL of the Substrate sidecar.
    #[serde(default = "default_ledger_endpoint")]
    pub endpoint: String,

    /// Indexer base URL for NFT inventory lookups. Defaults to `endpoint`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_endpoint: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// SS58 network prefix addresses must carry.
    #[serde(default = "default_ss58_prefix")]
    pub ss58_prefix: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscordSection {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Guild whose members are verified and granted roles.
    #[serde(default)]
    pub guild_id: String,

    /// The only user allowed to run admin commands. Without it admin
    /// commands are refused for everyone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_user_id: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// ── Defaults ───────────────────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_amount() -> TokenAmount {
    VerificationConfig::default().amount
}

fn default_max_amount() -> TokenAmount {
    VerificationConfig::default().max_amount
}

fn default_timeout_minutes() -> u64 {
    60
}

fn default_scan_window() -> u64 {
    50
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_ledger_call_timeout_secs() -> u64 {
    15
}

fn default_ledger_endpoint() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_ss58_prefix() -> u16 {
    unqgate_crypto::UNIQUE_PREFIX
}

fn default_api_base() -> String {
    unqgate_groups::DEFAULT_API_BASE.to_string()
}

impl Default for VerificationSection {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            max_amount: default_max_amount(),
            timeout_minutes: default_timeout_minutes(),
            scan_window: default_scan_window(),
            sweep_interval_secs: default_sweep_interval_secs(),
            ledger_call_timeout_secs: default_ledger_call_timeout_secs(),
        }
    }
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            endpoint: default_ledger_endpoint(),
            inventory_endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            ss58_prefix: default_ss58_prefix(),
        }
    }
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            guild_id: String::new(),
            admin_user_id: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            verification: VerificationSection::default(),
            ledger: LedgerSection::default(),
            discord: DiscordSection::default(),
            roles: RoleRules::default(),
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        let v = &self.verification;
        if v.amount.is_zero() {
            return Err(NodeError::Config("verification.amount must be positive".into()));
        }
        if v.amount > v.max_amount {
            return Err(NodeError::Config(format!(
                "verification.amount {} exceeds max_amount {}",
                v.amount, v.max_amount
            )));
        }
        if v.timeout_minutes == 0 || v.scan_window == 0 || v.sweep_interval_secs == 0 {
            return Err(NodeError::Config(
                "timeout_minutes, scan_window and sweep_interval_secs must be non-zero".into(),
            ));
        }
        // A zero timeout fails every ledger call that does not resolve on first poll.
        if v.ledger_call_timeout_secs == 0 {
            return Err(NodeError::Config(
                "verification.ledger_call_timeout_secs must be non-zero".into(),
            ));
        }
        if self.discord.guild_id.trim().is_empty() {
            return Err(NodeError::Config("discord.guild_id must be set".into()));
        }
        self.roles.validate()?;
        Ok(())
    }

    pub fn verification_config(&self) -> VerificationConfig {
        let v = &self.verification;
        VerificationConfig {
            amount: v.amount,
            max_amount: v.max_amount,
            timeout_secs: v.timeout_minutes.saturating_mul(60),
            scan_window: v.scan_window,
            ledger_call_timeout: Duration::from_secs(v.ledger_call_timeout_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.verification.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_guild() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.discord.guild_id = "42".into();
        config
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = with_guild();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.verification.amount, config.verification.amount);
        assert_eq!(parsed.ledger.ss58_prefix, 7391);
        assert_eq!(parsed.discord.api_base, config.discord.api_base);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("[discord]\nguild_id = \"42\"")
            .expect("a guild is all a config needs");
        assert_eq!(config.log_format, "human");
        assert_eq!(config.verification.amount.to_string(), "0.001");
        assert_eq!(config.verification.scan_window, 50);
        assert!(config.discord.admin_user_id.is_none());
        assert!(config.roles.is_empty());

        let vc = config.verification_config();
        assert_eq!(vc.timeout_secs, 3600);
        assert_eq!(vc.ledger_call_timeout, Duration::from_secs(15));
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_level = "debug"

            [verification]
            amount = "0.002"
            timeout_minutes = 10

            [discord]
            guild_id = "42"
            admin_user_id = "7"

            [[roles.quantity_tiers]]
            min_count = 5
            role_id = "900"
            name = "Collector"
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.verification.amount.to_string(), "0.002");
        assert_eq!(config.verification_config().timeout_secs, 600);
        assert_eq!(config.verification.scan_window, 50);
        assert_eq!(config.discord.admin_user_id.as_deref(), Some("7"));
        assert_eq!(config.roles.quantity_tiers.len(), 1);
    }

    #[test]
    fn amount_above_max_is_rejected() {
        let toml = r#"
            [verification]
            amount = "2"
            max_amount = "1"

            [discord]
            guild_id = "42"
        "#;
        assert!(matches!(NodeConfig::from_toml_str(toml), Err(NodeError::Config(_))));
    }

    #[test]
    fn duplicate_role_rules_are_rejected() {
        let toml = r#"
            [discord]
            guild_id = "42"

            [[roles.collections]]
            collection_id = 1
            role_id = "10"
            name = "A"

            [[roles.collections]]
            collection_id = 1
            role_id = "11"
            name = "B"
        "#;
        assert!(matches!(NodeConfig::from_toml_str(toml), Err(NodeError::Role(_))));
    }

    #[test]
    fn missing_guild_is_rejected() {
        assert!(matches!(NodeConfig::from_toml_str(""), Err(NodeError::Config(_))));
        let mut config = with_guild();
        config.discord.guild_id = "  ".into();
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));
        assert!(with_guild().validate().is_ok());
    }

    #[test]
    fn zero_ledger_call_timeout_is_rejected() {
        let toml = r#"
            [verification]
            ledger_call_timeout_secs = 0

            [discord]
            guild_id = "42"
        "#;
        assert!(matches!(NodeConfig::from_toml_str(toml), Err(NodeError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/unqgate.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
