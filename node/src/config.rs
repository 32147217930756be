//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use rebase_types::params::DEFAULT_GLOBAL_RATE;
use rebase_types::{AccountId, DomainId, LedgerParams, Rate};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a rebase node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Account that administers every domain's ledger.
    #[serde(default = "default_admin")]
    pub admin: String,

    /// Starting global rate for new ledgers, in 1e-18 per second.
    /// TOML integers are 64-bit, which covers any sensible rate.
    #[serde(default = "default_global_rate")]
    pub initial_global_rate: u64,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    // Tables last: TOML requires plain keys before them.
    /// Domains hosted by this node. Every domain trusts every other one.
    #[serde(default = "default_domains")]
    pub domains: Vec<DomainConfig>,

    #[serde(default)]
    pub relay: RelayConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub id: u64,
    pub name: String,
}

/// Bridge message delivery between hosted domains.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Delivery attempts per message before it is dead-lettered.
    #[serde(default = "default_max_attempts")]
    pub max_delivery_attempts: u32,

    /// Pause between retry rounds, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Shuffle each batch of queued messages before delivery.
    #[serde(default)]
    pub reorder: bool,

    /// Seed for the shuffle; a fixed seed makes delivery order reproducible.
    #[serde(default)]
    pub reorder_seed: Option<u64>,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_admin() -> String {
    "acct_admin".to_string()
}

fn default_global_rate() -> u64 {
    DEFAULT_GLOBAL_RATE.raw() as u64
}

fn default_domains() -> Vec<DomainConfig> {
    vec![
        DomainConfig {
            id: 1,
            name: "home".to_string(),
        },
        DomainConfig {
            id: 2,
            name: "remote".to_string(),
        },
    ]
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    50
}

fn default_channel_capacity() -> usize {
    1024
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.admin_account()?;
        if self.domains.is_empty() {
            return Err(NodeError::Config("at least one domain is required".into()));
        }
        let mut seen = BTreeSet::new();
        for domain in &self.domains {
            if !seen.insert(domain.id) {
                return Err(NodeError::Config(format!(
                    "domain id {} configured twice",
                    domain.id
                )));
            }
        }
        if self.relay.max_delivery_attempts == 0 {
            return Err(NodeError::Config(
                "relay.max_delivery_attempts must be at least 1".into(),
            ));
        }
        if self.relay.channel_capacity == 0 {
            return Err(NodeError::Config(
                "relay.channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn admin_account(&self) -> Result<AccountId, NodeError> {
        AccountId::parse(&self.admin).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn ledger_params(&self) -> LedgerParams {
        LedgerParams {
            initial_global_rate: Rate::new(u128::from(self.initial_global_rate)),
        }
    }

    pub fn domain_ids(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.domains.iter().map(|d| DomainId::new(d.id))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            initial_global_rate: default_global_rate(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            domains: default_domains(),
            relay: RelayConfig::default(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_delivery_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            reorder: false,
            reorder_seed: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}
