//! Contract configuration
//!
//! Plain structs with conservative defaults. Hosts that want different bounds
//! load them from JSON with [`LedgerConfig::from_json_str`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Bounds enforced when registering a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Minimum title length in characters.
    pub min_title_len: usize,
    /// Maximum title length in characters.
    pub max_title_len: usize,
    /// Maximum description length in characters.
    pub max_description_len: usize,
    /// Shortest allowed time between launch and deadline.
    pub min_duration_secs: i64,
    /// Longest allowed time between launch and deadline.
    pub max_duration_secs: i64,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            min_title_len: 1,
            max_title_len: 100,
            max_description_len: 2000,
            min_duration_secs: 3600,
            max_duration_secs: 365 * 86400,
        }
    }
}

/// Bounds enforced by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Highest pool fee in basis points.
    pub max_fee_bps: u32,
    /// Upper bound (exclusive) of the encrypted slippage range proof, in basis points.
    pub max_slippage_bps: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_fee_bps: 1000,
            max_slippage_bps: 5000,
        }
    }
}

/// Top-level configuration for the ledger facade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub campaign: CampaignConfig,
    pub exchange: ExchangeConfig,
}

impl LedgerConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inverted or empty bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.campaign;
        if c.min_title_len == 0 || c.min_title_len > c.max_title_len {
            return Err(ConfigError::Invalid {
                field: "campaign.min_title_len",
                reason: format!("must be in 1..={}", c.max_title_len),
            });
        }
        if c.min_duration_secs <= 0 || c.min_duration_secs > c.max_duration_secs {
            return Err(ConfigError::Invalid {
                field: "campaign.min_duration_secs",
                reason: format!("must be in 1..={}", c.max_duration_secs),
            });
        }
        if self.exchange.max_fee_bps > 10_000 {
            return Err(ConfigError::Invalid {
                field: "exchange.max_fee_bps",
                reason: "cannot exceed 10000".to_string(),
            });
        }
        if self.exchange.max_slippage_bps == 0 {
            return Err(ConfigError::Invalid {
                field: "exchange.max_slippage_bps",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
