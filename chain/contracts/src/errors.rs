//! Contract-specific error types
//!
//! Error taxonomy for campaign, exchange, and registry operations. Every
//! variant maps to one [`ErrorKind`] via `kind()`.

use thiserror::Error;
use types::errors::ErrorKind;
use types::ids::{AssetId, OrderId, PoolId, SwapId, VaultId};
use types::order::Side;

/// Campaign ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CampaignError {
    #[error("Vault not found: {vault_id}")]
    VaultNotFound { vault_id: VaultId },

    #[error("Vault {vault_id} is not accepting contributions")]
    VaultInactive { vault_id: VaultId },

    #[error("Invalid proof: verification failed")]
    InvalidProof,

    #[error("Transferred amount must be positive")]
    ZeroAmount,

    #[error("Invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("Invalid transition from {from} on {trigger}")]
    InvalidTransition { from: String, trigger: String },

    #[error("Unauthorized: caller is not the campaign creator")]
    NotCreator,

    #[error("Unauthorized: caller has no recorded contribution")]
    NoContribution,

    #[error("Withdrawal locked until deadline {deadline}")]
    WithdrawalLocked { deadline: i64 },
}

impl CampaignError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CampaignError::VaultNotFound { .. } => ErrorKind::NotFound,
            CampaignError::VaultInactive { .. }
            | CampaignError::InvalidTransition { .. }
            | CampaignError::WithdrawalLocked { .. } => ErrorKind::InvalidState,
            CampaignError::InvalidProof => ErrorKind::InvalidProof,
            CampaignError::ZeroAmount | CampaignError::InvalidParameter { .. } => {
                ErrorKind::InvalidParameter
            }
            CampaignError::NotCreator | CampaignError::NoContribution => ErrorKind::Unauthorized,
        }
    }
}

/// Exchange errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Pool not found: {pool_id}")]
    PoolNotFound { pool_id: PoolId },

    #[error("No pool for pair {asset_a}/{asset_b}")]
    PairNotFound { asset_a: AssetId, asset_b: AssetId },

    #[error("Pool already exists for pair {asset_a}/{asset_b}")]
    PoolAlreadyExists { asset_a: AssetId, asset_b: AssetId },

    #[error("Pool {pool_id} is inactive")]
    PoolInactive { pool_id: PoolId },

    #[error("Invalid token pair: {token_in} -> {token_out}")]
    InvalidTokenPair { token_in: AssetId, token_out: AssetId },

    #[error("Invalid fee: {fee_bps} bps exceeds maximum {max_bps} bps")]
    InvalidFee { fee_bps: u32, max_bps: u32 },

    #[error("Invalid proof for {leg}")]
    InvalidProof { leg: &'static str },

    #[error("No liquidity position to remove from")]
    NoLiquidity,

    #[error("Order {order_id} not found in pool {pool_id}")]
    OrderNotFound { pool_id: PoolId, order_id: OrderId },

    #[error("Order {order_id} is no longer active")]
    OrderInactive { order_id: OrderId },

    #[error("Order {order_id} is not a {expected} order")]
    SideMismatch { order_id: OrderId, expected: Side },

    #[error("Self-trade prevention triggered")]
    SelfTrade,

    #[error("Unauthorized: caller does not own the order")]
    NotOrderOwner,

    #[error("Unauthorized: caller is not admin")]
    Unauthorized,

    #[error("Swap not found: {swap_id}")]
    SwapNotFound { swap_id: SwapId },
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::PoolNotFound { .. }
            | ExchangeError::PairNotFound { .. }
            | ExchangeError::OrderNotFound { .. }
            | ExchangeError::SwapNotFound { .. } => ErrorKind::NotFound,
            ExchangeError::PoolAlreadyExists { .. }
            | ExchangeError::PoolInactive { .. }
            | ExchangeError::NoLiquidity
            | ExchangeError::OrderInactive { .. } => ErrorKind::InvalidState,
            ExchangeError::InvalidTokenPair { .. }
            | ExchangeError::InvalidFee { .. }
            | ExchangeError::SideMismatch { .. } => ErrorKind::InvalidParameter,
            ExchangeError::InvalidProof { .. } => ErrorKind::InvalidProof,
            ExchangeError::SelfTrade
            | ExchangeError::NotOrderOwner
            | ExchangeError::Unauthorized => ErrorKind::Unauthorized,
        }
    }
}

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("No metadata for campaign {vault_id}")]
    UnknownCampaign { vault_id: VaultId },

    #[error("Unauthorized: caller may not edit this entry")]
    Unauthorized,

    #[error("Invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::UnknownCampaign { .. } => ErrorKind::NotFound,
            RegistryError::Unauthorized => ErrorKind::Unauthorized,
            RegistryError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
        }
    }
}

/// Errors surfaced by the ledger facade
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Campaign error: {0}")]
    Campaign(#[from] CampaignError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Reentrancy detected")]
    ReentrancyDetected,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Campaign(e) => e.kind(),
            LedgerError::Exchange(e) => e.kind(),
            LedgerError::Registry(e) => e.kind(),
            LedgerError::ReentrancyDetected => ErrorKind::ReentrancyDetected,
        }
    }
}
