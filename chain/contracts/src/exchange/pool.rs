//! Confidential liquidity pool

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::handle::EncryptedHandle;
use types::ids::{AccountId, AssetId, PoolId};

use super::order_book::OrderBook;

/// Which reserve a swap draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// asset_a in, asset_b out
    AToB,
    /// asset_b in, asset_a out
    BToA,
}

/// Sort a pair so `(x, y)` and `(y, x)` map to the same key.
pub fn canonical_pair(x: AssetId, y: AssetId) -> (AssetId, AssetId) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

#[derive(Debug, Clone)]
pub struct Pool {
    pub(crate) pool_id: PoolId,
    /// Canonical (sorted) pair
    pub(crate) asset_a: AssetId,
    pub(crate) asset_b: AssetId,
    pub(crate) reserve_a: EncryptedHandle,
    pub(crate) reserve_b: EncryptedHandle,
    pub(crate) total_liquidity: EncryptedHandle,
    pub(crate) shares: HashMap<AccountId, EncryptedHandle>,
    /// Advertised fee rate. `execute_swap` does not deduct it.
    pub(crate) fee_bps: u32,
    pub(crate) active: bool,
    pub(crate) creator: AccountId,
    pub(crate) created_at: i64,
    pub(crate) book: OrderBook,
}

impl Pool {
    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    pub fn pair(&self) -> (&AssetId, &AssetId) {
        (&self.asset_a, &self.asset_b)
    }

    pub fn reserves(&self) -> (EncryptedHandle, EncryptedHandle) {
        (self.reserve_a, self.reserve_b)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Provider share, `NULL` if the provider has no open position.
    pub fn share_of(&self, provider: &AccountId) -> EncryptedHandle {
        self.shares
            .get(provider)
            .copied()
            .unwrap_or(EncryptedHandle::NULL)
    }

    /// Resolve a caller-supplied direction against the canonical pair.
    pub fn direction(&self, token_in: &AssetId, token_out: &AssetId) -> Option<Direction> {
        if *token_in == self.asset_a && *token_out == self.asset_b {
            Some(Direction::AToB)
        } else if *token_in == self.asset_b && *token_out == self.asset_a {
            Some(Direction::BToA)
        } else {
            None
        }
    }

    pub fn info(&self) -> PoolInfo {
        PoolInfo {
            pool_id: self.pool_id,
            asset_a: self.asset_a.clone(),
            asset_b: self.asset_b.clone(),
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            total_liquidity: self.total_liquidity,
            fee_bps: self.fee_bps,
            active: self.active,
            creator: self.creator,
            created_at: self.created_at,
            provider_count: self.shares.len(),
            order_count: self.book.len(),
        }
    }
}

/// Read-only pool snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub pool_id: PoolId,
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub reserve_a: EncryptedHandle,
    pub reserve_b: EncryptedHandle,
    pub total_liquidity: EncryptedHandle,
    pub fee_bps: u32,
    pub active: bool,
    pub creator: AccountId,
    pub created_at: i64,
    pub provider_count: usize,
    pub order_count: usize,
}
