//! Executed swap records
//!
//! Append-only. The settlement handle is `compare(amount_out, min_amount_out)`;
//! only the decryption oracle can tell whether the bound held.

use serde::{Deserialize, Serialize};
use types::handle::{EncryptedHandle, Proof};
use types::ids::{AccountId, AssetId, PoolId, SwapId};

/// Caller input for a swap.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub token_in: AssetId,
    pub token_out: AssetId,
    pub amount_in: EncryptedHandle,
    pub amount_in_proof: Proof,
    pub min_amount_out: EncryptedHandle,
    pub min_amount_out_proof: Proof,
    /// Encrypted slippage tolerance in basis points
    pub slippage: EncryptedHandle,
    /// Range proof over `[0, max_slippage_bps)`
    pub slippage_proof: Proof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swap {
    pub swap_id: SwapId,
    pub pool_id: PoolId,
    pub trader: AccountId,
    pub token_in: AssetId,
    pub token_out: AssetId,
    pub amount_in: EncryptedHandle,
    pub amount_out: EncryptedHandle,
    pub min_amount_out: EncryptedHandle,
    pub slippage: EncryptedHandle,
    pub settlement: EncryptedHandle,
    pub executed: bool,
    pub executed_at: i64,
}
