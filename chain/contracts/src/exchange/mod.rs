//! Confidential exchange
//!
//! Liquidity pools with encrypted reserves, a per-pool order book with
//! encrypted amounts and prices, and swap execution against the reserves.
//!
//! The exchange cannot check the sign of a ciphertext, so reserves may go
//! encrypted-negative. Non-negativity is the proof backend's problem; the
//! exchange only enforces structural invariants.

pub mod order_book;
pub mod pool;
pub mod swap;

pub use order_book::{ConfidentialOrder, OrderBook};
pub use pool::{canonical_pair, Direction, Pool, PoolInfo};
pub use swap::{Swap, SwapRequest};

use cipher_core::{CipherEngine, EncryptionContext};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::handle::{EncryptedHandle, Proof};
use types::ids::{AccountId, AssetId, OrderId, PoolId, SwapId};
use types::order::{OrderKind, Side};

use crate::config::ExchangeConfig;
use crate::errors::ExchangeError;
use crate::events::{
    LedgerEvent, LiquidityAdded, LiquidityRemoved, OrderCancelled, OrderExecuted, OrderPlaced,
    PoolCreated, PoolStatusChanged, SwapExecuted,
};
use crate::security::AccessControl;

/// Caller input for a new order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub side: Side,
    pub kind: OrderKind,
    pub amount: EncryptedHandle,
    pub amount_proof: Proof,
    pub price: EncryptedHandle,
    pub price_proof: Proof,
}

/// Encrypted amounts released by `remove_liquidity`, in canonical pair order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub amount_a: EncryptedHandle,
    pub amount_b: EncryptedHandle,
    /// Provider share reached `NULL` and the position was closed
    pub position_closed: bool,
}

#[derive(Debug)]
pub struct ConfidentialExchange {
    engine: Arc<CipherEngine>,
    config: ExchangeConfig,
    access: AccessControl,
    /// Arena indexed by `PoolId - 1`
    pools: Vec<Pool>,
    pair_index: HashMap<(AssetId, AssetId), PoolId>,
    /// Arena indexed by `SwapId - 1`
    swaps: Vec<Swap>,
    events: Vec<LedgerEvent>,
}

impl ConfidentialExchange {
    pub fn new(engine: Arc<CipherEngine>, config: ExchangeConfig, admin: AccountId) -> Self {
        Self {
            engine,
            config,
            access: AccessControl::new(admin),
            pools: Vec::new(),
            pair_index: HashMap::new(),
            swaps: Vec::new(),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Pools ─────────────────────────

    /// Create a pool for an unordered asset pair.
    ///
    /// Reserves and total liquidity start at an encryption of zero so that
    /// "empty" is distinguishable from "uninitialized".
    pub fn create_pool(
        &mut self,
        creator: AccountId,
        asset_x: AssetId,
        asset_y: AssetId,
        fee_bps: u32,
        now: i64,
    ) -> Result<PoolId, ExchangeError> {
        if asset_x == asset_y {
            return Err(ExchangeError::InvalidTokenPair {
                token_in: asset_x,
                token_out: asset_y,
            });
        }

        if fee_bps > self.config.max_fee_bps {
            return Err(ExchangeError::InvalidFee {
                fee_bps,
                max_bps: self.config.max_fee_bps,
            });
        }

        let (asset_a, asset_b) = canonical_pair(asset_x, asset_y);
        let key = (asset_a.clone(), asset_b.clone());
        if self.pair_index.contains_key(&key) {
            return Err(ExchangeError::PoolAlreadyExists { asset_a, asset_b });
        }

        let pool_id = PoolId::new(self.pools.len() as u64 + 1);
        let ctx = EncryptionContext::new(creator, now);
        let zeros = self.engine.batch_encrypt(&[0, 0, 0], &ctx);

        info!(
            pool_id = %pool_id,
            asset_a = %asset_a,
            asset_b = %asset_b,
            fee_bps,
            "pool created"
        );
        self.events.push(LedgerEvent::PoolCreated(PoolCreated {
            pool_id,
            asset_a: asset_a.clone(),
            asset_b: asset_b.clone(),
            fee_bps,
            creator,
        }));

        self.pools.push(Pool {
            pool_id,
            asset_a,
            asset_b,
            reserve_a: zeros[0],
            reserve_b: zeros[1],
            total_liquidity: zeros[2],
            shares: HashMap::new(),
            fee_bps,
            active: true,
            creator,
            created_at: now,
            book: OrderBook::new(),
        });
        self.pair_index.insert(key, pool_id);
        Ok(pool_id)
    }

    /// Admin only.
    pub fn set_pool_active(
        &mut self,
        caller: &AccountId,
        pool_id: PoolId,
        active: bool,
    ) -> Result<(), ExchangeError> {
        if !self.access.is_admin(caller) {
            return Err(ExchangeError::Unauthorized);
        }
        let pool = self.pool_mut(pool_id)?;
        if pool.active == active {
            return Ok(());
        }
        pool.active = active;

        info!(pool_id = %pool_id, active, "pool status changed");
        self.events
            .push(LedgerEvent::PoolStatusChanged(PoolStatusChanged { pool_id, active }));
        Ok(())
    }

    // ───────────────────────── Liquidity ─────────────────────────

    /// Deposit both legs. Returns the provider's new share.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &mut self,
        pool_id: PoolId,
        provider: AccountId,
        amount_a: EncryptedHandle,
        proof_a: &Proof,
        amount_b: EncryptedHandle,
        proof_b: &Proof,
        now: i64,
    ) -> Result<EncryptedHandle, ExchangeError> {
        let pool = self.active_pool(pool_id)?;

        if !self.engine.verify(&amount_a, proof_a) {
            return Err(ExchangeError::InvalidProof { leg: "amount_a" });
        }
        if !self.engine.verify(&amount_b, proof_b) {
            return Err(ExchangeError::InvalidProof { leg: "amount_b" });
        }

        let delta = self.engine.add(&amount_a, &amount_b);
        let previous = match pool.shares.get(&provider) {
            Some(share) => *share,
            None => self
                .engine
                .encrypt(0, &EncryptionContext::new(provider, now)),
        };
        let share = self.engine.add(&previous, &delta);
        let reserve_a = self.engine.add(&pool.reserve_a, &amount_a);
        let reserve_b = self.engine.add(&pool.reserve_b, &amount_b);
        let total = self.engine.add(&pool.total_liquidity, &delta);

        let pool = self.pool_mut(pool_id)?;
        pool.reserve_a = reserve_a;
        pool.reserve_b = reserve_b;
        pool.total_liquidity = total;
        pool.shares.insert(provider, share);

        debug!(pool_id = %pool_id, provider = %provider, "liquidity added");
        self.events
            .push(LedgerEvent::LiquidityAdded(LiquidityAdded { pool_id, provider }));
        Ok(share)
    }

    /// Burn `liquidity` from the provider's share and release the matching
    /// amounts from both reserves.
    pub fn remove_liquidity(
        &mut self,
        pool_id: PoolId,
        provider: AccountId,
        liquidity: EncryptedHandle,
        proof: &Proof,
    ) -> Result<Withdrawal, ExchangeError> {
        let pool = self.active_pool(pool_id)?;

        let share = match pool.shares.get(&provider) {
            Some(share) if !share.is_null() => *share,
            _ => return Err(ExchangeError::NoLiquidity),
        };

        if !self.engine.verify(&liquidity, proof) {
            return Err(ExchangeError::InvalidProof { leg: "liquidity" });
        }

        let amount_a = self.engine.multiply(&liquidity, &pool.reserve_a);
        let amount_b = self.engine.multiply(&liquidity, &pool.reserve_b);
        let reserve_a = self.engine.subtract(&pool.reserve_a, &amount_a);
        let reserve_b = self.engine.subtract(&pool.reserve_b, &amount_b);
        let total = self.engine.subtract(&pool.total_liquidity, &liquidity);
        let remaining = self.engine.subtract(&share, &liquidity);
        let position_closed = remaining.is_null();

        let pool = self.pool_mut(pool_id)?;
        pool.reserve_a = reserve_a;
        pool.reserve_b = reserve_b;
        pool.total_liquidity = total;
        if position_closed {
            pool.shares.remove(&provider);
        } else {
            pool.shares.insert(provider, remaining);
        }

        debug!(pool_id = %pool_id, provider = %provider, position_closed, "liquidity removed");
        self.events
            .push(LedgerEvent::LiquidityRemoved(LiquidityRemoved {
                pool_id,
                provider,
                position_closed,
            }));
        Ok(Withdrawal {
            amount_a,
            amount_b,
            position_closed,
        })
    }

    // ───────────────────────── Orders ─────────────────────────

    pub fn place_order(
        &mut self,
        pool_id: PoolId,
        owner: AccountId,
        request: OrderRequest,
        now: i64,
    ) -> Result<OrderId, ExchangeError> {
        self.active_pool(pool_id)?;

        if !self.engine.verify(&request.amount, &request.amount_proof) {
            return Err(ExchangeError::InvalidProof { leg: "amount" });
        }
        if !self.engine.verify(&request.price, &request.price_proof) {
            return Err(ExchangeError::InvalidProof { leg: "price" });
        }

        let pool = self.pool_mut(pool_id)?;
        let order_id = pool.book.insert(
            owner,
            request.amount,
            request.price,
            request.side,
            request.kind,
            now,
        );

        debug!(
            pool_id = %pool_id,
            order_id = %order_id,
            side = %request.side,
            "order placed"
        );
        self.events.push(LedgerEvent::OrderPlaced(OrderPlaced {
            pool_id,
            order_id,
            owner,
            side: request.side,
            kind: request.kind,
        }));
        Ok(order_id)
    }

    /// Fill a resting order on behalf of `executor`.
    pub fn execute_order(
        &mut self,
        pool_id: PoolId,
        order_id: OrderId,
        side: Side,
        executor: AccountId,
    ) -> Result<(), ExchangeError> {
        let pool = self.active_pool(pool_id)?;
        let order = Self::active_order(pool, order_id)?;

        if order.owner == executor {
            warn!(pool_id = %pool_id, order_id = %order_id, "self-trade rejected");
            return Err(ExchangeError::SelfTrade);
        }
        if order.side != side {
            return Err(ExchangeError::SideMismatch {
                order_id,
                expected: side,
            });
        }
        let owner = order.owner;

        self.pool_mut(pool_id)?.book.deactivate(&order_id);

        info!(pool_id = %pool_id, order_id = %order_id, side = %side, "order executed");
        self.events.push(LedgerEvent::OrderExecuted(OrderExecuted {
            pool_id,
            order_id,
            owner,
            executor,
            side,
        }));
        Ok(())
    }

    /// Owner only. Cancelling is allowed on an inactive pool.
    pub fn cancel_order(
        &mut self,
        pool_id: PoolId,
        order_id: OrderId,
        caller: &AccountId,
    ) -> Result<(), ExchangeError> {
        let pool = self.pool(pool_id)?;
        let order = Self::active_order(pool, order_id)?;

        if order.owner != *caller {
            return Err(ExchangeError::NotOrderOwner);
        }

        self.pool_mut(pool_id)?.book.deactivate(&order_id);

        debug!(pool_id = %pool_id, order_id = %order_id, "order cancelled");
        self.events.push(LedgerEvent::OrderCancelled(OrderCancelled {
            pool_id,
            order_id,
            owner: *caller,
        }));
        Ok(())
    }

    fn active_order(pool: &Pool, order_id: OrderId) -> Result<&ConfidentialOrder, ExchangeError> {
        let order = pool.book.get(&order_id).ok_or(ExchangeError::OrderNotFound {
            pool_id: pool.pool_id,
            order_id,
        })?;
        if !order.active {
            return Err(ExchangeError::OrderInactive { order_id });
        }
        Ok(order)
    }

    // ───────────────────────── Swaps ─────────────────────────

    /// Swap against the pool reserves. All-or-nothing: every proof is
    /// checked before any reserve changes.
    pub fn execute_swap(
        &mut self,
        pool_id: PoolId,
        trader: AccountId,
        request: SwapRequest,
        now: i64,
    ) -> Result<SwapId, ExchangeError> {
        let pool = self.active_pool(pool_id)?;

        let direction = pool
            .direction(&request.token_in, &request.token_out)
            .ok_or_else(|| ExchangeError::InvalidTokenPair {
                token_in: request.token_in.clone(),
                token_out: request.token_out.clone(),
            })?;

        if !self.engine.verify(&request.amount_in, &request.amount_in_proof) {
            return Err(ExchangeError::InvalidProof { leg: "amount_in" });
        }
        if !self
            .engine
            .verify(&request.min_amount_out, &request.min_amount_out_proof)
        {
            return Err(ExchangeError::InvalidProof {
                leg: "min_amount_out",
            });
        }
        if !self.engine.verify_range(
            &request.slippage,
            0,
            self.config.max_slippage_bps,
            &request.slippage_proof,
        ) {
            return Err(ExchangeError::InvalidProof { leg: "slippage" });
        }

        let (reserve_in, reserve_out) = match direction {
            Direction::AToB => (pool.reserve_a, pool.reserve_b),
            Direction::BToA => (pool.reserve_b, pool.reserve_a),
        };
        let amount_out = self.engine.multiply(&request.amount_in, &reserve_out);
        let new_in = self.engine.add(&reserve_in, &request.amount_in);
        let new_out = self.engine.subtract(&reserve_out, &amount_out);
        let settlement = self.engine.compare(&amount_out, &request.min_amount_out);

        let pool = self.pool_mut(pool_id)?;
        match direction {
            Direction::AToB => {
                pool.reserve_a = new_in;
                pool.reserve_b = new_out;
            }
            Direction::BToA => {
                pool.reserve_b = new_in;
                pool.reserve_a = new_out;
            }
        }

        let swap_id = SwapId::new(self.swaps.len() as u64 + 1);
        info!(
            swap_id = %swap_id,
            pool_id = %pool_id,
            token_in = %request.token_in,
            token_out = %request.token_out,
            "swap executed"
        );
        self.events.push(LedgerEvent::SwapExecuted(SwapExecuted {
            swap_id,
            pool_id,
            trader,
            token_in: request.token_in.clone(),
            token_out: request.token_out.clone(),
        }));
        self.swaps.push(Swap {
            swap_id,
            pool_id,
            trader,
            token_in: request.token_in,
            token_out: request.token_out,
            amount_in: request.amount_in,
            amount_out,
            min_amount_out: request.min_amount_out,
            slippage: request.slippage,
            settlement,
            executed: true,
            executed_at: now,
        });
        Ok(swap_id)
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn pool(&self, pool_id: PoolId) -> Result<&Pool, ExchangeError> {
        pool_id
            .value()
            .checked_sub(1)
            .and_then(|index| self.pools.get(index as usize))
            .ok_or(ExchangeError::PoolNotFound { pool_id })
    }

    pub fn pool_info(&self, pool_id: PoolId) -> Result<PoolInfo, ExchangeError> {
        self.pool(pool_id).map(Pool::info)
    }

    pub fn pool_reserves(
        &self,
        pool_id: PoolId,
    ) -> Result<(EncryptedHandle, EncryptedHandle), ExchangeError> {
        self.pool(pool_id).map(Pool::reserves)
    }

    /// Look up a pool by pair, in either order.
    pub fn pool_by_pair(&self, asset_x: &AssetId, asset_y: &AssetId) -> Result<PoolId, ExchangeError> {
        let key = canonical_pair(asset_x.clone(), asset_y.clone());
        self.pair_index
            .get(&key)
            .copied()
            .ok_or(ExchangeError::PairNotFound {
                asset_a: key.0,
                asset_b: key.1,
            })
    }

    pub fn order(&self, pool_id: PoolId, order_id: OrderId) -> Result<&ConfidentialOrder, ExchangeError> {
        self.pool(pool_id)?
            .book
            .get(&order_id)
            .ok_or(ExchangeError::OrderNotFound { pool_id, order_id })
    }

    pub fn active_order_ids(&self, pool_id: PoolId, side: Side) -> Result<&[OrderId], ExchangeError> {
        Ok(self.pool(pool_id)?.book.active_ids(side))
    }

    pub fn liquidity_of(
        &self,
        pool_id: PoolId,
        provider: &AccountId,
    ) -> Result<EncryptedHandle, ExchangeError> {
        Ok(self.pool(pool_id)?.share_of(provider))
    }

    pub fn swap(&self, swap_id: SwapId) -> Result<&Swap, ExchangeError> {
        swap_id
            .value()
            .checked_sub(1)
            .and_then(|index| self.swaps.get(index as usize))
            .ok_or(ExchangeError::SwapNotFound { swap_id })
    }

    pub fn swaps_by_trader(&self, trader: &AccountId) -> Vec<SwapId> {
        self.swaps
            .iter()
            .filter(|s| s.trader == *trader)
            .map(|s| s.swap_id)
            .collect()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    // ───────────────────────── Events ─────────────────────────

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal ─────────────────────────

    fn active_pool(&self, pool_id: PoolId) -> Result<&Pool, ExchangeError> {
        let pool = self.pool(pool_id)?;
        if !pool.active {
            return Err(ExchangeError::PoolInactive { pool_id });
        }
        Ok(pool)
    }

    fn pool_mut(&mut self, pool_id: PoolId) -> Result<&mut Pool, ExchangeError> {
        pool_id
            .value()
            .checked_sub(1)
            .and_then(|index| self.pools.get_mut(index as usize))
            .ok_or(ExchangeError::PoolNotFound { pool_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_core::{DigestProofBackend, RANGE_BOUND_LEN};
    use types::errors::ErrorKind;

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        exchange: ConfidentialExchange,
        engine: Arc<CipherEngine>,
        admin: AccountId,
        pool_id: PoolId,
    }

    fn setup() -> Fixture {
        let engine = Arc::new(CipherEngine::new(DigestProofBackend::new()));
        let admin = AccountId::new();
        let mut exchange =
            ConfidentialExchange::new(Arc::clone(&engine), ExchangeConfig::default(), admin);
        let pool_id = exchange
            .create_pool(admin, AssetId::from("ETH"), AssetId::from("USDC"), 30, NOW)
            .unwrap();
        Fixture {
            exchange,
            engine,
            admin,
            pool_id,
        }
    }

    fn sealed(engine: &CipherEngine, who: AccountId, value: u64) -> (EncryptedHandle, Proof) {
        let handle = engine.encrypt(value, &EncryptionContext::new(who, NOW));
        (handle, DigestProofBackend::prove(&handle))
    }

    fn order_request(engine: &CipherEngine, who: AccountId, side: Side) -> OrderRequest {
        let (amount, amount_proof) = sealed(engine, who, 10);
        let (price, price_proof) = sealed(engine, who, 2000);
        OrderRequest {
            side,
            kind: OrderKind::Limit,
            amount,
            amount_proof,
            price,
            price_proof,
        }
    }

    fn swap_request(engine: &CipherEngine, who: AccountId, token_in: &str, token_out: &str) -> SwapRequest {
        let (amount_in, amount_in_proof) = sealed(engine, who, 5);
        let (min_amount_out, min_amount_out_proof) = sealed(engine, who, 4);
        let slippage = engine.encrypt(50, &EncryptionContext::new(who, NOW));
        SwapRequest {
            token_in: AssetId::from(token_in),
            token_out: AssetId::from(token_out),
            amount_in,
            amount_in_proof,
            min_amount_out,
            min_amount_out_proof,
            slippage,
            slippage_proof: DigestProofBackend::prove_range(&slippage, 0, 5000),
        }
    }

    // ─── Pool tests ───

    #[test]
    fn test_create_pool_starts_at_encrypted_zero() {
        let f = setup();
        let info = f.exchange.pool_info(f.pool_id).unwrap();
        assert!(!info.reserve_a.is_null());
        assert!(!info.reserve_b.is_null());
        assert!(!info.total_liquidity.is_null());
        assert_ne!(info.reserve_a, info.reserve_b);
        assert_eq!(info.fee_bps, 30);
        assert!(info.active);
    }

    #[test]
    fn test_duplicate_pool_reversed_pair() {
        let mut f = setup();
        let err = f
            .exchange
            .create_pool(f.admin, AssetId::from("USDC"), AssetId::from("ETH"), 30, NOW)
            .unwrap_err();
        assert!(matches!(err, ExchangeError::PoolAlreadyExists { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(f.exchange.pool_count(), 1);
    }

    #[test]
    fn test_create_pool_rejects_high_fee() {
        let mut f = setup();
        let err = f
            .exchange
            .create_pool(f.admin, AssetId::from("BTC"), AssetId::from("USDC"), 1001, NOW)
            .unwrap_err();
        assert_eq!(err, ExchangeError::InvalidFee { fee_bps: 1001, max_bps: 1000 });
    }

    #[test]
    fn test_create_pool_rejects_same_asset() {
        let mut f = setup();
        let err = f
            .exchange
            .create_pool(f.admin, AssetId::from("BTC"), AssetId::from("BTC"), 30, NOW)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_pool_by_pair_either_order() {
        let f = setup();
        let eth = AssetId::from("ETH");
        let usdc = AssetId::from("USDC");
        assert_eq!(f.exchange.pool_by_pair(&usdc, &eth).unwrap(), f.pool_id);
        assert_eq!(f.exchange.pool_by_pair(&eth, &usdc).unwrap(), f.pool_id);
        let err = f.exchange.pool_by_pair(&eth, &AssetId::from("DAI")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_set_pool_active_admin_only() {
        let mut f = setup();
        let err = f
            .exchange
            .set_pool_active(&AccountId::new(), f.pool_id, false)
            .unwrap_err();
        assert_eq!(err, ExchangeError::Unauthorized);

        f.exchange.set_pool_active(&f.admin, f.pool_id, false).unwrap();
        let trader = AccountId::new();
        let req = order_request(&f.engine, trader, Side::Buy);
        let err = f.exchange.place_order(f.pool_id, trader, req, NOW).unwrap_err();
        assert_eq!(err, ExchangeError::PoolInactive { pool_id: f.pool_id });
    }

    // ─── Liquidity tests ───

    #[test]
    fn test_add_liquidity_updates_reserves() {
        let mut f = setup();
        let provider = AccountId::new();
        let (r_a, r_b) = f.exchange.pool_reserves(f.pool_id).unwrap();
        let (a, pa) = sealed(&f.engine, provider, 100);
        let (b, pb) = sealed(&f.engine, provider, 200);

        let share = f
            .exchange
            .add_liquidity(f.pool_id, provider, a, &pa, b, &pb, NOW)
            .unwrap();

        assert_eq!(
            f.exchange.pool_reserves(f.pool_id).unwrap(),
            (f.engine.add(&r_a, &a), f.engine.add(&r_b, &b))
        );
        assert_eq!(f.exchange.liquidity_of(f.pool_id, &provider).unwrap(), share);
    }

    #[test]
    fn test_add_liquidity_bad_second_leg_is_atomic() {
        let mut f = setup();
        let provider = AccountId::new();
        let before = f.exchange.pool_info(f.pool_id).unwrap();
        let (a, pa) = sealed(&f.engine, provider, 100);
        let (b, _) = sealed(&f.engine, provider, 200);

        let err = f
            .exchange
            .add_liquidity(f.pool_id, provider, a, &pa, b, &Proof::empty(), NOW)
            .unwrap_err();
        assert_eq!(err, ExchangeError::InvalidProof { leg: "amount_b" });
        assert_eq!(f.exchange.pool_info(f.pool_id).unwrap(), before);
    }

    #[test]
    fn test_remove_liquidity_without_share() {
        let mut f = setup();
        let (liq, proof) = sealed(&f.engine, f.admin, 1);
        let err = f
            .exchange
            .remove_liquidity(f.pool_id, AccountId::new(), liq, &proof)
            .unwrap_err();
        assert_eq!(err, ExchangeError::NoLiquidity);
    }

    #[test]
    fn test_remove_full_share_closes_position() {
        let mut f = setup();
        let provider = AccountId::new();
        let (a, pa) = sealed(&f.engine, provider, 100);
        let (b, pb) = sealed(&f.engine, provider, 200);
        let share = f
            .exchange
            .add_liquidity(f.pool_id, provider, a, &pa, b, &pb, NOW)
            .unwrap();

        let released = f
            .exchange
            .remove_liquidity(f.pool_id, provider, share, &DigestProofBackend::prove(&share))
            .unwrap();
        assert!(released.position_closed);
        assert!(!released.amount_a.is_null());
        assert!(f.exchange.liquidity_of(f.pool_id, &provider).unwrap().is_null());
        assert_eq!(f.exchange.pool_info(f.pool_id).unwrap().provider_count, 0);
    }

    #[test]
    fn test_remove_partial_share_keeps_position() {
        let mut f = setup();
        let provider = AccountId::new();
        let (a, pa) = sealed(&f.engine, provider, 100);
        let (b, pb) = sealed(&f.engine, provider, 200);
        let share = f
            .exchange
            .add_liquidity(f.pool_id, provider, a, &pa, b, &pb, NOW)
            .unwrap();
        let (part, pp) = sealed(&f.engine, provider, 50);

        let released = f.exchange.remove_liquidity(f.pool_id, provider, part, &pp).unwrap();
        assert!(!released.position_closed);
        assert_eq!(
            f.exchange.liquidity_of(f.pool_id, &provider).unwrap(),
            f.engine.subtract(&share, &part)
        );
    }

    #[test]
    fn test_remove_liquidity_bad_proof_is_atomic() {
        let mut f = setup();
        let provider = AccountId::new();
        let (a, pa) = sealed(&f.engine, provider, 100);
        let (b, pb) = sealed(&f.engine, provider, 200);
        let share = f
            .exchange
            .add_liquidity(f.pool_id, provider, a, &pa, b, &pb, NOW)
            .unwrap();
        let before = f.exchange.pool_info(f.pool_id).unwrap();

        let err = f
            .exchange
            .remove_liquidity(f.pool_id, provider, share, &Proof::empty())
            .unwrap_err();
        assert_eq!(err, ExchangeError::InvalidProof { leg: "liquidity" });
        assert_eq!(err.kind(), ErrorKind::InvalidProof);
        assert_eq!(f.exchange.pool_info(f.pool_id).unwrap(), before);
        assert_eq!(f.exchange.liquidity_of(f.pool_id, &provider).unwrap(), share);
    }

    #[test]
    fn test_inactive_pool_blocks_liquidity_swaps_and_execution() {
        let mut f = setup();
        let provider = AccountId::new();
        let (a, pa) = sealed(&f.engine, provider, 100);
        let (b, pb) = sealed(&f.engine, provider, 200);
        let share = f
            .exchange
            .add_liquidity(f.pool_id, provider, a, &pa, b, &pb, NOW)
            .unwrap();
        let owner = AccountId::new();
        let req = order_request(&f.engine, owner, Side::Sell);
        let order_id = f.exchange.place_order(f.pool_id, owner, req, NOW).unwrap();

        f.exchange.set_pool_active(&f.admin, f.pool_id, false).unwrap();
        let before = f.exchange.pool_info(f.pool_id).unwrap();
        let inactive = ExchangeError::PoolInactive { pool_id: f.pool_id };

        let err = f
            .exchange
            .add_liquidity(f.pool_id, provider, a, &pa, b, &pb, NOW)
            .unwrap_err();
        assert_eq!(err, inactive);
        let err = f
            .exchange
            .remove_liquidity(f.pool_id, provider, share, &DigestProofBackend::prove(&share))
            .unwrap_err();
        assert_eq!(err, inactive);
        let trader = AccountId::new();
        let swap = swap_request(&f.engine, trader, "ETH", "USDC");
        let err = f.exchange.execute_swap(f.pool_id, trader, swap, NOW).unwrap_err();
        assert_eq!(err, inactive);
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let err = f
            .exchange
            .execute_order(f.pool_id, order_id, Side::Sell, trader)
            .unwrap_err();
        assert_eq!(err, inactive);

        assert_eq!(f.exchange.pool_info(f.pool_id).unwrap(), before);
        assert!(f.exchange.swaps_by_trader(&trader).is_empty());

        f.exchange.cancel_order(f.pool_id, order_id, &owner).unwrap();
        assert!(f.exchange.active_order_ids(f.pool_id, Side::Sell).unwrap().is_empty());
    }

    // ─── Order tests ───

    #[test]
    fn test_execute_order_removes_from_index() {
        let mut f = setup();
        let owner = AccountId::new();
        let req = order_request(&f.engine, owner, Side::Buy);
        let id = f.exchange.place_order(f.pool_id, owner, req, NOW).unwrap();
        assert_eq!(id, OrderId::new(1));

        f.exchange
            .execute_order(f.pool_id, id, Side::Buy, AccountId::new())
            .unwrap();
        assert!(!f.exchange.order(f.pool_id, id).unwrap().active);
        assert!(f.exchange.active_order_ids(f.pool_id, Side::Buy).unwrap().is_empty());

        let err = f
            .exchange
            .execute_order(f.pool_id, id, Side::Buy, AccountId::new())
            .unwrap_err();
        assert_eq!(err, ExchangeError::OrderInactive { order_id: id });
    }

    #[test]
    fn test_self_trade_rejected() {
        let mut f = setup();
        let owner = AccountId::new();
        let req = order_request(&f.engine, owner, Side::Sell);
        let id = f.exchange.place_order(f.pool_id, owner, req, NOW).unwrap();

        let err = f
            .exchange
            .execute_order(f.pool_id, id, Side::Sell, owner)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(f.exchange.order(f.pool_id, id).unwrap().active);
    }

    #[test]
    fn test_self_trade_rejected_before_side_check() {
        let mut f = setup();
        let owner = AccountId::new();
        let req = order_request(&f.engine, owner, Side::Buy);
        let id = f.exchange.place_order(f.pool_id, owner, req, NOW).unwrap();

        let err = f
            .exchange
            .execute_order(f.pool_id, id, Side::Sell, owner)
            .unwrap_err();
        assert_eq!(err, ExchangeError::SelfTrade);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(f.exchange.active_order_ids(f.pool_id, Side::Buy).unwrap(), &[id]);
    }

    #[test]
    fn test_execute_wrong_side() {
        let mut f = setup();
        let owner = AccountId::new();
        let req = order_request(&f.engine, owner, Side::Sell);
        let id = f.exchange.place_order(f.pool_id, owner, req, NOW).unwrap();
        let err = f
            .exchange
            .execute_order(f.pool_id, id, Side::Buy, AccountId::new())
            .unwrap_err();
        assert!(matches!(err, ExchangeError::SideMismatch { .. }));
    }

    #[test]
    fn test_execute_unknown_order() {
        let mut f = setup();
        let err = f
            .exchange
            .execute_order(f.pool_id, OrderId::new(42), Side::Buy, AccountId::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_place_order_invalid_price_proof() {
        let mut f = setup();
        let owner = AccountId::new();
        let mut req = order_request(&f.engine, owner, Side::Buy);
        req.price_proof = Proof::empty();
        let err = f.exchange.place_order(f.pool_id, owner, req, NOW).unwrap_err();
        assert_eq!(err, ExchangeError::InvalidProof { leg: "price" });
        assert!(f.exchange.active_order_ids(f.pool_id, Side::Buy).unwrap().is_empty());
    }

    #[test]
    fn test_cancel_order_owner_only() {
        let mut f = setup();
        let owner = AccountId::new();
        let req = order_request(&f.engine, owner, Side::Buy);
        let id = f.exchange.place_order(f.pool_id, owner, req, NOW).unwrap();

        let err = f
            .exchange
            .cancel_order(f.pool_id, id, &AccountId::new())
            .unwrap_err();
        assert_eq!(err, ExchangeError::NotOrderOwner);

        f.exchange.cancel_order(f.pool_id, id, &owner).unwrap();
        assert!(f.exchange.active_order_ids(f.pool_id, Side::Buy).unwrap().is_empty());
    }

    // ─── Swap tests ───

    #[test]
    fn test_swap_updates_both_reserves() {
        let mut f = setup();
        let trader = AccountId::new();
        let (r_eth, r_usdc) = f.exchange.pool_reserves(f.pool_id).unwrap();
        let req = swap_request(&f.engine, trader, "USDC", "ETH");
        let amount_in = req.amount_in;

        let swap_id = f.exchange.execute_swap(f.pool_id, trader, req, NOW).unwrap();
        let swap = f.exchange.swap(swap_id).unwrap().clone();

        // fee_bps is advertised only; the output is not reduced by it
        assert_eq!(swap.amount_out, f.engine.multiply(&amount_in, &r_eth));
        assert_eq!(
            f.exchange.pool_reserves(f.pool_id).unwrap(),
            (
                f.engine.subtract(&r_eth, &swap.amount_out),
                f.engine.add(&r_usdc, &amount_in)
            )
        );
        assert_eq!(swap.settlement, f.engine.compare(&swap.amount_out, &swap.min_amount_out));
        assert!(swap.executed);
        assert_eq!(f.exchange.swaps_by_trader(&trader), vec![swap_id]);
    }

    #[test]
    fn test_swap_invalid_pair() {
        let mut f = setup();
        let trader = AccountId::new();
        let req = swap_request(&f.engine, trader, "ETH", "DAI");
        let err = f.exchange.execute_swap(f.pool_id, trader, req, NOW).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidTokenPair { .. }));
    }

    #[test]
    fn test_swap_bad_slippage_proof_is_atomic() {
        let mut f = setup();
        let trader = AccountId::new();
        let before = f.exchange.pool_info(f.pool_id).unwrap();
        let mut req = swap_request(&f.engine, trader, "ETH", "USDC");
        req.slippage_proof = Proof::new(vec![0u8; RANGE_BOUND_LEN - 1]);

        let err = f.exchange.execute_swap(f.pool_id, trader, req, NOW).unwrap_err();
        assert_eq!(err, ExchangeError::InvalidProof { leg: "slippage" });
        assert_eq!(f.exchange.pool_info(f.pool_id).unwrap(), before);
        assert!(f.exchange.swaps_by_trader(&trader).is_empty());
    }

    #[test]
    fn test_swap_unknown_id() {
        let f = setup();
        let err = f.exchange.swap(SwapId::new(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
