//! Ledger facade
//!
//! [`ConfidentialLedger`] composes the campaign ledger, the exchange and the
//! registry behind one entry point. Every mutating call:
//!
//! 1. enters the reentrancy guard (one call in flight at a time),
//! 2. takes the state write lock, runs the operation and journals its events,
//! 3. releases the write lock,
//! 4. publishes the new journal records to every sink, guard still held.
//!
//! A sink that calls back into a mutating operation therefore gets
//! [`LedgerError::ReentrancyDetected`], while a sink that queries sees the
//! committed state. Queries only take the read lock and may run in parallel.

use cipher_core::CipherEngine;
use rust_decimal::Decimal;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};
use types::handle::{EncryptedHandle, Proof};
use types::ids::{AccountId, AssetId, OrderId, PoolId, SwapId, VaultId};
use types::order::Side;
use uuid::Uuid;

use crate::campaign::{CampaignLedger, CampaignParams, VaultDetails};
use crate::clock::Clock;
use crate::config::{ConfigError, LedgerConfig};
use crate::errors::LedgerError;
use crate::events::{EventRecord, EventSink, LedgerEvent};
use crate::exchange::{
    ConfidentialExchange, ConfidentialOrder, OrderRequest, PoolInfo, Swap, SwapRequest,
    Withdrawal,
};
use crate::lifecycle::CampaignStatus;
use crate::registry::{
    CampaignMetadata, CampaignRegistry, MetadataUpdate, RegistryStats, VerificationTier,
};
use crate::security::{ReentrancyGuard, Role};

struct LedgerState {
    campaigns: CampaignLedger,
    exchange: ConfidentialExchange,
    registry: CampaignRegistry,
    journal: Vec<EventRecord>,
}

impl LedgerState {
    /// Move pending component events into the journal and the registry.
    /// Returns the records appended by this call.
    fn commit_events(&mut self, now: i64) -> Vec<EventRecord> {
        let mut pending = self.campaigns.drain_events();
        pending.extend(self.exchange.drain_events());

        let first = self.journal.len();
        for event in pending {
            self.registry.observe(&event, now);
            let record = EventRecord {
                event_id: Uuid::now_v7(),
                sequence: self.journal.len() as u64 + 1,
                emitted_at: now,
                event,
            };
            self.journal.push(record);
        }
        self.journal[first..].to_vec()
    }
}

pub struct ConfidentialLedger {
    engine: Arc<CipherEngine>,
    clock: Arc<dyn Clock>,
    guard: ReentrancyGuard,
    state: RwLock<LedgerState>,
    sinks: RwLock<Vec<Arc<dyn EventSink>>>,
}

impl ConfidentialLedger {
    /// Build a ledger. `admin` administers both the exchange and the registry.
    pub fn new(
        config: LedgerConfig,
        admin: AccountId,
        engine: Arc<CipherEngine>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = LedgerState {
            campaigns: CampaignLedger::new(Arc::clone(&engine), config.campaign.clone()),
            exchange: ConfidentialExchange::new(Arc::clone(&engine), config.exchange.clone(), admin),
            registry: CampaignRegistry::new(config.campaign, admin),
            journal: Vec::new(),
        };

        info!(admin = %admin, "confidential ledger initialized");
        Ok(Self {
            engine,
            clock,
            guard: ReentrancyGuard::new(),
            state: RwLock::new(state),
            sinks: RwLock::new(Vec::new()),
        })
    }

    pub fn engine(&self) -> &Arc<CipherEngine> {
        &self.engine
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    pub fn add_sink(&self, sink: Arc<dyn EventSink>) {
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    // ───────────────────────── Campaigns ─────────────────────────

    pub fn register_campaign(&self, creator: AccountId, params: CampaignParams) -> Result<VaultId, LedgerError> {
        self.mutate(|s, now| s.campaigns.register_campaign(creator, params, now))
    }

    pub fn save_draft(&self, creator: AccountId, params: CampaignParams) -> Result<VaultId, LedgerError> {
        self.mutate(|s, now| s.campaigns.save_draft(creator, params, now))
    }

    pub fn launch(&self, caller: AccountId, vault_id: VaultId) -> Result<(), LedgerError> {
        self.mutate(|s, now| s.campaigns.launch(vault_id, &caller, now))
    }

    pub fn pause(&self, caller: AccountId, vault_id: VaultId) -> Result<(), LedgerError> {
        self.mutate(|s, _| s.campaigns.pause(vault_id, &caller))
    }

    pub fn resume(&self, caller: AccountId, vault_id: VaultId) -> Result<(), LedgerError> {
        self.mutate(|s, _| s.campaigns.resume(vault_id, &caller))
    }

    pub fn cancel_campaign(&self, caller: AccountId, vault_id: VaultId) -> Result<(), LedgerError> {
        self.mutate(|s, _| s.campaigns.cancel(vault_id, &caller))
    }

    pub fn contribute(
        &self,
        caller: AccountId,
        vault_id: VaultId,
        transferred: Decimal,
        encrypted: EncryptedHandle,
        proof: &Proof,
    ) -> Result<CampaignStatus, LedgerError> {
        self.mutate(|s, now| {
            s.campaigns
                .contribute(vault_id, caller, transferred, encrypted, proof, now)
        })
    }

    pub fn withdraw(&self, caller: AccountId, vault_id: VaultId) -> Result<EncryptedHandle, LedgerError> {
        self.mutate(|s, now| s.campaigns.withdraw(vault_id, &caller, now))
    }

    pub fn emergency_exit(
        &self,
        caller: AccountId,
        vault_id: VaultId,
    ) -> Result<Vec<(AccountId, EncryptedHandle)>, LedgerError> {
        self.mutate(|s, _| s.campaigns.emergency_exit(vault_id, &caller))
    }

    // ───────────────────────── Exchange ─────────────────────────

    pub fn create_pool(
        &self,
        caller: AccountId,
        asset_x: AssetId,
        asset_y: AssetId,
        fee_bps: u32,
    ) -> Result<PoolId, LedgerError> {
        self.mutate(|s, now| s.exchange.create_pool(caller, asset_x, asset_y, fee_bps, now))
    }

    pub fn set_pool_active(&self, caller: AccountId, pool_id: PoolId, active: bool) -> Result<(), LedgerError> {
        self.mutate(|s, _| s.exchange.set_pool_active(&caller, pool_id, active))
    }

    pub fn add_liquidity(
        &self,
        caller: AccountId,
        pool_id: PoolId,
        amount_a: EncryptedHandle,
        proof_a: &Proof,
        amount_b: EncryptedHandle,
        proof_b: &Proof,
    ) -> Result<EncryptedHandle, LedgerError> {
        self.mutate(|s, now| {
            s.exchange
                .add_liquidity(pool_id, caller, amount_a, proof_a, amount_b, proof_b, now)
        })
    }

    pub fn remove_liquidity(
        &self,
        caller: AccountId,
        pool_id: PoolId,
        liquidity: EncryptedHandle,
        proof: &Proof,
    ) -> Result<Withdrawal, LedgerError> {
        self.mutate(|s, _| s.exchange.remove_liquidity(pool_id, caller, liquidity, proof))
    }

    pub fn place_order(&self, caller: AccountId, pool_id: PoolId, request: OrderRequest) -> Result<OrderId, LedgerError> {
        self.mutate(|s, now| s.exchange.place_order(pool_id, caller, request, now))
    }

    pub fn execute_order(
        &self,
        caller: AccountId,
        pool_id: PoolId,
        order_id: OrderId,
        side: Side,
    ) -> Result<(), LedgerError> {
        self.mutate(|s, _| s.exchange.execute_order(pool_id, order_id, side, caller))
    }

    pub fn cancel_order(&self, caller: AccountId, pool_id: PoolId, order_id: OrderId) -> Result<(), LedgerError> {
        self.mutate(|s, _| s.exchange.cancel_order(pool_id, order_id, &caller))
    }

    pub fn execute_swap(&self, caller: AccountId, pool_id: PoolId, request: SwapRequest) -> Result<SwapId, LedgerError> {
        self.mutate(|s, now| s.exchange.execute_swap(pool_id, caller, request, now))
    }

    // ───────────────────────── Registry ─────────────────────────

    pub fn update_metadata(
        &self,
        caller: AccountId,
        vault_id: VaultId,
        update: MetadataUpdate,
    ) -> Result<(), LedgerError> {
        self.mutate(|s, now| s.registry.update_metadata(&caller, vault_id, update, now))
    }

    pub fn set_verification(
        &self,
        caller: AccountId,
        vault_id: VaultId,
        tier: VerificationTier,
    ) -> Result<(), LedgerError> {
        self.mutate(|s, now| s.registry.set_verification(&caller, vault_id, tier, now))
    }

    /// Admin only. Operators may assign verification tiers.
    pub fn grant_role(&self, caller: AccountId, target: AccountId, role: Role) -> Result<(), LedgerError> {
        self.mutate(|s, _| s.registry.grant_role(&caller, target, role))
    }

    pub fn revoke_role(&self, caller: AccountId, target: AccountId) -> Result<(), LedgerError> {
        self.mutate(|s, _| s.registry.revoke_role(&caller, &target))
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.read().registry.access().has_role(account, role)
    }

    pub fn vault_details(&self, vault_id: VaultId) -> Result<VaultDetails, LedgerError> {
        Ok(self.read().campaigns.vault_details(vault_id)?)
    }

    pub fn contribution_of(&self, vault_id: VaultId, account: &AccountId) -> Result<EncryptedHandle, LedgerError> {
        Ok(self.read().campaigns.contribution_of(vault_id, account)?)
    }

    pub fn contributors(&self, vault_id: VaultId) -> Result<Vec<AccountId>, LedgerError> {
        Ok(self.read().campaigns.contributors(vault_id)?.to_vec())
    }

    pub fn contributor_count(&self, vault_id: VaultId) -> Result<usize, LedgerError> {
        Ok(self.read().campaigns.contributor_count(vault_id)?)
    }

    pub fn has_contributed(&self, vault_id: VaultId, account: &AccountId) -> Result<bool, LedgerError> {
        Ok(self.read().campaigns.has_contributed(vault_id, account)?)
    }

    /// Deadline passed while still ACTIVE, judged against the clock now.
    pub fn is_expired(&self, vault_id: VaultId) -> Result<bool, LedgerError> {
        let now = self.clock.now();
        Ok(self.read().campaigns.is_expired(vault_id, now)?)
    }

    pub fn campaigns_by_creator(&self, creator: &AccountId) -> Vec<VaultId> {
        self.read().campaigns.campaigns_by_creator(creator)
    }

    pub fn pool_info(&self, pool_id: PoolId) -> Result<PoolInfo, LedgerError> {
        Ok(self.read().exchange.pool_info(pool_id)?)
    }

    pub fn pool_reserves(&self, pool_id: PoolId) -> Result<(EncryptedHandle, EncryptedHandle), LedgerError> {
        Ok(self.read().exchange.pool_reserves(pool_id)?)
    }

    pub fn pool_by_pair(&self, asset_x: &AssetId, asset_y: &AssetId) -> Result<PoolId, LedgerError> {
        Ok(self.read().exchange.pool_by_pair(asset_x, asset_y)?)
    }

    pub fn order(&self, pool_id: PoolId, order_id: OrderId) -> Result<ConfidentialOrder, LedgerError> {
        Ok(self.read().exchange.order(pool_id, order_id)?.clone())
    }

    pub fn active_order_ids(&self, pool_id: PoolId, side: Side) -> Result<Vec<OrderId>, LedgerError> {
        Ok(self.read().exchange.active_order_ids(pool_id, side)?.to_vec())
    }

    pub fn liquidity_of(&self, pool_id: PoolId, provider: &AccountId) -> Result<EncryptedHandle, LedgerError> {
        Ok(self.read().exchange.liquidity_of(pool_id, provider)?)
    }

    pub fn swap(&self, swap_id: SwapId) -> Result<Swap, LedgerError> {
        Ok(self.read().exchange.swap(swap_id)?.clone())
    }

    pub fn swaps_by_trader(&self, trader: &AccountId) -> Vec<SwapId> {
        self.read().exchange.swaps_by_trader(trader)
    }

    pub fn metadata(&self, vault_id: VaultId) -> Result<CampaignMetadata, LedgerError> {
        Ok(self.read().registry.metadata(vault_id)?.clone())
    }

    pub fn campaigns_by_category(&self, category: &str) -> Vec<VaultId> {
        self.read().registry.by_category(category)
    }

    pub fn registry_by_creator(&self, creator: &AccountId) -> Vec<VaultId> {
        self.read().registry.by_creator(creator)
    }

    pub fn campaigns_by_tier(&self, tier: VerificationTier) -> Vec<VaultId> {
        self.read().registry.by_tier(tier)
    }

    pub fn stats(&self) -> RegistryStats {
        self.read().registry.stats()
    }

    /// Full event journal, oldest first.
    pub fn journal(&self) -> Vec<EventRecord> {
        self.read().journal.clone()
    }

    /// Journal records with a sequence number greater than `sequence`.
    pub fn journal_since(&self, sequence: u64) -> Vec<EventRecord> {
        let state = self.read();
        let start = (sequence as usize).min(state.journal.len());
        state.journal[start..].to_vec()
    }

    /// Events of the journal without their envelopes.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.read().journal.iter().map(|r| r.event.clone()).collect()
    }

    // ───────────────────────── Internal ─────────────────────────

    fn mutate<T, E>(&self, op: impl FnOnce(&mut LedgerState, i64) -> Result<T, E>) -> Result<T, LedgerError>
    where
        LedgerError: From<E>,
    {
        let _entered = self.guard.enter().map_err(|_| {
            warn!("reentrant call rejected");
            LedgerError::ReentrancyDetected
        })?;
        let now = self.clock.now();

        let (value, records) = {
            let mut state = self.write();
            let value = op(&mut state, now)?;
            let records = state.commit_events(now);
            (value, records)
        };

        self.dispatch(&records);
        Ok(value)
    }

    fn dispatch(&self, records: &[EventRecord]) {
        if records.is_empty() {
            return;
        }
        let sinks: Vec<Arc<dyn EventSink>> = self
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for record in records {
            for sink in &sinks {
                sink.publish(record);
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ConfidentialLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfidentialLedger")
            .field("engine", &self.engine)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
