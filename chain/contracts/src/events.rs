//! Contract events
//!
//! Events are immutable records emitted by contract operations. They carry
//! entity ids and public fields only, never handles or proofs, so they can
//! be forwarded to any observer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::ids::{AccountId, AssetId, OrderId, PoolId, SwapId, VaultId};
use types::order::{OrderKind, Side};
use uuid::Uuid;

use crate::lifecycle::CampaignStatus;

/// Campaign registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCreated {
    pub vault_id: VaultId,
    pub creator: AccountId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_uri: Option<String>,
    pub target: Decimal,
    pub deadline: i64,
    pub status: CampaignStatus,
}

/// Launch, pause or resume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStatusChanged {
    pub vault_id: VaultId,
    pub from: CampaignStatus,
    pub to: CampaignStatus,
}

/// Contribution accepted. The amount stays confidential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRecorded {
    pub vault_id: VaultId,
    pub contributor: AccountId,
    pub first_contribution: bool,
    pub contributor_count: usize,
}

/// Public target reached. Emitted exactly once per campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCompleted {
    pub vault_id: VaultId,
    pub target: Decimal,
    pub contributor_count: usize,
    pub completed_at: i64,
}

/// Campaign cancelled by its creator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCancelled {
    pub vault_id: VaultId,
    pub cancelled_by: AccountId,
    pub emergency: bool,
    pub refunded_contributors: usize,
}

/// Contributor reclaimed their contribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionWithdrawn {
    pub vault_id: VaultId,
    pub contributor: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCreated {
    pub pool_id: PoolId,
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub fee_bps: u32,
    pub creator: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatusChanged {
    pub pool_id: PoolId,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityAdded {
    pub pool_id: PoolId,
    pub provider: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRemoved {
    pub pool_id: PoolId,
    pub provider: AccountId,
    pub position_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub pool_id: PoolId,
    pub order_id: OrderId,
    pub owner: AccountId,
    pub side: Side,
    pub kind: OrderKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExecuted {
    pub pool_id: PoolId,
    pub order_id: OrderId,
    pub owner: AccountId,
    pub executor: AccountId,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub pool_id: PoolId,
    pub order_id: OrderId,
    pub owner: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapExecuted {
    pub swap_id: SwapId,
    pub pool_id: PoolId,
    pub trader: AccountId,
    pub token_in: AssetId,
    pub token_out: AssetId,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum LedgerEvent {
    CampaignCreated(CampaignCreated),
    CampaignStatusChanged(CampaignStatusChanged),
    ContributionRecorded(ContributionRecorded),
    CampaignCompleted(CampaignCompleted),
    CampaignCancelled(CampaignCancelled),
    ContributionWithdrawn(ContributionWithdrawn),
    PoolCreated(PoolCreated),
    PoolStatusChanged(PoolStatusChanged),
    LiquidityAdded(LiquidityAdded),
    LiquidityRemoved(LiquidityRemoved),
    OrderPlaced(OrderPlaced),
    OrderExecuted(OrderExecuted),
    OrderCancelled(OrderCancelled),
    SwapExecuted(SwapExecuted),
}

impl LedgerEvent {
    /// Get a human-readable label for the event type.
    pub fn label(&self) -> &'static str {
        match self {
            LedgerEvent::CampaignCreated(_) => "CampaignCreated",
            LedgerEvent::CampaignStatusChanged(_) => "CampaignStatusChanged",
            LedgerEvent::ContributionRecorded(_) => "ContributionRecorded",
            LedgerEvent::CampaignCompleted(_) => "CampaignCompleted",
            LedgerEvent::CampaignCancelled(_) => "CampaignCancelled",
            LedgerEvent::ContributionWithdrawn(_) => "ContributionWithdrawn",
            LedgerEvent::PoolCreated(_) => "PoolCreated",
            LedgerEvent::PoolStatusChanged(_) => "PoolStatusChanged",
            LedgerEvent::LiquidityAdded(_) => "LiquidityAdded",
            LedgerEvent::LiquidityRemoved(_) => "LiquidityRemoved",
            LedgerEvent::OrderPlaced(_) => "OrderPlaced",
            LedgerEvent::OrderExecuted(_) => "OrderExecuted",
            LedgerEvent::OrderCancelled(_) => "OrderCancelled",
            LedgerEvent::SwapExecuted(_) => "SwapExecuted",
        }
    }
}

/// Journal entry wrapping an event with its position in the global sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event identifier (UUID v7)
    pub event_id: Uuid,
    /// Monotonic sequence number, starting at 1
    pub sequence: u64,
    /// Time source reading when the emitting call ran
    pub emitted_at: i64,
    pub event: LedgerEvent,
}

/// Observer of committed events.
///
/// Called after the emitting operation has committed, while it still holds
/// the reentrancy guard.
///
/// Re-entry is detected per thread. A mutating call made from `publish`
/// fails with `ReentrancyDetected`, but one made from a thread that
/// `publish` spawns waits for the guard; joining that thread from inside
/// `publish` deadlocks. Hand such work off without waiting for it.
pub trait EventSink: Send + Sync {
    fn publish(&self, record: &EventRecord);
}

/// Sink forwarding every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, record: &EventRecord) {
        info!(
            sequence = record.sequence,
            event_type = record.event.label(),
            emitted_at = record.emitted_at,
            "ledger event"
        );
    }
}
