//! Per-pool confidential order book
//!
//! Orders live in a map keyed by id; the currently fillable ids are kept in
//! two separate index lists, one per side. Removing an id from an index is a
//! swap-with-last-and-pop, so the remaining ids carry no ordering guarantee.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::handle::EncryptedHandle;
use types::ids::{AccountId, OrderId};
use types::order::{OrderKind, Side};

/// A resting confidential order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidentialOrder {
    pub order_id: OrderId,
    pub owner: AccountId,
    pub amount: EncryptedHandle,
    pub price: EncryptedHandle,
    pub side: Side,
    pub kind: OrderKind,
    /// False once filled or cancelled, never reset
    pub active: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    /// BTreeMap keeps iteration deterministic
    orders: BTreeMap<OrderId, ConfidentialOrder>,
    buy_ids: Vec<OrderId>,
    sell_ids: Vec<OrderId>,
    last_order_id: u64,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next inserted order will receive.
    pub fn next_order_id(&self) -> OrderId {
        OrderId::new(self.last_order_id).next()
    }

    /// Insert a new active order and index it. Returns its id.
    pub fn insert(
        &mut self,
        owner: AccountId,
        amount: EncryptedHandle,
        price: EncryptedHandle,
        side: Side,
        kind: OrderKind,
        now: i64,
    ) -> OrderId {
        let order_id = self.next_order_id();
        self.last_order_id = order_id.value();

        self.orders.insert(
            order_id,
            ConfidentialOrder {
                order_id,
                owner,
                amount,
                price,
                side,
                kind,
                active: true,
                created_at: now,
            },
        );
        self.index_mut(side).push(order_id);
        order_id
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&ConfidentialOrder> {
        self.orders.get(order_id)
    }

    /// Deactivate an order and drop it from its side's index.
    ///
    /// Returns false if the order is unknown or already inactive.
    pub fn deactivate(&mut self, order_id: &OrderId) -> bool {
        let side = match self.orders.get_mut(order_id) {
            Some(order) if order.active => {
                order.active = false;
                order.side
            }
            _ => return false,
        };

        let index = self.index_mut(side);
        if let Some(pos) = index.iter().position(|id| id == order_id) {
            index.swap_remove(pos);
        }
        true
    }

    /// Active order ids for one side. Order is unspecified.
    pub fn active_ids(&self, side: Side) -> &[OrderId] {
        match side {
            Side::Buy => &self.buy_ids,
            Side::Sell => &self.sell_ids,
        }
    }

    /// Total orders ever placed, active or not.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn index_mut(&mut self, side: Side) -> &mut Vec<OrderId> {
        match side {
            Side::Buy => &mut self.buy_ids,
            Side::Sell => &mut self.sell_ids,
        }
    }
}
