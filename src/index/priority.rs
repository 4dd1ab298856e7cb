//! Priority-keyed order index.
//!
//! Holds every live order, ordered by priority. The in-order sequence is the
//! delivery chain: an order's *successor* (next higher priority) is the order
//! ahead of it, its *predecessor* the order behind it.

use std::collections::HashMap;

use super::{AvlTree, PriorityKey};
use crate::models::{Order, OrderId, Timestamp};

/// AVL index of orders keyed by priority.
#[derive(Debug, Clone, Default)]
pub struct PriorityIndex {
    tree: AvlTree<PriorityKey, Order>,
    locator: HashMap<OrderId, PriorityKey>,
    next_seq: u64,
}

impl PriorityIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Whether an order with this id is present.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.locator.contains_key(&order_id)
    }

    /// Inserts `order` at `priority`.
    ///
    /// Among equal priorities the new entry sorts last. An existing entry
    /// with the same id is replaced, so there is never more than one entry
    /// per order.
    pub fn insert(&mut self, priority: f64, order: Order) -> PriorityKey {
        let key = PriorityKey {
            priority,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        if let Some(stale) = self.locator.insert(order.id, key) {
            self.tree.remove(&stale);
        }
        self.tree.insert(key, order.with_priority(priority));
        key
    }

    /// Removes an order by identity.
    pub fn delete(&mut self, order_id: OrderId) -> Option<Order> {
        let key = self.locator.remove(&order_id)?;
        self.tree.remove(&key).map(|(_, order)| order)
    }

    /// Moves an order to a new priority, keeping its other fields.
    pub fn reposition(&mut self, order_id: OrderId, priority: f64) -> bool {
        match self.delete(order_id) {
            Some(order) => {
                self.insert(priority, order);
                true
            }
            None => false,
        }
    }

    /// Order snapshot by identity.
    pub fn get(&self, order_id: OrderId) -> Option<Order> {
        let key = self.locator.get(&order_id)?;
        self.tree.get(key).copied()
    }

    /// Current priority of an order.
    pub fn priority_of(&self, order_id: OrderId) -> Option<f64> {
        self.locator.get(&order_id).map(|key| key.priority)
    }

    /// Tree key of an order.
    pub fn key_of(&self, order_id: OrderId) -> Option<PriorityKey> {
        self.locator.get(&order_id).copied()
    }

    /// Records a new ETA. Ordering is unaffected.
    pub fn set_eta(&mut self, order_id: OrderId, eta: Timestamp) -> bool {
        self.modify(order_id, |order| order.eta = eta)
    }

    /// Records a new delivery duration. Ordering is unaffected.
    pub fn set_delivery_duration(&mut self, order_id: OrderId, duration: i64) -> bool {
        self.modify(order_id, |order| order.delivery_duration = duration)
    }

    fn modify(&mut self, order_id: OrderId, f: impl FnOnce(&mut Order)) -> bool {
        let Some(key) = self.locator.get(&order_id) else {
            return false;
        };
        match self.tree.get_mut(key) {
            Some(order) => {
                f(order);
                true
            }
            None => false,
        }
    }

    /// Highest-priority order strictly below `priority`.
    pub fn find_predecessor(&self, priority: f64) -> Option<Order> {
        self.tree
            .predecessor(&PriorityKey::lower_probe(priority))
            .map(|(_, order)| *order)
    }

    /// Lowest-priority order strictly above `priority`.
    pub fn find_successor(&self, priority: f64) -> Option<Order> {
        self.tree
            .successor(&PriorityKey::upper_probe(priority))
            .map(|(_, order)| *order)
    }

    /// In-order neighbour just below this order (the order behind it).
    pub fn predecessor_of(&self, order_id: OrderId) -> Option<Order> {
        let key = self.locator.get(&order_id)?;
        self.tree.predecessor(key).map(|(_, order)| *order)
    }

    /// In-order neighbour just above this order (the order ahead of it).
    pub fn successor_of(&self, order_id: OrderId) -> Option<Order> {
        let key = self.locator.get(&order_id)?;
        self.tree.successor(key).map(|(_, order)| *order)
    }

    /// Orders in ascending priority.
    pub fn iter(&self) -> impl Iterator<Item = &Order> + '_ {
        self.tree.iter().map(|(_, order)| order)
    }

    /// Underlying tree, for structural checks.
    pub fn tree(&self) -> &AvlTree<PriorityKey, Order> {
        &self.tree
    }

    pub(crate) fn locator_len(&self) -> usize {
        self.locator.len()
    }
}
