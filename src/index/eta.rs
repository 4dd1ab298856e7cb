//! ETA-keyed index of pending orders.

use std::collections::HashMap;

use super::{AvlTree, EtaKey};
use crate::models::{OrderId, Timestamp};

/// AVL index of pending orders keyed by ETA.
#[derive(Debug, Clone, Default)]
pub struct EtaIndex {
    tree: AvlTree<EtaKey, OrderId>,
    locator: HashMap<OrderId, EtaKey>,
    next_seq: u64,
}

impl EtaIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending orders.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether no order is pending.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Whether this order has an ETA entry.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.locator.contains_key(&order_id)
    }

    /// ETA recorded for an order.
    pub fn eta_of(&self, order_id: OrderId) -> Option<Timestamp> {
        self.locator.get(&order_id).map(|key| key.eta)
    }

    /// Tree key of an order.
    pub fn key_of(&self, order_id: OrderId) -> Option<EtaKey> {
        self.locator.get(&order_id).copied()
    }

    /// Inserts an order at `eta`, replacing any existing entry for it.
    pub fn insert(&mut self, eta: Timestamp, order_id: OrderId) {
        let key = EtaKey {
            eta,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        if let Some(stale) = self.locator.insert(order_id, key) {
            self.tree.remove(&stale);
        }
        self.tree.insert(key, order_id);
    }

    /// Removes an order, returning the ETA it was filed under.
    pub fn delete(&mut self, order_id: OrderId) -> Option<Timestamp> {
        let key = self.locator.remove(&order_id)?;
        self.tree.remove(&key).map(|(key, _)| key.eta)
    }

    /// Re-files an existing entry under a new ETA.
    ///
    /// Returns `false` (and inserts nothing) when the order is not indexed.
    pub fn reschedule(&mut self, order_id: OrderId, eta: Timestamp) -> bool {
        if self.delete(order_id).is_none() {
            return false;
        }
        self.insert(eta, order_id);
        true
    }

    /// Ids of all orders with `lo <= eta <= hi`, ascending ETA.
    pub fn range_query(&self, lo: Timestamp, hi: Timestamp) -> Vec<OrderId> {
        self.tree
            .range(&EtaKey::lower_probe(lo), &EtaKey::upper_probe(hi))
            .into_iter()
            .map(|(_, order_id)| *order_id)
            .collect()
    }

    /// Every `(eta, order_id)` pair, ascending ETA.
    pub fn in_order_extract(&self) -> Vec<(Timestamp, OrderId)> {
        self.iter().collect()
    }

    /// Entries with `eta <= now`, ascending. Does not remove them.
    pub fn due(&self, now: Timestamp) -> Vec<(Timestamp, OrderId)> {
        self.iter().take_while(|(eta, _)| *eta <= now).collect()
    }

    /// Zero-based position of an order in ascending-ETA order.
    pub fn rank_of(&self, order_id: OrderId) -> Option<usize> {
        let key = self.locator.get(&order_id)?;
        self.tree.iter().position(|(k, _)| k == key)
    }

    /// Ascending `(eta, order_id)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, OrderId)> + '_ {
        self.tree.iter().map(|(key, order_id)| (key.eta, *order_id))
    }

    /// Underlying tree, for structural checks.
    pub fn tree(&self) -> &AvlTree<EtaKey, OrderId> {
        &self.tree
    }

    pub(crate) fn locator_len(&self) -> usize {
        self.locator.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_range_query_ascending() {
        let mut index = EtaIndex::new();
        index.insert(30, 2);
        index.insert(10, 1);
        index.insert(50, 3);

        assert_eq!(index.range_query(0, 100), vec![1, 2, 3]);
        assert_eq!(index.range_query(10, 30), vec![1, 2]);
        assert_eq!(index.range_query(11, 29), Vec::<OrderId>::new());
        assert_eq!(index.range_query(100, 0), Vec::<OrderId>::new());
    }

    #[test]
    fn test_equal_etas_keep_insertion_order() {
        let mut index = EtaIndex::new();
        index.insert(20, 7);
        index.insert(20, 3);
        index.insert(20, 5);
        assert_eq!(index.range_query(20, 20), vec![7, 3, 5]);
        assert_eq!(index.rank_of(5), Some(2));
    }

    #[test]
    fn test_reschedule_moves_entry() {
        let mut index = EtaIndex::new();
        index.insert(10, 1);
        index.insert(20, 2);

        assert!(index.reschedule(1, 40));
        assert_eq!(index.eta_of(1), Some(40));
        assert_eq!(index.in_order_extract(), vec![(20, 2), (40, 1)]);
        assert!(!index.reschedule(9, 5));
        assert!(!index.contains(9));
    }

    #[test]
    fn test_due_is_a_prefix() {
        let mut index = EtaIndex::new();
        for (eta, id) in [(5, 1), (9, 2), (12, 3)] {
            index.insert(eta, id);
        }
        assert_eq!(index.due(9), vec![(5, 1), (9, 2)]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_delete_returns_eta() {
        let mut index = EtaIndex::new();
        index.insert(10, 1);
        assert_eq!(index.delete(1), Some(10));
        assert_eq!(index.delete(1), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_range_query_matches_filtered_extract() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut index = EtaIndex::new();
        for id in 0..300 {
            index.insert(rng.random_range(0..1000), id);
        }
        for id in (0..300).step_by(3) {
            index.delete(id);
        }

        for _ in 0..100 {
            let lo = rng.random_range(-50..1050);
            let hi = rng.random_range(lo..1100);
            let expected: Vec<OrderId> = index
                .in_order_extract()
                .into_iter()
                .filter(|(eta, _)| lo <= *eta && *eta <= hi)
                .map(|(_, id)| id)
                .collect();
            assert_eq!(index.range_query(lo, hi), expected);
        }
    }
}
