//! Balanced order indexes.
//!
//! Two AVL trees over the same population of orders:
//!
//! - [`PriorityIndex`]: every live order, keyed by synthetic priority.
//! - [`EtaIndex`]: every pending order, keyed by ETA.
//!
//! Both indexes keep an identity → key locator, so deleting or updating an
//! order by id is a logarithmic descent instead of a full-tree scan.
//!
//! # Equal keys
//!
//! Equal primary keys are allowed. Each insert stamps a monotonic sequence
//! number into the key, so a later insert sorts after every earlier insert
//! with the same primary key ("ties route right").

mod avl;
mod eta;
mod priority;

pub use avl::{AvlTree, Iter, Node};
pub use eta::EtaIndex;
pub use priority::PriorityIndex;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::Timestamp;

/// Priority tree key: priority, then insertion sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriorityKey {
    /// Synthetic priority.
    pub priority: f64,
    /// Insertion sequence, unique per index.
    pub seq: u64,
}

impl PriorityKey {
    /// Probe that sorts before every entry with priority `>= priority`.
    fn lower_probe(priority: f64) -> Self {
        Self { priority, seq: 0 }
    }

    /// Probe that sorts after every entry with priority `<= priority`.
    fn upper_probe(priority: f64) -> Self {
        Self {
            priority,
            seq: u64::MAX,
        }
    }
}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PriorityKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriorityKey {}

/// ETA tree key: ETA, then insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EtaKey {
    /// Estimated delivery time.
    pub eta: Timestamp,
    /// Insertion sequence, unique per index.
    pub seq: u64,
}

impl EtaKey {
    fn lower_probe(eta: Timestamp) -> Self {
        Self { eta, seq: 0 }
    }

    fn upper_probe(eta: Timestamp) -> Self {
        Self { eta, seq: u64::MAX }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_key_ties_break_by_sequence() {
        let a = PriorityKey {
            priority: 1.0,
            seq: 3,
        };
        let b = PriorityKey {
            priority: 1.0,
            seq: 4,
        };
        let c = PriorityKey {
            priority: 0.5,
            seq: 9,
        };
        assert!(a < b);
        assert!(c < a);
        assert!(PriorityKey::lower_probe(1.0) <= a);
        assert!(PriorityKey::upper_probe(1.0) > b);
    }

    #[test]
    fn test_eta_key_orders_by_eta_first() {
        let early = EtaKey { eta: 5, seq: 10 };
        let late = EtaKey { eta: 6, seq: 1 };
        assert!(early < late);
        assert!(EtaKey::upper_probe(5) > early);
        assert!(EtaKey::lower_probe(6) <= late);
    }
}
