//! Order model.
//!
//! An order is the unit being scheduled. Its identity, creation time and
//! value never change; its delivery duration changes only through an
//! explicit reschedule, while priority and ETA are owned by the engine.

use serde::{Deserialize, Serialize};

/// Unique order identity, stable for the order's lifetime.
pub type OrderId = i64;

/// Absolute simulation time. ETAs and creation times share this unit.
pub type Timestamp = i64;

/// A snapshot of one order as stored in the priority index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identity.
    pub id: OrderId,
    /// Time the order entered the system.
    pub creation_time: Timestamp,
    /// Declared monetary value.
    pub value: i64,
    /// Time needed to deliver this order once it reaches the front.
    pub delivery_duration: i64,
    /// Synthetic priority (higher = closer to the front of the chain).
    pub priority: f64,
    /// Estimated delivery time. Zero until first computed.
    pub eta: Timestamp,
}

impl Order {
    /// Creates an order with no priority or ETA assigned yet.
    pub fn new(
        id: OrderId,
        creation_time: Timestamp,
        value: i64,
        delivery_duration: i64,
    ) -> Self {
        Self {
            id,
            creation_time,
            value,
            delivery_duration,
            priority: 0.0,
            eta: 0,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the ETA.
    pub fn with_eta(mut self, eta: Timestamp) -> Self {
        self.eta = eta;
        self
    }

    /// ETA of an order queued directly behind this one.
    ///
    /// The order behind has to wait for this order's ETA plus this order's
    /// own delivery leg. `None` if that time is not representable.
    #[inline]
    pub fn release_time(&self) -> Option<Timestamp> {
        self.eta.checked_add(self.delivery_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_builder() {
        let order = Order::new(7, 100, 250, 30).with_priority(1.5).with_eta(130);
        assert_eq!(order.id, 7);
        assert_eq!(order.creation_time, 100);
        assert_eq!(order.value, 250);
        assert_eq!(order.delivery_duration, 30);
        assert_eq!(order.priority, 1.5);
        assert_eq!(order.eta, 130);
    }

    #[test]
    fn test_release_time() {
        let order = Order::new(1, 0, 50, 10).with_eta(10);
        assert_eq!(order.release_time(), Some(20));

        let late = Order::new(2, 0, 50, i64::MAX / 2).with_eta(i64::MAX / 2 + 2);
        assert_eq!(late.release_time(), None);
    }

    #[test]
    fn test_order_serde_roundtrip() {
        let order = Order::new(3, 5, 100, 20).with_priority(-2.9).with_eta(40);
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
