//! Result events produced while processing commands.
//!
//! Each event renders (via `Display`) to exactly one output line.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Order, OrderId, Timestamp};

/// A recomputed ETA reported by a cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaUpdate {
    /// Affected order.
    pub order_id: OrderId,
    /// Its new ETA.
    pub eta: Timestamp,
}

/// One observable outcome, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A new order was accepted.
    Created { order_id: OrderId, eta: Timestamp },
    /// Stored fields of a single order.
    OrderDetails { order: Order },
    /// Single-order lookup missed.
    OrderNotFound { order_id: OrderId },
    /// Pending orders whose ETA falls in the queried window, ascending ETA.
    OrdersInRange { order_ids: Vec<OrderId> },
    /// Range query matched nothing.
    NoOrdersInRange,
    /// Number of pending orders ahead of this one.
    Rank { order_id: OrderId, ahead: usize },
    /// A pending order was removed.
    Canceled { order_id: OrderId },
    /// Cancel targeted an unknown or already due order.
    CancelRejected { order_id: OrderId },
    /// Reschedule targeted an unknown or already due order.
    UpdateRejected { order_id: OrderId },
    /// A cascade recomputed one or more ETAs.
    EtasUpdated { updates: Vec<EtaUpdate> },
    /// Delivery sweep hit.
    Delivered { order_id: OrderId, eta: Timestamp },
    /// End-of-run report for an order still pending.
    Outstanding { order_id: OrderId, eta: Timestamp },
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "]")
}

impl fmt::Display for EtaUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.order_id, self.eta)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Created { order_id, eta } => {
                write!(f, "Order {order_id} has been created - ETA: {eta}")
            }
            Event::OrderDetails { order } => write!(
                f,
                "[{}, {}, {}, {}, {}]",
                order.id, order.creation_time, order.value, order.delivery_duration, order.eta
            ),
            Event::OrderNotFound { .. } => write!(f, "There are no orders with that ID"),
            Event::OrdersInRange { order_ids } => write_list(f, order_ids),
            Event::NoOrdersInRange => write!(f, "There are no orders in that time period"),
            Event::Rank { order_id, ahead } => {
                write!(f, "Order {order_id} will be delivered after {ahead} orders.")
            }
            Event::Canceled { order_id } => write!(f, "Order {order_id} has been canceled"),
            Event::CancelRejected { order_id } => {
                write!(f, "Cannot cancel. Order {order_id} has already been delivered")
            }
            Event::UpdateRejected { order_id } => {
                write!(f, "Cannot update. Order {order_id} has already been delivered")
            }
            Event::EtasUpdated { updates } => {
                write!(f, "Updated ETAs: ")?;
                write_list(f, updates)
            }
            Event::Delivered { order_id, eta } => {
                write!(f, "Order {order_id} has been delivered at time {eta}")
            }
            Event::Outstanding { order_id, eta } => {
                write!(f, "Order {order_id} will be delivered at time {eta}")
            }
        }
    }
}
