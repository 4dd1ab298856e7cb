//! Commands accepted by the scheduler.
//!
//! One variant per line of the command grammar. `Display` renders a command
//! back into that grammar, so a parsed script can be echoed verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{OrderId, Timestamp};

/// A single scheduler command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// `createOrder(order_id, creation_time, value, delivery_duration)`
    CreateOrder {
        order_id: OrderId,
        creation_time: Timestamp,
        value: i64,
        delivery_duration: i64,
    },
    /// `cancelOrder(order_id, current_time)`
    CancelOrder {
        order_id: OrderId,
        current_time: Timestamp,
    },
    /// `updateTime(order_id, current_time, new_delivery_duration)`
    UpdateTime {
        order_id: OrderId,
        current_time: Timestamp,
        new_delivery_duration: i64,
    },
    /// `print(order_id)`
    PrintOrder { order_id: OrderId },
    /// `print(time1, time2)`
    PrintRange { time1: Timestamp, time2: Timestamp },
    /// `getRankOfOrder(order_id)`
    GetRankOfOrder { order_id: OrderId },
    /// `Quit()`
    Quit,
}

impl Command {
    /// Clock value this command advances the engine to, if it mutates.
    pub fn clock(&self) -> Option<Timestamp> {
        match *self {
            Command::CreateOrder { creation_time, .. } => Some(creation_time),
            Command::CancelOrder { current_time, .. } | Command::UpdateTime { current_time, .. } => {
                Some(current_time)
            }
            _ => None,
        }
    }

    /// Grammar name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateOrder { .. } => "createOrder",
            Command::CancelOrder { .. } => "cancelOrder",
            Command::UpdateTime { .. } => "updateTime",
            Command::PrintOrder { .. } | Command::PrintRange { .. } => "print",
            Command::GetRankOfOrder { .. } => "getRankOfOrder",
            Command::Quit => "Quit",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match *self {
            Command::CreateOrder {
                order_id,
                creation_time,
                value,
                delivery_duration,
            } => write!(
                f,
                "{name}({order_id}, {creation_time}, {value}, {delivery_duration})"
            ),
            Command::CancelOrder {
                order_id,
                current_time,
            } => write!(f, "{name}({order_id}, {current_time})"),
            Command::UpdateTime {
                order_id,
                current_time,
                new_delivery_duration,
            } => write!(
                f,
                "{name}({order_id}, {current_time}, {new_delivery_duration})"
            ),
            Command::PrintOrder { order_id } | Command::GetRankOfOrder { order_id } => {
                write!(f, "{name}({order_id})")
            }
            Command::PrintRange { time1, time2 } => write!(f, "{name}({time1}, {time2})"),
            Command::Quit => write!(f, "{name}()"),
        }
    }
}
