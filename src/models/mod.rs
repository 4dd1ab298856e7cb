//! Scheduler domain models.
//!
//! Plain data shared by the indexes, the engine and the command adapter.
//!
//! | Type | Role |
//! |------|------|
//! | `Order` | One order's fields as stored in the priority index |
//! | `Command` | One line of input |
//! | `Event` | One line of output |

mod command;
mod event;
mod order;

pub use command::Command;
pub use event::{Event, EtaUpdate};
pub use order::{Order, OrderId, Timestamp};
