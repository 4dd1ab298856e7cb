//! Error types.

use thiserror::Error;

use crate::models::{OrderId, Timestamp};

/// Why the engine could not act on an order.
///
/// `NotFound` and `AlreadyResolved` never abort command processing; the
/// engine turns them into reported outcomes. `DuplicateOrder` is a caller
/// contract violation. `EtaOverflow` leaves the engine as it was before the
/// command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// No pending order with this identity.
    #[error("order {0} not found")]
    NotFound(OrderId),
    /// The order's ETA has already been reached.
    #[error("order {order_id} already resolved (eta {eta}, now {now})")]
    AlreadyResolved {
        order_id: OrderId,
        eta: Timestamp,
        now: Timestamp,
    },
    /// An order with this identity is still tracked.
    #[error("order {0} already exists")]
    DuplicateOrder(OrderId),
    /// Chaining this order's ETA overflows the timestamp range.
    #[error("eta of order {0} overflows the timestamp range")]
    EtaOverflow(OrderId),
}

/// What was wrong with a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("expected `name(arg, ...)`")]
    MissingParenthesis,
    #[error("`{command}` takes {expected} argument(s), found {found}")]
    WrongArity {
        command: &'static str,
        expected: &'static str,
        found: usize,
    },
    #[error("`{0}` is not an integer")]
    InvalidInteger(String),
}

/// A malformed command, with its 1-based script line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    #[source]
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = SchedulerError::AlreadyResolved {
            order_id: 1,
            eta: 10,
            now: 12,
        };
        assert_eq!(err.to_string(), "order 1 already resolved (eta 10, now 12)");

        let err = ParseError::new(3, ParseErrorKind::InvalidInteger("x".into()));
        assert_eq!(err.to_string(), "line 3: `x` is not an integer");
    }
}
