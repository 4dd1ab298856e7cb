//! Script and engine-state validation.
//!
//! Two independent checks:
//!
//! - [`validate_commands`] inspects a command script before it runs and
//!   flags input the engine would accept but probably should not see:
//!   - Duplicate order IDs
//!   - Negative delivery durations
//!   - Clock regressions between mutating commands
//!   - Inverted range queries
//!   - Commands after `Quit`
//! - [`validate_engine`] inspects live engine state:
//!   - AVL balance, cached heights and key order in both indexes
//!   - Identity locators agree with tree contents
//!   - Every pending order's ETA matches in both indexes
//!   - Every pending order's ETA matches a from-scratch chain recomputation
//!
//! Both collect every problem found rather than stopping at the first.

use std::collections::HashSet;

use crate::index::{AvlTree, Node};
use crate::models::{Command, OrderId, Timestamp};
use crate::scheduler::SchedulerEngine;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two `createOrder` commands share an order ID.
    DuplicateId,
    /// A delivery duration is negative.
    NegativeDuration,
    /// A mutating command moves the clock backwards.
    ClockRegression,
    /// `print(t1, t2)` with `t1 > t2`.
    InvertedRange,
    /// Commands follow `Quit` and will never run.
    UnreachableCommand,
    /// A tree node violates the AVL balance bound.
    Unbalanced,
    /// A cached node height disagrees with the subtree.
    StaleHeight,
    /// In-order keys are not strictly ascending.
    KeyOrder,
    /// The identity locator disagrees with the tree.
    LocatorMismatch,
    /// ETA index and priority index disagree on an ETA.
    MirrorMismatch,
    /// A stored ETA differs from its chain recomputation.
    ChainMismatch,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a command script.
///
/// Checks:
/// 1. No order ID is created twice
/// 2. No create or update carries a negative duration
/// 3. Mutating commands never move the clock backwards
/// 4. Range queries are not inverted
/// 5. Nothing follows `Quit`
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_commands(commands: &[Command]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut created: HashSet<OrderId> = HashSet::new();
    let mut clock: Option<Timestamp> = None;

    for (i, command) in commands.iter().enumerate() {
        let line = i + 1;

        match *command {
            Command::CreateOrder {
                order_id,
                delivery_duration,
                ..
            } => {
                if !created.insert(order_id) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::DuplicateId,
                        format!("command {line}: order {order_id} is created twice"),
                    ));
                }
                if delivery_duration < 0 {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::NegativeDuration,
                        format!("command {line}: order {order_id} has duration {delivery_duration}"),
                    ));
                }
            }
            Command::UpdateTime {
                order_id,
                new_delivery_duration,
                ..
            } if new_delivery_duration < 0 => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeDuration,
                    format!(
                        "command {line}: order {order_id} updated to duration {new_delivery_duration}"
                    ),
                ));
            }
            Command::PrintRange { time1, time2 } if time1 > time2 => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvertedRange,
                    format!("command {line}: range [{time1}, {time2}] is empty"),
                ));
            }
            Command::Quit if line < commands.len() => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnreachableCommand,
                    format!(
                        "command {line}: {} command(s) after Quit",
                        commands.len() - line
                    ),
                ));
            }
            _ => {}
        }

        if let Some(time) = command.clock() {
            if let Some(previous) = clock.filter(|&previous| time < previous) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ClockRegression,
                    format!("command {line}: clock moves from {previous} back to {time}"),
                ));
            }
            clock = Some(clock.map_or(time, |previous| previous.max(time)));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the structural and ETA invariants of a live engine.
///
/// Orders whose delivery duration was changed after delivery break the chain
/// for orders behind them; that shows up here as `ChainMismatch`.
pub fn validate_engine(engine: &SchedulerEngine) -> ValidationResult {
    let mut errors = Vec::new();
    let by_priority = engine.priority_index();
    let by_eta = engine.eta_index();

    check_tree("priority index", by_priority.tree(), &mut errors);
    check_tree("eta index", by_eta.tree(), &mut errors);

    // Locators
    if by_priority.locator_len() != by_priority.len() {
        errors.push(ValidationError::new(
            ValidationErrorKind::LocatorMismatch,
            format!(
                "priority index tracks {} ids for {} entries",
                by_priority.locator_len(),
                by_priority.len()
            ),
        ));
    }
    for (key, order) in by_priority.tree() {
        if by_priority.key_of(order.id) != Some(*key) {
            errors.push(ValidationError::new(
                ValidationErrorKind::LocatorMismatch,
                format!("priority index locator for order {} is stale", order.id),
            ));
        }
    }
    if by_eta.locator_len() != by_eta.len() {
        errors.push(ValidationError::new(
            ValidationErrorKind::LocatorMismatch,
            format!(
                "eta index tracks {} ids for {} entries",
                by_eta.locator_len(),
                by_eta.len()
            ),
        ));
    }
    for (key, order_id) in by_eta.tree() {
        if by_eta.key_of(*order_id) != Some(*key) {
            errors.push(ValidationError::new(
                ValidationErrorKind::LocatorMismatch,
                format!("eta index locator for order {order_id} is stale"),
            ));
        }
    }

    // Mirror and chain
    for (eta, order_id) in by_eta.iter() {
        let Some(order) = by_priority.get(order_id) else {
            errors.push(ValidationError::new(
                ValidationErrorKind::MirrorMismatch,
                format!("pending order {order_id} is missing from the priority index"),
            ));
            continue;
        };
        if order.eta != eta {
            errors.push(ValidationError::new(
                ValidationErrorKind::MirrorMismatch,
                format!(
                    "order {order_id}: eta index says {eta}, priority index says {}",
                    order.eta
                ),
            ));
        }

        let expected = by_priority
            .successor_of(order_id)
            .map_or(Some(order.creation_time), |ahead| ahead.release_time())
            .and_then(|start| order.delivery_duration.checked_add(start));
        if expected != Some(order.eta) {
            errors.push(ValidationError::new(
                ValidationErrorKind::ChainMismatch,
                format!(
                    "order {order_id}: stored eta {} but chain gives {expected:?}",
                    order.eta
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_tree<K: Ord, V>(name: &str, tree: &AvlTree<K, V>, errors: &mut Vec<ValidationError>) {
    let mut count = 0;
    check_subtree(name, tree.root(), &mut count, errors);
    if count != tree.len() {
        errors.push(ValidationError::new(
            ValidationErrorKind::LocatorMismatch,
            format!("{name}: {count} nodes reachable but length is {}", tree.len()),
        ));
    }

    let mut keys = tree.iter().map(|(key, _)| key);
    if let Some(mut previous) = keys.next() {
        for key in keys {
            if key <= previous {
                errors.push(ValidationError::new(
                    ValidationErrorKind::KeyOrder,
                    format!("{name}: in-order keys are not strictly ascending"),
                ));
                break;
            }
            previous = key;
        }
    }
}

/// Returns the real height of the subtree.
fn check_subtree<K, V>(
    name: &str,
    node: Option<&Node<K, V>>,
    count: &mut usize,
    errors: &mut Vec<ValidationError>,
) -> u32 {
    let Some(node) = node else {
        return 0;
    };
    *count += 1;

    let left = check_subtree(name, node.left(), count, errors);
    let right = check_subtree(name, node.right(), count, errors);
    if left.abs_diff(right) > 1 {
        errors.push(ValidationError::new(
            ValidationErrorKind::Unbalanced,
            format!("{name}: subtree heights {left} and {right}"),
        ));
    }
    let actual = 1 + left.max(right);
    if node.height() != actual {
        errors.push(ValidationError::new(
            ValidationErrorKind::StaleHeight,
            format!("{name}: cached height {} but actual {actual}", node.height()),
        ));
    }
    actual
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerConfig;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn create(order_id: OrderId, creation_time: Timestamp, delivery_duration: i64) -> Command {
        Command::CreateOrder {
            order_id,
            creation_time,
            value: 100,
            delivery_duration,
        }
    }

    #[test]
    fn test_valid_script() {
        let commands = vec![
            create(1, 0, 10),
            create(2, 3, 5),
            Command::PrintRange { time1: 0, time2: 50 },
            Command::CancelOrder {
                order_id: 2,
                current_time: 4,
            },
            Command::Quit,
        ];
        assert!(validate_commands(&commands).is_ok());
    }

    #[test]
    fn test_duplicate_create() {
        let commands = vec![create(1, 0, 10), create(1, 2, 10)];
        let errors = validate_commands(&commands).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_negative_durations() {
        let commands = vec![
            create(1, 0, -1),
            Command::UpdateTime {
                order_id: 1,
                current_time: 1,
                new_delivery_duration: -5,
            },
        ];
        let errors = validate_commands(&commands).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::NegativeDuration)
                .count(),
            2
        );
    }

    #[test]
    fn test_clock_regression() {
        let commands = vec![
            create(1, 10, 5),
            Command::CancelOrder {
                order_id: 1,
                current_time: 4,
            },
        ];
        let errors = validate_commands(&commands).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::ClockRegression));
    }

    #[test]
    fn test_inverted_range_and_trailing_commands() {
        let commands = vec![
            Command::PrintRange { time1: 9, time2: 1 },
            Command::Quit,
            Command::PrintOrder { order_id: 1 },
        ];
        let errors = validate_commands(&commands).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvertedRange));
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnreachableCommand));
    }

    #[test]
    fn test_fresh_engine_is_valid() {
        assert!(validate_engine(&SchedulerEngine::new()).is_ok());
    }

    #[test]
    fn test_update_after_delivery_breaks_chain() {
        let mut engine = SchedulerEngine::new();
        engine.create_order(1, 0, 50, 5).unwrap();
        engine.create_order(2, 6, 50, 10).unwrap();
        assert!(validate_engine(&engine).is_ok());

        // Order 1 is delivered; changing its duration leaves order 2 stale.
        engine.update_delivery_time(1, 7, 50);
        let errors = validate_engine(&engine).unwrap_err();
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::ChainMismatch));
    }

    #[test]
    fn test_random_session_keeps_invariants() {
        let mut rng = SmallRng::seed_from_u64(2024);
        let mut engine = SchedulerEngine::with_config(SchedulerConfig::default());
        let mut next_id: OrderId = 1;
        let mut now: Timestamp = 0;

        for _ in 0..600 {
            now += rng.random_range(0..4);
            let pending: Vec<OrderId> = engine
                .eta_index()
                .iter()
                .filter(|&(eta, _)| eta > now)
                .map(|(_, id)| id)
                .collect();

            let command = match rng.random_range(0..10) {
                roll @ 0..=5 => {
                    // High-value orders land among the oldest, mostly
                    // delivered, orders and go through priority repair.
                    let value = if roll == 5 {
                        (now - rng.random_range(0..=now.min(10))) * 117 + 1
                    } else {
                        rng.random_range(1..500)
                    };
                    let cmd = Command::CreateOrder {
                        order_id: next_id,
                        creation_time: now,
                        value,
                        delivery_duration: rng.random_range(1..20),
                    };
                    next_id += 1;
                    cmd
                }
                6 | 7 if !pending.is_empty() => Command::CancelOrder {
                    order_id: pending[rng.random_range(0..pending.len())],
                    current_time: now,
                },
                8 if !pending.is_empty() => Command::UpdateTime {
                    order_id: pending[rng.random_range(0..pending.len())],
                    current_time: now,
                    new_delivery_duration: rng.random_range(1..20),
                },
                _ => Command::PrintRange {
                    time1: now,
                    time2: now + 50,
                },
            };

            let events = engine.execute(&command);
            if let Err(errors) = validate_engine(&engine) {
                panic!("after {command}: {errors:?}");
            }

            // Range answers agree with a filtered full extract.
            if let Command::PrintRange { time1, time2 } = command {
                let expected: Vec<OrderId> = engine
                    .eta_index()
                    .in_order_extract()
                    .into_iter()
                    .filter(|&(eta, _)| time1 <= eta && eta <= time2)
                    .map(|(_, id)| id)
                    .collect();
                assert_eq!(engine.eta_index().range_query(time1, time2), expected);
                assert_eq!(events.len(), 1);
            }

            // A second sweep at the same clock finds nothing.
            assert!(engine.deliver_orders(engine.clock()).is_empty());
        }

        let summary = engine.summary();
        assert!(summary.created > 0);
        assert!(summary.repairs > 0);
    }
}
