//! Order-delivery scheduling engine.
//!
//! # Algorithm
//!
//! Orders form a single delivery chain ordered by priority. The order with
//! the highest priority is at the front and anchors to its own creation time;
//! every other order waits for the order directly ahead of it (its priority
//! successor):
//!
//! ```text
//! eta(front) = duration(front) + creation_time(front)
//! eta(o)     = duration(o) + duration(ahead) + eta(ahead)
//! ```
//!
//! Any change to an order's position, duration or existence therefore
//! invalidates the ETAs of every order behind it, so each mutation ends with
//! a cascade that walks the chain backwards recomputing ETAs and mirroring
//! them into the ETA index. Each mutating command finishes with a delivery
//! sweep at the new clock.
//!
//! # Delivered orders
//!
//! A delivery sweep removes an order from the ETA index only. The order keeps
//! its place in the priority chain, so orders behind it still chain off its
//! last ETA and single-order lookups still return it.
//!
//! # Complexity
//! Create, cancel and reschedule are O(c log n) for a cascade touching c
//! orders. Range queries are O(log n + k).

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::SchedulerConfig;
use crate::error::SchedulerError;
use crate::index::{EtaIndex, PriorityIndex};
use crate::models::{Command, EtaUpdate, Event, Order, OrderId, Timestamp};

/// Running totals for one engine instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Orders accepted.
    pub created: usize,
    /// Orders canceled.
    pub canceled: usize,
    /// Orders delivered by sweeps.
    pub delivered: usize,
    /// Cancel or reschedule requests that were refused.
    pub rejected: usize,
    /// Individual ETA recomputations performed by cascades.
    pub eta_updates: usize,
    /// Priority repair steps taken.
    pub repairs: usize,
}

/// In-memory delivery scheduler.
///
/// Owns both indexes and the simulation clock. Commands run to completion
/// one at a time.
///
/// # Example
///
/// ```
/// use gator_delivery::models::Event;
/// use gator_delivery::scheduler::SchedulerEngine;
///
/// let mut engine = SchedulerEngine::new();
/// let events = engine.create_order(1, 0, 50, 10).unwrap();
/// assert_eq!(events, vec![Event::Created { order_id: 1, eta: 10 }]);
///
/// let events = engine.create_order(2, 1, 50, 10).unwrap();
/// assert_eq!(events, vec![Event::Created { order_id: 2, eta: 30 }]);
/// assert_eq!(engine.rank_of_order(2), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchedulerEngine {
    config: SchedulerConfig,
    clock: Timestamp,
    priority_index: PriorityIndex,
    eta_index: EtaIndex,
    summary: RunSummary,
}

impl SchedulerEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with a custom configuration.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current simulation clock.
    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Running totals.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// The priority chain.
    pub fn priority_index(&self) -> &PriorityIndex {
        &self.priority_index
    }

    /// Pending orders by ETA.
    pub fn eta_index(&self) -> &EtaIndex {
        &self.eta_index
    }

    /// Stored fields of an order still in the priority chain.
    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.priority_index.get(order_id)
    }

    /// Executes one command and returns its events in emission order.
    ///
    /// `Quit` reports every pending order but does not stop the engine;
    /// use [`run`](Self::run) for stop-at-quit semantics.
    pub fn execute(&mut self, command: &Command) -> Vec<Event> {
        trace!(%command, "executing");
        match *command {
            Command::CreateOrder {
                order_id,
                creation_time,
                value,
                delivery_duration,
            } => match self.create_order(order_id, creation_time, value, delivery_duration) {
                Ok(events) => events,
                Err(err) => {
                    warn!(order_id, %err, "create ignored");
                    Vec::new()
                }
            },
            Command::CancelOrder {
                order_id,
                current_time,
            } => self.cancel_order(order_id, current_time),
            Command::UpdateTime {
                order_id,
                current_time,
                new_delivery_duration,
            } => self.update_delivery_time(order_id, current_time, new_delivery_duration),
            Command::PrintOrder { order_id } => vec![self.print_order(order_id)],
            Command::PrintRange { time1, time2 } => vec![self.print_range(time1, time2)],
            Command::GetRankOfOrder { order_id } => match self.rank_of_order(order_id) {
                Some(ahead) => vec![Event::Rank { order_id, ahead }],
                None => {
                    debug!(order_id, "rank requested for an order that is not pending");
                    Vec::new()
                }
            },
            Command::Quit => self.outstanding(),
        }
    }

    /// Executes commands in order up to and including the first `Quit`.
    pub fn run<'a, I>(&mut self, commands: I) -> Vec<Event>
    where
        I: IntoIterator<Item = &'a Command>,
    {
        let mut events = Vec::new();
        for command in commands {
            events.extend(self.execute(command));
            if matches!(command, Command::Quit) {
                break;
            }
        }
        events
    }

    /// Accepts a new order.
    ///
    /// # Steps
    /// 1. Advance the clock to `creation_time`.
    /// 2. Insert into the priority chain at the configured priority.
    /// 3. Repair placement if the order ahead is an already delivered order
    ///    whose ETA has passed.
    /// 4. Compute the ETA and file it in the ETA index.
    /// 5. Cascade to every order behind it, then sweep deliveries.
    ///
    /// # Errors
    /// - [`SchedulerError::DuplicateOrder`] if the id is still tracked.
    /// - [`SchedulerError::EtaOverflow`] if the new order or any order behind
    ///   it would get an ETA past `i64::MAX`. The engine is left untouched.
    pub fn create_order(
        &mut self,
        order_id: OrderId,
        creation_time: Timestamp,
        value: i64,
        delivery_duration: i64,
    ) -> Result<Vec<Event>, SchedulerError> {
        if self.priority_index.contains(order_id) {
            return Err(SchedulerError::DuplicateOrder(order_id));
        }
        let previous_clock = self.clock;
        self.clock = creation_time;

        let priority = self.config.priority(creation_time, value);
        let order = Order::new(order_id, creation_time, value, delivery_duration);
        self.priority_index.insert(priority, order);
        let repairs = self.repair_priority(order_id);

        let mut updates = match self.plan_from(order_id) {
            Ok(updates) if !updates.is_empty() => updates,
            outcome => {
                self.priority_index.delete(order_id);
                self.clock = previous_clock;
                return Err(outcome.err().unwrap_or(SchedulerError::NotFound(order_id)));
            }
        };

        let eta = updates.remove(0).eta;
        self.priority_index.set_eta(order_id, eta);
        self.eta_index.insert(eta, order_id);
        info!(order_id, priority, eta, "order created");
        self.summary.created += 1;
        self.summary.repairs += repairs;

        let mut events = vec![Event::Created { order_id, eta }];
        events.extend(self.apply_cascade(updates));
        events.extend(self.deliver_orders(self.clock));
        Ok(events)
    }

    /// Cancels a pending order.
    ///
    /// Orders that are unknown or already due are refused with a
    /// cancellation-rejected event. Either way a delivery sweep follows.
    pub fn cancel_order(&mut self, order_id: OrderId, current_time: Timestamp) -> Vec<Event> {
        self.clock = current_time;
        let mut events = Vec::new();

        // Orders behind the canceled one chain off the order ahead of it.
        let outcome = self.pending_eta(order_id).and_then(|_| {
            let behind = self.priority_index.predecessor_of(order_id).map(|o| o.id);
            let ahead = self.priority_index.successor_of(order_id);
            self.plan_chain(behind, ahead)
        });

        match outcome {
            Ok(updates) => {
                self.eta_index.delete(order_id);
                self.priority_index.delete(order_id);
                info!(order_id, "order canceled");
                self.summary.canceled += 1;

                events.push(Event::Canceled { order_id });
                events.extend(self.apply_cascade(updates));
            }
            Err(err @ SchedulerError::EtaOverflow(_)) => {
                warn!(order_id, %err, "cancel rejected");
                self.summary.rejected += 1;
                events.push(Event::CancelRejected { order_id });
            }
            Err(err) => {
                debug!(order_id, %err, "cancel rejected");
                self.summary.rejected += 1;
                events.push(Event::CancelRejected { order_id });
            }
        }

        events.extend(self.deliver_orders(self.clock));
        events
    }

    /// Changes an order's delivery duration.
    ///
    /// The new duration is recorded on any order still in the priority
    /// chain, but ETAs are only recomputed when the order is pending. A
    /// duration that would overflow an ETA is refused and not recorded.
    pub fn update_delivery_time(
        &mut self,
        order_id: OrderId,
        current_time: Timestamp,
        new_delivery_duration: i64,
    ) -> Vec<Event> {
        self.clock = current_time;
        let mut events = Vec::new();

        let pending = self.pending_eta(order_id);
        let previous = self.priority_index.get(order_id).map(|o| o.delivery_duration);
        self.priority_index
            .set_delivery_duration(order_id, new_delivery_duration);

        match pending.and_then(|_| self.plan_from(order_id)) {
            Ok(updates) => events.extend(self.apply_cascade(updates)),
            Err(err @ SchedulerError::EtaOverflow(_)) => {
                if let Some(duration) = previous {
                    self.priority_index.set_delivery_duration(order_id, duration);
                }
                warn!(order_id, %err, "update rejected");
                self.summary.rejected += 1;
                events.push(Event::UpdateRejected { order_id });
            }
            Err(err) => {
                debug!(order_id, %err, "update rejected");
                self.summary.rejected += 1;
                events.push(Event::UpdateRejected { order_id });
            }
        }

        events.extend(self.deliver_orders(self.clock));
        events
    }

    /// Removes and reports every pending order with `eta <= current_time`.
    pub fn deliver_orders(&mut self, current_time: Timestamp) -> Vec<Event> {
        let due = self.eta_index.due(current_time);
        let mut events = Vec::with_capacity(due.len());
        for (eta, order_id) in due {
            self.eta_index.delete(order_id);
            info!(order_id, eta, "order delivered");
            self.summary.delivered += 1;
            events.push(Event::Delivered { order_id, eta });
        }
        events
    }

    /// Single-order lookup over the priority chain.
    pub fn print_order(&self, order_id: OrderId) -> Event {
        match self.priority_index.get(order_id) {
            Some(order) => Event::OrderDetails { order },
            None => Event::OrderNotFound { order_id },
        }
    }

    /// Pending orders with ETA in `[time1, time2]`.
    pub fn print_range(&self, time1: Timestamp, time2: Timestamp) -> Event {
        let order_ids = self.eta_index.range_query(time1, time2);
        if order_ids.is_empty() {
            Event::NoOrdersInRange
        } else {
            Event::OrdersInRange { order_ids }
        }
    }

    /// Number of pending orders ahead of this one in ETA order.
    pub fn rank_of_order(&self, order_id: OrderId) -> Option<usize> {
        self.eta_index.rank_of(order_id)
    }

    /// End-of-run report: every pending order, ascending ETA.
    pub fn outstanding(&self) -> Vec<Event> {
        self.eta_index
            .iter()
            .map(|(eta, order_id)| Event::Outstanding { order_id, eta })
            .collect()
    }

    /// ETA of an order that has not been reached yet.
    fn pending_eta(&self, order_id: OrderId) -> Result<Timestamp, SchedulerError> {
        let eta = self
            .eta_index
            .eta_of(order_id)
            .ok_or(SchedulerError::NotFound(order_id))?;
        if eta <= self.clock {
            return Err(SchedulerError::AlreadyResolved {
                order_id,
                eta,
                now: self.clock,
            });
        }
        Ok(eta)
    }

    /// Moves a freshly inserted order behind its predecessor while the order
    /// ahead of it is a delivered order whose ETA has already passed.
    /// Returns the number of steps taken.
    fn repair_priority(&mut self, order_id: OrderId) -> usize {
        let mut steps = 0;
        while let Some(target) = self.repair_target(order_id) {
            if steps == self.config.max_repair_steps {
                warn!(order_id, steps, "priority repair stopped at its step bound");
                break;
            }
            debug!(order_id, step = steps, priority = target, "repairing priority");
            self.priority_index.reposition(order_id, target);
            steps += 1;
        }
        steps
    }

    fn repair_target(&self, order_id: OrderId) -> Option<f64> {
        let ahead = self.priority_index.successor_of(order_id)?;
        let behind = self.priority_index.predecessor_of(order_id)?;
        let ahead_overdue = ahead.eta < self.clock && !self.eta_index.contains(ahead.id);
        ahead_overdue.then(|| behind.priority - self.config.repair_epsilon)
    }

    /// ETAs for `start` and every order behind it, chaining off the order
    /// currently ahead of `start`. Nothing is written.
    fn plan_from(&self, start: OrderId) -> Result<Vec<EtaUpdate>, SchedulerError> {
        let ahead = self.priority_index.successor_of(start);
        self.plan_chain(Some(start), ahead)
    }

    /// Walks the chain backwards from `cursor`, treating `ahead` as the order
    /// in front of it.
    ///
    /// # Errors
    /// [`SchedulerError::EtaOverflow`] for the first order whose ETA does not
    /// fit in a [`Timestamp`].
    fn plan_chain(
        &self,
        mut cursor: Option<OrderId>,
        mut ahead: Option<Order>,
    ) -> Result<Vec<EtaUpdate>, SchedulerError> {
        let mut updates = Vec::new();
        while let Some(order_id) = cursor {
            let order = self
                .priority_index
                .get(order_id)
                .ok_or(SchedulerError::NotFound(order_id))?;
            let start = match ahead {
                Some(ahead) => ahead.release_time(),
                None => Some(order.creation_time),
            };
            let eta = start
                .and_then(|start| order.delivery_duration.checked_add(start))
                .ok_or(SchedulerError::EtaOverflow(order_id))?;
            updates.push(EtaUpdate { order_id, eta });
            ahead = Some(order.with_eta(eta));
            cursor = self.priority_index.predecessor_of(order_id).map(|o| o.id);
        }
        Ok(updates)
    }

    /// Stores planned ETAs in both indexes.
    fn apply_cascade(&mut self, updates: Vec<EtaUpdate>) -> Option<Event> {
        let first = updates.first()?.order_id;
        for update in &updates {
            self.priority_index.set_eta(update.order_id, update.eta);
            if !self.eta_index.reschedule(update.order_id, update.eta) {
                debug!(
                    order_id = update.order_id,
                    eta = update.eta,
                    "cascade reached an order that is no longer pending"
                );
            }
        }

        debug!(start = first, touched = updates.len(), "eta cascade");
        self.summary.eta_updates += updates.len();
        Some(Event::EtasUpdated { updates })
    }
}
