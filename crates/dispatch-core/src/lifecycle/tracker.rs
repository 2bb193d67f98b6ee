//! # Lifecycle Tracker
//!
//! One [`OrderHistory`] per order id, all behind a single lock. Every state change goes
//! through [`LifecycleTracker::push`], which checks the transition table in
//! [`OrderState::can_transition_to`] and either appends a stamped [`StateRecord`] or
//! reports [`DispatchError::InvalidTransition`] with the history untouched.
//!
//! Histories stay in memory until [`LifecycleTracker::cleanup`] hands the final history
//! of a terminal order back to the caller. Nothing survives the process; archiving the
//! returned history is the caller's job.

use crate::clock::{elapsed_between, Clock, SystemClock};
use crate::error::DispatchError;
use crate::lifecycle::{OrderHistory, OrderState, StateRecord};
use crate::order::OrderId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Read-only composite view of one order, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub current_state: OrderState,
    pub total_elapsed: Duration,
    /// History length minus one.
    pub transition_count: usize,
    pub time_in_current_state: Duration,
    pub history: Vec<StateRecord>,
}

/// A non-terminal order as seen by a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveOrder {
    pub order_id: OrderId,
    pub state: OrderState,
    pub time_in_state: Duration,
}

/// Cloneable handle to the shared per-order state histories.
///
/// ```rust
/// use dispatch_core::{LifecycleTracker, OrderId, OrderState};
///
/// let tracker = LifecycleTracker::new();
/// let id = OrderId::from("B");
/// tracker.initialize(&id);
/// tracker.push(&id, OrderState::InTransit, None).unwrap();
/// tracker.push(&id, OrderState::Delivered, None).unwrap();
///
/// let history = tracker.cleanup(&id).unwrap();
/// assert_eq!(history.len(), 3);
/// assert!(tracker.current_state(&id).is_err());
/// ```
#[derive(Clone)]
pub struct LifecycleTracker {
    histories: Arc<Mutex<HashMap<OrderId, OrderHistory>>>,
    clock: Arc<dyn Clock>,
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            histories: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Starts a `Pending` history for `order_id`. See [`initialize_with`](Self::initialize_with).
    pub fn initialize(&self, order_id: &OrderId) -> bool {
        self.initialize_with(order_id, OrderState::Pending)
    }

    /// Starts a history for `order_id` at `initial`.
    ///
    /// Returns `false` and leaves the existing history alone if the order is already
    /// tracked.
    pub fn initialize_with(&self, order_id: &OrderId, initial: OrderState) -> bool {
        let mut histories = self.histories.lock();
        if histories.contains_key(order_id) {
            debug!(%order_id, "Initialize: already tracked");
            return false;
        }
        histories.insert(order_id.clone(), OrderHistory::new(initial, self.clock.now()));
        info!(%order_id, state = %initial, tracked = histories.len(), "Initialized");
        true
    }

    /// Moves `order_id` to `new_state` if the transition table allows it.
    ///
    /// An unknown order is first initialized to `Pending`, and that initialization stays
    /// even if the transition is then rejected. A rejected transition appends nothing.
    pub fn push(
        &self,
        order_id: &OrderId,
        new_state: OrderState,
        note: Option<String>,
    ) -> Result<StateRecord, DispatchError> {
        let now = self.clock.now();
        let mut histories = self.histories.lock();
        let history = histories.entry(order_id.clone()).or_insert_with(|| {
            debug!(%order_id, "Push: implicit initialization");
            OrderHistory::new(OrderState::Pending, now)
        });

        let current = history.current().state;
        if !current.can_transition_to(new_state) {
            warn!(%order_id, from = %current, to = %new_state, "Invalid transition");
            return Err(DispatchError::InvalidTransition {
                order_id: order_id.clone(),
                from: current,
                to: new_state,
            });
        }

        let record = history.append(new_state, now, note).clone();
        info!(%order_id, from = %current, to = %new_state, seq = record.sequence_number, "Transitioned");
        Ok(record)
    }

    /// The most recent record.
    pub fn peek(&self, order_id: &OrderId) -> Result<StateRecord, DispatchError> {
        self.read(order_id, |h| h.current().clone())
    }

    /// Rolls back the most recent transition.
    ///
    /// The initial record is never removed: a history with a single record is
    /// [`DispatchError::Refused`].
    pub fn pop(&self, order_id: &OrderId) -> Result<StateRecord, DispatchError> {
        let mut histories = self.histories.lock();
        let history = histories
            .get_mut(order_id)
            .ok_or_else(|| DispatchError::NotFound(order_id.clone()))?;

        match history.rollback() {
            Some(record) => {
                info!(%order_id, removed = %record.state, now = %history.current().state, "Rolled back");
                Ok(record)
            }
            None => {
                warn!(%order_id, "Pop refused: only the initial state remains");
                Err(DispatchError::refused(order_id, "initial state cannot be popped"))
            }
        }
    }

    /// Snapshot of every record, oldest first.
    pub fn history(&self, order_id: &OrderId) -> Result<Vec<StateRecord>, DispatchError> {
        self.read(order_id, OrderHistory::to_vec)
    }

    pub fn current_state(&self, order_id: &OrderId) -> Result<OrderState, DispatchError> {
        self.read(order_id, |h| h.current().state)
    }

    /// Whether [`push`](Self::push) would accept `candidate` right now.
    ///
    /// An unknown order is judged from `Pending`, matching what `push` would do.
    pub fn can_transition_to(&self, order_id: &OrderId, candidate: OrderState) -> bool {
        let current = self
            .histories
            .lock()
            .get(order_id)
            .map(|h| h.current().state)
            .unwrap_or(OrderState::Pending);
        current.can_transition_to(candidate)
    }

    /// Time since the most recent transition.
    pub fn time_in_current_state(&self, order_id: &OrderId) -> Result<Duration, DispatchError> {
        let now = self.clock.now();
        self.read(order_id, |h| elapsed_between(h.current().timestamp, now))
    }

    /// Time since the initial state was entered.
    pub fn total_elapsed_time(&self, order_id: &OrderId) -> Result<Duration, DispatchError> {
        let now = self.clock.now();
        self.read(order_id, |h| elapsed_between(h.initial().timestamp, now))
    }

    pub fn summary(&self, order_id: &OrderId) -> Result<OrderSummary, DispatchError> {
        let now = self.clock.now();
        self.read(order_id, |h| summarize(order_id, h, now))
    }

    /// Releases a terminal order and returns its final history.
    ///
    /// Orders that can still move are [`DispatchError::Refused`] and stay tracked.
    pub fn cleanup(&self, order_id: &OrderId) -> Result<Vec<StateRecord>, DispatchError> {
        let mut histories = self.histories.lock();
        let current = histories
            .get(order_id)
            .map(|h| h.current().state)
            .ok_or_else(|| DispatchError::NotFound(order_id.clone()))?;

        if !current.is_terminal() {
            warn!(%order_id, state = %current, "Cleanup refused: not terminal");
            return Err(DispatchError::refused(
                order_id,
                format!("order is still {current}"),
            ));
        }

        let history = histories
            .remove(order_id)
            .ok_or_else(|| DispatchError::NotFound(order_id.clone()))?;
        info!(%order_id, state = %current, records = history.record_count(), tracked = histories.len(), "Cleaned up");
        Ok(history.to_vec())
    }

    /// Every non-terminal order, longest in its current state first.
    pub fn active_orders(&self) -> Vec<ActiveOrder> {
        let now = self.clock.now();
        let mut active: Vec<ActiveOrder> = self
            .histories
            .lock()
            .iter()
            .filter(|(_, h)| !h.current().state.is_terminal())
            .map(|(id, h)| ActiveOrder {
                order_id: id.clone(),
                state: h.current().state,
                time_in_state: elapsed_between(h.current().timestamp, now),
            })
            .collect();
        active.sort_by(|a, b| {
            b.time_in_state
                .cmp(&a.time_in_state)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        active
    }

    /// Number of orders with a history, terminal or not.
    pub fn tracked_count(&self) -> usize {
        self.histories.lock().len()
    }

    fn read<T>(
        &self,
        order_id: &OrderId,
        f: impl FnOnce(&OrderHistory) -> T,
    ) -> Result<T, DispatchError> {
        self.histories
            .lock()
            .get(order_id)
            .map(f)
            .ok_or_else(|| DispatchError::NotFound(order_id.clone()))
    }
}

fn summarize(order_id: &OrderId, history: &OrderHistory, now: DateTime<Utc>) -> OrderSummary {
    OrderSummary {
        order_id: order_id.clone(),
        current_state: history.current().state,
        total_elapsed: elapsed_between(history.initial().timestamp, now),
        transition_count: history.transition_count(),
        time_in_current_state: elapsed_between(history.current().timestamp, now),
        history: history.to_vec(),
    }
}
