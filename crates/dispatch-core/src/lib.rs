//! # Dispatch Core
//!
//! This crate provides the two in-memory building blocks of order dispatch for a
//! food-delivery platform:
//!
//! 1. **Ranking** ([`RankingQueue`]) - a max-priority pool of orders that no courier has
//!    claimed yet. The most valuable order is always on top.
//! 2. **Lifecycle** ([`LifecycleTracker`]) - one state history per order, validated
//!    against a closed state machine and stamped with the time each state was entered.
//!
//! The two components do not know about each other. The service that composes them
//! decides the order of calls (see the `dispatch-service` crate).
//!
//! ## Ownership
//!
//! Orders belong to the caller. The queue stores an `Arc<O>` for any `O:`
//! [`DispatchOrder`], reading its value once at insertion. [`OrderRecord`] is a
//! ready-made order type for callers that do not bring their own.
//!
//! Both components are cheap-to-clone handles over state behind a single
//! `parking_lot::Mutex`. There are no globals: construct one of each and pass clones to
//! whoever needs them.
//!
//! ## End to end
//!
//! ```rust
//! use dispatch_core::{LifecycleTracker, OrderRecord, OrderState, RankingQueue};
//! use std::sync::Arc;
//!
//! let queue = RankingQueue::new();
//! let tracker = LifecycleTracker::new();
//!
//! for (id, value) in [("A", 50_000.0), ("B", 120_000.0), ("C", 75_000.0)] {
//!     let order = Arc::new(OrderRecord::new(id, value));
//!     tracker.initialize(&order.id);
//!     queue.enqueue(order);
//! }
//!
//! // a courier accepts the top order: claim it, then record the transition
//! let top = queue.peek().unwrap();
//! let claimed = queue.remove_by_id(top.order_id()).unwrap();
//! tracker.push(claimed.order_id(), OrderState::InTransit, None).unwrap();
//! tracker.push(claimed.order_id(), OrderState::Delivered, None).unwrap();
//!
//! let history = tracker.cleanup(claimed.order_id()).unwrap();
//! assert_eq!(history.last().unwrap().state, OrderState::Delivered);
//! assert_eq!(queue.dequeue().unwrap().order_id().as_str(), "C");
//! ```
//!
//! ## Outcomes, not faults
//!
//! Nothing here performs I/O. Every "failure" is an expected answer and comes back as a
//! value: `None` for an empty queue, or a [`DispatchError`] (`NotFound`,
//! `InvalidTransition`, `Refused`). Callers choose whether to surface, log, or ignore it.

pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod order;
pub mod ranking;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::DispatchError;
pub use lifecycle::{ActiveOrder, LifecycleTracker, OrderHistory, OrderState, OrderSummary, StateRecord};
pub use order::{DispatchOrder, OrderId, OrderRecord};
pub use ranking::{Priority, QueueEntry, RankingHeap, RankingQueue};
