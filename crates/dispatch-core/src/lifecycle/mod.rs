//! Per-order state machine with a full audit trail.
//!
//! - [`OrderState`] and its closed transition table
//! - [`OrderHistory`] - the non-empty, append-only record sequence of one order
//! - [`LifecycleTracker`] - shared handle over every tracked order

pub mod history;
pub mod state;
pub mod tracker;

pub use history::*;
pub use state::*;
pub use tracker::*;
