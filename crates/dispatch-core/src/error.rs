//! # Dispatch Errors
//!
//! This module defines the outcome taxonomy shared by the ranking queue and the
//! lifecycle tracker. None of these are faults: the core performs no I/O, so every
//! variant describes an expected answer to a well-formed question.

use crate::lifecycle::OrderState;
use crate::order::OrderId;

/// Errors reported by the dispatch core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The ranking queue holds no entries.
    #[error("Ranking queue is empty")]
    Empty,

    /// The order id is unknown to the component that was asked.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The requested state change is not in the transition table.
    #[error("Invalid transition for {order_id}: {from} -> {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderState,
        to: OrderState,
    },

    /// A well-formed request that policy disallows.
    #[error("Refused for {order_id}: {reason}")]
    Refused { order_id: OrderId, reason: String },
}

impl DispatchError {
    pub(crate) fn refused(order_id: &OrderId, reason: impl Into<String>) -> Self {
        DispatchError::Refused {
            order_id: order_id.clone(),
            reason: reason.into(),
        }
    }
}
