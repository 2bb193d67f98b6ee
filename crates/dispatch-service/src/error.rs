//! Error types for the dispatch service.

use dispatch_core::{DispatchError, OrderId, StateRecord};
use thiserror::Error;

/// Errors surfaced by the dispatch actor and its client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    /// The actor's request channel is closed.
    #[error("Dispatch actor closed")]
    ActorClosed,

    /// The actor dropped the response channel before answering.
    #[error("Dispatch actor dropped response channel")]
    ActorDropped,

    /// The ranking queue or lifecycle tracker answered with an error.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The order was released from memory but the archive rejected its history.
    /// The history is carried here so the caller can retry persisting it.
    #[error("Archive failed for {order_id}: {reason}")]
    Archive {
        order_id: OrderId,
        history: Vec<StateRecord>,
        reason: String,
    },

    /// A background task panicked or was aborted.
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl ServiceError {
    /// True when the order was not in the pending pool, i.e. another worker claimed it.
    pub fn is_lost_claim(&self) -> bool {
        matches!(self, ServiceError::Dispatch(DispatchError::NotFound(_)))
    }
}
