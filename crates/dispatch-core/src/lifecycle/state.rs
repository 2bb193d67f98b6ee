//! Order states and the closed transition table.
//!
//! ```text
//!  ┌─────────┐  courier accepts  ┌───────────┐  handed over  ┌───────────┐
//!  │ Pending │──────────────────▶│ InTransit │──────────────▶│ Delivered │
//!  └────┬────┘                   └─────┬─────┘               └───────────┘
//!       │ cancel                       │ cancel                (terminal)
//!       │          ┌───────────┐       │
//!       └─────────▶│ Cancelled │◀──────┘
//!                  └───────────┘
//!                   (terminal)
//! ```
//!
//! Any pair not drawn above is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Where an order is in its delivery lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// Created and waiting for a courier. The initial state.
    #[default]
    Pending,
    /// Claimed by a courier and on its way.
    InTransit,
    /// Handed to the customer.
    Delivered,
    /// Withdrawn before delivery.
    Cancelled,
}

impl OrderState {
    pub const ALL: [OrderState; 4] = [
        OrderState::Pending,
        OrderState::InTransit,
        OrderState::Delivered,
        OrderState::Cancelled,
    ];

    /// States reachable from `self` in one step.
    pub fn allowed_next(self) -> &'static [OrderState] {
        match self {
            OrderState::Pending => &[OrderState::InTransit, OrderState::Cancelled],
            OrderState::InTransit => &[OrderState::Delivered, OrderState::Cancelled],
            OrderState::Delivered | OrderState::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderState) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Cancelled)
    }
}

impl Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderState::Pending => "Pending",
            OrderState::InTransit => "InTransit",
            OrderState::Delivered => "Delivered",
            OrderState::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// One entry in an order's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub state: OrderState,
    /// When the state was entered.
    pub timestamp: DateTime<Utc>,
    /// 1-based position within the order's history.
    pub sequence_number: u32,
    /// Caller-supplied annotation, e.g. a cancellation reason.
    pub note: Option<String>,
}
