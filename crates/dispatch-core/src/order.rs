//! # Order Records
//!
//! The dispatch core never owns an order's business data. Callers hand in their own
//! order type behind an `Arc`, and the core only reads the two things it needs through
//! the [`DispatchOrder`] trait: an id and a ranking value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contract an order type must satisfy to be ranked and tracked.
///
/// # Architecture Note
/// The ranking queue is generic over this trait so that the service composing the core
/// can keep whatever payload it likes (customer, restaurant, line items) on its own
/// order type. The queue reads `value()` exactly once, at insertion time.
pub trait DispatchOrder: Send + Sync + Debug + 'static {
    /// The unique identifier of this order.
    fn order_id(&self) -> &OrderId;

    /// The non-negative ranking value (the order total).
    fn value(&self) -> f64;
}

/// A ready-made order record with free-form payload fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub value: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl OrderRecord {
    /// Creates a new OrderRecord with no metadata.
    pub fn new(id: impl Into<OrderId>, value: f64) -> Self {
        Self {
            id: id.into(),
            value,
            metadata: BTreeMap::new(),
        }
    }

    /// Attaches a payload field, replacing any previous value under `key`.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl DispatchOrder for OrderRecord {
    fn order_id(&self) -> &OrderId {
        &self.id
    }

    fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_record_exposes_id_and_value() {
        let order = OrderRecord::new("order_7", 125_000.0).with_metadata("customer", "alice");
        assert_eq!(order.order_id(), &OrderId::from("order_7"));
        assert_eq!(order.value(), 125_000.0);
        assert_eq!(order.metadata.get("customer").map(String::as_str), Some("alice"));
        assert_eq!(order.id.to_string(), "order_7");
    }
}
