//! # Courier Gateway
//!
//! Couriers live outside the dispatch core. Workers reach them through
//! [`CourierGateway`]: find one who is free, offer them an order, and either confirm
//! the assignment or take the offer back.

use async_trait::async_trait;
use dispatch_core::{OrderId, OrderRecord};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

/// Type-safe identifier for Couriers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourierId(pub String);

impl From<&str> for CourierId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for CourierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A courier's answer to an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    Accepted,
    Declined,
}

/// Availability and offer channel to couriers.
///
/// A courier handed out by [`next_available`](Self::next_available) is reserved until
/// the worker either gets an acceptance it can claim, or hands the courier back with
/// [`release`](Self::release) or [`withdraw`](Self::withdraw).
#[async_trait]
pub trait CourierGateway: Send + Sync + 'static {
    /// Reserves a free courier, if any.
    async fn next_available(&self) -> Option<CourierId>;

    /// Offers `order` to a reserved courier.
    async fn offer(&self, courier: &CourierId, order: &OrderRecord) -> OfferOutcome;

    /// Returns a reserved courier to the pool without an assignment.
    async fn release(&self, courier: &CourierId);

    /// Takes back an accepted offer whose order another worker claimed first.
    /// The courier becomes free again.
    async fn withdraw(&self, courier: &CourierId, order_id: &OrderId);
}

#[derive(Debug, Default)]
struct PoolState {
    available: VecDeque<CourierId>,
    reserved: Vec<CourierId>,
    assignments: HashMap<CourierId, OrderId>,
}

/// In-memory courier roster where every courier accepts every offer.
#[derive(Debug, Clone, Default)]
pub struct CourierPool {
    state: Arc<Mutex<PoolState>>,
}

impl CourierPool {
    pub fn new<I, C>(couriers: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CourierId>,
    {
        let state = PoolState {
            available: couriers.into_iter().map(Into::into).collect(),
            ..PoolState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Current courier → order assignments, sorted by courier.
    pub fn assignments(&self) -> Vec<(CourierId, OrderId)> {
        let mut list: Vec<_> = self
            .state
            .lock()
            .assignments
            .iter()
            .map(|(c, o)| (c.clone(), o.clone()))
            .collect();
        list.sort();
        list
    }

    pub fn available_count(&self) -> usize {
        self.state.lock().available.len()
    }

    /// Frees `courier` after its delivery is finished. Returns the order it carried.
    pub fn complete(&self, courier: &CourierId) -> Option<OrderId> {
        let mut state = self.state.lock();
        let order_id = state.assignments.remove(courier)?;
        state.available.push_back(courier.clone());
        Some(order_id)
    }
}

#[async_trait]
impl CourierGateway for CourierPool {
    async fn next_available(&self) -> Option<CourierId> {
        let mut state = self.state.lock();
        let courier = state.available.pop_front()?;
        state.reserved.push(courier.clone());
        Some(courier)
    }

    async fn offer(&self, courier: &CourierId, order: &OrderRecord) -> OfferOutcome {
        let mut state = self.state.lock();
        state.reserved.retain(|c| c != courier);
        state.assignments.insert(courier.clone(), order.id.clone());
        debug!(%courier, order_id = %order.id, "Offer accepted");
        OfferOutcome::Accepted
    }

    async fn release(&self, courier: &CourierId) {
        let mut state = self.state.lock();
        state.reserved.retain(|c| c != courier);
        state.available.push_back(courier.clone());
    }

    async fn withdraw(&self, courier: &CourierId, order_id: &OrderId) {
        let mut state = self.state.lock();
        if state.assignments.get(courier) == Some(order_id) {
            state.assignments.remove(courier);
        }
        state.available.push_back(courier.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_cycles_couriers_through_assignment() {
        let pool = CourierPool::new(["c1", "c2"]);
        let order = OrderRecord::new("o1", 10.0);

        let courier = pool.next_available().await.unwrap();
        assert_eq!(courier, CourierId::from("c1"));
        assert_eq!(pool.offer(&courier, &order).await, OfferOutcome::Accepted);
        assert_eq!(pool.assignments(), vec![(courier.clone(), OrderId::from("o1"))]);
        assert_eq!(pool.available_count(), 1);

        assert_eq!(pool.complete(&courier), Some(OrderId::from("o1")));
        assert_eq!(pool.available_count(), 2);
        assert!(pool.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_frees_courier() {
        let pool = CourierPool::new(["c1"]);
        let courier = pool.next_available().await.unwrap();
        assert!(pool.next_available().await.is_none());

        pool.offer(&courier, &OrderRecord::new("o1", 1.0)).await;
        pool.withdraw(&courier, &OrderId::from("o1")).await;

        assert!(pool.assignments().is_empty());
        assert_eq!(pool.next_available().await, Some(courier));
    }
}
