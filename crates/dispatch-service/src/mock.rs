//! # Test Doubles
//!
//! Two seams can be faked without spawning anything real:
//!
//! | Seam | Double | Use Case |
//! |------|--------|----------|
//! | [`DispatchClient`] | [`create_mock_client`] + `expect_*` | Testing worker logic against scripted actor answers |
//! | [`CourierGateway`] | [`ScriptedGateway`] | Declines, lost races, offer bookkeeping |
//!
//! ## Scripting the actor
//!
//! The client sends to a channel you hold. Pull the next request off it, assert on the
//! payload, and answer through its responder:
//!
//! ```rust
//! use dispatch_core::{DispatchError, OrderId};
//! use dispatch_service::courier::CourierId;
//! use dispatch_service::error::ServiceError;
//! use dispatch_service::mock::{create_mock_client, expect_accept};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (client, mut receiver) = create_mock_client(4);
//!     let call = tokio::spawn(async move {
//!         client.accept_order(OrderId::from("o1"), CourierId::from("c1")).await
//!     });
//!
//!     let (order_id, _courier, respond_to) = expect_accept(&mut receiver).await.unwrap();
//!     respond_to
//!         .send(Err(ServiceError::Dispatch(DispatchError::NotFound(order_id))))
//!         .unwrap();
//!
//!     assert!(call.await.unwrap().unwrap_err().is_lost_claim());
//! }
//! ```

use crate::client::DispatchClient;
use crate::courier::{CourierGateway, CourierId, OfferOutcome};
use crate::message::{DispatchRequest, Response};
use async_trait::async_trait;
use dispatch_core::{OrderId, OrderRecord, StateRecord};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates a client wired to a receiver the test controls.
pub fn create_mock_client(buffer_size: usize) -> (DispatchClient, mpsc::Receiver<DispatchRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (DispatchClient::new(sender), receiver)
}

/// Helper to verify that the next message is a CreateOrder request
pub async fn expect_create(
    receiver: &mut mpsc::Receiver<DispatchRequest>,
) -> Option<(OrderRecord, Response<OrderId>)> {
    match receiver.recv().await {
        Some(DispatchRequest::CreateOrder { order, respond_to }) => Some((order, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an AcceptOrder request
pub async fn expect_accept(
    receiver: &mut mpsc::Receiver<DispatchRequest>,
) -> Option<(OrderId, CourierId, Response<StateRecord>)> {
    match receiver.recv().await {
        Some(DispatchRequest::AcceptOrder {
            order_id,
            courier_id,
            respond_to,
        }) => Some((order_id, courier_id, respond_to)),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Script {
    available: VecDeque<CourierId>,
    recycle: bool,
    declines: HashSet<OrderId>,
    offers: Vec<(CourierId, OrderId)>,
    releases: Vec<CourierId>,
    withdrawals: Vec<(CourierId, OrderId)>,
}

/// A [`CourierGateway`] that records every call.
///
/// Couriers are handed out once each, in order. Released or withdrawn couriers are not
/// handed out again unless the gateway is built with [`recycling`](Self::recycling).
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    pub fn new<I, C>(couriers: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CourierId>,
    {
        let script = Script {
            available: couriers.into_iter().map(Into::into).collect(),
            ..Script::default()
        };
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }

    /// Released and withdrawn couriers go back to the end of the roster.
    pub fn recycling(self) -> Self {
        self.script.lock().recycle = true;
        self
    }

    /// Every courier will decline `order_id`.
    pub fn decline(&self, order_id: impl Into<OrderId>) -> &Self {
        self.script.lock().declines.insert(order_id.into());
        self
    }

    pub fn offers(&self) -> Vec<(CourierId, OrderId)> {
        self.script.lock().offers.clone()
    }

    pub fn releases(&self) -> Vec<CourierId> {
        self.script.lock().releases.clone()
    }

    pub fn withdrawals(&self) -> Vec<(CourierId, OrderId)> {
        self.script.lock().withdrawals.clone()
    }

    /// Panics unless exactly `expected` offers were made.
    pub fn verify_offers(&self, expected: usize) {
        let offers = self.script.lock().offers.len();
        if offers != expected {
            panic!("Expected {expected} offers, saw {offers}");
        }
    }
}

#[async_trait]
impl CourierGateway for ScriptedGateway {
    async fn next_available(&self) -> Option<CourierId> {
        self.script.lock().available.pop_front()
    }

    async fn offer(&self, courier: &CourierId, order: &OrderRecord) -> OfferOutcome {
        let mut script = self.script.lock();
        script.offers.push((courier.clone(), order.id.clone()));
        if script.declines.contains(&order.id) {
            OfferOutcome::Declined
        } else {
            OfferOutcome::Accepted
        }
    }

    async fn release(&self, courier: &CourierId) {
        let mut script = self.script.lock();
        script.releases.push(courier.clone());
        if script.recycle {
            script.available.push_back(courier.clone());
        }
    }

    async fn withdraw(&self, courier: &CourierId, order_id: &OrderId) {
        let mut script = self.script.lock();
        script.withdrawals.push((courier.clone(), order_id.clone()));
        if script.recycle {
            script.available.push_back(courier.clone());
        }
    }
}
