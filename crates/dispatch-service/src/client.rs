//! # Dispatch Client
//!
//! Provides a high‑level API for the order-management layer and the dispatch workers.
//! It forwards each inbound event to the [`DispatchActor`](crate::actor::DispatchActor)
//! and awaits the answer on a oneshot channel.

use crate::courier::CourierId;
use crate::error::ServiceError;
use crate::message::{DispatchRequest, Response};
use dispatch_core::{ActiveOrder, OrderId, OrderRecord, OrderSummary, QueueEntry, StateRecord};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Cloneable handle to the dispatch actor.
///
/// * **Cloneable** – holds only a sender, so cloning is inexpensive.
/// * **Async API** – every method resolves to `Result<…, ServiceError>`.
/// * **Lifetime** – the actor shuts down once every clone is dropped.
#[derive(Clone, Debug)]
pub struct DispatchClient {
    sender: mpsc::Sender<DispatchRequest>,
}

impl DispatchClient {
    pub fn new(sender: mpsc::Sender<DispatchRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> DispatchRequest,
    ) -> Result<T, ServiceError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| ServiceError::ActorClosed)?;
        response.await.map_err(|_| ServiceError::ActorDropped)?
    }

    /// Registers a new order: ranks it and starts its `Pending` history.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn create_order(&self, order: OrderRecord) -> Result<OrderId, ServiceError> {
        debug!(value = order.value, "Sending create_order");
        self.request(|respond_to| DispatchRequest::CreateOrder { order, respond_to })
            .await
    }

    /// Claims `order_id` for `courier_id` and moves it in transit.
    ///
    /// Fails with a lost claim ([`ServiceError::is_lost_claim`]) if the order was no
    /// longer pending.
    #[instrument(skip(self))]
    pub async fn accept_order(
        &self,
        order_id: OrderId,
        courier_id: CourierId,
    ) -> Result<StateRecord, ServiceError> {
        debug!("Sending accept_order");
        self.request(|respond_to| DispatchRequest::AcceptOrder {
            order_id,
            courier_id,
            respond_to,
        })
        .await
    }

    /// Marks the order delivered and returns its archived history.
    #[instrument(skip(self))]
    pub async fn deliver_order(&self, order_id: OrderId) -> Result<Vec<StateRecord>, ServiceError> {
        debug!("Sending deliver_order");
        self.request(|respond_to| DispatchRequest::DeliverOrder {
            order_id,
            respond_to,
        })
        .await
    }

    /// Cancels the order wherever it is and returns its archived history.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<Vec<StateRecord>, ServiceError> {
        debug!("Sending cancel_order");
        self.request(|respond_to| DispatchRequest::CancelOrder {
            order_id,
            reason,
            respond_to,
        })
        .await
    }

    /// Returns an in-transit order to the pending pool after its courier gave it back.
    #[instrument(skip(self))]
    pub async fn requeue_order(
        &self,
        order_id: OrderId,
    ) -> Result<QueueEntry<OrderRecord>, ServiceError> {
        debug!("Sending requeue_order");
        self.request(|respond_to| DispatchRequest::RequeueOrder {
            order_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, order_id: OrderId) -> Result<OrderSummary, ServiceError> {
        self.request(|respond_to| DispatchRequest::Summary {
            order_id,
            respond_to,
        })
        .await
    }

    pub async fn active_orders(&self) -> Result<Vec<ActiveOrder>, ServiceError> {
        self.request(|respond_to| DispatchRequest::ActiveOrders { respond_to })
            .await
    }

    /// The highest-priority pending order, or `Dispatch(Empty)`.
    pub async fn peek_next(&self) -> Result<QueueEntry<OrderRecord>, ServiceError> {
        self.request(|respond_to| DispatchRequest::PeekNext { respond_to })
            .await
    }

    /// Pending orders, highest priority first.
    pub async fn pending_orders(&self) -> Result<Vec<QueueEntry<OrderRecord>>, ServiceError> {
        self.request(|respond_to| DispatchRequest::PendingOrders { respond_to })
            .await
    }
}
