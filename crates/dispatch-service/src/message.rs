//! # Dispatch Messages
//!
//! Requests sent from a [`DispatchClient`](crate::client::DispatchClient) to the
//! [`DispatchActor`](crate::actor::DispatchActor). Each variant is one inbound event of the
//! order-management layer, or one reporting read, and carries a oneshot channel for the
//! answer.

use crate::courier::CourierId;
use crate::error::ServiceError;
use dispatch_core::{ActiveOrder, OrderId, OrderRecord, OrderSummary, QueueEntry, StateRecord};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the dispatch actor.
pub type Response<T> = oneshot::Sender<Result<T, ServiceError>>;

#[derive(Debug)]
pub enum DispatchRequest {
    /// A new order: rank it and start its history.
    CreateOrder {
        order: OrderRecord,
        respond_to: Response<OrderId>,
    },
    /// A courier accepted an offer: claim the order and move it in transit.
    AcceptOrder {
        order_id: OrderId,
        courier_id: CourierId,
        respond_to: Response<StateRecord>,
    },
    /// The courier handed the order over.
    DeliverOrder {
        order_id: OrderId,
        respond_to: Response<Vec<StateRecord>>,
    },
    /// Cancellation, before or after a courier claimed the order.
    CancelOrder {
        order_id: OrderId,
        reason: Option<String>,
        respond_to: Response<Vec<StateRecord>>,
    },
    /// The courier gave the order back: undo the claim and rank it again.
    RequeueOrder {
        order_id: OrderId,
        respond_to: Response<QueueEntry<OrderRecord>>,
    },
    Summary {
        order_id: OrderId,
        respond_to: Response<OrderSummary>,
    },
    ActiveOrders {
        respond_to: Response<Vec<ActiveOrder>>,
    },
    /// The order a worker should offer next.
    PeekNext {
        respond_to: Response<QueueEntry<OrderRecord>>,
    },
    PendingOrders {
        respond_to: Response<Vec<QueueEntry<OrderRecord>>>,
    },
}
