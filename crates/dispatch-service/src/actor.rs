//! # Dispatch Actor
//!
//! The single writer behind every multi-step order workflow. The ranking queue and the
//! lifecycle tracker are independent and each guards itself, but the workflows that
//! touch both (claim then transition, cancel in both places, roll back then re-rank)
//! are sequenced here, one request at a time.

use crate::archive::HistoryArchive;
use crate::client::DispatchClient;
use crate::courier::CourierId;
use crate::error::ServiceError;
use crate::message::DispatchRequest;
use dispatch_core::{
    DispatchError, LifecycleTracker, OrderId, OrderRecord, OrderState, QueueEntry, RankingQueue,
    StateRecord,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// An order a courier is carrying, kept so it can be ranked again on requeue.
#[derive(Debug)]
struct Assignment {
    order: Arc<OrderRecord>,
    courier_id: CourierId,
}

/// The "server" half of the dispatch service.
///
/// **Concurrency Model**:
/// Requests are processed sequentially from one channel, so two workflows for the same
/// order never interleave. The queue and tracker handles it holds are shared with the
/// dispatch workers, which read the queue directly.
///
/// ## Workflows
///
/// * **Create**: initialize the history, then enqueue. A duplicate id is refused.
/// * **Accept**: remove from the queue (the claim), then push `InTransit`. A failed
///   removal means another worker got there first; the tracker is not touched.
/// * **Deliver**: push `Delivered`, clean up, archive.
/// * **Cancel**: remove from the queue (best effort) *and* push `Cancelled`, then clean
///   up and archive.
/// * **Requeue**: only from `InTransit`. Pop the transition and enqueue the order again.
pub struct DispatchActor {
    receiver: mpsc::Receiver<DispatchRequest>,
    queue: RankingQueue<OrderRecord>,
    tracker: LifecycleTracker,
    assignments: HashMap<OrderId, Assignment>,
}

impl DispatchActor {
    /// Creates a new `DispatchActor` over the given components and its associated client.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - The capacity of the request channel. If the channel is full,
    ///   client calls wait until there is space.
    pub fn new(
        buffer_size: usize,
        queue: RankingQueue<OrderRecord>,
        tracker: LifecycleTracker,
    ) -> (Self, DispatchClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            queue,
            tracker,
            assignments: HashMap::new(),
        };
        (actor, DispatchClient::new(sender))
    }

    /// Runs the event loop until every client is dropped.
    ///
    /// The archive is injected here rather than at construction so the caller can wire
    /// it late.
    pub async fn run(mut self, archive: Arc<dyn HistoryArchive>) {
        info!("Dispatch actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                DispatchRequest::CreateOrder { order, respond_to } => {
                    let _ = respond_to.send(self.create_order(order));
                }
                DispatchRequest::AcceptOrder {
                    order_id,
                    courier_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.accept_order(order_id, courier_id));
                }
                DispatchRequest::DeliverOrder {
                    order_id,
                    respond_to,
                } => {
                    let result = self.deliver_order(&order_id, archive.as_ref()).await;
                    let _ = respond_to.send(result);
                }
                DispatchRequest::CancelOrder {
                    order_id,
                    reason,
                    respond_to,
                } => {
                    let result = self.cancel_order(&order_id, reason, archive.as_ref()).await;
                    let _ = respond_to.send(result);
                }
                DispatchRequest::RequeueOrder {
                    order_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.requeue_order(&order_id));
                }
                DispatchRequest::Summary {
                    order_id,
                    respond_to,
                } => {
                    debug!(%order_id, "Summary");
                    let _ = respond_to.send(self.tracker.summary(&order_id).map_err(Into::into));
                }
                DispatchRequest::ActiveOrders { respond_to } => {
                    let _ = respond_to.send(Ok(self.tracker.active_orders()));
                }
                DispatchRequest::PeekNext { respond_to } => {
                    let next = self.queue.peek().ok_or(ServiceError::Dispatch(DispatchError::Empty));
                    let _ = respond_to.send(next);
                }
                DispatchRequest::PendingOrders { respond_to } => {
                    let _ = respond_to.send(Ok(self.queue.all_sorted_by_priority()));
                }
            }
        }

        info!(
            pending = self.queue.size(),
            tracked = self.tracker.tracked_count(),
            "Shutdown"
        );
    }

    fn create_order(&mut self, order: OrderRecord) -> Result<OrderId, ServiceError> {
        debug!(?order, "CreateOrder");
        let order_id = order.id.clone();
        if !self.tracker.initialize(&order_id) {
            warn!(%order_id, "Order already exists");
            return Err(DispatchError::Refused {
                order_id,
                reason: "order already exists".into(),
            }
            .into());
        }
        self.queue.enqueue(Arc::new(order));
        Ok(order_id)
    }

    fn accept_order(
        &mut self,
        order_id: OrderId,
        courier_id: CourierId,
    ) -> Result<StateRecord, ServiceError> {
        debug!(%order_id, %courier_id, "AcceptOrder");
        let entry = self.queue.remove_by_id(&order_id).map_err(|e| {
            info!(%order_id, %courier_id, "Claim lost: order no longer pending");
            e
        })?;

        let note = Some(format!("courier {courier_id}"));
        match self.tracker.push(&order_id, OrderState::InTransit, note) {
            Ok(record) => {
                info!(%order_id, %courier_id, "Assigned");
                self.assignments.insert(
                    order_id,
                    Assignment {
                        order: entry.order,
                        courier_id,
                    },
                );
                Ok(record)
            }
            Err(e) => {
                // undo the claim so the order is not lost between the two components
                error!(%order_id, error = %e, "Claimed order could not move in transit, re-ranking");
                self.queue.enqueue(entry.order);
                Err(e.into())
            }
        }
    }

    async fn deliver_order(
        &mut self,
        order_id: &OrderId,
        archive: &dyn HistoryArchive,
    ) -> Result<Vec<StateRecord>, ServiceError> {
        debug!(%order_id, "DeliverOrder");
        // push would start a fresh history for an id the tracker already forgot
        self.tracker.current_state(order_id)?;
        self.tracker.push(order_id, OrderState::Delivered, None)?;
        self.finish(order_id, archive).await
    }

    async fn cancel_order(
        &mut self,
        order_id: &OrderId,
        reason: Option<String>,
        archive: &dyn HistoryArchive,
    ) -> Result<Vec<StateRecord>, ServiceError> {
        debug!(%order_id, ?reason, "CancelOrder");
        // both halves run even if the first fails, so neither component is orphaned
        let withdrawn = self.queue.remove_by_id(order_id).is_ok();
        let pushed = match self.tracker.current_state(order_id) {
            Ok(_) => self.tracker.push(order_id, OrderState::Cancelled, reason),
            Err(e) => Err(e),
        };

        if let Err(e) = pushed {
            warn!(%order_id, withdrawn, error = %e, "Cancel rejected");
            return Err(e.into());
        }
        info!(%order_id, withdrawn, "Cancelled");
        self.finish(order_id, archive).await
    }

    fn requeue_order(&mut self, order_id: &OrderId) -> Result<QueueEntry<OrderRecord>, ServiceError> {
        debug!(%order_id, "RequeueOrder");
        let current = self.tracker.current_state(order_id)?;
        if current != OrderState::InTransit {
            warn!(%order_id, state = %current, "Requeue rejected");
            return Err(DispatchError::InvalidTransition {
                order_id: order_id.clone(),
                from: current,
                to: OrderState::Pending,
            }
            .into());
        }
        if !self.assignments.contains_key(order_id) {
            return Err(DispatchError::NotFound(order_id.clone()).into());
        }

        self.tracker.pop(order_id)?;
        let assignment = self
            .assignments
            .remove(order_id)
            .ok_or_else(|| DispatchError::NotFound(order_id.clone()))?;
        info!(%order_id, courier_id = %assignment.courier_id, "Requeued");
        Ok(self.queue.enqueue(assignment.order))
    }

    /// Releases a terminal order from memory and archives its history.
    async fn finish(
        &mut self,
        order_id: &OrderId,
        archive: &dyn HistoryArchive,
    ) -> Result<Vec<StateRecord>, ServiceError> {
        self.assignments.remove(order_id);
        let history = self.tracker.cleanup(order_id)?;

        match archive.archive(order_id, &history).await {
            Ok(()) => {
                info!(%order_id, records = history.len(), "Archived");
                Ok(history)
            }
            Err(e) => {
                error!(%order_id, error = %e, "Archive failed");
                Err(ServiceError::Archive {
                    order_id: order_id.clone(),
                    history,
                    reason: e.to_string(),
                })
            }
        }
    }
}
