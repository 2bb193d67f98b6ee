//! # Dispatch Workers
//!
//! Each worker repeats one step: reserve a free courier, look at the most valuable
//! pending order, offer it, and on acceptance claim it through the
//! [`DispatchClient`]. Several workers run at once. Two of them may offer the same order
//! to different couriers; the claim decides, and the loser withdraws its offer.

use crate::client::DispatchClient;
use crate::courier::{CourierGateway, CourierId, OfferOutcome};
use crate::error::ServiceError;
use dispatch_core::{OrderId, OrderRecord, RankingQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// What a single dispatch step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No pending order or no free courier.
    Idle,
    Assigned { order_id: OrderId, courier_id: CourierId },
    Declined { order_id: OrderId, courier_id: CourierId },
    /// The courier accepted but another worker had already claimed the order.
    LostRace { order_id: OrderId, courier_id: CourierId },
}

pub struct DispatchWorker {
    id: usize,
    queue: RankingQueue<OrderRecord>,
    client: DispatchClient,
    gateway: Arc<dyn CourierGateway>,
    poll_interval: Duration,
}

impl DispatchWorker {
    pub fn new(
        id: usize,
        queue: RankingQueue<OrderRecord>,
        client: DispatchClient,
        gateway: Arc<dyn CourierGateway>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            id,
            queue,
            client,
            gateway,
            poll_interval,
        }
    }

    /// Loops until `shutdown` flips to `true` or the dispatch actor goes away.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(worker = self.id, "Worker started");

        while !*shutdown.borrow() {
            match self.dispatch_once().await {
                // a declined offer would be made again at once to the same courier
                Ok(DispatchOutcome::Idle) | Ok(DispatchOutcome::Declined { .. }) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        _ = shutdown.changed() => {}
                    }
                }
                Ok(_) => {}
                Err(ServiceError::ActorClosed) | Err(ServiceError::ActorDropped) => {
                    warn!(worker = self.id, "Dispatch actor gone, stopping");
                    break;
                }
                Err(e) => {
                    error!(worker = self.id, error = %e, "Dispatch step failed");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        info!(worker = self.id, "Worker stopped");
    }

    /// Performs one offer-and-claim attempt.
    #[instrument(skip(self), fields(worker = self.id))]
    pub async fn dispatch_once(&self) -> Result<DispatchOutcome, ServiceError> {
        if self.queue.is_empty() {
            return Ok(DispatchOutcome::Idle);
        }
        let Some(courier_id) = self.gateway.next_available().await else {
            return Ok(DispatchOutcome::Idle);
        };
        let Some(top) = self.queue.peek() else {
            self.gateway.release(&courier_id).await;
            return Ok(DispatchOutcome::Idle);
        };
        let order_id = top.order_id().clone();

        debug!(%order_id, %courier_id, priority = %top.priority, "Offering");
        if self.gateway.offer(&courier_id, &top.order).await == OfferOutcome::Declined {
            debug!(%order_id, %courier_id, "Offer declined");
            self.gateway.release(&courier_id).await;
            return Ok(DispatchOutcome::Declined {
                order_id,
                courier_id,
            });
        }

        match self
            .client
            .accept_order(order_id.clone(), courier_id.clone())
            .await
        {
            Ok(_) => Ok(DispatchOutcome::Assigned {
                order_id,
                courier_id,
            }),
            Err(e) if e.is_lost_claim() => {
                info!(%order_id, %courier_id, "Order claimed elsewhere, withdrawing offer");
                self.gateway.withdraw(&courier_id, &order_id).await;
                Ok(DispatchOutcome::LostRace {
                    order_id,
                    courier_id,
                })
            }
            Err(e) => {
                self.gateway.withdraw(&courier_id, &order_id).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::DispatchActor;
    use crate::archive::InMemoryArchive;
    use crate::mock::{create_mock_client, expect_accept, ScriptedGateway};
    use dispatch_core::{DispatchError, LifecycleTracker, OrderState};

    fn spawn_worker(
        gateway: ScriptedGateway,
    ) -> (DispatchWorker, DispatchClient, RankingQueue<OrderRecord>, LifecycleTracker) {
        let queue = RankingQueue::new();
        let tracker = LifecycleTracker::new();
        let (actor, client) = DispatchActor::new(8, queue.clone(), tracker.clone());
        tokio::spawn(actor.run(Arc::new(InMemoryArchive::new())));
        let worker = DispatchWorker::new(
            0,
            queue.clone(),
            client.clone(),
            Arc::new(gateway),
            Duration::from_millis(5),
        );
        (worker, client, queue, tracker)
    }

    #[tokio::test]
    async fn test_assigns_highest_value_order_first() {
        let gateway = ScriptedGateway::new(["c1"]);
        let (worker, client, queue, tracker) = spawn_worker(gateway.clone());
        client.create_order(OrderRecord::new("low", 10.0)).await.unwrap();
        client.create_order(OrderRecord::new("high", 80.0)).await.unwrap();

        let outcome = worker.dispatch_once().await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Assigned {
                order_id: OrderId::from("high"),
                courier_id: CourierId::from("c1"),
            }
        );
        assert_eq!(queue.size(), 1);
        assert_eq!(
            tracker.current_state(&OrderId::from("high")).unwrap(),
            OrderState::InTransit
        );
    }

    #[tokio::test]
    async fn test_idle_without_orders_or_couriers() {
        let gateway = ScriptedGateway::new(Vec::<CourierId>::new());
        let (worker, client, _, _) = spawn_worker(gateway.clone());
        assert_eq!(worker.dispatch_once().await.unwrap(), DispatchOutcome::Idle);

        client.create_order(OrderRecord::new("o1", 5.0)).await.unwrap();
        assert_eq!(worker.dispatch_once().await.unwrap(), DispatchOutcome::Idle);
        gateway.verify_offers(0);
    }

    #[tokio::test]
    async fn test_declined_offer_leaves_order_pending() {
        let gateway = ScriptedGateway::new(["c1"]);
        gateway.decline("o1");
        let (worker, client, queue, tracker) = spawn_worker(gateway.clone());
        let id = client.create_order(OrderRecord::new("o1", 5.0)).await.unwrap();

        let outcome = worker.dispatch_once().await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::Declined { .. }));
        assert!(queue.contains(&id));
        assert_eq!(tracker.current_state(&id).unwrap(), OrderState::Pending);
        assert_eq!(gateway.releases(), vec![CourierId::from("c1")]);
    }

    #[tokio::test]
    async fn test_lost_claim_withdraws_offer() {
        let gateway = ScriptedGateway::new(["c1"]);
        let queue = RankingQueue::new();
        queue.enqueue(Arc::new(OrderRecord::new("o1", 5.0)));
        let (client, mut receiver) = create_mock_client(4);
        let worker = DispatchWorker::new(
            0,
            queue,
            client,
            Arc::new(gateway.clone()),
            Duration::from_millis(5),
        );

        let step = tokio::spawn(async move { worker.dispatch_once().await });
        let (order_id, _, respond_to) = expect_accept(&mut receiver).await.unwrap();
        respond_to
            .send(Err(ServiceError::Dispatch(DispatchError::NotFound(order_id))))
            .unwrap();

        let outcome = step.await.unwrap().unwrap();
        assert!(matches!(outcome, DispatchOutcome::LostRace { .. }));
        assert_eq!(
            gateway.withdrawals(),
            vec![(CourierId::from("c1"), OrderId::from("o1"))]
        );
    }

    #[tokio::test]
    async fn test_declined_offers_back_off_between_polls() {
        let gateway = ScriptedGateway::new(["c1"]).recycling();
        gateway.decline("o1");
        let queue = RankingQueue::new();
        queue.enqueue(Arc::new(OrderRecord::new("o1", 5.0)));
        let (client, _receiver) = create_mock_client(4);
        let worker = DispatchWorker::new(
            0,
            queue,
            client,
            Arc::new(gateway.clone()),
            Duration::from_millis(50),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let offers = gateway.offers().len();
        assert!(offers >= 1, "no offer was made");
        assert!(offers <= 8, "{offers} offers in four poll intervals");
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (worker, _client, _, _) = spawn_worker(ScriptedGateway::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(shutdown_rx));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker did not stop")
            .unwrap();
    }
}
