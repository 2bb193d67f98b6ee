use crate::actor::DispatchActor;
use crate::archive::HistoryArchive;
use crate::client::DispatchClient;
use crate::config::{ConfigError, DispatchConfig};
use crate::courier::CourierGateway;
use crate::error::ServiceError;
use crate::worker::DispatchWorker;
use dispatch_core::{LifecycleTracker, OrderRecord, RankingQueue};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The running dispatch service.
///
/// `DispatchSystem` is responsible for:
/// - **Construction**: building the queue and tracker from [`DispatchConfig`]
/// - **Wiring**: injecting the archive into the actor and the gateway into each worker
/// - **Lifecycle**: starting every task and stopping them in order
///
/// # Example
///
/// ```ignore
/// let system = DispatchSystem::new(config, Arc::new(pool), Arc::new(archive))?;
/// let id = system.client().create_order(OrderRecord::new("A", 500.0)).await?;
/// system.shutdown().await?;
/// ```
pub struct DispatchSystem {
    client: DispatchClient,
    queue: RankingQueue<OrderRecord>,
    tracker: LifecycleTracker,
    shutdown: watch::Sender<bool>,
    actor_handle: JoinHandle<()>,
    worker_handles: Vec<JoinHandle<()>>,
}

impl DispatchSystem {
    /// Validates `config` and starts the actor plus `worker_count` workers.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(
        config: DispatchConfig,
        gateway: Arc<dyn CourierGateway>,
        archive: Arc<dyn HistoryArchive>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let queue = RankingQueue::with_precision(config.priority_decimals);
        let tracker = LifecycleTracker::new();

        let (actor, client) = DispatchActor::new(config.channel_buffer, queue.clone(), tracker.clone());
        let actor_handle = tokio::spawn(actor.run(archive));

        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker_handles = (0..config.worker_count)
            .map(|id| {
                let worker = DispatchWorker::new(
                    id,
                    queue.clone(),
                    client.clone(),
                    gateway.clone(),
                    config.poll_interval(),
                );
                tokio::spawn(worker.run(shutdown_rx.clone()))
            })
            .collect();

        info!(
            workers = config.worker_count,
            decimals = config.priority_decimals,
            "Dispatch system started"
        );

        Ok(Self {
            client,
            queue,
            tracker,
            shutdown,
            actor_handle,
            worker_handles,
        })
    }

    /// Client for order-management events and reporting.
    pub fn client(&self) -> &DispatchClient {
        &self.client
    }

    pub fn queue(&self) -> &RankingQueue<OrderRecord> {
        &self.queue
    }

    pub fn tracker(&self) -> &LifecycleTracker {
        &self.tracker
    }

    /// Stops the workers, then the actor.
    ///
    /// Returns [`ServiceError::TaskFailed`] if any task panicked; the remaining tasks
    /// are still awaited.
    pub async fn shutdown(self) -> Result<(), ServiceError> {
        info!("Shutting down dispatch system");
        // Receivers may already be gone if every worker exited on its own.
        let _ = self.shutdown.send(true);

        let mut failure = None;
        for handle in self.worker_handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task failed");
                failure.get_or_insert(ServiceError::TaskFailed(e.to_string()));
            }
        }

        drop(self.client);
        if let Err(e) = self.actor_handle.await {
            error!(error = %e, "Dispatch actor task failed");
            failure.get_or_insert(ServiceError::TaskFailed(e.to_string()));
        }

        match failure {
            Some(e) => Err(e),
            None => {
                info!("Dispatch system stopped");
                Ok(())
            }
        }
    }
}
