//! Demo run: three orders, two couriers, every order delivered and archived.
//!
//! ```bash
//! RUST_LOG=info cargo run -p dispatch-service -- dispatch.toml
//! ```

use dispatch_core::{OrderId, OrderRecord, OrderState};
use dispatch_service::archive::InMemoryArchive;
use dispatch_service::config::DispatchConfig;
use dispatch_service::courier::CourierPool;
use dispatch_service::runtime::{setup_tracing, DispatchSystem};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => DispatchConfig::from_file(&path).map_err(|e| e.to_string())?,
        None => DispatchConfig::default(),
    };
    info!(?config, "Starting dispatch demo");

    let pool = CourierPool::new(["courier-1", "courier-2"]);
    let archive = InMemoryArchive::new();
    let system = DispatchSystem::new(config, Arc::new(pool.clone()), Arc::new(archive.clone()))
        .map_err(|e| e.to_string())?;

    let orders = [("A", 50_000.0), ("B", 120_000.0), ("C", 75_000.0)];
    for (id, value) in orders {
        system
            .client()
            .create_order(OrderRecord::new(id, value))
            .await
            .map_err(|e| e.to_string())?;
    }

    let span = tracing::info_span!("deliveries");
    let run = async {
        while archive.len() < orders.len() {
            for (courier, order_id) in pool.assignments() {
                // The courier may have accepted before the claim went through.
                if system.tracker().current_state(&order_id) != Ok(OrderState::InTransit) {
                    continue;
                }
                let history = system
                    .client()
                    .deliver_order(order_id.clone())
                    .await
                    .map_err(|e| e.to_string())?;
                pool.complete(&courier);
                info!(%order_id, %courier, records = history.len(), "Delivered");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Ok::<(), String>(())
    }
    .instrument(span);

    tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .map_err(|_| "Timed out waiting for deliveries".to_string())??;

    for (id, _) in orders {
        let order_id = OrderId::from(id);
        if let Some(history) = archive.get(&order_id) {
            let states: Vec<String> = history.iter().map(|r| r.state.to_string()).collect();
            info!(%order_id, path = %states.join(" -> "), "Archived history");
        }
    }

    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Dispatch demo completed");
    Ok(())
}
