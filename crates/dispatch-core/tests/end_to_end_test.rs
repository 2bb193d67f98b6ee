use dispatch_core::{DispatchError, LifecycleTracker, OrderRecord, OrderState, RankingQueue};
use std::sync::Arc;

/// Orders A, B and C flow through both components the way the order service drives them.
#[test]
fn test_highest_value_order_is_dispatched_and_archived() {
    let queue = RankingQueue::new();
    let tracker = LifecycleTracker::new();

    for (id, value) in [("A", 50_000.0), ("B", 120_000.0), ("C", 75_000.0)] {
        let order = Arc::new(OrderRecord::new(id, value));
        tracker.initialize(&order.id);
        queue.enqueue(order);
    }

    let top = queue.peek().expect("queue should not be empty");
    assert_eq!(top.order_id().as_str(), "B");

    let claimed = queue.remove_by_id(top.order_id()).unwrap();
    tracker.push(claimed.order_id(), OrderState::InTransit, None).unwrap();
    tracker.push(claimed.order_id(), OrderState::Delivered, None).unwrap();

    let history = tracker.cleanup(claimed.order_id()).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.last().map(|r| r.state), Some(OrderState::Delivered));

    let next = queue.dequeue().unwrap();
    assert_eq!(next.order_id().as_str(), "C");
    assert_eq!(next.priority.as_f64(), 75_000.0);
    assert_eq!(queue.dequeue().unwrap().order_id().as_str(), "A");
    assert!(queue.dequeue().is_none());
}

/// A cancellation before any courier claims the order touches both components, and a
/// worker that later tries to claim it must stop at the failed removal.
#[test]
fn test_cancel_while_pending_blocks_later_claim() {
    let queue = RankingQueue::new();
    let tracker = LifecycleTracker::new();
    let order = Arc::new(OrderRecord::new("D", 20_000.0));
    tracker.initialize(&order.id);
    queue.enqueue(order.clone());

    let removed = queue.remove_by_id(&order.id);
    let pushed = tracker.push(&order.id, OrderState::Cancelled, Some("customer changed mind".into()));
    assert!(removed.is_ok());
    assert!(pushed.is_ok());

    let claim = queue.remove_by_id(&order.id);
    assert_eq!(claim.unwrap_err(), DispatchError::NotFound(order.id.clone()));
    assert!(!tracker.can_transition_to(&order.id, OrderState::InTransit));
    assert!(tracker.active_orders().is_empty());
}
