use dispatch_core::{DispatchError, OrderId, OrderRecord, RankingQueue};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn order(id: impl Into<String>, value: f64) -> Arc<OrderRecord> {
    Arc::new(OrderRecord::new(id.into(), value))
}

/// Deterministic pseudo-random sequence so the mixed-operation test is repeatable.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

#[test]
fn test_dequeue_returns_max_first() {
    let queue = RankingQueue::new();
    for (i, value) in [30.0, 90.0, 10.0, 90.0, 50.0].into_iter().enumerate() {
        queue.enqueue(order(format!("o{i}"), value));
    }

    let mut priorities = Vec::new();
    while let Some(entry) = queue.dequeue() {
        priorities.push(entry.priority.as_f64());
    }
    assert_eq!(priorities, vec![90.0, 90.0, 50.0, 30.0, 10.0]);
}

#[test]
fn test_round_trip_returns_every_order_once() {
    let queue = RankingQueue::new();
    let n = 200;
    for i in 0..n {
        queue.enqueue(order(format!("order_{i}"), ((i * 37) % 101) as f64));
    }
    assert_eq!(queue.size(), n);

    let mut seen = HashSet::new();
    for _ in 0..n {
        let entry = queue.dequeue().expect("queue drained early");
        assert!(seen.insert(entry.order_id().clone()), "duplicate {}", entry.order_id());
    }
    assert_eq!(seen.len(), n);
    assert!(queue.is_empty());
}

#[test]
fn test_heap_invariant_under_mixed_operations() {
    let queue = RankingQueue::new();
    let mut rng = Lcg(42);
    let mut live: Vec<OrderId> = Vec::new();

    for step in 0..2_000 {
        match rng.next() % 4 {
            0 | 1 => {
                let id = format!("o{step}");
                queue.enqueue(order(id.clone(), (rng.next() % 10_000) as f64 / 100.0));
                live.push(OrderId::from(id));
            }
            2 => {
                if let Some(entry) = queue.dequeue() {
                    live.retain(|id| id != entry.order_id());
                }
            }
            _ => {
                if !live.is_empty() {
                    let idx = (rng.next() as usize) % live.len();
                    let id = live.swap_remove(idx);
                    queue.remove_by_id(&id).expect("live order must be removable");
                }
            }
        }
        assert!(queue.is_consistent(), "heap broken at step {step}");
        assert_eq!(queue.size(), live.len());
    }
}

#[test]
fn test_all_sorted_by_priority_is_a_snapshot() {
    let queue = RankingQueue::new();
    queue.enqueue(order("A", 50_000.0));
    queue.enqueue(order("B", 120_000.0));
    queue.enqueue(order("C", 75_000.0));

    let snapshot = queue.all_sorted_by_priority();
    let ranked: Vec<_> = snapshot
        .iter()
        .map(|e| (e.order_id().to_string(), e.priority.as_f64()))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("B".to_string(), 120_000.0),
            ("C".to_string(), 75_000.0),
            ("A".to_string(), 50_000.0),
        ]
    );
    assert_eq!(queue.size(), 3);
}

#[test]
fn test_concurrent_claims_have_one_winner() {
    let queue = RankingQueue::new();
    for i in 0..50 {
        queue.enqueue(order(format!("o{i}"), i as f64));
    }

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || {
                let mut won = Vec::new();
                for i in 0..50 {
                    let id = OrderId::from(format!("o{i}"));
                    match queue.remove_by_id(&id) {
                        Ok(entry) => won.push(entry.order_id().clone()),
                        Err(DispatchError::NotFound(_)) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                won
            })
        })
        .collect();

    let mut claimed = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(claimed.insert(id), "order claimed twice");
        }
    }
    assert_eq!(claimed.len(), 50);
    assert!(queue.is_empty());
}
