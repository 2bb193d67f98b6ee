//! # Ranking Queue
//!
//! The shared pending-assignment pool. Every operation takes the one lock around the
//! [`RankingHeap`]; the heap work under it is O(log n), or O(n) for a withdrawal.
//!
//! [`RankingQueue::remove_by_id`] is the authoritative claim: when two dispatch workers
//! race for the same order, exactly one removal succeeds and the other sees
//! [`DispatchError::NotFound`].

use crate::clock::{Clock, SystemClock};
use crate::error::DispatchError;
use crate::order::{DispatchOrder, OrderId};
use crate::ranking::{Priority, QueueEntry, RankingHeap, DEFAULT_PRIORITY_DECIMALS};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cloneable handle to a shared max-priority pool of pending orders.
///
/// Clones share one heap. Construct one per process (or per market) and hand clones to
/// whatever needs it.
///
/// ```rust
/// use dispatch_core::{OrderRecord, RankingQueue};
/// use std::sync::Arc;
///
/// let queue = RankingQueue::new();
/// queue.enqueue(Arc::new(OrderRecord::new("A", 50_000.0)));
/// queue.enqueue(Arc::new(OrderRecord::new("B", 120_000.0)));
///
/// let top = queue.peek().unwrap();
/// assert_eq!(top.order_id().as_str(), "B");
/// ```
pub struct RankingQueue<O> {
    heap: Arc<Mutex<RankingHeap<O>>>,
    clock: Arc<dyn Clock>,
    decimals: u32,
}

impl<O> Clone for RankingQueue<O> {
    fn clone(&self) -> Self {
        Self {
            heap: Arc::clone(&self.heap),
            clock: Arc::clone(&self.clock),
            decimals: self.decimals,
        }
    }
}

impl<O: DispatchOrder> Default for RankingQueue<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: DispatchOrder> RankingQueue<O> {
    /// Creates an empty queue ranking at two decimal places.
    pub fn new() -> Self {
        Self::with_precision(DEFAULT_PRIORITY_DECIMALS)
    }

    /// Creates an empty queue that rounds ranking values to `decimals` places.
    pub fn with_precision(decimals: u32) -> Self {
        Self::with_clock(decimals, Arc::new(SystemClock))
    }

    pub fn with_clock(decimals: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            heap: Arc::new(Mutex::new(RankingHeap::new())),
            clock,
            decimals,
        }
    }

    /// Adds `order` to the pool, ranked by its value at this moment.
    ///
    /// Never fails. A negative or non-finite value ranks as zero. Enqueuing the same
    /// order id twice stores two entries.
    pub fn enqueue(&self, order: Arc<O>) -> QueueEntry<O> {
        let value = order.value();
        let priority = Priority::from_value(value, self.decimals).unwrap_or_else(|| {
            warn!(order_id = %order.order_id(), value, "Unrankable value, using zero priority");
            Priority::zero(self.decimals)
        });
        let entry = QueueEntry {
            order,
            priority,
            enqueued_at: self.clock.now(),
        };

        let mut heap = self.heap.lock();
        heap.push(entry.clone());
        info!(order_id = %entry.order_id(), %priority, size = heap.len(), "Enqueued");
        entry
    }

    /// The highest-priority entry without removing it, or `None` when empty.
    pub fn peek(&self) -> Option<QueueEntry<O>> {
        self.heap.lock().peek().cloned()
    }

    /// Removes and returns the highest-priority entry, or `None` when empty.
    pub fn dequeue(&self) -> Option<QueueEntry<O>> {
        let mut heap = self.heap.lock();
        let entry = heap.pop();
        match &entry {
            Some(e) => info!(order_id = %e.order_id(), priority = %e.priority, size = heap.len(), "Dequeued"),
            None => debug!("Dequeue on empty queue"),
        }
        entry
    }

    /// Withdraws the order with `order_id` from the pool.
    ///
    /// Returns [`DispatchError::NotFound`] if it is not pending, which for a claiming
    /// worker means another worker took it first.
    pub fn remove_by_id(&self, order_id: &OrderId) -> Result<QueueEntry<O>, DispatchError> {
        let mut heap = self.heap.lock();
        match heap.remove_by_id(order_id) {
            Some(entry) => {
                info!(%order_id, size = heap.len(), "Removed");
                Ok(entry)
            }
            None => {
                debug!(%order_id, "Remove: not pending");
                Err(DispatchError::NotFound(order_id.clone()))
            }
        }
    }

    /// Snapshot of every pending entry, highest priority first.
    pub fn all_sorted_by_priority(&self) -> Vec<QueueEntry<O>> {
        self.heap.lock().sorted_desc()
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.heap.lock().contains(order_id)
    }

    pub fn size(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }

    pub fn clear(&self) {
        let mut heap = self.heap.lock();
        let dropped = heap.len();
        heap.clear();
        info!(dropped, "Cleared");
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Whether the heap property currently holds. Intended for tests and debug checks.
    pub fn is_consistent(&self) -> bool {
        self.heap.lock().is_valid_heap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderRecord;

    fn order(id: &str, value: f64) -> Arc<OrderRecord> {
        Arc::new(OrderRecord::new(id, value))
    }

    #[test]
    fn test_empty_queue_signals_empty() {
        let queue = RankingQueue::<OrderRecord>::new();
        assert!(queue.is_empty());
        assert!(queue.peek().is_none());
        assert!(queue.dequeue().is_none());
        assert_eq!(
            queue.remove_by_id(&OrderId::from("x")).unwrap_err(),
            DispatchError::NotFound(OrderId::from("x"))
        );
    }

    #[test]
    fn test_peek_does_not_remove() {
        let queue = RankingQueue::new();
        queue.enqueue(order("a", 10.0));
        queue.enqueue(order("b", 20.0));

        assert_eq!(queue.peek().unwrap().order_id().as_str(), "b");
        assert_eq!(queue.size(), 2);
    }

    #[test]
    fn test_unrankable_value_enqueues_at_zero() {
        let queue = RankingQueue::new();
        let entry = queue.enqueue(order("neg", -5.0));
        queue.enqueue(order("pos", 0.01));

        assert_eq!(entry.priority.units(), 0);
        assert_eq!(queue.dequeue().unwrap().order_id().as_str(), "pos");
        assert_eq!(queue.dequeue().unwrap().order_id().as_str(), "neg");
    }

    #[test]
    fn test_duplicate_ids_are_stored_twice() {
        let queue = RankingQueue::new();
        queue.enqueue(order("dup", 10.0));
        queue.enqueue(order("dup", 10.0));
        assert_eq!(queue.size(), 2);

        queue.remove_by_id(&OrderId::from("dup")).unwrap();
        assert!(queue.contains(&OrderId::from("dup")));
        queue.remove_by_id(&OrderId::from("dup")).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_and_clones_share_state() {
        let queue = RankingQueue::new();
        let other = queue.clone();
        queue.enqueue(order("a", 1.0));
        assert_eq!(other.size(), 1);

        other.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_precision_controls_ties() {
        let coarse = RankingQueue::with_precision(0);
        let a = coarse.enqueue(order("a", 10.4));
        let b = coarse.enqueue(order("b", 10.2));
        assert_eq!(a.priority, b.priority);

        let fine = RankingQueue::with_precision(2);
        let a = fine.enqueue(order("a", 10.4));
        let b = fine.enqueue(order("b", 10.2));
        assert!(a.priority > b.priority);
    }
}
