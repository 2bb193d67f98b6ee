//! # Array-backed max-heap
//!
//! [`RankingHeap`] is the unsynchronized structure behind [`RankingQueue`](super::RankingQueue).
//! It keeps the standard implicit-tree layout: the children of slot `i` live at
//! `2i + 1` and `2i + 2`, and every slot's priority is at least that of its children.
//!
//! Removal by id is a linear scan. Withdrawals are rare next to inserts and max
//! extraction, and the pool holds hundreds of orders rather than millions, so the heap
//! carries no id index.

use crate::order::{DispatchOrder, OrderId};
use crate::ranking::Priority;
use chrono::{DateTime, Utc};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// One pending order inside the heap.
pub struct QueueEntry<O> {
    /// The caller's order, shared rather than copied.
    pub order: Arc<O>,
    /// Ranking key, fixed at insertion time.
    pub priority: Priority,
    /// Informational only; never consulted for ordering.
    pub enqueued_at: DateTime<Utc>,
}

impl<O: DispatchOrder> QueueEntry<O> {
    pub fn order_id(&self) -> &OrderId {
        self.order.order_id()
    }
}

impl<O> Clone for QueueEntry<O> {
    fn clone(&self) -> Self {
        Self {
            order: Arc::clone(&self.order),
            priority: self.priority,
            enqueued_at: self.enqueued_at,
        }
    }
}

impl<O: Debug> Debug for QueueEntry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEntry")
            .field("order", &self.order)
            .field("priority", &self.priority)
            .field("enqueued_at", &self.enqueued_at)
            .finish()
    }
}

/// Max-heap of [`QueueEntry`] ordered by [`Priority`].
///
/// Equal priorities come out in no particular order. Insertion order is not preserved
/// across ties and callers must not rely on it.
pub struct RankingHeap<O> {
    entries: Vec<QueueEntry<O>>,
}

impl<O> Default for RankingHeap<O> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<O: DispatchOrder> RankingHeap<O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Inserts `entry` and sifts it up to its place.
    pub fn push(&mut self, entry: QueueEntry<O>) {
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        self.sift_up(last);
    }

    /// The highest-priority entry, if any.
    pub fn peek(&self) -> Option<&QueueEntry<O>> {
        self.entries.first()
    }

    /// Removes and returns the highest-priority entry.
    pub fn pop(&mut self) -> Option<QueueEntry<O>> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let top = self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        top
    }

    /// Removes the first entry whose order carries `order_id`.
    pub fn remove_by_id(&mut self, order_id: &OrderId) -> Option<QueueEntry<O>> {
        let pos = self.position(order_id)?;
        let last = self.entries.len() - 1;
        self.entries.swap(pos, last);
        let removed = self.entries.pop();
        if pos < self.entries.len() {
            // the element moved into `pos` may belong above or below it
            self.sift_up(pos);
            self.sift_down(pos);
        }
        removed
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.position(order_id).is_some()
    }

    /// Every entry, highest priority first. Does not disturb the heap.
    pub fn sorted_desc(&self) -> Vec<QueueEntry<O>> {
        let mut snapshot = self.entries.clone();
        snapshot.sort_by(|a, b| b.priority.cmp(&a.priority));
        snapshot
    }

    /// Checks the max-heap property over every parent/child pair.
    pub fn is_valid_heap(&self) -> bool {
        (1..self.entries.len()).all(|i| self.entries[(i - 1) / 2].priority >= self.entries[i].priority)
    }

    fn position(&self, order_id: &OrderId) -> Option<usize> {
        self.entries.iter().position(|e| e.order_id() == order_id)
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.entries[index].priority <= self.entries[parent].priority {
                break;
            }
            self.entries.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut largest = index;

            if left < len && self.entries[left].priority > self.entries[largest].priority {
                largest = left;
            }
            if right < len && self.entries[right].priority > self.entries[largest].priority {
                largest = right;
            }
            if largest == index {
                break;
            }
            self.entries.swap(index, largest);
            index = largest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderRecord;

    fn entry(id: &str, value: f64) -> QueueEntry<OrderRecord> {
        QueueEntry {
            order: Arc::new(OrderRecord::new(id, value)),
            priority: Priority::from_value(value, 2).unwrap(),
            enqueued_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn heap_of(values: &[(&str, f64)]) -> RankingHeap<OrderRecord> {
        let mut heap = RankingHeap::new();
        for (id, value) in values {
            heap.push(entry(id, *value));
        }
        heap
    }

    #[test]
    fn test_pop_yields_non_increasing_priorities() {
        let mut heap = heap_of(&[("a", 30.0), ("b", 90.0), ("c", 10.0), ("d", 90.0), ("e", 50.0)]);
        assert!(heap.is_valid_heap());

        let mut popped = Vec::new();
        while let Some(e) = heap.pop() {
            assert!(heap.is_valid_heap());
            popped.push(e.priority.as_f64());
        }
        assert_eq!(popped, vec![90.0, 90.0, 50.0, 30.0, 10.0]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_remove_interior_entry_keeps_heap_valid() {
        // 100 at the root, 80 and 70 as its children, the rest as leaves
        let mut heap = heap_of(&[
            ("root", 100.0),
            ("l", 80.0),
            ("r", 70.0),
            ("ll", 20.0),
            ("lr", 15.0),
            ("rl", 65.0),
            ("rr", 60.0),
        ]);
        assert_eq!(heap.entries[1].order_id().as_str(), "l");

        let removed = heap.remove_by_id(&OrderId::from("l")).unwrap();
        assert_eq!(removed.order_id().as_str(), "l");
        assert_eq!(heap.len(), 6);
        assert!(heap.is_valid_heap());
        assert!(!heap.contains(&OrderId::from("l")));
    }

    #[test]
    fn test_remove_replacement_sifts_up() {
        // removing a leaf in the left subtree pulls in a large leaf from the right
        let mut heap = heap_of(&[
            ("root", 100.0),
            ("l", 50.0),
            ("r", 90.0),
            ("ll", 40.0),
            ("lr", 45.0),
            ("rl", 85.0),
            ("rr", 80.0),
        ]);
        heap.remove_by_id(&OrderId::from("ll")).unwrap();
        assert!(heap.is_valid_heap());
        assert_eq!(heap.entries[1].order_id().as_str(), "rr");
    }

    #[test]
    fn test_remove_unknown_and_last() {
        let mut heap = heap_of(&[("only", 10.0)]);
        assert!(heap.remove_by_id(&OrderId::from("missing")).is_none());
        assert!(heap.remove_by_id(&OrderId::from("only")).is_some());
        assert!(heap.is_empty());
        assert!(heap.pop().is_none());
        assert!(heap.peek().is_none());
    }

    #[test]
    fn test_sorted_desc_leaves_heap_untouched() {
        let heap = heap_of(&[("a", 5.0), ("b", 15.0), ("c", 10.0)]);
        let ids: Vec<_> = heap
            .sorted_desc()
            .iter()
            .map(|e| e.order_id().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek().unwrap().order_id().as_str(), "b");
    }
}
