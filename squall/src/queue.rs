use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{self, AtomicU64};

use tokio::sync::{Mutex, Notify, Semaphore};

/// An async min-priority queue with a bounded producer side.
///
/// `push` waits for capacity, which is what backpressures a producer
/// iterating an unbounded source. `push_unbounded` skips the capacity
/// check; the executor uses it to re-enqueue repeating queries, since the
/// queue's only consumer must never block on its own push. Ties on the
/// priority key pop in push order.
pub struct BoundedPriorityQueue<T> {
    heap: Mutex<BinaryHeap<HeapEntry<T>>>,
    capacity: Semaphore,
    available: Notify,
    next_seq: AtomicU64,
}

struct HeapEntry<T> {
    priority: i64,
    seq: u64,
    holds_permit: bool,
    item: T,
}

// BinaryHeap is a max-heap; reverse the comparison to pop minimum keys
// first (FIFO on equal keys via the sequence number).
impl<T> Ord for HeapEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.priority, other.seq).cmp(&(self.priority, self.seq))
    }
}

impl<T> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for HeapEntry<T> {}

impl<T: Send> BoundedPriorityQueue<T> {
    pub fn new(capacity: usize) -> BoundedPriorityQueue<T> {
        BoundedPriorityQueue {
            heap: Mutex::new(BinaryHeap::new()),
            capacity: Semaphore::new(capacity),
            available: Notify::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Pushes an item, waiting until the queue has capacity.
    pub async fn push(&self, priority: i64, item: T) {
        let permit = self
            .capacity
            .acquire()
            .await
            .expect("queue semaphore is never closed");
        permit.forget();
        self.insert(priority, item, true).await;
    }

    /// Pushes an item regardless of capacity.
    pub async fn push_unbounded(&self, priority: i64, item: T) {
        self.insert(priority, item, false).await;
    }

    /// Pops the minimum-priority item, waiting until one is available.
    pub async fn pop(&self) -> (i64, T) {
        loop {
            let notified = self.available.notified();
            {
                let mut heap = self.heap.lock().await;
                if let Some(entry) = heap.pop() {
                    if entry.holds_permit {
                        self.capacity.add_permits(1);
                    }
                    return (entry.priority, entry.item);
                }
            }
            notified.await;
        }
    }

    async fn insert(&self, priority: i64, item: T, holds_permit: bool) {
        let seq = self.next_seq.fetch_add(1, atomic::Ordering::Relaxed);
        self.heap.lock().await.push(HeapEntry {
            priority,
            seq,
            holds_permit,
            item,
        });
        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_pops_in_priority_order() {
        let queue = BoundedPriorityQueue::new(10);
        queue.push(30, "c").await;
        queue.push(10, "a").await;
        queue.push(20, "b").await;

        assert_eq!(queue.pop().await, (10, "a"));
        assert_eq!(queue.pop().await, (20, "b"));
        assert_eq!(queue.pop().await, (30, "c"));
    }

    #[tokio::test]
    async fn test_equal_priorities_pop_fifo() {
        let queue = BoundedPriorityQueue::new(10);
        for label in ["first", "second", "third"] {
            queue.push(5, label).await;
        }
        assert_eq!(queue.pop().await.1, "first");
        assert_eq!(queue.pop().await.1, "second");
        assert_eq!(queue.pop().await.1, "third");
    }

    #[tokio::test]
    async fn test_push_blocks_at_capacity() {
        let queue = Arc::new(BoundedPriorityQueue::new(2));
        queue.push(1, 1).await;
        queue.push(2, 2).await;

        let blocked = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.push(3, 3).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());

        // Popping frees a slot and unblocks the producer
        assert_eq!(queue.pop().await.1, 1);
        blocked.await.unwrap();
        assert_eq!(queue.pop().await.1, 2);
        assert_eq!(queue.pop().await.1, 3);
    }

    #[tokio::test]
    async fn test_push_unbounded_ignores_capacity() {
        let queue = BoundedPriorityQueue::new(1);
        queue.push(1, "bounded").await;
        // Would deadlock if it waited for capacity
        queue.push_unbounded(0, "exempt").await;

        assert_eq!(queue.pop().await.1, "exempt");
        assert_eq!(queue.pop().await.1, "bounded");
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let queue = Arc::new(BoundedPriorityQueue::new(4));
        let popper = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!popper.is_finished());

        queue.push(7, "late").await;
        assert_eq!(popper.await.unwrap(), (7, "late"));
    }
}
