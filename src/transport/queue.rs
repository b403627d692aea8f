//! # Keep-Last Topic Queues
//!
//! Bounded per-topic FIFOs with middleware-style "keep last N" semantics: when
//! a topic's queue is full, its oldest record is dropped to make room.
//!
//! Records are popped in arrival order across all topics. Dropping only ever
//! removes records of the topic that overflowed, so per-topic order is kept.
//!
//! Any number of producers may [`offer`](TopicQueues::offer); a single consumer
//! is expected to [`pop`](TopicQueues::pop).

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::debug;

use crate::error::{BridgeError, Result};

struct Slot<T> {
    depth: usize,
    items: VecDeque<(u64, T)>,
}

struct Inner<T> {
    slots: Vec<(String, Slot<T>)>,
    index: HashMap<String, usize>,
    next_seq: u64,
    dropped: u64,
    closed: bool,
}

/// Set of keep-last queues, one per topic.
///
/// # Examples
///
/// ```
/// use px4_bridge::transport::TopicQueues;
///
/// let queues = TopicQueues::new([("status".to_string(), 1)]);
/// queues.offer("status", 1).unwrap();
/// queues.offer("status", 2).unwrap(); // drops 1
///
/// assert_eq!(queues.try_pop(), Some(("status".to_string(), 2)));
/// assert_eq!(queues.try_pop(), None);
/// ```
pub struct TopicQueues<T> {
    inner: Mutex<Inner<T>>,
    notify: Notify,
}

impl<T> std::fmt::Debug for TopicQueues<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("TopicQueues")
            .field("topics", &inner.slots.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .field("dropped", &inner.dropped)
            .field("closed", &inner.closed)
            .finish_non_exhaustive()
    }
}

impl<T> TopicQueues<T> {
    /// Creates queues for the given `(topic, depth)` pairs.
    ///
    /// A depth of 0 is treated as 1. Repeated topic names keep the first depth.
    pub fn new<I>(topics: I) -> Self
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let mut slots = Vec::new();
        let mut index = HashMap::new();

        for (name, depth) in topics {
            if index.contains_key(&name) {
                continue;
            }
            index.insert(name.clone(), slots.len());
            slots.push((
                name,
                Slot {
                    depth: depth.max(1),
                    items: VecDeque::with_capacity(depth.max(1)),
                },
            ));
        }

        Self {
            inner: Mutex::new(Inner {
                slots,
                index,
                next_seq: 0,
                dropped: 0,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues `item` on `topic`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the topic was full and its oldest record was dropped
    /// * `Ok(false)` otherwise
    ///
    /// # Errors
    ///
    /// - [`BridgeError::UnknownTopic`] if `topic` has no queue
    /// - [`BridgeError::Transport`] if the queues were closed
    pub fn offer(&self, topic: &str, item: T) -> Result<bool> {
        let dropped = {
            let mut inner = self.lock();

            if inner.closed {
                return Err(BridgeError::Transport(format!("queue closed for {}", topic)));
            }

            let idx = *inner
                .index
                .get(topic)
                .ok_or_else(|| BridgeError::UnknownTopic(topic.to_string()))?;

            let seq = inner.next_seq;
            inner.next_seq += 1;

            let slot = &mut inner.slots[idx].1;
            let dropped = if slot.items.len() >= slot.depth {
                slot.items.pop_front();
                true
            } else {
                false
            };
            slot.items.push_back((seq, item));

            if dropped {
                inner.dropped += 1;
                debug!("Queue for {} full, dropped oldest record", topic);
            }
            dropped
        };

        self.notify.notify_one();
        Ok(dropped)
    }

    /// Removes the oldest record across all topics, if any.
    pub fn try_pop(&self) -> Option<(String, T)> {
        let mut inner = self.lock();

        let (idx, _) = inner
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, (_, slot))| slot.items.front().map(|(seq, _)| (i, *seq)))
            .min_by_key(|&(_, seq)| seq)?;

        let (name, slot) = &mut inner.slots[idx];
        let (_, item) = slot.items.pop_front()?;
        Some((name.clone(), item))
    }

    /// Waits for the next record.
    ///
    /// Returns `None` once the queues are closed and drained.
    pub async fn pop(&self) -> Option<(String, T)> {
        loop {
            if let Some(item) = self.try_pop() {
                return Some(item);
            }
            if self.is_closed() {
                return None;
            }
            self.notify.notified().await;
        }
    }

    /// Stops accepting records. Records already queued can still be popped.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_one();
    }

    /// Whether [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of queued records across all topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().slots.iter().map(|(_, slot)| slot.items.len()).sum()
    }

    /// Whether no records are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records dropped because a topic queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    /// Configured depth of `topic`, if it has a queue.
    #[must_use]
    pub fn depth(&self, topic: &str) -> Option<usize> {
        let inner = self.lock();
        inner.index.get(topic).map(|&i| inner.slots[i].1.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn queues() -> TopicQueues<u32> {
        TopicQueues::new([("a".to_string(), 3), ("b".to_string(), 1)])
    }

    // ==================== Offer / Pop Tests ====================

    #[test]
    fn test_fifo_within_topic() {
        let q = queues();
        q.offer("a", 1).unwrap();
        q.offer("a", 2).unwrap();
        q.offer("a", 3).unwrap();

        assert_eq!(q.try_pop(), Some(("a".to_string(), 1)));
        assert_eq!(q.try_pop(), Some(("a".to_string(), 2)));
        assert_eq!(q.try_pop(), Some(("a".to_string(), 3)));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn test_arrival_order_across_topics() {
        let q = queues();
        q.offer("a", 1).unwrap();
        q.offer("b", 2).unwrap();
        q.offer("a", 3).unwrap();

        let order: Vec<u32> = std::iter::from_fn(|| q.try_pop()).map(|(_, v)| v).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_keep_last_drops_oldest() {
        let q = queues();
        for v in 1..=5 {
            q.offer("a", v).unwrap();
        }

        let kept: Vec<u32> = std::iter::from_fn(|| q.try_pop()).map(|(_, v)| v).collect();
        assert_eq!(kept, vec![3, 4, 5]);
        assert_eq!(q.dropped(), 2);
    }

    #[test]
    fn test_depth_one_is_latest_value() {
        let q = queues();
        assert!(!q.offer("b", 1).unwrap());
        assert!(q.offer("b", 2).unwrap());
        assert!(q.offer("b", 3).unwrap());

        assert_eq!(q.len(), 1);
        assert_eq!(q.try_pop(), Some(("b".to_string(), 3)));
    }

    #[test]
    fn test_overflow_does_not_touch_other_topics() {
        let q = queues();
        q.offer("a", 10).unwrap();
        q.offer("b", 1).unwrap();
        q.offer("b", 2).unwrap();

        assert_eq!(q.try_pop(), Some(("a".to_string(), 10)));
        assert_eq!(q.try_pop(), Some(("b".to_string(), 2)));
    }

    #[test]
    fn test_unknown_topic() {
        let q = queues();
        let result = q.offer("c", 1);
        assert!(matches!(result, Err(BridgeError::UnknownTopic(t)) if t == "c"));
        assert!(q.is_empty());
    }

    #[test]
    fn test_zero_depth_treated_as_one() {
        let q: TopicQueues<u32> = TopicQueues::new([("z".to_string(), 0)]);
        assert_eq!(q.depth("z"), Some(1));
        q.offer("z", 1).unwrap();
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_duplicate_topic_keeps_first_depth() {
        let q: TopicQueues<u32> = TopicQueues::new([("x".to_string(), 4), ("x".to_string(), 9)]);
        assert_eq!(q.depth("x"), Some(4));
        assert_eq!(q.depth("y"), None);
    }

    // ==================== Close Tests ====================

    #[test]
    fn test_offer_after_close_fails() {
        let q = queues();
        q.offer("a", 1).unwrap();
        q.close();

        assert!(matches!(q.offer("a", 2), Err(BridgeError::Transport(_))));
        // Already queued records still drain
        assert_eq!(q.try_pop(), Some(("a".to_string(), 1)));
    }

    #[tokio::test]
    async fn test_pop_returns_none_when_closed_and_empty() {
        let q = queues();
        q.offer("b", 7).unwrap();
        q.close();

        assert_eq!(q.pop().await, Some(("b".to_string(), 7)));
        assert_eq!(q.pop().await, None);
    }

    #[test]
    fn test_pop_pending_until_offer() {
        let q = queues();
        let mut pop = tokio_test::task::spawn(q.pop());

        tokio_test::assert_pending!(pop.poll());

        q.offer("a", 5).unwrap();
        assert!(pop.is_woken());
        assert_eq!(tokio_test::assert_ready!(pop.poll()), Some(("a".to_string(), 5)));
    }

    #[tokio::test]
    async fn test_pop_waits_for_offer() {
        let q = Arc::new(queues());
        let producer = q.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.offer("a", 42).unwrap();
        });

        let popped = tokio::time::timeout(Duration::from_secs(1), q.pop()).await.unwrap();
        assert_eq!(popped, Some(("a".to_string(), 42)));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_pop_wakes_on_close() {
        let q: Arc<TopicQueues<u32>> = Arc::new(queues());
        let closer = q.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            closer.close();
        });

        let popped = tokio::time::timeout(Duration::from_secs(1), q.pop()).await.unwrap();
        assert_eq!(popped, None);
        handle.await.unwrap();
    }

    #[test]
    fn test_debug_lists_topics() {
        let q = queues();
        let text = format!("{:?}", q);
        assert!(text.contains("TopicQueues"));
        assert!(text.contains("\"a\""));
    }
}
