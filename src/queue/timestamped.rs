//! TimestampedQueue implementation
//!
//! A mutex-protected `VecDeque` with two condition variables, one signalled
//! when an item arrives and one when room frees up. Entries carry the time
//! they were enqueued so the head's age can be peeked in constant time.

use crate::core::sync::handle_mutex_poison;
use crate::queue::error::{QueueError, QueueResult};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How long a `put` or `get` may block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Block until the operation can complete
    Forever,
    /// Fail immediately if the operation cannot complete
    NoWait,
    /// Block for at most the given duration
    Timeout(Duration),
}

/// Queue entry: the item plus the time it was enqueued
#[derive(Debug)]
struct QueueEntry<T> {
    timestamp: DateTime<Utc>,
    item: T,
}

/// FIFO queue that knows how long its oldest item has been waiting
///
/// Safe to share between producer and consumer threads behind an `Arc`.
#[derive(Debug)]
pub struct TimestampedQueue<T> {
    /// Queue identifier, used in logs and backpressure reports
    name: String,

    /// Maximum number of pending items, 0 for unbounded
    max_size: usize,

    entries: Mutex<VecDeque<QueueEntry<T>>>,
    not_empty: Condvar,
    not_full: Condvar,

    /// Set once the consumer is gone; only flipped while `entries` is locked
    closed: AtomicBool,
}

impl<T> TimestampedQueue<T> {
    /// Create a queue holding at most `max_size` items (0 = unbounded)
    pub fn new(name: impl Into<String>, max_size: usize) -> Self {
        Self {
            name: name.into(),
            max_size,
            entries: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a queue without a size limit
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self::new(name, 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of pending items
    pub fn len(&self) -> usize {
        self.peek_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peek_lock().is_empty()
    }

    /// Enqueue an item stamped with the current time
    ///
    /// Only bounded queues can block; a queue that stays full for the whole
    /// wait yields `QueueError::Full` and the item is dropped. A closed queue
    /// refuses the item with `QueueError::Closed`, waking blocked callers.
    pub fn put(&self, item: T, wait: Wait) -> QueueResult<()> {
        let max_size = self.max_size;
        let closed = &self.closed;
        let is_full = move |entries: &mut VecDeque<QueueEntry<T>>| {
            max_size > 0 && entries.len() >= max_size
        };

        let guard = self.lock()?;
        let mut entries = self.wait_while(guard, &self.not_full, wait, |entries| {
            is_full(entries) && !closed.load(Ordering::Acquire)
        })?;
        if self.is_closed() {
            return Err(QueueError::Closed {
                name: self.name.clone(),
            });
        }
        if is_full(&mut *entries) {
            return Err(QueueError::Full { max_size });
        }

        entries.push_back(QueueEntry {
            timestamp: Utc::now(),
            item,
        });
        drop(entries);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Dequeue the oldest item, discarding its timestamp
    pub fn get(&self, wait: Wait) -> QueueResult<T> {
        self.get_with_timestamp(wait).map(|(_, item)| item)
    }

    /// Dequeue the oldest item together with the time it was enqueued
    pub fn get_with_timestamp(&self, wait: Wait) -> QueueResult<(DateTime<Utc>, T)> {
        let closed = &self.closed;
        let guard = self.lock()?;
        let mut entries = self.wait_while(guard, &self.not_empty, wait, |entries| {
            entries.is_empty() && !closed.load(Ordering::Acquire)
        })?;

        match entries.pop_front() {
            Some(entry) => {
                drop(entries);
                self.not_full.notify_one();
                Ok((entry.timestamp, entry.item))
            }
            None => Err(QueueError::Empty),
        }
    }

    /// Refuse further puts and wake every blocked caller
    ///
    /// Items already queued can still be taken; an empty closed queue
    /// answers `get` with `QueueError::Empty` straight away.
    pub fn close(&self) {
        let entries = self.peek_lock();
        self.closed.store(true, Ordering::Release);
        drop(entries);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Enqueue time of the item at the head, `None` when the queue is empty
    pub fn oldest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.peek_lock().front().map(|entry| entry.timestamp)
    }

    /// Seconds the head item has been waiting, `0.0` when the queue is empty
    pub fn seconds_behind(&self) -> f64 {
        match self.oldest_timestamp() {
            Some(timestamp) => {
                let elapsed = Utc::now().signed_duration_since(timestamp);
                elapsed
                    .num_microseconds()
                    .map(|micros| micros as f64 / 1_000_000.0)
                    .unwrap_or(0.0)
                    .max(0.0)
            }
            None => 0.0,
        }
    }

    fn lock(&self) -> QueueResult<MutexGuard<'_, VecDeque<QueueEntry<T>>>> {
        handle_mutex_poison(self.entries.lock(), |message| QueueError::Poisoned {
            message,
        })
    }

    // Observers ignore poisoning: no operation leaves the deque half-updated
    fn peek_lock(&self) -> MutexGuard<'_, VecDeque<QueueEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_while<'a, F>(
        &self,
        guard: MutexGuard<'a, VecDeque<QueueEntry<T>>>,
        condvar: &Condvar,
        wait: Wait,
        blocked: F,
    ) -> QueueResult<MutexGuard<'a, VecDeque<QueueEntry<T>>>>
    where
        F: FnMut(&mut VecDeque<QueueEntry<T>>) -> bool,
    {
        let poisoned = |message: String| QueueError::Poisoned { message };
        match wait {
            Wait::NoWait => Ok(guard),
            Wait::Forever => handle_mutex_poison(condvar.wait_while(guard, blocked), poisoned),
            Wait::Timeout(timeout) => {
                handle_mutex_poison(condvar.wait_timeout_while(guard, timeout, blocked), poisoned)
                    .map(|(guard, _timed_out)| guard)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_queue_creation() {
        let queue: TimestampedQueue<u32> = TimestampedQueue::new("test-queue", 1000);

        assert_eq!(queue.name(), "test-queue");
        assert_eq!(queue.max_size(), 1000);
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert!(queue.oldest_timestamp().is_none());
    }

    #[test]
    fn test_fifo_order() {
        let queue = TimestampedQueue::unbounded("fifo");
        for i in 0..5 {
            queue.put(i, Wait::NoWait).unwrap();
        }

        let drained: Vec<i32> = (0..5).map(|_| queue.get(Wait::NoWait).unwrap()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.get(Wait::NoWait), Err(QueueError::Empty));
    }

    #[test]
    fn test_queue_size_limit() {
        let queue = TimestampedQueue::new("small", 2);

        assert!(queue.put("file1.warc", Wait::NoWait).is_ok());
        assert!(queue.put("file2.warc", Wait::NoWait).is_ok());

        match queue.put("file3.warc", Wait::NoWait) {
            Err(QueueError::Full { max_size }) => assert_eq!(max_size, 2),
            other => panic!("Expected Full error, got {:?}", other),
        }
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_put_timeout_on_full_queue() {
        let queue = TimestampedQueue::new("small", 1);
        queue.put(1, Wait::NoWait).unwrap();

        let result = queue.put(2, Wait::Timeout(Duration::from_millis(20)));
        assert_eq!(result, Err(QueueError::Full { max_size: 1 }));
    }

    #[test]
    fn test_get_with_timestamp_returns_enqueue_time() {
        let queue = TimestampedQueue::unbounded("stamped");
        let before = Utc::now();
        queue.put("item", Wait::Forever).unwrap();
        let after = Utc::now();

        let (timestamp, item) = queue.get_with_timestamp(Wait::NoWait).unwrap();
        assert_eq!(item, "item");
        assert!(timestamp >= before && timestamp <= after);
    }

    #[test]
    fn test_poisoned_queue_reports_error_but_still_observable() {
        let queue = Arc::new(TimestampedQueue::unbounded("poisoned"));
        queue.put(7u32, Wait::NoWait).unwrap();

        let poisoner = Arc::clone(&queue);
        let _ = thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("Intentional panic to poison queue lock");
        })
        .join();

        assert!(matches!(
            queue.get(Wait::NoWait),
            Err(QueueError::Poisoned { .. })
        ));
        assert!(queue.oldest_timestamp().is_some());
        assert_eq!(queue.len(), 1);
    }
}
