//! Lock poisoning as typed errors
//!
//! Two locks are shared across stage threads: the deque inside each
//! [`TimestampedQueue`](crate::queue::TimestampedQueue) and the SQLite
//! connection of [`LocalStatsStore`](crate::stats::LocalStatsStore). When a
//! stage panics while holding one, the stages still running get a
//! `QueueError::Poisoned` or `StatsError::Poisoned` back and treat it like
//! any other transient failure.

use std::sync::LockResult;

/// Map a poisoned lock or condvar wait onto the caller's error type
///
/// ```
/// use std::sync::Mutex;
/// use postfetch::core::sync::handle_mutex_poison;
/// use postfetch::queue::QueueError;
///
/// let pending = Mutex::new(vec!["http://example.com/"]);
/// let guard = handle_mutex_poison(pending.lock(), |message| QueueError::Poisoned { message })
///     .unwrap();
/// assert_eq!(guard.len(), 1);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    poisoned: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|e| poisoned(format!("a stage panicked while holding the lock ({:?})", e)))
}
