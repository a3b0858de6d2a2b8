//! Tests for the oldest-item age signal

use crate::queue::{TimestampedQueue, Wait};
use std::thread;
use std::time::Duration;

#[test]
fn test_oldest_timestamp_empty_iff_queue_empty() {
    let queue = TimestampedQueue::unbounded("inbound");
    assert!(queue.oldest_timestamp().is_none());

    queue.put("a", Wait::NoWait).unwrap();
    assert!(queue.oldest_timestamp().is_some());

    queue.get(Wait::NoWait).unwrap();
    assert!(queue.oldest_timestamp().is_none());
}

#[test]
fn test_oldest_timestamp_follows_head_after_get() {
    let queue = TimestampedQueue::unbounded("inbound");

    queue.put("first", Wait::NoWait).unwrap();
    let first_stamp = queue.oldest_timestamp().unwrap();
    thread::sleep(Duration::from_millis(5));
    queue.put("second", Wait::NoWait).unwrap();

    // Peeking does not remove anything and keeps reporting the head
    assert_eq!(queue.oldest_timestamp(), Some(first_stamp));
    assert_eq!(queue.len(), 2);

    let (stamp, item) = queue.get_with_timestamp(Wait::NoWait).unwrap();
    assert_eq!(item, "first");
    assert_eq!(stamp, first_stamp);

    let second_stamp = queue.oldest_timestamp().unwrap();
    assert!(second_stamp > first_stamp);

    let (stamp, item) = queue.get_with_timestamp(Wait::NoWait).unwrap();
    assert_eq!(item, "second");
    assert_eq!(stamp, second_stamp);
    assert!(queue.oldest_timestamp().is_none());
}

#[test]
fn test_seconds_behind_zero_when_empty() {
    let queue: TimestampedQueue<u8> = TimestampedQueue::unbounded("idle");
    assert_eq!(queue.seconds_behind(), 0.0);
}

#[test]
fn test_seconds_behind_grows_while_item_waits() {
    let queue = TimestampedQueue::unbounded("stalled");
    queue.put(1u8, Wait::NoWait).unwrap();

    thread::sleep(Duration::from_millis(60));
    let behind = queue.seconds_behind();
    assert!(behind >= 0.05, "expected at least 50ms behind, got {}", behind);
    assert!(behind < 5.0, "unexpectedly large lag {}", behind);

    queue.get(Wait::NoWait).unwrap();
    assert_eq!(queue.seconds_behind(), 0.0);
}
