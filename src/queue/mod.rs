//! Latency-aware FIFO queue between pipeline stages
//!
//! Every item is stamped with its enqueue time. Consumers normally only see
//! the item; the stamp exists so that anyone holding the queue can ask how
//! long the oldest pending item has been waiting, which is the pipeline's
//! backpressure signal.
//!
//! # Example Usage
//!
//! ```rust
//! use postfetch::queue::{TimestampedQueue, Wait};
//! use std::time::Duration;
//!
//! let queue = TimestampedQueue::unbounded("writer");
//! queue.put("http://example.com/", Wait::Forever).unwrap();
//!
//! assert!(queue.oldest_timestamp().is_some());
//! let url = queue.get(Wait::Timeout(Duration::from_millis(500))).unwrap();
//! assert_eq!(url, "http://example.com/");
//! assert_eq!(queue.seconds_behind(), 0.0);
//! ```

mod error;
mod timestamped;

pub use error::{QueueError, QueueResult};
pub use timestamped::{TimestampedQueue, Wait};

#[cfg(test)]
mod tests;
