//! Postfetch processing pipeline
//!
//! Every completed transaction passes through a chain of stages after it has
//! been fetched and recorded. Each stage runs on its own thread, takes
//! [`RecordedUrl`]s from its input [`TimestampedQueue`], hands them to a
//! processing step and forwards them unchanged to the next stage.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use postfetch::postfetch::{Listener, ListenerProcessor, PipelineBuilder, PostfetchResult, Standard};
//! use postfetch::queue::Wait;
//! use postfetch::recorded::{RecordedUrl, WarcRecord};
//!
//! struct Printer;
//!
//! impl Listener for Printer {
//!     fn notify(&self, url: &RecordedUrl, _records: &[WarcRecord]) -> PostfetchResult<()> {
//!         println!("{} ({} bytes)", url.url, url.size);
//!         Ok(())
//!     }
//! }
//!
//! let mut pipeline = PipelineBuilder::new()
//!     .stage("printer", |input, output| {
//!         Standard::new(ListenerProcessor::new(Printer), input, output)
//!     })
//!     .build();
//! pipeline.start()?;
//! pipeline.inbound().put(RecordedUrl::new("http://example.com/", 512), Wait::Forever)?;
//! pipeline.stop()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`TimestampedQueue`]: crate::queue::TimestampedQueue

mod engine;
mod error;
mod listener;
mod pipeline;
mod policy;
mod profile;

pub use engine::{
    FatalExitHandler, LoopOutcome, PostfetchStage, StageHandle, StageOptions, FATAL_EXIT_CODE,
};
pub use error::{PostfetchError, PostfetchResult};
pub use listener::{Listener, ListenerProcessor};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use policy::{
    Batch, BatchProcessor, ConsumptionPolicy, Standard, Step, UrlProcessor, MAX_BATCH_SIZE,
};
pub use profile::LoopProfile;

use crate::queue::TimestampedQueue;
use crate::recorded::RecordedUrl;

/// Queue type connecting postfetch stages
pub type UrlQueue = TimestampedQueue<RecordedUrl>;

#[cfg(test)]
mod tests;
