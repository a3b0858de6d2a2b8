//! Consumption policies: how a stage takes work from its input queue
//!
//! A policy owns the stage's processing step together with its input and
//! optional output queue. [`Standard`] handles one url per step, [`Batch`]
//! takes whatever has piled up (up to [`MAX_BATCH_SIZE`]) in one go.

use crate::postfetch::error::PostfetchResult;
use crate::postfetch::UrlQueue;
use crate::queue::{QueueError, Wait};
use crate::recorded::RecordedUrl;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on the number of urls handed to one `process_batch` call
pub const MAX_BATCH_SIZE: usize = 500;

/// Result of one get-process-put step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing arrived within the poll timeout
    Idle,
    /// This many urls were processed and forwarded
    Processed(usize),
}

/// A stage's get-process-put step and its shutdown hook
pub trait ConsumptionPolicy: Send + 'static {
    /// Take work from the input, process it and forward it downstream
    ///
    /// Must not block on the input for longer than `poll_timeout`.
    fn step(&mut self, poll_timeout: Duration) -> PostfetchResult<Step>;

    /// Release resources once the stage loop has ended
    fn shutdown(&mut self) {}
}

/// Processing step of a single-url stage
pub trait UrlProcessor: Send + 'static {
    fn process_url(&mut self, url: &mut RecordedUrl) -> PostfetchResult<()>;

    fn shutdown(&mut self) {}
}

/// Processing step of a batch stage
pub trait BatchProcessor: Send + 'static {
    fn process_batch(&mut self, batch: &mut [RecordedUrl]) -> PostfetchResult<()>;

    fn shutdown(&mut self) {}
}

fn forward(output: Option<&Arc<UrlQueue>>, url: RecordedUrl) -> PostfetchResult<()> {
    if let Some(queue) = output {
        queue.put(url, Wait::Forever)?;
    }
    Ok(())
}

/// One url per step
pub struct Standard<U> {
    processor: U,
    input: Arc<UrlQueue>,
    output: Option<Arc<UrlQueue>>,
}

impl<U: UrlProcessor> Standard<U> {
    pub fn new(processor: U, input: Arc<UrlQueue>, output: Option<Arc<UrlQueue>>) -> Self {
        Self {
            processor,
            input,
            output,
        }
    }

    pub fn processor(&self) -> &U {
        &self.processor
    }
}

impl<U: UrlProcessor> ConsumptionPolicy for Standard<U> {
    fn step(&mut self, poll_timeout: Duration) -> PostfetchResult<Step> {
        let mut url = match self.input.get(Wait::Timeout(poll_timeout)) {
            Ok(url) => url,
            Err(QueueError::Empty) => return Ok(Step::Idle),
            Err(e) => return Err(e.into()),
        };

        self.processor.process_url(&mut url)?;
        forward(self.output.as_ref(), url)?;
        Ok(Step::Processed(1))
    }

    fn shutdown(&mut self) {
        self.processor.shutdown();
    }
}

/// Opportunistic batching: block for the first url, then drain what is ready
pub struct Batch<B> {
    processor: B,
    input: Arc<UrlQueue>,
    output: Option<Arc<UrlQueue>>,
}

impl<B: BatchProcessor> Batch<B> {
    pub fn new(processor: B, input: Arc<UrlQueue>, output: Option<Arc<UrlQueue>>) -> Self {
        Self {
            processor,
            input,
            output,
        }
    }

    pub fn processor(&self) -> &B {
        &self.processor
    }

    fn collect(&self, poll_timeout: Duration) -> PostfetchResult<Vec<RecordedUrl>> {
        let first = match self.input.get(Wait::Timeout(poll_timeout)) {
            Ok(url) => url,
            Err(QueueError::Empty) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut batch = Vec::with_capacity(self.input.len().min(MAX_BATCH_SIZE - 1) + 1);
        batch.push(first);
        while batch.len() < MAX_BATCH_SIZE {
            match self.input.get(Wait::NoWait) {
                Ok(url) => batch.push(url),
                Err(QueueError::Empty) => break,
                Err(e) => {
                    crate::critical!(
                        "dropping {} urls collected from {}: {}",
                        batch.len(),
                        self.input.name(),
                        e
                    );
                    return Err(e.into());
                }
            }
        }
        Ok(batch)
    }
}

impl<B: BatchProcessor> ConsumptionPolicy for Batch<B> {
    fn step(&mut self, poll_timeout: Duration) -> PostfetchResult<Step> {
        let mut batch = self.collect(poll_timeout)?;
        if batch.is_empty() {
            return Ok(Step::Idle);
        }

        log::trace!("processing batch of {} urls", batch.len());
        if let Err(e) = self.processor.process_batch(&mut batch) {
            crate::critical!("batch of {} urls not forwarded: {}", batch.len(), e);
            return Err(e);
        }

        let count = batch.len();
        for url in batch {
            forward(self.output.as_ref(), url)?;
        }
        Ok(Step::Processed(count))
    }

    fn shutdown(&mut self) {
        self.processor.shutdown();
    }
}
