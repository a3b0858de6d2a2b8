//! Chaining stages into a pipeline
//!
//! The builder records how to construct each stage; [`PipelineBuilder::build`]
//! creates one queue per stage input, so that stage `n`'s output is stage
//! `n + 1`'s input and the last stage is terminal.
//!
//! A stage's input queue is closed when its thread ends, however it ends, so
//! the stage feeding it cannot block forever on a consumer that is gone.

use crate::core::version::build_description;
use crate::postfetch::engine::{FatalExitHandler, LoopOutcome, PostfetchStage, StageHandle, StageOptions};
use crate::postfetch::error::PostfetchResult;
use crate::postfetch::policy::{ConsumptionPolicy, Step};
use crate::postfetch::UrlQueue;
use std::sync::Arc;
use std::time::Duration;

struct Wiring {
    input: Arc<UrlQueue>,
    output: Option<Arc<UrlQueue>>,
    options: StageOptions,
    fatal_handler: Option<FatalExitHandler>,
}

/// Closes the stage's input once the stage (and with it this policy) is dropped
struct ClosesInput<P> {
    policy: P,
    input: Arc<UrlQueue>,
}

impl<P: ConsumptionPolicy> ConsumptionPolicy for ClosesInput<P> {
    fn step(&mut self, poll_timeout: Duration) -> PostfetchResult<Step> {
        self.policy.step(poll_timeout)
    }

    fn shutdown(&mut self) {
        self.policy.shutdown();
    }
}

impl<P> Drop for ClosesInput<P> {
    fn drop(&mut self) {
        log::debug!("closing {}", self.input.name());
        self.input.close();
    }
}

type Launch = Box<dyn FnOnce(Wiring) -> PostfetchResult<StageHandle> + Send>;

struct StageSpec {
    name: String,
    launch: Launch,
}

/// Collects stages in processing order
pub struct PipelineBuilder {
    queue_size: usize,
    options: StageOptions,
    fatal_handler: Option<FatalExitHandler>,
    stages: Vec<StageSpec>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            queue_size: 0,
            options: StageOptions::default(),
            fatal_handler: None,
            stages: Vec::new(),
        }
    }

    /// Bound every inter-stage queue (0 = unbounded, the default)
    ///
    /// A stage forwarding into a full queue waits for room; it gives up, and
    /// drops that url, only once the downstream stage has ended.
    pub fn queue_size(mut self, max_size: usize) -> Self {
        self.queue_size = max_size;
        self
    }

    /// Options applied to every stage
    pub fn options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fatal_handler(mut self, handler: FatalExitHandler) -> Self {
        self.fatal_handler = Some(handler);
        self
    }

    /// Append a stage; `policy` receives the stage's input and output queues
    pub fn stage<P, F>(mut self, name: impl Into<String>, policy: F) -> Self
    where
        P: ConsumptionPolicy,
        F: FnOnce(Arc<UrlQueue>, Option<Arc<UrlQueue>>) -> P + Send + 'static,
    {
        let name = name.into();
        let stage_name = name.clone();
        let launch: Launch = Box::new(move |wiring: Wiring| {
            let input = Arc::clone(&wiring.input);
            let policy = ClosesInput {
                policy: policy(wiring.input, wiring.output),
                input,
            };
            let mut stage = PostfetchStage::new(stage_name, policy).with_options(wiring.options);
            if let Some(handler) = wiring.fatal_handler {
                stage = stage.with_fatal_handler(handler);
            }
            stage.start()
        });
        self.stages.push(StageSpec { name, launch });
        self
    }

    pub fn build(self) -> Pipeline {
        let queues: Vec<Arc<UrlQueue>> = if self.stages.is_empty() {
            vec![Arc::new(UrlQueue::new("inbound", self.queue_size))]
        } else {
            self.stages
                .iter()
                .map(|spec| Arc::new(UrlQueue::new(format!("{} input", spec.name), self.queue_size)))
                .collect()
        };

        Pipeline {
            queues,
            options: self.options,
            fatal_handler: self.fatal_handler,
            pending: self.stages,
            running: Vec::new(),
        }
    }
}

/// A chain of stages sharing queues
pub struct Pipeline {
    queues: Vec<Arc<UrlQueue>>,
    options: StageOptions,
    fatal_handler: Option<FatalExitHandler>,
    pending: Vec<StageSpec>,
    running: Vec<StageHandle>,
}

impl Pipeline {
    /// Queue the proxy engine feeds completed transactions into
    pub fn inbound(&self) -> Arc<UrlQueue> {
        Arc::clone(&self.queues[0])
    }

    pub fn stage_names(&self) -> Vec<&str> {
        if self.running.is_empty() {
            self.pending.iter().map(|spec| spec.name.as_str()).collect()
        } else {
            self.running.iter().map(|handle| handle.name()).collect()
        }
    }

    /// Spawn every stage thread
    pub fn start(&mut self) -> PostfetchResult<()> {
        let specs: Vec<StageSpec> = self.pending.drain(..).collect();
        crate::notice!(
            "starting postfetch pipeline of {} stages, {}",
            specs.len(),
            build_description()
        );
        for (index, spec) in specs.into_iter().enumerate() {
            let wiring = Wiring {
                input: Arc::clone(&self.queues[index]),
                output: self.queues.get(index + 1).cloned(),
                options: self.options,
                fatal_handler: self.fatal_handler.clone(),
            };
            log::debug!("starting stage {} ({})", index, spec.name);
            let handle = (spec.launch)(wiring)?;
            self.running.push(handle);
        }
        Ok(())
    }

    /// Seconds behind of each stage's input queue, in pipeline order
    pub fn backpressure(&self) -> Vec<(String, f64)> {
        self.queues
            .iter()
            .map(|queue| (queue.name().to_string(), queue.seconds_behind()))
            .collect()
    }

    /// Stop and join stages front to back so queued urls drain downstream
    ///
    /// Every stage is stopped and joined even when an earlier one panicked;
    /// the first failure is returned once all of them have ended.
    pub fn stop(&mut self) -> PostfetchResult<Vec<LoopOutcome>> {
        let mut outcomes = Vec::with_capacity(self.running.len());
        let mut first_error = None;
        for handle in self.running.drain(..) {
            log::debug!("stopping stage {}", handle.name());
            match handle.stop_and_join() {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    log::error!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(outcomes),
        }
    }
}
