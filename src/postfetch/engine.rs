//! Stage loop: one thread per stage
//!
//! A [`PostfetchStage`] repeatedly runs its policy's step until the stop
//! signal is set and the input has run dry. Errors are classified on every
//! iteration: storage exhaustion shuts the stage down and exits the process,
//! anything else is logged and the loop carries on after a short backoff.

use crate::config::StageConfig;
use crate::core::error_handling::{classify, error_chain, log_error_with_context, ErrorClass};
use crate::core::logging::Severity;
use crate::core::shutdown::StopSignal;
use crate::postfetch::error::{PostfetchError, PostfetchResult};
use crate::postfetch::policy::{ConsumptionPolicy, Step};
use crate::postfetch::profile::LoopProfile;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Exit status used when a stage hits a fatal error
pub const FATAL_EXIT_CODE: i32 = 1;

/// Called with the exit status after a fatal error
pub type FatalExitHandler = Arc<dyn Fn(i32) + Send + Sync>;

/// How a stage loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Stop was requested and the input was drained
    Stopped,
    /// A fatal error ended the loop and the exit handler was invoked
    Fatal,
}

/// Timings and switches for one stage loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOptions {
    pub poll_timeout: Duration,
    pub error_backoff: Duration,
    pub profile: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(500),
            error_backoff: Duration::from_millis(500),
            profile: false,
        }
    }
}

impl From<&StageConfig> for StageOptions {
    fn from(config: &StageConfig) -> Self {
        Self {
            poll_timeout: config.poll_timeout(),
            error_backoff: config.error_backoff(),
            profile: config.profile,
        }
    }
}

fn exit_process() -> FatalExitHandler {
    Arc::new(|code| {
        std::process::exit(code);
    })
}

/// A named stage driving one consumption policy
pub struct PostfetchStage<P: ConsumptionPolicy> {
    name: String,
    policy: P,
    options: StageOptions,
    stop: StopSignal,
    on_fatal: FatalExitHandler,
}

impl<P: ConsumptionPolicy> PostfetchStage<P> {
    pub fn new(name: impl Into<String>, policy: P) -> Self {
        Self {
            name: name.into(),
            policy,
            options: StageOptions::default(),
            stop: StopSignal::new(),
            on_fatal: exit_process(),
        }
    }

    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the default `std::process::exit` reaction to fatal errors
    pub fn with_fatal_handler(mut self, handler: FatalExitHandler) -> Self {
        self.on_fatal = handler;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> StageOptions {
        self.options
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Handle that requests this stage to stop once its input is drained
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Run the loop on the calling thread until stop or a fatal error
    ///
    /// The policy's shutdown hook runs exactly once before this returns.
    pub fn run_loop(&mut self) -> LoopOutcome {
        log::info!("{} starting up", self.name);
        let mut profile = self.options.profile.then(|| LoopProfile::new(&self.name));

        let outcome = loop {
            let started = Instant::now();
            match self.policy.step(self.options.poll_timeout) {
                Ok(Step::Idle) => {
                    if let Some(profile) = profile.as_mut() {
                        profile.record_idle();
                    }
                    if self.stop.is_set() {
                        break LoopOutcome::Stopped;
                    }
                }
                Ok(Step::Processed(count)) => {
                    if let Some(profile) = profile.as_mut() {
                        profile.record_processed(count, started.elapsed());
                    }
                }
                Err(e) => {
                    if let Some(profile) = profile.as_mut() {
                        profile.record_error(started.elapsed());
                    }
                    if self.handle_error(&e) == ErrorClass::Fatal {
                        break LoopOutcome::Fatal;
                    }
                    if self.stop.is_set() {
                        break LoopOutcome::Stopped;
                    }
                }
            }
        };

        self.policy.shutdown();
        if let Some(profile) = profile {
            profile.report();
        }

        match outcome {
            LoopOutcome::Stopped => log::info!("{} shut down", self.name),
            LoopOutcome::Fatal => (self.on_fatal)(FATAL_EXIT_CODE),
        }
        outcome
    }

    fn handle_error(&self, error: &PostfetchError) -> ErrorClass {
        let class = classify(error);
        match class {
            ErrorClass::Fatal => {
                crate::critical!(
                    "{} shutting down due to fatal problem: {}",
                    self.name,
                    error_chain(error)
                );
            }
            ErrorClass::Transient => {
                let context = format!("{} will try to continue after unexpected error", self.name);
                log_error_with_context(error, &context, Severity::Critical);
                thread::sleep(self.options.error_backoff);
            }
        }
        class
    }

    /// Spawn the loop on its own named thread
    pub fn start(self) -> PostfetchResult<StageHandle> {
        let name = self.name.clone();
        let stop = self.stop.clone();
        let mut stage = self;
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || stage.run_loop())
            .map_err(|source| PostfetchError::Spawn {
                stage: name.clone(),
                source,
            })?;

        Ok(StageHandle {
            name,
            stop,
            thread,
        })
    }
}

/// A running stage
pub struct StageHandle {
    name: String,
    stop: StopSignal,
    thread: JoinHandle<LoopOutcome>,
}

impl StageHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the stage to exit once its input is drained
    pub fn stop(&self) {
        self.stop.trigger();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the stage thread to end
    pub fn join(self) -> PostfetchResult<LoopOutcome> {
        let name = self.name;
        self.thread.join().map_err(|_| PostfetchError::Processing {
            message: format!("stage '{}' panicked", name),
        })
    }

    pub fn stop_and_join(self) -> PostfetchResult<LoopOutcome> {
        self.stop();
        self.join()
    }
}
