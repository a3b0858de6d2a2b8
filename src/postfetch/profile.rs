//! Optional per-stage loop profiling

use std::time::{Duration, Instant};

/// Counters gathered over the lifetime of one stage loop
#[derive(Debug)]
pub struct LoopProfile {
    stage: String,
    started: Instant,
    iterations: u64,
    processed: u64,
    idle_polls: u64,
    errors: u64,
    busy: Duration,
}

impl LoopProfile {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            started: Instant::now(),
            iterations: 0,
            processed: 0,
            idle_polls: 0,
            errors: 0,
            busy: Duration::ZERO,
        }
    }

    /// A step that handled `items` urls in `elapsed`
    pub fn record_processed(&mut self, items: usize, elapsed: Duration) {
        self.iterations += 1;
        self.processed += items as u64;
        self.busy += elapsed;
    }

    /// A step whose poll timed out on an empty input
    pub fn record_idle(&mut self) {
        self.iterations += 1;
        self.idle_polls += 1;
    }

    pub fn record_error(&mut self, elapsed: Duration) {
        self.iterations += 1;
        self.errors += 1;
        self.busy += elapsed;
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn idle_polls(&self) -> u64 {
        self.idle_polls
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn busy(&self) -> Duration {
        self.busy
    }

    /// Log the collected counters
    pub fn report(&self) {
        let wall = self.started.elapsed();
        let utilisation = if wall.is_zero() {
            0.0
        } else {
            self.busy.as_secs_f64() / wall.as_secs_f64() * 100.0
        };
        log::info!(
            "{} profile: {} iterations, {} urls processed, {} idle polls, {} errors, busy {:.3}s of {:.3}s ({:.1}%)",
            self.stage,
            self.iterations,
            self.processed,
            self.idle_polls,
            self.errors,
            self.busy.as_secs_f64(),
            wall.as_secs_f64(),
            utilisation
        );
    }
}
