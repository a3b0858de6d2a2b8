//! Tests for the postfetch stage framework

mod listener;

use crate::postfetch::{BatchProcessor, PostfetchError, PostfetchResult, StageOptions, UrlProcessor};
use crate::recorded::RecordedUrl;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(super) fn fast_options() -> StageOptions {
    StageOptions {
        poll_timeout: Duration::from_millis(20),
        error_backoff: Duration::from_millis(10),
        profile: false,
    }
}

pub(super) fn url(name: &str) -> RecordedUrl {
    RecordedUrl::new(format!("http://example.com/{}", name), 100)
}

/// How the recording processor reacts to a url whose path ends in `fail`
#[derive(Debug, Clone, Copy)]
pub(super) enum Failure {
    None,
    Transient,
    DiskFull,
}

/// Records every url it sees and counts shutdown calls
#[derive(Clone)]
pub(super) struct Recorder {
    pub seen: Arc<Mutex<Vec<String>>>,
    pub batches: Arc<Mutex<Vec<usize>>>,
    pub shutdowns: Arc<AtomicUsize>,
    pub failure: Failure,
}

impl Recorder {
    pub fn new(failure: Failure) -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
            batches: Arc::new(Mutex::new(Vec::new())),
            shutdowns: Arc::new(AtomicUsize::new(0)),
            failure,
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    fn check(&self, url: &RecordedUrl) -> PostfetchResult<()> {
        self.seen.lock().unwrap().push(url.url.clone());
        if !url.url.ends_with("fail") {
            return Ok(());
        }
        match self.failure {
            Failure::None => Ok(()),
            Failure::Transient => Err(PostfetchError::Processing {
                message: format!("cannot handle {}", url.url),
            }),
            Failure::DiskFull => Err(io::Error::from_raw_os_error(libc::ENOSPC).into()),
        }
    }
}

impl UrlProcessor for Recorder {
    fn process_url(&mut self, url: &mut RecordedUrl) -> PostfetchResult<()> {
        self.check(url)
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

impl BatchProcessor for Recorder {
    fn process_batch(&mut self, batch: &mut [RecordedUrl]) -> PostfetchResult<()> {
        self.batches.lock().unwrap().push(batch.len());
        for url in batch.iter() {
            self.check(url)?;
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}
