//! Tests for the listener adapter

use super::{fast_options, url};
use crate::postfetch::{Listener, ListenerProcessor, LoopOutcome, PostfetchError, PostfetchResult, UrlQueue};
use crate::queue::Wait;
use crate::recorded::{RecordedUrl, WarcRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CrawlLog {
    lines: Arc<Mutex<Vec<String>>>,
    stopped: Arc<AtomicBool>,
}

impl Listener for CrawlLog {
    fn notify(&self, url: &RecordedUrl, records: &[WarcRecord]) -> PostfetchResult<()> {
        let kind = records
            .first()
            .and_then(|record| record.record_type())
            .unwrap_or("-");
        self.lines
            .lock()
            .unwrap()
            .push(format!("{} {} {}", url.size, kind, url.url));
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

struct Refusing;

impl Listener for Refusing {
    fn notify(&self, url: &RecordedUrl, _records: &[WarcRecord]) -> PostfetchResult<()> {
        Err(PostfetchError::listener(
            "refusing",
            format!("will not log {}", url.url),
        ))
    }
}

#[test]
fn test_listener_sees_url_and_its_records() {
    let input = Arc::new(UrlQueue::unbounded("input"));
    let output = Arc::new(UrlQueue::unbounded("output"));
    let listener = CrawlLog::default();
    let lines = Arc::clone(&listener.lines);
    let stopped = Arc::clone(&listener.stopped);

    input
        .put(url("a").with_record(WarcRecord::of_type("response")), Wait::NoWait)
        .unwrap();
    input.put(url("b"), Wait::NoWait).unwrap();

    let mut stage = ListenerProcessor::stage("CrawlLogger", listener, input, Some(output.clone()))
        .with_options(fast_options());
    stage.stop_signal().trigger();

    assert_eq!(stage.run_loop(), LoopOutcome::Stopped);
    assert_eq!(
        *lines.lock().unwrap(),
        vec![
            "100 response http://example.com/a".to_string(),
            "100 - http://example.com/b".to_string(),
        ]
    );
    assert_eq!(output.len(), 2);
    assert!(stopped.load(Ordering::SeqCst));
}

#[test]
fn test_listener_failure_is_transient() {
    use crate::core::error_handling::{classify, ErrorClass};
    use crate::postfetch::UrlProcessor;

    let mut processor = ListenerProcessor::new(Refusing);
    let mut target = url("a");
    let err = processor.process_url(&mut target).unwrap_err();

    assert!(matches!(err, PostfetchError::Listener { ref listener, .. } if listener == "refusing"));
    assert_eq!(classify(&err), ErrorClass::Transient);
}

#[test]
fn test_listener_disk_full_is_fatal() {
    use crate::core::error_handling::{classify, ErrorClass};

    let err = PostfetchError::listener("crawl log", std::io::Error::from_raw_os_error(libc::ENOSPC));
    assert_eq!(classify(&err), ErrorClass::Fatal);
}
