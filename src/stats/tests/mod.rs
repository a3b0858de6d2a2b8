//! Tests for the statistics backends

mod fake_cluster;

use crate::recorded::{RecordedUrl, RequestMeta, WarcRecord, REVISIT};

pub(super) fn new_capture(url: &str, size: u64) -> (RecordedUrl, Vec<WarcRecord>) {
    let records = vec![WarcRecord::of_type("response")];
    (RecordedUrl::new(url, size), records)
}

pub(super) fn revisit(url: &str, size: u64) -> (RecordedUrl, Vec<WarcRecord>) {
    let records = vec![WarcRecord::of_type(REVISIT)];
    (RecordedUrl::new(url, size), records)
}

pub(super) fn in_buckets(url: RecordedUrl, buckets: &[&str]) -> RecordedUrl {
    url.with_meta(RequestMeta::with_buckets(buckets.iter().copied()))
}
