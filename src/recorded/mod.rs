//! Transaction records handed to the postfetch pipeline
//!
//! These types are the data contract with the proxy engine and the archive
//! writer. The pipeline never creates them; it only reads them, and lets an
//! upstream writer stage attach the archival records it produced.

use serde::{Deserialize, Serialize};

/// Header naming the archival record type
pub const WARC_TYPE: &str = "WARC-Type";
/// Record type of a capture whose payload duplicates earlier archived content
pub const REVISIT: &str = "revisit";

/// One completed, fetched and recorded transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedUrl {
    pub url: String,
    /// Bytes transferred on the wire for this transaction
    pub size: u64,
    /// Per-request metadata supplied by the client, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RequestMeta>,
    /// Archival records written for this transaction, in write order
    #[serde(default)]
    pub warc_records: Vec<WarcRecord>,
}

impl RecordedUrl {
    pub fn new(url: impl Into<String>, size: u64) -> Self {
        Self {
            url: url.into(),
            size,
            meta: None,
            warc_records: Vec::new(),
        }
    }

    pub fn with_meta(mut self, meta: RequestMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_record(mut self, record: WarcRecord) -> Self {
        self.warc_records.push(record);
        self
    }

    /// Custom statistics buckets named in the request metadata
    ///
    /// Empty when there is no metadata, no `stats` section, or no buckets.
    pub fn stats_buckets(&self) -> &[String] {
        self.meta
            .as_ref()
            .and_then(|meta| meta.stats.as_ref())
            .map(|stats| stats.buckets.as_slice())
            .unwrap_or(&[])
    }
}

/// Request metadata; only the statistics section matters here
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsMeta>,
    /// Everything else the client sent, kept for downstream processors
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RequestMeta {
    /// Metadata attributing the transaction to the given buckets
    pub fn with_buckets<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stats: Some(StatsMeta {
                buckets: buckets.into_iter().map(Into::into).collect(),
            }),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsMeta {
    #[serde(default)]
    pub buckets: Vec<String>,
}

/// Header view of an archival record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarcRecord {
    pub headers: Vec<(String, String)>,
}

impl WarcRecord {
    /// Record carrying just a `WARC-Type` header
    pub fn of_type(record_type: &str) -> Self {
        Self {
            headers: vec![(WARC_TYPE.to_string(), record_type.to_string())],
        }
    }

    /// First value of a header, matched case-insensitively
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn record_type(&self) -> Option<&str> {
        self.get_header(WARC_TYPE)
    }

    pub fn is_revisit(&self) -> bool {
        self.record_type() == Some(REVISIT)
    }
}
