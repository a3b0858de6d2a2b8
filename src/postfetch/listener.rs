//! Single-url stage forwarding to an external listener

use crate::postfetch::engine::PostfetchStage;
use crate::postfetch::error::PostfetchResult;
use crate::postfetch::policy::{Standard, UrlProcessor};
use crate::postfetch::UrlQueue;
use crate::recorded::{RecordedUrl, WarcRecord};
use std::sync::Arc;

/// Something that wants to hear about every recorded url
pub trait Listener: Send + 'static {
    fn notify(&self, url: &RecordedUrl, records: &[WarcRecord]) -> PostfetchResult<()>;

    /// Called once when the owning stage shuts down
    fn stop(&self) {}
}

/// Adapts a [`Listener`] to the [`UrlProcessor`] interface
pub struct ListenerProcessor<L> {
    listener: L,
}

impl<L: Listener> ListenerProcessor<L> {
    pub fn new(listener: L) -> Self {
        Self { listener }
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Standard stage notifying `listener` of each url taken from `input`
    pub fn stage(
        name: impl Into<String>,
        listener: L,
        input: Arc<UrlQueue>,
        output: Option<Arc<UrlQueue>>,
    ) -> PostfetchStage<Standard<Self>> {
        PostfetchStage::new(name, Standard::new(Self::new(listener), input, output))
    }
}

impl<L: Listener> UrlProcessor for ListenerProcessor<L> {
    fn process_url(&mut self, url: &mut RecordedUrl) -> PostfetchResult<()> {
        self.listener.notify(url, &url.warc_records)
    }

    fn shutdown(&mut self) {
        self.listener.stop();
    }
}
