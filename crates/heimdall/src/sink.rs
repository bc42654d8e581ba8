//! Export boundary for finished spans.
//!
//! The span runtime hands every ended, still-recorded span to a sink.
//! Transport (batching, HTTP ingestion) lives behind this trait and is not
//! this crate's concern.

use std::sync::{Arc, Mutex};

use crate::span::SpanData;

/// Receives finished spans with attributes exactly as the caller set them.
///
/// Sinks must not fail the recording call path; report problems through
/// logging and return.
pub trait SpanSink: Send + Sync {
    fn export(&self, span: &SpanData);
}

/// Discards everything. Used by disabled contexts.
#[derive(Debug, Default)]
pub struct NullSink;

impl SpanSink for NullSink {
    fn export(&self, _span: &SpanData) {}
}

/// Buffers finished spans in memory, for tests and for dispatchers that
/// drain batches themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    spans: Mutex<Vec<SpanData>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All spans exported so far, oldest first.
    pub fn exported(&self) -> Vec<SpanData> {
        self.spans.lock().unwrap().clone()
    }

    /// Remove and return everything buffered.
    pub fn drain(&self) -> Vec<SpanData> {
        std::mem::take(&mut *self.spans.lock().unwrap())
    }

    /// The first exported span with the given name.
    pub fn find(&self, name: &str) -> Option<SpanData> {
        self.spans.lock().unwrap().iter().find(|s| s.name == name).cloned()
    }

    /// Number of spans exported so far.
    pub fn len(&self) -> usize {
        self.spans.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SpanSink for MemorySink {
    fn export(&self, span: &SpanData) {
        self.spans.lock().unwrap().push(span.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_memory_sink_collects_and_drains() {
        let sink = MemorySink::new();
        let span = crate::span::SpanHandle::start("work", None, Arc::clone(&sink) as Arc<dyn SpanSink>, false);
        span.end();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.find("work").unwrap().name, "work");

        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert!(sink.is_empty());
    }
}
