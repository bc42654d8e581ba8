//! The span runtime: shared handles over mutable span state.
//!
//! Records wrap these handles. A handle keeps its data after `end()`, so
//! exporters and tests observe attributes exactly as they were written; no
//! buffering or transformation happens between a setter and the span.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ambient;
use crate::sink::SpanSink;
use crate::value::AttrValue;

/// Completion status of a span.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error { message: String },
}

/// A point-in-time occurrence on a span's timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl SpanEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// The state behind a span handle. This is also the export payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanData {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub name: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttrValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SpanEvent>,
    #[serde(default)]
    pub status: SpanStatus,
    /// False once the span has been excluded from export.
    pub recorded: bool,
}

struct SpanInner {
    data: SpanData,
    ended: bool,
    sink: Arc<dyn SpanSink>,
}

/// Cheap-clone handle to one span's mutable state.
#[derive(Clone)]
pub struct SpanHandle {
    inner: Arc<Mutex<SpanInner>>,
}

impl std::fmt::Debug for SpanHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("SpanHandle")
            .field("trace_id", &inner.data.trace_id)
            .field("span_id", &inner.data.span_id)
            .field("name", &inner.data.name)
            .finish()
    }
}

impl SpanHandle {
    /// Start a span. Parent and trace identity come from `parent` when
    /// given; otherwise a fresh trace identity is minted. With
    /// `make_current` the new span is pushed as ambient-current.
    pub(crate) fn start(
        name: &str,
        parent: Option<&SpanHandle>,
        sink: Arc<dyn SpanSink>,
        make_current: bool,
    ) -> SpanHandle {
        let (trace_id, parent_span_id) = match parent {
            Some(p) => (p.trace_id(), Some(p.span_id())),
            None => (Uuid::new_v4().to_string(), None),
        };

        let data = SpanData {
            trace_id,
            span_id: Uuid::new_v4().to_string(),
            parent_span_id,
            name: name.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            attributes: BTreeMap::new(),
            events: Vec::new(),
            status: SpanStatus::Unset,
            recorded: true,
        };

        let handle = SpanHandle {
            inner: Arc::new(Mutex::new(SpanInner {
                data,
                ended: false,
                sink,
            })),
        };

        if make_current {
            ambient::push_span(handle.clone());
        }
        handle
    }

    pub fn span_id(&self) -> String {
        self.inner.lock().unwrap().data.span_id.clone()
    }

    pub fn trace_id(&self) -> String {
        self.inner.lock().unwrap().data.trace_id.clone()
    }

    pub fn parent_span_id(&self) -> Option<String> {
        self.inner.lock().unwrap().data.parent_span_id.clone()
    }

    pub fn name(&self) -> String {
        self.inner.lock().unwrap().data.name.clone()
    }

    pub(crate) fn set_name(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.ended {
            inner.data.name = name.to_string();
        }
    }

    /// Whether the span is still eligible for export.
    pub fn is_recorded(&self) -> bool {
        self.inner.lock().unwrap().data.recorded
    }

    /// Exclude the span from export. Data already written stays in place.
    pub(crate) fn mark_unrecorded(&self) {
        self.inner.lock().unwrap().data.recorded = false;
    }

    pub fn is_ended(&self) -> bool {
        self.inner.lock().unwrap().ended
    }

    /// Writes after `end()` are dropped; everything else lands verbatim.
    pub(crate) fn set_attribute(&self, key: &str, value: AttrValue) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.ended {
            inner.data.attributes.insert(key.to_string(), value);
        }
    }

    /// A single attribute, as written.
    pub fn attribute(&self, key: &str) -> Option<AttrValue> {
        self.inner.lock().unwrap().data.attributes.get(key).cloned()
    }

    pub(crate) fn add_event(&self, event: SpanEvent) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.ended {
            inner.data.events.push(event);
        }
    }

    pub(crate) fn set_status(&self, status: SpanStatus) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.ended {
            inner.data.status = status;
        }
    }

    /// A copy of the span's current state.
    pub fn snapshot(&self) -> SpanData {
        self.inner.lock().unwrap().data.clone()
    }

    /// End the span: stamp the end time, drop it from the ambient stack,
    /// and hand it to the sink unless it was excluded from export. Returns
    /// whether this call performed the transition; repeated calls do
    /// nothing.
    pub(crate) fn end(&self) -> bool {
        let export = {
            let mut inner = self.inner.lock().unwrap();
            if inner.ended {
                return false;
            }
            inner.ended = true;
            inner.data.ended_at = Some(Utc::now());
            if inner.data.recorded {
                Some((inner.data.clone(), Arc::clone(&inner.sink)))
            } else {
                None
            }
        };

        ambient::remove_span(&self.span_id());

        if let Some((data, sink)) = export {
            tracing::debug!(span = %data.name, span_id = %data.span_id, "span ended");
            sink.export(&data);
        }
        true
    }
}
