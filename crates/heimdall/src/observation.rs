//! The base telemetry record.
//!
//! An [`Observation`] wraps an optional span handle. A record without a
//! handle models disabled tracing: every operation silently does nothing,
//! so instrumented code never branches on whether tracing is on.

use serde::Serialize;

use crate::schema::{self, ObservationKind};
use crate::span::{SpanEvent, SpanHandle, SpanStatus};
use crate::value::AttrValue;

/// Severity level of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    Debug,
    #[default]
    Default,
    Warning,
    Error,
}

impl Level {
    /// Upper-case name written under the level key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Default => "DEFAULT",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One node in a trace tree.
#[derive(Debug, Clone)]
pub struct Observation {
    span: Option<SpanHandle>,
    kind: ObservationKind,
}

impl Observation {
    pub(crate) fn new(span: SpanHandle, kind: ObservationKind) -> Self {
        span.set_attribute(schema::observation::TYPE, AttrValue::Str(kind.to_string()));
        Self {
            span: Some(span),
            kind,
        }
    }

    /// A record that ignores everything.
    pub(crate) fn noop(kind: ObservationKind) -> Self {
        Self { span: None, kind }
    }

    pub fn kind(&self) -> ObservationKind {
        self.kind
    }

    /// Whether this record is backed by a live span.
    pub fn is_active(&self) -> bool {
        self.span.is_some()
    }

    /// The underlying span, for exporters and tests.
    pub fn span(&self) -> Option<&SpanHandle> {
        self.span.as_ref()
    }

    /// Span identity, owned by the span runtime.
    pub fn span_id(&self) -> Option<String> {
        self.span.as_ref().map(|s| s.span_id())
    }

    /// Trace identity, owned by the span runtime.
    pub fn trace_id(&self) -> Option<String> {
        self.span.as_ref().map(|s| s.trace_id())
    }

    pub(crate) fn write(&self, key: &str, value: AttrValue) {
        if let Some(span) = &self.span {
            span.set_attribute(key, value);
        }
    }

    pub(crate) fn add_event(&self, event: SpanEvent) {
        if let Some(span) = &self.span {
            span.add_event(event);
        }
    }

    pub(crate) fn set_status(&self, status: SpanStatus) {
        if let Some(span) = &self.span {
            span.set_status(status);
        }
    }

    /// Record the operation input. Scalars pass through; structured values
    /// are serialized to their canonical JSON string.
    pub fn set_input<T: Serialize + ?Sized>(&self, value: &T) {
        self.write(schema::observation::INPUT, AttrValue::canonical(value));
    }

    /// Record the operation output, with the same serialization rule as
    /// [`set_input`](Self::set_input).
    pub fn set_output<T: Serialize + ?Sized>(&self, value: &T) {
        self.write(schema::observation::OUTPUT, AttrValue::canonical(value));
    }

    /// Write caller metadata under the metadata prefix.
    pub fn set_metadata<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let full = format!("{}{}", schema::observation::METADATA_PREFIX, key);
        self.write(&full, AttrValue::canonical(value));
    }

    pub fn set_level(&self, level: Level) {
        self.write(
            schema::observation::LEVEL,
            AttrValue::Str(level.as_str().to_string()),
        );
    }

    /// Escape hatch for attributes the schema does not cover.
    pub fn set_tag(&self, key: &str, value: impl Into<AttrValue>) {
        self.write(key, value.into());
    }

    /// Exclude this record from export. Attributes already written stay on
    /// the span and records created under this one are unaffected.
    /// Idempotent.
    pub fn skip(&self) {
        if let Some(span) = &self.span {
            span.mark_unrecorded();
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.span.as_ref().is_some_and(|s| !s.is_recorded())
    }

    /// Release the record: the span ends and, unless skipped, is handed to
    /// the sink. Safe to call any number of times.
    pub fn end(&self) {
        if let Some(span) = &self.span {
            span.end();
        }
    }
}
