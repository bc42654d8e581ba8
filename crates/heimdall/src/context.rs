//! The trace context: owner of at most one active trace per logical
//! execution.

use std::sync::Arc;

use serde::Serialize;

use crate::error::ContextError;
use crate::sink::{NullSink, SpanSink};
use crate::trace::{Trace, TraceOptions};
use crate::variants::{Agent, Embedding, Event, Generation, Span, ToolCall};

/// Construction-time settings for a context.
#[derive(Debug, Clone)]
pub struct TraceSettings {
    /// When false, every factory yields no-op records.
    pub enabled: bool,
    /// Deployment environment stamped on every trace.
    pub environment: Option<String>,
    /// Client-level release, used when a trace does not set its own.
    pub release: Option<String>,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            environment: None,
            release: None,
        }
    }
}

impl TraceSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for a context whose whole record tree is no-op.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            environment: None,
            release: None,
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }
}

/// Owns the current trace for one logical execution and exposes record
/// factories that delegate to it.
pub struct TraceContext {
    settings: TraceSettings,
    sink: Arc<dyn SpanSink>,
    current: Option<Trace>,
}

impl std::fmt::Debug for TraceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceContext")
            .field("settings", &self.settings)
            .field("current", &self.current)
            .finish()
    }
}

impl TraceContext {
    /// A context exporting through the given sink.
    pub fn new(settings: TraceSettings, sink: Arc<dyn SpanSink>) -> Self {
        Self {
            settings,
            sink,
            current: None,
        }
    }

    /// A context whose entire record tree is no-op.
    pub fn disabled() -> Self {
        Self {
            settings: TraceSettings::disabled(),
            sink: Arc::new(NullSink),
            current: None,
        }
    }

    /// The active trace, if any.
    pub fn current_trace(&self) -> Option<&Trace> {
        self.current.as_ref()
    }

    /// Start the context's trace. Fails while another trace is active.
    pub fn start_trace(
        &mut self,
        name: &str,
        options: &TraceOptions,
    ) -> Result<Trace, ContextError> {
        if self.current.is_some() {
            return Err(ContextError::TraceAlreadyActive);
        }
        let trace = self.build_trace(name, options, false);
        self.current = Some(trace.clone());
        Ok(trace)
    }

    /// Start an independent root trace without touching the current one.
    pub fn create_detached_trace(&self, name: &str, options: &TraceOptions) -> Trace {
        self.build_trace(name, options, true)
    }

    fn build_trace(&self, name: &str, options: &TraceOptions, detached: bool) -> Trace {
        if !self.settings.enabled {
            return Trace::inactive();
        }
        Trace::start(name, options, &self.settings, Arc::clone(&self.sink), detached)
    }

    fn require_current(&self) -> Result<&Trace, ContextError> {
        self.current.as_ref().ok_or(ContextError::NoActiveTrace)
    }

    pub fn create_span(&self, name: &str) -> Result<Span, ContextError> {
        Ok(self.require_current()?.create_span(name))
    }

    pub fn create_generation(
        &self,
        name: &str,
        model: &str,
        provider: Option<&str>,
    ) -> Result<Generation, ContextError> {
        Ok(self.require_current()?.create_generation(name, model, provider))
    }

    pub fn create_tool_call(&self, name: &str, tool_name: &str) -> Result<ToolCall, ContextError> {
        Ok(self.require_current()?.create_tool_call(name, tool_name))
    }

    pub fn create_embedding(
        &self,
        name: &str,
        model: &str,
        provider: Option<&str>,
    ) -> Result<Embedding, ContextError> {
        Ok(self.require_current()?.create_embedding(name, model, provider))
    }

    pub fn create_agent(&self, name: &str, agent_id: &str) -> Result<Agent, ContextError> {
        Ok(self.require_current()?.create_agent(name, agent_id))
    }

    pub fn create_event(&self, name: &str) -> Result<Event, ContextError> {
        Ok(self.require_current()?.create_event(name))
    }

    /// Record input on the active trace; fails when none is active.
    pub fn set_input<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), ContextError> {
        self.require_current()?.set_input(value);
        Ok(())
    }

    /// Record output on the active trace; fails when none is active.
    pub fn set_output<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), ContextError> {
        self.require_current()?.set_output(value);
        Ok(())
    }

    /// End the current trace, if any, and clear it. Idempotent.
    pub fn end(&mut self) {
        if let Some(trace) = self.current.take() {
            trace.end();
        }
    }
}

impl Drop for TraceContext {
    fn drop(&mut self) {
        self.end();
    }
}
