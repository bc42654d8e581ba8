//! The root record: owns cross-cutting context publication and the
//! creation of every child record.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::ambient;
use crate::context::TraceSettings;
use crate::observation::{Level, Observation};
use crate::schema::{self, ObservationKind};
use crate::sink::{NullSink, SpanSink};
use crate::span::SpanHandle;
use crate::value::AttrValue;
use crate::variants::{Agent, Embedding, Event, Generation, Span, ToolCall};

/// Optional fields for starting a trace. Absent fields are never written.
#[derive(Debug, Clone, Default)]
pub struct TraceOptions {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    pub tags: Option<Vec<String>>,
    pub public: Option<bool>,
    pub input: Option<serde_json::Value>,
    /// Force a fresh trace identity even when a span is ambiently current.
    pub root: bool,
}

impl TraceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = Some(public);
        self
    }

    pub fn with_input<T: Serialize>(mut self, input: &T) -> Self {
        self.input = serde_json::to_value(input).ok();
        self
    }

    pub fn as_root(mut self) -> Self {
        self.root = true;
        self
    }
}

/// The root telemetry record.
///
/// Cheap to clone; clones share state. An inactive trace (from a disabled
/// context) produces a fully no-op record tree, so call sites never branch
/// on whether tracing is on.
#[derive(Clone)]
pub struct Trace {
    obs: Observation,
    /// Cross-cutting (key, value) pairs this trace carries; for active
    /// traces this is also the set retracted from the ambient store on end.
    crosscut: Arc<Vec<(&'static str, String)>>,
    /// Whether the pairs were published to the ambient store.
    published: bool,
    settings: TraceSettings,
    sink: Arc<dyn SpanSink>,
}

impl std::fmt::Debug for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trace")
            .field("trace_id", &self.obs.trace_id())
            .field("active", &self.obs.is_active())
            .field("published", &self.published)
            .finish()
    }
}

impl Trace {
    /// Start a trace. Child of the ambient current span unless `root` is
    /// requested or nothing is current; `detached` additionally keeps the
    /// trace out of the ambient store and off the current-span stack.
    pub(crate) fn start(
        name: &str,
        options: &TraceOptions,
        settings: &TraceSettings,
        sink: Arc<dyn SpanSink>,
        detached: bool,
    ) -> Trace {
        let parent = if options.root || detached {
            None
        } else {
            ambient::current_span()
        };
        let handle = SpanHandle::start(name, parent.as_ref(), Arc::clone(&sink), !detached);
        let obs = Observation::new(handle, ObservationKind::Trace);
        obs.write(schema::trace::NAME, AttrValue::Str(name.to_string()));

        let mut crosscut: Vec<(&'static str, String)> = Vec::new();
        if let Some(user_id) = &options.user_id {
            crosscut.push((schema::trace::USER_ID, user_id.clone()));
        }
        if let Some(session_id) = &options.session_id {
            crosscut.push((schema::trace::SESSION_ID, session_id.clone()));
        }
        if let Some(version) = &options.version {
            crosscut.push((schema::trace::VERSION, version.clone()));
        }
        if let Some(release) = options.release.as_ref().or(settings.release.as_ref()) {
            crosscut.push((schema::trace::RELEASE, release.clone()));
        }
        if let Some(tags) = &options.tags {
            let encoded = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());
            crosscut.push((schema::trace::TAGS, encoded));
        }

        for (key, value) in &crosscut {
            obs.write(key, AttrValue::Str(value.clone()));
        }
        if let Some(environment) = &settings.environment {
            obs.write(
                schema::trace::ENVIRONMENT,
                AttrValue::Str(environment.clone()),
            );
        }
        if let Some(public) = options.public {
            obs.write(schema::trace::PUBLIC, AttrValue::Bool(public));
        }
        if let Some(input) = &options.input {
            let value = AttrValue::canonical(input);
            obs.write(schema::trace::INPUT, value.clone());
            obs.write(schema::observation::INPUT, value);
        }

        let published = !detached && !crosscut.is_empty();
        if published {
            for (key, value) in &crosscut {
                ambient::publish(key, value.clone());
            }
        }
        debug!(
            trace = name,
            trace_id = %obs.trace_id().unwrap_or_default(),
            detached,
            "trace started"
        );

        Trace {
            obs,
            crosscut: Arc::new(crosscut),
            published,
            settings: settings.clone(),
            sink,
        }
    }

    /// A trace that records nothing; every child it creates is no-op too.
    pub(crate) fn inactive() -> Trace {
        Trace {
            obs: Observation::noop(ObservationKind::Trace),
            crosscut: Arc::new(Vec::new()),
            published: false,
            settings: TraceSettings::default(),
            sink: Arc::new(NullSink),
        }
    }

    /// Whether this trace records anything.
    pub fn is_active(&self) -> bool {
        self.obs.is_active()
    }

    pub fn span_id(&self) -> Option<String> {
        self.obs.span_id()
    }

    pub fn trace_id(&self) -> Option<String> {
        self.obs.trace_id()
    }

    /// The trace's own record, for the recorder helpers.
    pub fn observation(&self) -> &Observation {
        &self.obs
    }

    fn child(&self, name: &str, kind: ObservationKind) -> Observation {
        let Some(own) = self.obs.span() else {
            return Observation::noop(kind);
        };

        // Nested records attach to the innermost live span of this trace; a
        // detached trace's children must not attach to ambient spans from
        // some other trace.
        let parent = match ambient::current_span() {
            Some(current) if current.trace_id() == own.trace_id() => current,
            _ => own.clone(),
        };

        let handle = SpanHandle::start(name, Some(&parent), Arc::clone(&self.sink), true);
        let obs = Observation::new(handle, kind);
        for (key, value) in self.crosscut.iter() {
            obs.write(key, AttrValue::Str(value.clone()));
        }
        obs
    }

    /// Create a nested span record.
    pub fn create_span(&self, name: &str) -> Span {
        Span::from_obs(self.child(name, ObservationKind::Span))
    }

    /// Create a model generation record.
    pub fn create_generation(&self, name: &str, model: &str, provider: Option<&str>) -> Generation {
        let obs = self.child(name, ObservationKind::Generation);
        obs.write(
            schema::operation::REQUEST_MODEL,
            AttrValue::Str(model.to_string()),
        );
        if let Some(provider) = provider {
            obs.write(
                schema::operation::PROVIDER,
                AttrValue::Str(provider.to_string()),
            );
        }
        Generation::from_obs(obs)
    }

    /// Create a tool invocation record.
    pub fn create_tool_call(&self, name: &str, tool_name: &str) -> ToolCall {
        let obs = self.child(name, ObservationKind::Tool);
        obs.write(schema::tool::NAME, AttrValue::Str(tool_name.to_string()));
        ToolCall::from_obs(obs)
    }

    /// Create an embeddings call record.
    pub fn create_embedding(&self, name: &str, model: &str, provider: Option<&str>) -> Embedding {
        let obs = self.child(name, ObservationKind::Embedding);
        obs.write(
            schema::operation::REQUEST_MODEL,
            AttrValue::Str(model.to_string()),
        );
        if let Some(provider) = provider {
            obs.write(
                schema::operation::PROVIDER,
                AttrValue::Str(provider.to_string()),
            );
        }
        Embedding::from_obs(obs)
    }

    /// Create an agent step record.
    pub fn create_agent(&self, name: &str, agent_id: &str) -> Agent {
        let obs = self.child(name, ObservationKind::Agent);
        obs.write(schema::agent::ID, AttrValue::Str(agent_id.to_string()));
        obs.write(schema::agent::NAME, AttrValue::Str(name.to_string()));
        Agent::from_obs(obs)
    }

    /// Create a point-in-time event record.
    pub fn create_event(&self, name: &str) -> Event {
        Event::from_obs(self.child(name, ObservationKind::Event))
    }

    /// Create a second, independent root trace. The new trace never touches
    /// the ambient store or the current-span stack, so the caller's active
    /// trace is undisturbed.
    pub fn create_detached_trace(&self, name: &str, options: &TraceOptions) -> Trace {
        if !self.is_active() {
            return Trace::inactive();
        }
        Trace::start(name, options, &self.settings, Arc::clone(&self.sink), true)
    }

    /// Rename the trace after creation.
    pub fn set_trace_name(&self, name: &str) {
        if let Some(span) = self.obs.span() {
            span.set_name(name);
        }
        self.obs
            .write(schema::trace::NAME, AttrValue::Str(name.to_string()));
    }

    /// Record the trace input, written to both the trace-level and the
    /// observation-level key.
    pub fn set_input<T: Serialize + ?Sized>(&self, value: &T) {
        let attr = AttrValue::canonical(value);
        self.obs.write(schema::trace::INPUT, attr.clone());
        self.obs.write(schema::observation::INPUT, attr);
    }

    /// Record the trace output, mirrored like [`set_input`](Self::set_input).
    pub fn set_output<T: Serialize + ?Sized>(&self, value: &T) {
        let attr = AttrValue::canonical(value);
        self.obs.write(schema::trace::OUTPUT, attr.clone());
        self.obs.write(schema::observation::OUTPUT, attr);
    }

    pub fn set_metadata<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.obs.set_metadata(key, value);
    }

    pub fn set_level(&self, level: Level) {
        self.obs.set_level(level);
    }

    pub fn set_tag(&self, key: &str, value: impl Into<AttrValue>) {
        self.obs.set_tag(key, value);
    }

    /// Exclude the trace's own record from export; child records are
    /// unaffected.
    pub fn skip(&self) {
        self.obs.skip();
    }

    pub fn is_skipped(&self) -> bool {
        self.obs.is_skipped()
    }

    /// End the trace and retract every cross-cutting key it published,
    /// whether or not child records have been released yet. Idempotent.
    pub fn end(&self) {
        let transitioned = match self.obs.span() {
            Some(span) => span.end(),
            None => false,
        };
        if transitioned && self.published {
            for (key, _) in self.crosscut.iter() {
                ambient::retract(key);
            }
            debug!(
                trace_id = %self.obs.trace_id().unwrap_or_default(),
                "trace ended, cross-cutting context retracted"
            );
        }
    }
}
