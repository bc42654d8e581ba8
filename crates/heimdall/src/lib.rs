//! Structured execution tracing for LLM applications.
//!
//! heimdall records model calls, tool invocations, embeddings calls, and
//! agent steps as a tree of telemetry records rooted in a [`Trace`]:
//!
//! - **Ambient nesting**: parent/child relationships are derived from the
//!   execution's current span, never passed explicitly. Creating a record
//!   makes it current; releasing it restores the previous one.
//! - **Cross-cutting propagation**: user/session/release/tags published by
//!   a trace flow to every descendant record created in the same logical
//!   execution, including across `.await` boundaries under
//!   [`ambient::scope`].
//! - **Selective recording**: any record can be excluded from export after
//!   creation with `skip()`; data already written stays visible on the
//!   span, it just never reaches the sink.
//! - **Disabled mode**: a disabled [`TraceContext`] hands out records with
//!   no underlying span, so instrumented code runs unchanged with tracing
//!   off.
//!
//! # Example
//!
//! ```rust
//! use heimdall::{LlmResponse, MemorySink, TraceContext, TraceOptions, TraceSettings};
//!
//! let sink = MemorySink::new();
//! let mut ctx = TraceContext::new(TraceSettings::new(), sink.clone());
//!
//! let trace = ctx
//!     .start_trace("checkout", &TraceOptions::new().with_user_id("u-1"))
//!     .unwrap();
//!
//! let generation = trace.create_generation("summarize-cart", "gpt-4", None);
//! generation.set_prompt("Summarize the cart");
//! generation.set_response(&LlmResponse::new().with_usage(100, 50));
//! generation.end();
//!
//! ctx.end();
//! assert_eq!(sink.len(), 2);
//! ```

pub mod ambient;
pub mod context;
pub mod error;
pub mod observation;
pub mod recorder;
pub mod response;
pub mod schema;
pub mod sink;
pub mod span;
pub mod trace;
pub mod value;
pub mod variants;
pub mod writer;

// Re-export main types
pub use context::{TraceContext, TraceSettings};
pub use error::ContextError;
pub use observation::{Level, Observation};
pub use recorder::{
    AgentRecordOptions, EmbeddingsOptions, GenerationOptions, SpanRecordOptions, ToolCallOptions,
};
pub use response::{ChatMessage, LlmResponse, Role};
pub use schema::{ObservationKind, Operation};
pub use sink::{MemorySink, NullSink, SpanSink};
pub use span::{SpanData, SpanEvent, SpanHandle, SpanStatus};
pub use trace::{Trace, TraceOptions};
pub use value::AttrValue;
pub use variants::{Agent, Embedding, Event, Generation, Span, ToolCall};
pub use writer::{SpanWriter, WriteError};
