//! End-to-end tests for the trace/record lifecycle.
//!
//! These exercise full flows through the public API: ambient nesting,
//! cross-cutting propagation, detached traces, selective recording, and
//! the no-op tree of a disabled context.

use std::sync::Arc;

use heimdall::{
    ambient, recorder, schema, AttrValue, ContextError, GenerationOptions, LlmResponse,
    MemorySink, SpanData, ToolCallOptions, TraceContext, TraceOptions, TraceSettings,
};

fn new_context(sink: &Arc<MemorySink>) -> TraceContext {
    TraceContext::new(TraceSettings::new(), Arc::clone(sink) as Arc<dyn heimdall::SpanSink>)
}

fn attr<'a>(span: &'a SpanData, key: &str) -> Option<&'a AttrValue> {
    span.attributes.get(key)
}

/// E2E: root trace -> generation -> response -> release everything.
///
/// Expects the generation to carry the model and exactly the two usage
/// keys, and the ambient store to be empty after the trace ends.
#[test]
fn test_e2e_generation_flow() {
    let sink = MemorySink::new();
    let mut ctx = new_context(&sink);

    let trace = ctx.start_trace("root", &TraceOptions::new()).unwrap();
    let generation = trace.create_generation("g1", "gpt-4", None);
    generation.set_response(&LlmResponse::new().with_usage(100, 50));
    generation.end();
    ctx.end();

    let g1 = sink.find("g1").unwrap();
    assert_eq!(
        attr(&g1, schema::operation::REQUEST_MODEL),
        Some(&AttrValue::Str("gpt-4".to_string()))
    );
    assert_eq!(
        attr(&g1, schema::response::USAGE_INPUT_TOKENS),
        Some(&AttrValue::Int(100))
    );
    assert_eq!(
        attr(&g1, schema::response::USAGE_OUTPUT_TOKENS),
        Some(&AttrValue::Int(50))
    );
    assert!(attr(&g1, schema::response::USAGE_TOTAL_TOKENS).is_none());
    assert!(attr(&g1, schema::response::MODEL).is_none());
    assert!(attr(&g1, schema::response::FINISH_REASONS).is_none());

    assert!(ambient::baggage().is_empty());
    assert_eq!(sink.len(), 2);
}

/// E2E: nested spans derive their parents from creation order.
#[test]
fn test_nested_spans_follow_creation_order() {
    let sink = MemorySink::new();
    let mut ctx = new_context(&sink);

    let trace = ctx
        .start_trace("t", &TraceOptions::new().with_user_id("u1"))
        .unwrap();
    let s1 = ctx.create_span("s1").unwrap();
    let s2 = ctx.create_span("s2").unwrap();

    s2.end();
    s1.end();
    let trace_span_id = trace.span_id().unwrap();
    ctx.end();

    let exported_s1 = sink.find("s1").unwrap();
    let exported_s2 = sink.find("s2").unwrap();

    assert_eq!(exported_s2.parent_span_id.as_deref(), Some(exported_s1.span_id.as_str()));
    assert_eq!(exported_s1.parent_span_id.as_deref(), Some(trace_span_id.as_str()));

    // Everything shares one trace identity.
    let t = sink.find("t").unwrap();
    assert_eq!(exported_s1.trace_id, t.trace_id);
    assert_eq!(exported_s2.trace_id, t.trace_id);
}

#[test]
fn test_start_trace_twice_fails_then_recovers() {
    let sink = MemorySink::new();
    let mut ctx = new_context(&sink);

    ctx.start_trace("first", &TraceOptions::new()).unwrap();
    assert_eq!(
        ctx.start_trace("again", &TraceOptions::new()).unwrap_err(),
        ContextError::TraceAlreadyActive
    );

    ctx.end();
    ctx.start_trace("second", &TraceOptions::new()).unwrap();
    ctx.end();

    assert_eq!(sink.len(), 2);
}

#[test]
fn test_detached_trace_gets_fresh_identity() {
    let sink = MemorySink::new();
    let mut ctx = new_context(&sink);

    let active = ctx
        .start_trace("main", &TraceOptions::new().with_user_id("outer"))
        .unwrap();
    let detached = ctx.create_detached_trace("background", &TraceOptions::new());

    assert_ne!(detached.trace_id(), active.trace_id());
    assert_eq!(
        ctx.current_trace().unwrap().trace_id(),
        active.trace_id()
    );
    // The caller's published context is untouched.
    assert_eq!(
        ambient::baggage_get(schema::trace::USER_ID),
        Some("outer".to_string())
    );

    detached.end();
    ctx.end();
}

/// A second trace started after the first one ends sees none of its keys.
#[test]
fn test_crosscut_keys_do_not_leak_between_traces() {
    let sink = MemorySink::new();
    let mut ctx = new_context(&sink);

    ctx.start_trace(
        "first",
        &TraceOptions::new()
            .with_user_id("u1")
            .with_session_id("s1")
            .with_version("v1")
            .with_tags(vec!["a".to_string()]),
    )
    .unwrap();
    assert!(!ambient::baggage().is_empty());
    ctx.end();
    assert!(ambient::baggage().is_empty());

    let second = ctx.start_trace("second", &TraceOptions::new()).unwrap();
    let child = second.create_span("child");
    child.end();
    ctx.end();

    let exported = sink.find("child").unwrap();
    assert!(attr(&exported, schema::trace::USER_ID).is_none());
    assert!(attr(&exported, schema::trace::SESSION_ID).is_none());
    assert!(attr(&exported, schema::trace::TAGS).is_none());
}

/// §-scenario: a skipped tool call keeps its data but never reaches the
/// sink.
#[test]
fn test_skipped_tool_call_keeps_data_but_is_not_exported() {
    let sink = MemorySink::new();
    let mut ctx = new_context(&sink);

    let trace = ctx.start_trace("root", &TraceOptions::new()).unwrap();
    let call = recorder::tool_call(
        &trace,
        "call-weather",
        "get_weather",
        &ToolCallOptions::new(),
    );
    call.set_arguments(&serde_json::json!({"location": "NYC"}));
    call.skip();

    assert!(call.is_skipped());
    let span = call.span().unwrap();
    assert!(!span.is_recorded());
    // Exclusion from export, not data erasure.
    assert_eq!(
        span.attribute(schema::tool::ARGUMENTS),
        Some(AttrValue::Str(r#"{"location":"NYC"}"#.to_string()))
    );

    call.end();
    ctx.end();

    assert!(sink.find("call-weather").is_none());
    assert!(sink.find("root").is_some());
}

/// Skip is local: skipped parent with recorded child and the reverse.
#[test]
fn test_skip_does_not_cascade_in_either_direction() {
    let sink = MemorySink::new();
    let mut ctx = new_context(&sink);

    let trace = ctx.start_trace("root", &TraceOptions::new()).unwrap();

    let parent = trace.create_span("skipped-parent");
    let child = trace.create_span("recorded-child");
    parent.skip();
    child.end();
    parent.end();

    let recorded_parent = trace.create_span("recorded-parent");
    let skipped_child = trace.create_span("skipped-child");
    skipped_child.skip();
    skipped_child.end();
    recorded_parent.end();

    ctx.end();

    assert!(sink.find("skipped-parent").is_none());
    assert!(sink.find("skipped-child").is_none());
    assert!(sink.find("recorded-child").is_some());
    assert!(sink.find("recorded-parent").is_some());
}

#[test]
fn test_disabled_context_runs_instrumented_code_unchanged() {
    let mut ctx = TraceContext::disabled();

    let trace = ctx
        .start_trace("t", &TraceOptions::new().with_user_id("u"))
        .unwrap();
    assert!(!trace.is_active());

    let generation = ctx.create_generation("g", "gpt-4", Some("openai")).unwrap();
    generation.set_prompt("hello");
    generation.set_response(&LlmResponse::new().with_usage(1, 2));
    generation.set_temperature(0.5);
    generation.end();

    let call = ctx.create_tool_call("c", "tool").unwrap();
    call.set_arguments("args");
    call.skip();
    call.end();

    let embedding = ctx.create_embedding("e", "text-embedding-3-small", None).unwrap();
    embedding.set_dimensions(256);
    embedding.end();

    ctx.set_input("in").unwrap();
    ctx.set_output("out").unwrap();
    ctx.end();
    ctx.end();

    assert!(generation.span().is_none());
    assert!(ambient::baggage().is_empty());
}

#[test]
fn test_release_out_of_order_is_safe() {
    let sink = MemorySink::new();
    let mut ctx = new_context(&sink);

    let trace = ctx.start_trace("root", &TraceOptions::new()).unwrap();
    let s1 = trace.create_span("s1");
    let s2 = trace.create_span("s2");

    // Parent released before child; repeated releases everywhere.
    s1.end();
    s1.end();
    s2.end();
    trace.end();
    ctx.end();
    ctx.end();

    assert_eq!(sink.len(), 3);
}

#[test]
fn test_recorder_shapes_end_to_end() {
    let sink = MemorySink::new();
    let mut ctx = new_context(&sink);

    let trace = ctx.start_trace("turn", &TraceOptions::new()).unwrap();

    recorder::embeddings(
        &trace,
        "embed-query",
        "text-embedding-3-small",
        &heimdall::EmbeddingsOptions::new()
            .with_text("what is rust")
            .with_dimensions(1536),
    )
    .end();

    recorder::invoke_agent(
        &trace,
        "researcher",
        "agent-9",
        &heimdall::AgentRecordOptions::new().with_description("looks things up"),
    )
    .end();

    let generation = recorder::chat_completion(
        &trace,
        "answer",
        "gpt-4",
        &GenerationOptions::new()
            .with_max_tokens(512)
            .with_prompt_reference("qa-prompt", Some(2)),
    );
    generation.end();
    ctx.end();

    let embed = sink.find("embed-query").unwrap();
    assert_eq!(
        attr(&embed, schema::operation::NAME),
        Some(&AttrValue::Str("embeddings".to_string()))
    );
    assert_eq!(
        attr(&embed, schema::embedding::DIMENSIONS),
        Some(&AttrValue::Int(1536))
    );

    let agent = sink.find("researcher").unwrap();
    assert_eq!(
        attr(&agent, schema::operation::NAME),
        Some(&AttrValue::Str("invoke_agent".to_string()))
    );
    assert_eq!(
        attr(&agent, schema::agent::ID),
        Some(&AttrValue::Str("agent-9".to_string()))
    );

    let answer = sink.find("answer").unwrap();
    assert_eq!(
        attr(&answer, schema::observation::PROMPT_NAME),
        Some(&AttrValue::Str("qa-prompt".to_string()))
    );
    assert_eq!(
        attr(&answer, schema::observation::PROMPT_VERSION),
        Some(&AttrValue::Int(2))
    );
}

/// Records created from sibling tasks that see the same current span
/// become siblings, not ancestors of each other.
#[tokio::test]
async fn test_sibling_tasks_share_a_parent() {
    let sink = MemorySink::new();

    ambient::scope(async {
        let mut ctx = new_context(&sink);
        let trace = ctx.start_trace("root", &TraceOptions::new()).unwrap();
        let phase = trace.create_span("phase");
        let snap_a = ambient::snapshot();
        let snap_b = ambient::snapshot();

        let trace_a = trace.clone();
        let trace_b = trace.clone();

        let a = tokio::spawn(ambient::scope_with(snap_a, async move {
            let span = trace_a.create_span("worker-a");
            let parent = span.span().unwrap().parent_span_id();
            span.end();
            parent
        }));
        let b = tokio::spawn(ambient::scope_with(snap_b, async move {
            let span = trace_b.create_span("worker-b");
            let parent = span.span().unwrap().parent_span_id();
            span.end();
            parent
        }));

        let parent_a = a.await.unwrap();
        let parent_b = b.await.unwrap();

        assert_eq!(parent_a, phase.span_id());
        assert_eq!(parent_b, phase.span_id());

        phase.end();
        ctx.end();
    })
    .await;

    assert_eq!(sink.len(), 4);
}

/// Cross-cutting fields published by the trace are readable from code that
/// was never handed the trace, across await points.
#[tokio::test]
async fn test_baggage_flows_across_async_boundaries() {
    async fn unrelated_library_code() -> Option<String> {
        tokio::task::yield_now().await;
        ambient::baggage_get(schema::trace::SESSION_ID)
    }

    let sink = MemorySink::new();
    ambient::scope(async {
        let mut ctx = new_context(&sink);
        ctx.start_trace(
            "root",
            &TraceOptions::new().with_session_id("session-1"),
        )
        .unwrap();

        assert_eq!(
            unrelated_library_code().await,
            Some("session-1".to_string())
        );

        ctx.end();
        assert_eq!(unrelated_library_code().await, None);
    })
    .await;
}
