//! End-to-end persistence: a full trace recorded through a JSONL writer
//! sink and read back from disk.

use std::sync::Arc;

use anyhow::Result;
use heimdall::{
    recorder, schema, AttrValue, GenerationOptions, LlmResponse, SpanWriter, TraceContext,
    TraceOptions, TraceSettings,
};

#[test]
fn test_trace_round_trips_through_jsonl() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let span_file = dir.path().join("spans.jsonl");
    let writer = Arc::new(SpanWriter::to_file(&span_file)?);

    let mut ctx = TraceContext::new(
        TraceSettings::new().with_environment("test"),
        Arc::clone(&writer) as Arc<dyn heimdall::SpanSink>,
    );

    let trace = ctx.start_trace(
        "persisted-turn",
        &TraceOptions::new().with_user_id("u-1").with_session_id("s-1"),
    )?;
    trace.set_input("question");

    let generation = recorder::chat_completion(
        &trace,
        "answer",
        "gpt-4",
        &GenerationOptions::new().with_temperature(0.1),
    );
    generation.set_response(
        &LlmResponse::new()
            .with_usage(120, 30)
            .with_finish_reasons(vec!["stop".to_string()])
            .with_completion("answer text"),
    );
    generation.end();

    trace.set_output("answer text");
    ctx.end();

    let spans = SpanWriter::read_spans(&span_file)?;
    assert_eq!(spans.len(), 2);

    // Children are written before their parents; everything shares one
    // trace identity and the hierarchy survives the round trip.
    let answer = &spans[0];
    let root = &spans[1];
    assert_eq!(answer.name, "answer");
    assert_eq!(root.name, "persisted-turn");
    assert_eq!(answer.trace_id, root.trace_id);
    assert_eq!(answer.parent_span_id.as_deref(), Some(root.span_id.as_str()));
    assert!(root.parent_span_id.is_none());

    // Attributes land exactly as written.
    assert_eq!(
        answer.attributes.get(schema::operation::TEMPERATURE),
        Some(&AttrValue::Float(0.1))
    );
    assert_eq!(
        answer.attributes.get(schema::response::USAGE_INPUT_TOKENS),
        Some(&AttrValue::Int(120))
    );
    assert_eq!(
        answer.attributes.get(schema::trace::USER_ID),
        Some(&AttrValue::Str("u-1".to_string()))
    );
    assert_eq!(
        root.attributes.get(schema::trace::ENVIRONMENT),
        Some(&AttrValue::Str("test".to_string()))
    );
    assert_eq!(
        root.attributes.get(schema::trace::INPUT),
        Some(&AttrValue::Str("question".to_string()))
    );
    assert_eq!(
        root.attributes.get(schema::observation::OUTPUT),
        Some(&AttrValue::Str("answer text".to_string()))
    );
    assert!(root.ended_at.is_some());
    assert!(answer.recorded);

    Ok(())
}

#[test]
fn test_skipped_spans_never_reach_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let span_file = dir.path().join("spans.jsonl");
    let writer = Arc::new(SpanWriter::to_file(&span_file)?);

    let mut ctx = TraceContext::new(
        TraceSettings::new(),
        Arc::clone(&writer) as Arc<dyn heimdall::SpanSink>,
    );

    let trace = ctx.start_trace("root", &TraceOptions::new())?;
    let noisy = trace.create_span("noisy");
    noisy.skip();
    noisy.end();
    ctx.end();

    let spans = SpanWriter::read_spans(&span_file)?;
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "root");

    Ok(())
}
