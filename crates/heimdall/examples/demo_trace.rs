//! Demo of recording an agent turn: a trace with retrieval, a tool call,
//! and a model generation, persisted as JSONL.

use std::path::PathBuf;
use std::sync::Arc;

use heimdall::{
    ambient, recorder, ChatMessage, GenerationOptions, LlmResponse, SpanWriter, ToolCallOptions,
    TraceContext, TraceOptions, TraceSettings,
};

async fn simulate_turn(ctx: &mut TraceContext) -> Result<(), Box<dyn std::error::Error>> {
    let trace = ctx.start_trace(
        "support-turn",
        &TraceOptions::new()
            .with_user_id("user-42")
            .with_session_id("session-7")
            .with_tags(vec!["demo".to_string()]),
    )?;
    trace.set_input("What's the weather like in NYC?");

    // Retrieval phase as a nested span.
    let retrieval = trace.create_span("retrieve-context");
    retrieval.set_metadata("documents", &3);
    retrieval.end();

    // Tool call, with arguments captured before execution.
    let call = recorder::tool_call(
        &trace,
        "call-weather",
        "get_weather",
        &ToolCallOptions::new().with_call_id("call-1"),
    );
    call.set_arguments(&serde_json::json!({"location": "NYC"}));
    call.set_result("72F, sunny");
    call.end();

    // Model generation with the normalized response.
    let generation = recorder::chat_completion(
        &trace,
        "answer",
        "gpt-4",
        &GenerationOptions::new()
            .with_provider("openai")
            .with_temperature(0.2)
            .with_messages(vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user("What's the weather like in NYC?"),
            ]),
    );
    generation.set_response(
        &LlmResponse::new()
            .with_id("resp-1")
            .with_model("gpt-4-0613")
            .with_usage(250, 40)
            .with_finish_reasons(vec!["stop".to_string()])
            .with_completion("It's 72F and sunny in NYC."),
    );
    generation.end();

    trace.set_output("It's 72F and sunny in NYC.");
    ctx.end();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = PathBuf::from(".heimdall/demo-spans.jsonl");
    let writer = Arc::new(SpanWriter::to_file(&path)?);

    let mut ctx = TraceContext::new(TraceSettings::new().with_environment("demo"), writer);

    ambient::scope(async {
        simulate_turn(&mut ctx).await
    })
    .await?;

    let spans = SpanWriter::read_spans(&path)?;
    println!("Recorded {} spans:", spans.len());
    for span in &spans {
        println!(
            "  {} (trace {}, parent {:?})",
            span.name, span.trace_id, span.parent_span_id
        );
    }

    println!("\n--- Spans written to {} ---", path.display());
    Ok(())
}
