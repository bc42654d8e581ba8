//! Stateless helpers that build a correctly-tagged record for each request
//! shape and normalize responses and errors into the schema.
//!
//! Every helper takes the small required field set plus an options struct;
//! absent optional fields are never written. The backend distinguishes
//! "unset" from "empty", so that rule is load-bearing.

use chrono::SecondsFormat;

use crate::context::TraceContext;
use crate::error::ContextError;
use crate::observation::{Level, Observation};
use crate::response::{ChatMessage, LlmResponse};
use crate::schema::{self, Operation};
use crate::span::{SpanEvent, SpanStatus};
use crate::trace::{Trace, TraceOptions};
use crate::value::AttrValue;
use crate::variants::{Agent, Embedding, Generation, Span, ToolCall};

/// Optional fields for generation-shaped records.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub provider: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub top_p: Option<f64>,
    pub top_k: Option<i64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub messages: Option<Vec<ChatMessage>>,
    pub prompt: Option<String>,
    pub prompt_name: Option<String>,
    pub prompt_version: Option<i64>,
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub fn with_presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_prompt_reference(mut self, name: impl Into<String>, version: Option<i64>) -> Self {
        self.prompt_name = Some(name.into());
        self.prompt_version = version;
        self
    }
}

/// Optional fields for embeddings records.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingsOptions {
    pub provider: Option<String>,
    pub text: Option<String>,
    pub dimensions: Option<i64>,
}

impl EmbeddingsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_dimensions(mut self, dimensions: i64) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// Optional fields for tool-call records.
#[derive(Debug, Clone, Default)]
pub struct ToolCallOptions {
    pub description: Option<String>,
    pub tool_type: Option<String>,
    pub call_id: Option<String>,
    pub arguments: Option<serde_json::Value>,
}

impl ToolCallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tool_type(mut self, tool_type: impl Into<String>) -> Self {
        self.tool_type = Some(tool_type.into());
        self
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    pub fn with_arguments(mut self, arguments: serde_json::Value) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// Optional fields for agent records.
#[derive(Debug, Clone, Default)]
pub struct AgentRecordOptions {
    pub description: Option<String>,
    pub data_source: Option<String>,
}

impl AgentRecordOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = Some(data_source.into());
        self
    }
}

/// Optional fields for plain span records.
#[derive(Debug, Clone, Default)]
pub struct SpanRecordOptions {
    pub description: Option<String>,
    pub input: Option<serde_json::Value>,
}

impl SpanRecordOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = Some(input);
        self
    }
}

/// Build a chat-completion generation under `trace`.
pub fn chat_completion(
    trace: &Trace,
    name: &str,
    model: &str,
    options: &GenerationOptions,
) -> Generation {
    let generation = trace.create_generation(name, model, options.provider.as_deref());
    generation.set_tag(schema::operation::NAME, Operation::Chat.as_str());
    apply_generation_options(&generation, options);
    generation
}

/// Build a text-completion generation under `trace`.
pub fn text_completion(
    trace: &Trace,
    name: &str,
    model: &str,
    options: &GenerationOptions,
) -> Generation {
    let generation = trace.create_generation(name, model, options.provider.as_deref());
    generation.set_tag(schema::operation::NAME, Operation::TextCompletion.as_str());
    apply_generation_options(&generation, options);
    generation
}

/// Build an embeddings record under `trace`.
pub fn embeddings(
    trace: &Trace,
    name: &str,
    model: &str,
    options: &EmbeddingsOptions,
) -> Embedding {
    let embedding = trace.create_embedding(name, model, options.provider.as_deref());
    embedding.set_tag(schema::operation::NAME, Operation::Embeddings.as_str());
    if let Some(text) = &options.text {
        embedding.set_text(text);
    }
    if let Some(dimensions) = options.dimensions {
        embedding.set_dimensions(dimensions);
    }
    embedding
}

/// Build a tool-call record under `trace`.
pub fn tool_call(
    trace: &Trace,
    name: &str,
    tool_name: &str,
    options: &ToolCallOptions,
) -> ToolCall {
    let call = trace.create_tool_call(name, tool_name);
    call.set_tag(schema::operation::NAME, Operation::ExecuteTool.as_str());
    if let Some(description) = &options.description {
        call.set_tag(schema::tool::DESCRIPTION, description.as_str());
    }
    if let Some(tool_type) = &options.tool_type {
        call.set_tag(schema::tool::TYPE, tool_type.as_str());
    }
    if let Some(call_id) = &options.call_id {
        call.set_tag(schema::tool::CALL_ID, call_id.as_str());
    }
    if let Some(arguments) = &options.arguments {
        call.set_arguments(arguments);
    }
    call
}

/// Build an agent record under `trace`.
pub fn agent(trace: &Trace, name: &str, agent_id: &str, options: &AgentRecordOptions) -> Agent {
    let agent = trace.create_agent(name, agent_id);
    agent.set_tag(schema::operation::NAME, Operation::Agent.as_str());
    apply_agent_options(&agent, options);
    agent
}

/// Build an agent-invocation record under `trace`.
pub fn invoke_agent(
    trace: &Trace,
    name: &str,
    agent_id: &str,
    options: &AgentRecordOptions,
) -> Agent {
    let agent = trace.create_agent(name, agent_id);
    agent.set_tag(schema::operation::NAME, Operation::InvokeAgent.as_str());
    apply_agent_options(&agent, options);
    agent
}

/// Build a plain span record under `trace`.
pub fn span(trace: &Trace, name: &str, options: &SpanRecordOptions) -> Span {
    let span = trace.create_span(name);
    if let Some(description) = &options.description {
        span.set_description(description);
    }
    if let Some(input) = &options.input {
        span.set_input(input);
    }
    span
}

/// Start the context's root trace. Thin alias kept for symmetry with the
/// other record builders.
pub fn trace(
    ctx: &mut TraceContext,
    name: &str,
    options: &TraceOptions,
) -> Result<Trace, ContextError> {
    ctx.start_trace(name, options)
}

fn apply_generation_options(generation: &Generation, options: &GenerationOptions) {
    if let Some(temperature) = options.temperature {
        generation.set_temperature(temperature);
    }
    if let Some(max_tokens) = options.max_tokens {
        generation.set_max_tokens(max_tokens);
    }
    if let Some(top_p) = options.top_p {
        generation.set_top_p(top_p);
    }
    if let Some(top_k) = options.top_k {
        generation.set_top_k(top_k);
    }
    if let Some(penalty) = options.frequency_penalty {
        generation.set_frequency_penalty(penalty);
    }
    if let Some(penalty) = options.presence_penalty {
        generation.set_presence_penalty(penalty);
    }
    if let Some(messages) = &options.messages {
        generation.set_input_messages(messages);
    } else if let Some(prompt) = &options.prompt {
        generation.set_prompt(prompt);
    }
    if let Some(prompt_name) = &options.prompt_name {
        generation.set_prompt_reference(prompt_name, options.prompt_version);
    }
}

fn apply_agent_options(agent: &Agent, options: &AgentRecordOptions) {
    if let Some(description) = &options.description {
        agent.set_tag(schema::agent::DESCRIPTION, description.as_str());
    }
    if let Some(data_source) = &options.data_source {
        agent.set_data_source(data_source);
    }
}

/// Normalize a response into a record's schema keys. Only fields present on
/// the response are written.
pub fn apply_response(record: &Observation, response: &LlmResponse) {
    if let Some(id) = &response.id {
        record.write(schema::response::ID, AttrValue::Str(id.clone()));
    }
    if let Some(model) = &response.model {
        record.write(schema::response::MODEL, AttrValue::Str(model.clone()));
    }
    if let Some(reasons) = &response.finish_reasons {
        record.write(
            schema::response::FINISH_REASONS,
            AttrValue::StrArray(reasons.clone()),
        );
    }
    if let Some(tokens) = response.input_tokens {
        record.write(schema::response::USAGE_INPUT_TOKENS, AttrValue::Int(tokens));
    }
    if let Some(tokens) = response.output_tokens {
        record.write(schema::response::USAGE_OUTPUT_TOKENS, AttrValue::Int(tokens));
    }
    if let Some(tokens) = response.total_tokens {
        record.write(schema::response::USAGE_TOTAL_TOKENS, AttrValue::Int(tokens));
    }
    if let Some(cost) = response.input_cost {
        record.write(schema::response::COST_INPUT, AttrValue::Float(cost));
    }
    if let Some(cost) = response.output_cost {
        record.write(schema::response::COST_OUTPUT, AttrValue::Float(cost));
    }
    if let Some(cost) = response.total_cost {
        record.write(schema::response::COST_TOTAL, AttrValue::Float(cost));
    }
    if let Some(at) = response.completion_start_time {
        record.write(
            schema::response::COMPLETION_START_TIME,
            AttrValue::Str(at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
    }
    if let Some(messages) = &response.messages {
        record.write(schema::observation::OUTPUT, AttrValue::canonical(messages));
    } else if let Some(completion) = &response.completion {
        record.write(
            schema::observation::OUTPUT,
            AttrValue::Str(completion.clone()),
        );
    }
}

/// Attach a caught error to a record: error level and status, error tags,
/// and a structured exception event on the span timeline. Always succeeds.
pub fn record_error<E>(record: &Observation, error: &E)
where
    E: std::error::Error + ?Sized,
{
    let type_name = std::any::type_name::<E>();
    let message = error.to_string();

    record.set_level(Level::Error);
    record.set_status(SpanStatus::Error {
        message: message.clone(),
    });
    record.write(
        schema::observation::STATUS_MESSAGE,
        AttrValue::Str(message.clone()),
    );
    record.write(schema::error::TYPE, AttrValue::Str(type_name.to_string()));
    record.write(schema::error::MESSAGE, AttrValue::Str(message.clone()));

    let mut event = SpanEvent::new(schema::exception::EVENT_NAME)
        .with_attribute(schema::exception::TYPE, AttrValue::Str(type_name.to_string()))
        .with_attribute(schema::exception::MESSAGE, AttrValue::Str(message));
    if let Some(chain) = source_chain(error) {
        event = event.with_attribute(schema::exception::STACKTRACE, AttrValue::Str(chain));
    }
    record.add_event(event);
}

/// The error's cause chain, one frame per line, if it has one.
fn source_chain<E>(error: &E) -> Option<String>
where
    E: std::error::Error + ?Sized,
{
    let mut frames = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        frames.push(cause.to_string());
        source = cause.source();
    }
    if frames.is_empty() {
        None
    } else {
        Some(frames.join("\n"))
    }
}
