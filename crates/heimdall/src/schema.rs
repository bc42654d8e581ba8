//! The attribute schema: the closed table of flat keys the backend expects.
//!
//! Domain setters only write through these keys; `set_tag` on a record is
//! the escape hatch for anything the table does not cover. Keys follow the
//! GenAI semantic conventions where one exists and the `heimdall.*`
//! namespace everywhere else.

use serde::{Deserialize, Serialize};

/// Operation-level keys: what was asked of a model or tool.
pub mod operation {
    /// Kind of operation ("chat", "embeddings", "execute_tool", ...).
    pub const NAME: &str = "gen_ai.operation.name";
    /// Provider the request targets ("openai", "anthropic", ...).
    pub const PROVIDER: &str = "gen_ai.system";
    pub const REQUEST_MODEL: &str = "gen_ai.request.model";
    pub const TEMPERATURE: &str = "gen_ai.request.temperature";
    pub const MAX_TOKENS: &str = "gen_ai.request.max_tokens";
    pub const TOP_P: &str = "gen_ai.request.top_p";
    pub const TOP_K: &str = "gen_ai.request.top_k";
    pub const FREQUENCY_PENALTY: &str = "gen_ai.request.frequency_penalty";
    pub const PRESENCE_PENALTY: &str = "gen_ai.request.presence_penalty";
}

/// Response-level keys: what came back from a model.
pub mod response {
    pub const ID: &str = "gen_ai.response.id";
    pub const MODEL: &str = "gen_ai.response.model";
    pub const FINISH_REASONS: &str = "gen_ai.response.finish_reasons";
    pub const USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";
    pub const USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";
    pub const USAGE_TOTAL_TOKENS: &str = "gen_ai.usage.total_tokens";
    pub const COST_INPUT: &str = "heimdall.observation.cost_details.input";
    pub const COST_OUTPUT: &str = "heimdall.observation.cost_details.output";
    pub const COST_TOTAL: &str = "heimdall.observation.cost_details.total";
    pub const COMPLETION_START_TIME: &str = "heimdall.observation.completion_start_time";
}

/// Trace-level keys: cross-cutting fields set once per trace.
pub mod trace {
    pub const NAME: &str = "heimdall.trace.name";
    pub const USER_ID: &str = "user.id";
    pub const SESSION_ID: &str = "session.id";
    pub const TAGS: &str = "heimdall.trace.tags";
    pub const PUBLIC: &str = "heimdall.trace.public";
    pub const INPUT: &str = "heimdall.trace.input";
    pub const OUTPUT: &str = "heimdall.trace.output";
    pub const VERSION: &str = "heimdall.version";
    pub const RELEASE: &str = "heimdall.release";
    pub const ENVIRONMENT: &str = "heimdall.environment";
}

/// Observation-level keys: every record carries these.
pub mod observation {
    pub const TYPE: &str = "heimdall.observation.type";
    pub const INPUT: &str = "heimdall.observation.input";
    pub const OUTPUT: &str = "heimdall.observation.output";
    pub const LEVEL: &str = "heimdall.observation.level";
    pub const STATUS_MESSAGE: &str = "heimdall.observation.status_message";
    pub const DESCRIPTION: &str = "heimdall.observation.description";
    /// Prefix for caller metadata; the caller's key is appended.
    pub const METADATA_PREFIX: &str = "heimdall.observation.metadata.";
    pub const PROMPT_NAME: &str = "heimdall.observation.prompt.name";
    pub const PROMPT_VERSION: &str = "heimdall.observation.prompt.version";
}

/// Tool-call keys.
pub mod tool {
    pub const NAME: &str = "gen_ai.tool.name";
    pub const DESCRIPTION: &str = "gen_ai.tool.description";
    pub const TYPE: &str = "gen_ai.tool.type";
    pub const CALL_ID: &str = "gen_ai.tool.call.id";
    pub const ARGUMENTS: &str = "gen_ai.tool.call.arguments";
    pub const RESULT: &str = "gen_ai.tool.call.result";
}

/// Embeddings keys.
pub mod embedding {
    pub const DIMENSIONS: &str = "gen_ai.embeddings.dimension_count";
}

/// Agent keys.
pub mod agent {
    pub const ID: &str = "gen_ai.agent.id";
    pub const NAME: &str = "gen_ai.agent.name";
    pub const DESCRIPTION: &str = "gen_ai.agent.description";
    pub const DATA_SOURCE: &str = "gen_ai.agent.data_source.id";
}

/// Error keys written by the error recorder.
pub mod error {
    pub const TYPE: &str = "error.type";
    pub const MESSAGE: &str = "error.message";
}

/// Keys and the event name used for recorded exceptions.
pub mod exception {
    pub const EVENT_NAME: &str = "exception";
    pub const TYPE: &str = "exception.type";
    pub const MESSAGE: &str = "exception.message";
    pub const STACKTRACE: &str = "exception.stacktrace";
}

/// The type discriminator written under [`observation::TYPE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationKind {
    Trace,
    Span,
    Generation,
    Tool,
    Embedding,
    Agent,
    Event,
}

impl std::fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Span => write!(f, "span"),
            Self::Generation => write!(f, "generation"),
            Self::Tool => write!(f, "tool"),
            Self::Embedding => write!(f, "embedding"),
            Self::Agent => write!(f, "agent"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// Values written under [`operation::NAME`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Chat,
    TextCompletion,
    Embeddings,
    ExecuteTool,
    InvokeAgent,
    Agent,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::TextCompletion => "text_completion",
            Self::Embeddings => "embeddings",
            Self::ExecuteTool => "execute_tool",
            Self::InvokeAgent => "invoke_agent",
            Self::Agent => "agent",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
