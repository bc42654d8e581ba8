//! Record variants: typed wrappers that add domain setters on top of the
//! base record.
//!
//! Each variant derefs to [`Observation`], so the base operations
//! (input/output/metadata/level/skip/end) are available on every one of
//! them. Variants are only created through a [`Trace`](crate::Trace) or
//! the recorder helpers.

use std::ops::Deref;

use serde::Serialize;

use crate::observation::Observation;
use crate::recorder;
use crate::response::{ChatMessage, LlmResponse};
use crate::schema;
use crate::value::AttrValue;

macro_rules! variant {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            obs: Observation,
        }

        impl $name {
            pub(crate) fn from_obs(obs: Observation) -> Self {
                Self { obs }
            }
        }

        impl Deref for $name {
            type Target = Observation;

            fn deref(&self) -> &Observation {
                &self.obs
            }
        }
    };
}

variant! {
    /// A plain nested span.
    Span
}

variant! {
    /// A model generation record.
    Generation
}

variant! {
    /// A tool invocation record.
    ToolCall
}

variant! {
    /// An embeddings call record.
    Embedding
}

variant! {
    /// An agent step record.
    Agent
}

variant! {
    /// A point-in-time event record.
    Event
}

impl Span {
    /// Free-text description of what this span covers.
    pub fn set_description(&self, text: &str) {
        self.obs.write(
            schema::observation::DESCRIPTION,
            AttrValue::Str(text.to_string()),
        );
    }
}

impl Generation {
    /// Record the ordered input messages sent to the model.
    pub fn set_input_messages(&self, messages: &[ChatMessage]) {
        self.obs.set_input(messages);
    }

    /// Record a bare prompt, wrapped as a single user message.
    pub fn set_prompt(&self, text: &str) {
        self.set_input_messages(&[ChatMessage::user(text)]);
    }

    /// Record the completion text as the output.
    pub fn set_completion(&self, text: &str) {
        self.obs.set_output(text);
    }

    /// Normalize a full response (usage, cost, finish reasons, output) into
    /// the schema in one call. Absent fields are never written.
    pub fn set_response(&self, response: &LlmResponse) {
        recorder::apply_response(&self.obs, response);
    }

    /// Reference the prompt template this generation was rendered from.
    pub fn set_prompt_reference(&self, name: &str, version: Option<i64>) {
        self.obs.write(
            schema::observation::PROMPT_NAME,
            AttrValue::Str(name.to_string()),
        );
        if let Some(version) = version {
            self.obs
                .write(schema::observation::PROMPT_VERSION, AttrValue::Int(version));
        }
    }

    pub fn set_temperature(&self, value: f64) {
        self.obs
            .write(schema::operation::TEMPERATURE, AttrValue::Float(value));
    }

    pub fn set_max_tokens(&self, value: i64) {
        self.obs
            .write(schema::operation::MAX_TOKENS, AttrValue::Int(value));
    }

    pub fn set_top_p(&self, value: f64) {
        self.obs.write(schema::operation::TOP_P, AttrValue::Float(value));
    }

    pub fn set_top_k(&self, value: i64) {
        self.obs.write(schema::operation::TOP_K, AttrValue::Int(value));
    }

    pub fn set_frequency_penalty(&self, value: f64) {
        self.obs
            .write(schema::operation::FREQUENCY_PENALTY, AttrValue::Float(value));
    }

    pub fn set_presence_penalty(&self, value: f64) {
        self.obs
            .write(schema::operation::PRESENCE_PENALTY, AttrValue::Float(value));
    }
}

impl ToolCall {
    /// Record the call arguments. Scalars pass through; structured values
    /// are serialized.
    pub fn set_arguments<T: Serialize + ?Sized>(&self, arguments: &T) {
        self.obs
            .write(schema::tool::ARGUMENTS, AttrValue::canonical(arguments));
    }

    /// Record the call result, with the same serialization rule.
    pub fn set_result<T: Serialize + ?Sized>(&self, result: &T) {
        self.obs.write(schema::tool::RESULT, AttrValue::canonical(result));
    }
}

impl Embedding {
    /// Record the text being embedded (written as the input).
    pub fn set_text(&self, text: &str) {
        self.obs.set_input(text);
    }

    pub fn set_dimensions(&self, dimensions: i64) {
        self.obs
            .write(schema::embedding::DIMENSIONS, AttrValue::Int(dimensions));
    }
}

impl Agent {
    /// Reference the upstream data source feeding this agent.
    pub fn set_data_source(&self, id: &str) {
        self.obs
            .write(schema::agent::DATA_SOURCE, AttrValue::Str(id.to_string()));
    }
}
