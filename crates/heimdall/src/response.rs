//! Message and response shapes normalized into the schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message exchanged with a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }

    pub fn tool(text: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: text.into(),
        }
    }
}

/// A model response decomposed into the optional fields the recorder
/// writes. Only fields actually present are exported; the backend
/// distinguishes "unset" from "empty".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub id: Option<String>,
    pub model: Option<String>,
    pub finish_reasons: Option<Vec<String>>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub input_cost: Option<f64>,
    pub output_cost: Option<f64>,
    pub total_cost: Option<f64>,
    /// When the first output token arrived (streaming time-to-first-token).
    pub completion_start_time: Option<DateTime<Utc>>,
    pub messages: Option<Vec<ChatMessage>>,
    pub completion: Option<String>,
}

impl LlmResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_finish_reasons(mut self, reasons: Vec<String>) -> Self {
        self.finish_reasons = Some(reasons);
        self
    }

    /// Set input and output token counts (and nothing else).
    pub fn with_usage(mut self, input_tokens: i64, output_tokens: i64) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self
    }

    pub fn with_total_tokens(mut self, total: i64) -> Self {
        self.total_tokens = Some(total);
        self
    }

    pub fn with_cost(mut self, input: f64, output: f64) -> Self {
        self.input_cost = Some(input);
        self.output_cost = Some(output);
        self
    }

    pub fn with_total_cost(mut self, total: f64) -> Self {
        self.total_cost = Some(total);
        self
    }

    pub fn with_completion_start_time(mut self, at: DateTime<Utc>) -> Self {
        self.completion_start_time = Some(at);
        self
    }

    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn with_completion(mut self, text: impl Into<String>) -> Self {
        self.completion = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");

        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
    }

    #[test]
    fn test_response_builder_leaves_absent_fields_unset() {
        let response = LlmResponse::new().with_usage(100, 50);
        assert_eq!(response.input_tokens, Some(100));
        assert_eq!(response.output_tokens, Some(50));
        assert!(response.id.is_none());
        assert!(response.model.is_none());
        assert!(response.total_tokens.is_none());
        assert!(response.finish_reasons.is_none());
        assert!(response.completion.is_none());
    }

    #[test]
    fn test_response_builder_full() {
        let response = LlmResponse::new()
            .with_id("resp-1")
            .with_model("gpt-4")
            .with_finish_reasons(vec!["stop".to_string()])
            .with_usage(10, 20)
            .with_total_tokens(30)
            .with_cost(0.001, 0.002)
            .with_total_cost(0.003)
            .with_completion("done");

        assert_eq!(response.id.as_deref(), Some("resp-1"));
        assert_eq!(response.total_tokens, Some(30));
        assert_eq!(response.total_cost, Some(0.003));
        assert_eq!(response.completion.as_deref(), Some("done"));
    }
}
