//! Core conversation types (provider-agnostic).
//!
//! These types represent the universal concepts shared across model
//! providers. Provider-specific wire details belong in adapter modules
//! under `providers`.

use super::errors::ModelError;
use crate::tools::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// Role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Carrier role for tool results fed back to the model.
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (used to correlate results).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Raw arguments as JSON, not yet validated.
    pub arguments: Value,
}

/// Outcome of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// Tool executed successfully.
    Success { output: Value },
    /// Tool lookup, validation, or execution failed.
    Failure { error: ToolError },
}

impl ToolOutcome {
    /// Whether this is a failure outcome.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// Result of one tool invocation, correlated with its request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Name of the tool that was (or was not) invoked.
    pub tool_name: String,
    /// Outcome of the invocation.
    pub outcome: ToolOutcome,
}

impl ToolResult {
    /// Create a successful result.
    pub fn success(call: &ToolCall, output: Value) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            outcome: ToolOutcome::Success { output },
        }
    }

    /// Create a failure result.
    pub fn failure(call: &ToolCall, error: ToolError) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            outcome: ToolOutcome::Failure { error },
        }
    }
}

/// A part of a message's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text content.
    Text { text: String },
    /// Tool call from the assistant.
    ToolCall(ToolCall),
    /// Tool result fed back to the model.
    ToolResult(ToolResult),
}

impl Part {
    /// Create a text part.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    /// Create a message with a role and text content.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
        }
    }

    /// Create a user message with text.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message with text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Create a tool-role message carrying one tool result.
    pub fn tool_result(result: ToolResult) -> Self {
        Self {
            role: Role::Tool,
            parts: vec![Part::ToolResult(result)],
        }
    }

    /// Create a message from parts.
    pub fn from_parts(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// Get combined text content from all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Extract all tool calls carried by this message.
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::ToolCall(tc) => Some(tc),
                _ => None,
            })
            .collect()
    }
}

/// Tool declaration advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for input arguments.
    pub input_schema: Value,
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of response.
    #[default]
    Stop,
    /// The model requested tool invocations.
    ToolCalls,
    /// Token or round limit reached.
    Length,
    /// The model or transport failed.
    Error,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Everything needed for one model call.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolSpec],
    pub system: Option<&'a str>,
}

/// The response from one model call.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: Message,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// Trait for generative model clients.
///
/// Implementations send the conversation plus advertised tool
/// declarations to a provider and decode the reply into a
/// provider-agnostic [`ModelResponse`].
pub trait ModelClient: Send + Sync {
    fn generate(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send;
}

impl<M: ModelClient> ModelClient for &M {
    fn generate(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send {
        (**self).generate(request)
    }
}
