//! Inbound request surface.
//!
//! This is the operation an external transport layer (HTTP server,
//! CLI, test harness) calls into. It normalizes the raw request,
//! attaches a correlation id, and hands the conversation to the
//! orchestrator.

use crate::model::{
    FinishReason, Message, ModelClient, Part, Role, ToolCall, ToolOutcome, ToolResult,
};
use crate::orchestrator::{GenerationOrchestrator, RunConfig, RunError};
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// A generation request as received from the transport.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Caller-supplied correlation id; one is generated when absent.
    #[serde(default)]
    pub request_id: Option<String>,
    pub messages: Vec<IncomingMessage>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// One inbound message with a free-form role string.
///
/// Plain text travels in `content`; a caller replaying a multi-turn
/// history carries prior tool calls and results as structured `parts`.
/// When both are present the text precedes the parts.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parts: Vec<IncomingPart>,
}

impl IncomingMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            parts: Vec::new(),
        }
    }

    /// A message built from structured parts.
    pub fn from_parts(role: impl Into<String>, parts: Vec<IncomingPart>) -> Self {
        Self {
            role: role.into(),
            content: String::new(),
            parts,
        }
    }
}

/// A structured content part in an inbound message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingPart {
    /// Plain text.
    Text { text: String },
    /// A tool call the assistant made in a prior turn. An id is minted
    /// when the caller does not supply one.
    ToolCall {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        arguments: Value,
    },
    /// The output of a prior tool call, correlated by id.
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        output: Value,
    },
}

/// The terminal response returned to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Correlation id, echoed back for observability.
    pub request_id: String,
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    pub finish_reason: FinishReason,
}

/// Request-surface errors.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request carried no messages.
    #[error("request contains no messages")]
    EmptyMessages,

    /// A message used a role outside {system, user, assistant, tool}.
    ///
    /// Unrecognized roles are rejected rather than silently
    /// reclassified, so a typo'd role surfaces as a request error
    /// instead of corrupting the conversation.
    #[error("invalid message role '{role}' at index {index}")]
    InvalidRole { role: String, index: usize },

    /// The generation run aborted.
    #[error(transparent)]
    Run(#[from] RunError),
}

impl ChatError {
    /// Whether the failure is the caller's fault (HTTP 400 class) as
    /// opposed to a server-side abort (HTTP 500 class).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Run(_))
    }
}

/// The single operation exposed to the transport layer.
///
/// Holds the shared read-only registry and the model client; each
/// inbound request becomes one independent orchestration run.
pub struct ChatService<M: ModelClient> {
    registry: Arc<ToolRegistry>,
    client: M,
    config: RunConfig,
}

impl<M: ModelClient> ChatService<M> {
    pub fn new(registry: Arc<ToolRegistry>, client: M) -> Self {
        Self {
            registry,
            client,
            config: RunConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and run one generation request.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if request.messages.is_empty() {
            return Err(ChatError::EmptyMessages);
        }
        let conversation = normalize_messages(&request.messages)?;

        info!(
            %request_id,
            messages = conversation.len(),
            has_system = request.system_prompt.is_some(),
            "handling generation request"
        );

        let orchestrator = GenerationOrchestrator::new(&self.registry, &self.client)
            .with_config(self.config.clone());
        let result = orchestrator
            .run(conversation, request.system_prompt.as_deref())
            .await?;

        info!(
            %request_id,
            finish = ?result.finish_reason,
            tool_calls = result.tool_calls.len(),
            "generation complete"
        );

        Ok(ChatResponse {
            request_id,
            text: result.text,
            tool_calls: result.tool_calls,
            tool_results: result.tool_results,
            finish_reason: result.finish_reason,
        })
    }
}

fn normalize_messages(messages: &[IncomingMessage]) -> Result<Vec<Message>, ChatError> {
    messages
        .iter()
        .enumerate()
        .map(|(index, msg)| {
            let role = parse_role(&msg.role).ok_or_else(|| ChatError::InvalidRole {
                role: msg.role.clone(),
                index,
            })?;
            Ok(Message::from_parts(role, normalize_parts(msg)))
        })
        .collect()
}

fn normalize_parts(msg: &IncomingMessage) -> Vec<Part> {
    let mut parts = Vec::new();
    if !msg.content.is_empty() {
        parts.push(Part::text(msg.content.clone()));
    }
    for part in &msg.parts {
        parts.push(match part {
            IncomingPart::Text { text } => Part::text(text.clone()),
            IncomingPart::ToolCall {
                id,
                name,
                arguments,
            } => Part::ToolCall(ToolCall {
                id: id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                name: name.clone(),
                arguments: arguments.clone(),
            }),
            IncomingPart::ToolResult {
                tool_call_id,
                tool_name,
                output,
            } => Part::ToolResult(ToolResult {
                tool_call_id: tool_call_id.clone(),
                tool_name: tool_name.clone(),
                outcome: ToolOutcome::Success {
                    output: output.clone(),
                },
            }),
        });
    }
    parts
}

fn parse_role(role: &str) -> Option<Role> {
    match role {
        "system" => Some(Role::System),
        "user" => Some(Role::User),
        "assistant" => Some(Role::Assistant),
        "tool" => Some(Role::Tool),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_history_parts_normalize_to_structured_parts() {
        let messages = vec![
            IncomingMessage::new("user", "Flights from Seattle to Miami?"),
            IncomingMessage::from_parts(
                "assistant",
                vec![IncomingPart::ToolCall {
                    id: Some("call-1".into()),
                    name: "getFlightInfo".into(),
                    arguments: json!({ "originCity": "Seattle", "destinationCity": "Miami" }),
                }],
            ),
            IncomingMessage::from_parts(
                "tool",
                vec![IncomingPart::ToolResult {
                    tool_call_id: "call-1".into(),
                    tool_name: "getFlightInfo".into(),
                    output: json!({ "airline": "Delta" }),
                }],
            ),
        ];
        let conversation = normalize_messages(&messages).unwrap();

        let calls = conversation[1].tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call-1");
        match &conversation[2].parts[0] {
            Part::ToolResult(result) => {
                assert_eq!(result.tool_call_id, "call-1");
                assert_eq!(result.tool_name, "getFlightInfo");
                assert!(!result.outcome.is_failure());
            }
            other => panic!("expected tool result part, got {other:?}"),
        }
    }

    #[test]
    fn tool_call_part_without_id_gets_one_minted() {
        let messages = vec![IncomingMessage::from_parts(
            "assistant",
            vec![IncomingPart::ToolCall {
                id: None,
                name: "getFlightInfo".into(),
                arguments: json!({}),
            }],
        )];
        let conversation = normalize_messages(&messages).unwrap();
        assert!(!conversation[0].tool_calls()[0].id.is_empty());
    }

    #[test]
    fn known_roles_normalize() {
        let messages = vec![
            IncomingMessage::new("system", "be brief"),
            IncomingMessage::new("user", "hi"),
            IncomingMessage::new("assistant", "hello"),
            IncomingMessage::new("tool", "{}"),
        ];
        let conversation = normalize_messages(&messages).unwrap();
        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation[0].role, Role::System);
        assert_eq!(conversation[3].role, Role::Tool);
    }

    #[test]
    fn typod_role_is_rejected_with_its_index() {
        let messages = vec![
            IncomingMessage::new("user", "hi"),
            IncomingMessage::new("systm", "oops"),
        ];
        let err = normalize_messages(&messages).unwrap_err();
        match err {
            ChatError::InvalidRole { role, index } => {
                assert_eq!(role, "systm");
                assert_eq!(index, 1);
            }
            other => panic!("expected invalid role, got {other:?}"),
        }
        assert!(
            ChatError::InvalidRole {
                role: "systm".into(),
                index: 1
            }
            .is_client_error()
        );
    }
}
