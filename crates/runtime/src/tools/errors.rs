use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Path to the offending field, e.g. `originCity` or `stops[2].code`.
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur while resolving, validating, or executing a
/// tool call.
///
/// These are recoverable within a generation run: each becomes a
/// failure [`ToolResult`](crate::model::ToolResult) fed back to the
/// model, which can then self-correct. They are serializable because
/// they travel through the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolError {
    /// No tool with the requested name is registered.
    #[error("unknown tool: {name}")]
    Unknown { name: String },

    /// The arguments did not match the tool's declared schema.
    #[error("invalid arguments for {tool}: {}", format_violations(.violations))]
    InvalidArguments {
        tool: String,
        violations: Vec<Violation>,
    },

    /// The handler did not complete within the configured deadline.
    #[error("tool {tool} timed out after {elapsed_ms}ms")]
    Timeout { tool: String, elapsed_ms: u64 },

    /// The handler itself failed.
    #[error("tool {tool} failed: {message}")]
    Execution { tool: String, message: String },
}

/// Failure signal raised by a tool handler.
///
/// Handlers report failures as messages; the executor wraps them into
/// [`ToolError::Execution`] along with the tool name.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Errors from tool registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A tool with this name is already registered. Registration is
    /// append-only and first-wins; duplicates are fatal at startup.
    #[error("duplicate tool name: {0}")]
    DuplicateToolName(String),
}
