//! Conversation protocol types and the model client trait.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::{
    FinishReason, Message, ModelClient, ModelRequest, ModelResponse, Part, Role, ToolCall,
    ToolOutcome, ToolResult, ToolSpec, Usage,
};
