//! Purser runtime — tool registry and generation orchestration.
//!
//! This crate drives the multi-round protocol between a conversation
//! and a generative model that may invoke declared tools mid-turn.
//!
//! # Overview
//!
//! The runtime is organized around these concepts:
//!
//! - **ToolRegistry**: an immutable-after-init catalogue of declared
//!   tools, each carrying a [`SchemaSpec`] that both advertises the
//!   tool to the model and validates the arguments it sends back.
//! - **GenerationOrchestrator**: the explicit loop that calls the
//!   model, executes requested tools, feeds results back into the
//!   conversation, and bounds the number of rounds.
//! - **ModelClient**: a trait abstracting the generative backend;
//!   [`GeminiClient`] is the shipped implementation.
//! - **ChatService**: the request surface a transport layer calls,
//!   with role normalization and correlation ids.
//!
//! # Example
//!
//! ```ignore
//! use runtime::tools::definitions::flight_info_tool;
//! use runtime::{ChatRequest, ChatService, GeminiClient, IncomingMessage, ToolRegistry};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = ToolRegistry::new();
//! registry.register(flight_info_tool())?;
//!
//! let client = GeminiClient::from_env()?;
//! let service = ChatService::new(Arc::new(registry), client);
//!
//! let response = service
//!     .handle(ChatRequest {
//!         request_id: None,
//!         messages: vec![IncomingMessage::new(
//!             "user",
//!             "Is there a flight from Seattle to Miami?",
//!         )],
//!         system_prompt: None,
//!     })
//!     .await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod model;
pub mod orchestrator;
pub mod providers;
pub mod tools;

pub use chat::{ChatError, ChatRequest, ChatResponse, ChatService, IncomingMessage, IncomingPart};
pub use model::{
    FinishReason, Message, ModelClient, ModelError, ModelRequest, ModelResponse, Part, Role,
    ToolCall, ToolOutcome, ToolResult, ToolSpec, Usage,
};
pub use orchestrator::{GenerationOrchestrator, GenerationResult, RunConfig, RunError};
pub use providers::{GeminiClient, GeminiClientBuilder};
pub use tools::{
    HandlerError, ParamKind, ParamSpec, RegistryError, SchemaSpec, ToolDeclaration, ToolError,
    ToolExecutor, ToolHandler, ToolRegistry, Violation,
};
