//! Shared test support: a scripted in-memory model client.

// Not every test binary uses every helper.
#![allow(dead_code)]

use runtime::{
    FinishReason, Message, ModelClient, ModelError, ModelRequest, ModelResponse, Part, Role,
    ToolCall, Usage,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// A model client that replays a fixed script of responses.
///
/// When the script runs out, the fallback response (if any) is served
/// indefinitely — useful for simulating a model that never stops
/// requesting tools.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    fallback: Option<ModelResponse>,
    stall_when_exhausted: bool,
    seen: Mutex<Vec<Vec<Message>>>,
    calls: AtomicU32,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            stall_when_exhausted: false,
            seen: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn then(self, response: ModelResponse) -> Self {
        self.script.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn then_err(self, error: ModelError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Serve this response whenever the script is exhausted.
    pub fn repeating(mut self, response: ModelResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Never resolve once the script is exhausted.
    pub fn then_stall(mut self) -> Self {
        self.stall_when_exhausted = true;
        self
    }

    /// Number of generate calls seen so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The message history of the most recent generate call.
    pub fn last_request(&self) -> Vec<Message> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl ModelClient for ScriptedClient {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.messages.to_vec());
        if let Some(step) = self.script.lock().unwrap().pop_front() {
            return step;
        }
        if self.stall_when_exhausted {
            std::future::pending::<()>().await;
        }
        match &self.fallback {
            Some(response) => Ok(response.clone()),
            None => panic!("scripted client ran out of responses"),
        }
    }
}

/// A plain text response with the given finish reason.
pub fn text_response(text: &str, finish_reason: FinishReason) -> ModelResponse {
    ModelResponse {
        message: Message::assistant(text),
        finish_reason,
        usage: Usage::default(),
    }
}

/// An assistant response requesting the given tool calls.
pub fn tool_call_response(text: &str, calls: Vec<(&str, &str, Value)>) -> ModelResponse {
    let mut parts = Vec::new();
    if !text.is_empty() {
        parts.push(Part::text(text));
    }
    for (id, name, arguments) in calls {
        parts.push(Part::ToolCall(ToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
        }));
    }
    ModelResponse {
        message: Message::from_parts(Role::Assistant, parts),
        finish_reason: FinishReason::ToolCalls,
        usage: Usage::default(),
    }
}
