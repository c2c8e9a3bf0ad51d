//! The multi-round generation loop.
//!
//! One run drives the protocol between a conversation and a model that
//! may request tool invocations mid-turn:
//!
//! ```text
//! Sending ──► AwaitingToolExecution ──► Sending ──► … ──► Done
//!    │
//!    └──────────────────────────────────────────────────► Aborted
//! ```
//!
//! Tool-level failures (unknown tool, bad arguments, handler error)
//! are recoverable: they become failure results inside the
//! conversation so the model can self-correct. Model-transport failure
//! and round-limit exhaustion are unrecoverable for the run and abort
//! it, carrying whatever was accumulated so far.

use crate::model::{
    FinishReason, Message, ModelClient, ModelError, ModelRequest, ToolCall, ToolResult,
};
use crate::tools::{ToolExecutor, ToolRegistry};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_MAX_ROUNDS: u32 = 5;
const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Policy knobs for one generation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of tool rounds before the run is aborted.
    pub max_rounds: u32,
    /// Deadline for each model call.
    pub model_timeout: Duration,
    /// Deadline for each tool execution.
    pub tool_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

/// Terminal artifact of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    /// Text accumulated across all rounds, non-empty segments joined
    /// with newlines.
    pub text: String,
    /// Every tool call the model requested, in request order.
    pub tool_calls: Vec<ToolCall>,
    /// One result per call, same order.
    pub tool_results: Vec<ToolResult>,
    pub finish_reason: FinishReason,
}

/// Unrecoverable run failures.
///
/// Both variants carry the best-effort result accumulated before the
/// abort, so callers never lose text or tool results that were already
/// produced.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("model unavailable: {source}")]
    ModelUnavailable {
        source: ModelError,
        partial: GenerationResult,
    },

    #[error("round limit of {limit} reached without a final answer")]
    RoundLimitExceeded {
        limit: u32,
        partial: GenerationResult,
    },
}

impl RunError {
    /// The best-effort result accumulated before the abort.
    pub fn partial(&self) -> &GenerationResult {
        match self {
            Self::ModelUnavailable { partial, .. } => partial,
            Self::RoundLimitExceeded { partial, .. } => partial,
        }
    }
}

/// Loop states, used for trace output.
#[derive(Debug, Clone, Copy)]
enum RunState {
    Sending,
    AwaitingToolExecution,
    Done,
    Aborted,
}

/// Accumulates text, calls, and results across rounds.
#[derive(Default)]
struct Accumulator {
    segments: Vec<String>,
    calls: Vec<ToolCall>,
    results: Vec<ToolResult>,
}

impl Accumulator {
    fn into_result(self, finish_reason: FinishReason) -> GenerationResult {
        GenerationResult {
            text: self.segments.join("\n"),
            tool_calls: self.calls,
            tool_results: self.results,
            finish_reason,
        }
    }
}

/// Drives the multi-round protocol between a conversation and a model.
///
/// Dependencies are injected explicitly: the registry and client are
/// borrowed for the duration of the orchestrator, which makes isolated
/// registries trivial in tests and leaves the caller in charge of
/// sharing. Dropping the future returned by [`run`](Self::run) cancels
/// any in-flight tool executions; no background work outlives a
/// cancelled run.
pub struct GenerationOrchestrator<'a, M: ModelClient> {
    registry: &'a ToolRegistry,
    client: &'a M,
    config: RunConfig,
}

impl<'a, M: ModelClient> GenerationOrchestrator<'a, M> {
    pub fn new(registry: &'a ToolRegistry, client: &'a M) -> Self {
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

    /// Run the loop to completion over the given conversation.
    ///
    /// The orchestrator only appends to the conversation — assistant
    /// messages and one tool-role message per tool result — and never
    /// mutates entries it was handed.
    pub async fn run(
        &self,
        mut conversation: Vec<Message>,
        system: Option<&str>,
    ) -> Result<GenerationResult, RunError> {
        let tools = self.registry.declarations();
        let executor = ToolExecutor::new(self.registry, self.config.tool_timeout);
        let mut acc = Accumulator::default();
        let mut round: u32 = 0;

        loop {
            debug!(round, state = ?RunState::Sending, messages = conversation.len(), "calling model");
            let request = ModelRequest {
                messages: &conversation,
                tools: &tools,
                system,
            };
            let response =
                match tokio::time::timeout(self.config.model_timeout, self.client.generate(request))
                    .await
                {
                    Ok(Ok(response)) => response,
                    Ok(Err(source)) => {
                        warn!(round, state = ?RunState::Aborted, %source, "model call failed");
                        return Err(RunError::ModelUnavailable {
                            source,
                            partial: acc.into_result(FinishReason::Error),
                        });
                    }
                    Err(_) => {
                        let elapsed_ms = self.config.model_timeout.as_millis() as u64;
                        warn!(round, state = ?RunState::Aborted, elapsed_ms, "model call timed out");
                        return Err(RunError::ModelUnavailable {
                            source: ModelError::Timeout(elapsed_ms),
                            partial: acc.into_result(FinishReason::Error),
                        });
                    }
                };

            debug!(
                round,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                finish = ?response.finish_reason,
                "model responded"
            );

            let text = response.message.text();
            if !text.is_empty() {
                acc.segments.push(text);
            }
            let calls: Vec<ToolCall> = response
                .message
                .tool_calls()
                .into_iter()
                .cloned()
                .collect();
            conversation.push(response.message);

            if calls.is_empty() {
                let finish_reason = match response.finish_reason {
                    // A tool-calls reason with no calls attached is a
                    // provider quirk; treat it as a normal stop.
                    FinishReason::ToolCalls => FinishReason::Stop,
                    other => other,
                };
                debug!(round, state = ?RunState::Done, ?finish_reason, "run complete");
                return Ok(acc.into_result(finish_reason));
            }

            // Calls within a round are independent by construction, so
            // they are dispatched concurrently; join_all preserves
            // request order and settles the whole round before the
            // next send.
            debug!(round, state = ?RunState::AwaitingToolExecution, calls = calls.len(), "executing tools");
            let results: Vec<ToolResult> =
                join_all(calls.iter().map(|call| executor.dispatch(call))).await;

            acc.calls.extend(calls);
            for result in &results {
                conversation.push(Message::tool_result(result.clone()));
            }
            acc.results.extend(results);

            round += 1;
            if round >= self.config.max_rounds {
                warn!(round, state = ?RunState::Aborted, limit = self.config.max_rounds, "round limit exceeded");
                return Err(RunError::RoundLimitExceeded {
                    limit: self.config.max_rounds,
                    partial: acc.into_result(FinishReason::Length),
                });
            }
        }
    }
}
