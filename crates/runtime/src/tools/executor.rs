//! Tool execution.

use crate::model::{ToolCall, ToolResult};
use crate::tools::{ToolDeclaration, ToolError, ToolRegistry};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Executes tool calls against a registry.
///
/// Every failure mode — unknown tool, invalid arguments, handler
/// error, timeout — is contained as a failure [`ToolResult`] rather
/// than propagated, so a single bad call never aborts a generation
/// run. No retry is attempted here; a failed call is fed back to the
/// model, which decides how to react.
pub struct ToolExecutor<'a> {
    registry: &'a ToolRegistry,
    timeout: Duration,
}

impl<'a> ToolExecutor<'a> {
    pub fn new(registry: &'a ToolRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Run a declaration's handler with validated arguments.
    ///
    /// The handler is treated as an opaque, potentially slow and
    /// potentially failing operation; failures and timeouts are
    /// wrapped into [`ToolError`].
    pub async fn execute(
        &self,
        declaration: &ToolDeclaration,
        args: Value,
    ) -> Result<Value, ToolError> {
        match tokio::time::timeout(self.timeout, declaration.invoke(args)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ToolError::Execution {
                tool: declaration.name.clone(),
                message: e.to_string(),
            }),
            Err(_) => Err(ToolError::Timeout {
                tool: declaration.name.clone(),
                elapsed_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    /// Resolve and run one tool call end to end: lookup, validation,
    /// execution. Always produces a result correlated with the call.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(declaration) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, id = %call.id, "model requested unknown tool");
            return ToolResult::failure(
                call,
                ToolError::Unknown {
                    name: call.name.clone(),
                },
            );
        };

        let args = match declaration.schema.validate(&call.arguments) {
            Ok(args) => args,
            Err(violations) => {
                warn!(
                    tool = %call.name,
                    id = %call.id,
                    count = violations.len(),
                    "tool arguments failed validation"
                );
                return ToolResult::failure(
                    call,
                    ToolError::InvalidArguments {
                        tool: call.name.clone(),
                        violations,
                    },
                );
            }
        };

        debug!(tool = %call.name, id = %call.id, "executing tool");
        match self.execute(declaration, args).await {
            Ok(output) => ToolResult::success(call, output),
            Err(error) => {
                warn!(tool = %call.name, id = %call.id, %error, "tool execution failed");
                ToolResult::failure(call, error)
            }
        }
    }
}
