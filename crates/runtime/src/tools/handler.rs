//! Tool handler trait.

use crate::tools::HandlerError;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;

/// Trait for executable tool handlers.
///
/// A handler receives arguments that already passed schema validation
/// and produces the tool's output value. This is the boundary between
/// the generation loop and side effects; handlers are expected to be
/// I/O bound and may fail, and both are contained by the executor.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn run(&self, args: Value) -> Result<Value, HandlerError>;
}

/// Adapter turning an async closure into a [`ToolHandler`].
pub(crate) struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    async fn run(&self, args: Value) -> Result<Value, HandlerError> {
        (self.0)(args).await
    }
}
