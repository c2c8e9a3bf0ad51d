//! Tool catalogue.

use crate::model::ToolSpec;
use crate::tools::handler::FnHandler;
use crate::tools::{HandlerError, RegistryError, SchemaSpec, ToolHandler};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// A declared tool: name, description, argument schema, and handler.
///
/// The schema instance is used both to advertise the tool to the model
/// and to validate incoming arguments.
#[derive(Clone)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub schema: SchemaSpec,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: SchemaSpec,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler: Arc::new(handler),
        }
    }

    /// Build a declaration from an async closure.
    pub fn from_fn<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: SchemaSpec,
        f: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        Self::new(name, description, schema, FnHandler(f))
    }

    /// Invoke the handler with validated arguments.
    pub async fn invoke(&self, args: Value) -> Result<Value, HandlerError> {
        self.handler.run(args).await
    }

    /// The declaration advertised to the model.
    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.schema.to_json_schema(),
        }
    }
}

impl std::fmt::Debug for ToolDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDeclaration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Immutable-after-init catalogue of invocable tools.
///
/// Registration happens once at process startup; afterwards the
/// registry is read-only and safe to share across concurrent
/// generation runs without synchronization.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDeclaration>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if the name is already taken; the first
    /// registration is retained.
    pub fn register(&mut self, declaration: ToolDeclaration) -> Result<(), RegistryError> {
        if self.index.contains_key(&declaration.name) {
            return Err(RegistryError::DuplicateToolName(declaration.name));
        }
        info!(tool = %declaration.name, "registered tool");
        self.index
            .insert(declaration.name.clone(), self.tools.len());
        self.tools.push(declaration);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDeclaration> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Declarations advertised to the model, in registration order.
    ///
    /// The order is stable across calls within a process lifetime so
    /// that model prompting stays reproducible.
    pub fn declarations(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(ToolDeclaration::spec).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
