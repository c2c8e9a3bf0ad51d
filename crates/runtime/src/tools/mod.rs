//! Tool registry, argument schemas, and execution.

pub mod definitions;
mod errors;
mod executor;
mod handler;
mod registry;
mod schema;

pub use errors::{HandlerError, RegistryError, ToolError, Violation};
pub use executor::ToolExecutor;
pub use handler::ToolHandler;
pub use registry::{ToolDeclaration, ToolRegistry};
pub use schema::{ParamKind, ParamSpec, SchemaSpec};
