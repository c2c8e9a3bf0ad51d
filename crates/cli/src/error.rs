//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tool registration failed at startup.
    #[error(transparent)]
    Registry(#[from] runtime::RegistryError),

    /// The model backend could not be constructed.
    #[error(transparent)]
    Model(#[from] runtime::ModelError),

    /// The generation request failed.
    #[error(transparent)]
    Chat(#[from] runtime::ChatError),
}

pub type Result<T> = std::result::Result<T, Error>;
