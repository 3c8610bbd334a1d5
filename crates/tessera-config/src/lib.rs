//! Engine option loading for Tessera.
//!
//! Options come from several places and are merged by priority, lowest to
//! highest:
//!
//! 1. Defaults - [`EngineOptions::default`]
//! 2. File - `tessera.toml` or an explicit path
//! 3. Environment - `TESSERA__*` variables
//! 4. Call - per-call overrides supplied by the embedding application
//!
//! The [`loader`] reads layers 1-3; [`Layered`] lets a caller add layer 4
//! and reports which layer each option came from.

pub mod loader;
pub mod merger;

pub use loader::{load_layered, load_layered_with_env, load_options};
pub use merger::{Layered, PartialOptions, Priority};

use tessera_core::EngineOptions;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Parse an inline TOML document into options, unset keys keeping their defaults.
pub fn from_toml(toml_str: &str) -> Result<EngineOptions> {
    let partial = PartialOptions::from_toml(toml_str)?;
    Ok(partial.apply(EngineOptions::default()))
}
