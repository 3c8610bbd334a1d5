use thiserror::Error;

/// Core error types for Tessera leaf types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid field descriptor: {message}")]
    InvalidDescriptor { message: String },

    #[error("Invalid sort mode: {0}")]
    InvalidSortMode(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidPath error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a new InvalidVersion error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion(version.into())
    }

    /// Create a new InvalidDescriptor error
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            message: message.into(),
        }
    }

    /// Create a new InvalidSortMode error
    pub fn invalid_sort_mode(mode: impl Into<String>) -> Self {
        Self::InvalidSortMode(mode.into())
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPath(_) | Self::InvalidVersion(_) | Self::InvalidSortMode(_) => {
                ErrorCategory::Input
            }
            Self::InvalidDescriptor { .. } => ErrorCategory::Schema,
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller-supplied strings that do not parse (paths, versions, flags)
    Input,
    /// Descriptor tables that are internally inconsistent
    Schema,
    /// A node whose type does not match its descriptor
    Type,
    /// A value outside its descriptor's constraints
    Constraint,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Schema => write!(f, "schema"),
            Self::Type => write!(f, "type"),
            Self::Constraint => write!(f, "constraint"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
