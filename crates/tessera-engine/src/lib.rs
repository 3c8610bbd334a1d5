//! Tessera transcoding engine.
//!
//! Converts between the flat, untyped wire payloads of a remote management
//! API and the typed declarative tree a caller keeps as state:
//!
//! - [`Inbound`] reads wire into a [`Node`](tessera_core::Node) ("flatten"),
//!   aligning table rows with previous state and carrying write-only fields
//!   forward
//! - [`Outbound`] writes a node back to wire ("expand")
//! - [`Reconciler`] and [`sort_rows`] are the table passes inbound runs
//! - [`Engine`] bundles the passes with a set of
//!   [`EngineOptions`](tessera_core::EngineOptions)
//!
//! Every field is driven by a [`FieldDescriptor`](tessera_core::FieldDescriptor);
//! there is no per-field code.

pub mod diagnostics;
pub mod engine;
pub mod gate;
pub mod inbound;
pub mod outbound;
pub mod reconcile;
pub mod sort;
pub mod vault;

pub use diagnostics::{Diagnostic, DiagnosticKind, RowSource};
pub use engine::Engine;
pub use inbound::{Flattened, Inbound, coerce};
pub use outbound::Outbound;
pub use reconcile::{Reconciled, Reconciler, reconcile};
pub use sort::sort_rows;
pub use vault::resolve_sensitive;

use tessera_core::{CoreError, ErrorCategory, Path};
use thiserror::Error;

/// Errors from transcoding. Every node-level variant names the failing path.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: Path,
        expected: String,
        found: String,
    },

    #[error("{path}: field is not declared by the schema")]
    UnknownField { path: Path },

    #[error("{path}: {message}")]
    ConstraintViolation { path: Path, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TranscodeError {
    pub fn type_mismatch(
        path: Path,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unknown_field(path: Path) -> Self {
        Self::UnknownField { path }
    }

    pub fn constraint_violation(path: Path, message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            path,
            message: message.into(),
        }
    }

    /// Path of the node the error concerns, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::UnknownField { path }
            | Self::ConstraintViolation { path, .. } => Some(path),
            Self::Core(_) => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TypeMismatch { .. } => ErrorCategory::Type,
            Self::UnknownField { .. } => ErrorCategory::Schema,
            Self::ConstraintViolation { .. } => ErrorCategory::Constraint,
            Self::Core(err) => err.category(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TranscodeError>;
