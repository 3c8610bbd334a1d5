//! Non-fatal findings collected while reading wire payloads.

use std::fmt;

use tessera_core::Path;

/// Which side of a reconciliation a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    Previous,
    Wire,
}

impl fmt::Display for RowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Previous => write!(f, "previous state"),
            Self::Wire => write!(f, "wire"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A wire value could not be converted; the field was skipped.
    TypeMismatch { expected: String, found: String },
    /// Two rows share an identity value; the later one binds to the first match.
    DuplicateIdentity {
        key: String,
        first: usize,
        duplicate: usize,
        source: RowSource,
    },
    /// A wire row has no usable identity value and is treated as new.
    MissingIdentity { key_field: String },
}

/// One finding, anchored at the path it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: Path,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(path: Path, kind: DiagnosticKind) -> Self {
        Self { path, kind }
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.kind, DiagnosticKind::TypeMismatch { .. })
    }

    pub fn is_ambiguity(&self) -> bool {
        matches!(self.kind, DiagnosticKind::DuplicateIdentity { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::TypeMismatch { expected, found } => write!(
                f,
                "{}: expected {expected}, found {found}; field skipped",
                self.path
            ),
            DiagnosticKind::DuplicateIdentity {
                key,
                first,
                duplicate,
                source,
            } => write!(
                f,
                "{}: identity '{key}' repeats in {source} rows {first} and {duplicate}; bound to first match",
                self.path
            ),
            DiagnosticKind::MissingIdentity { key_field } => write!(
                f,
                "{}: row has no '{key_field}' value; treated as new",
                self.path
            ),
        }
    }
}
