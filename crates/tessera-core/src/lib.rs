//! Core types for the Tessera transcoding engine.
//!
//! Leaf types shared by the engine and its callers:
//! - [`WireValue`] - untyped JSON as exchanged with the remote API
//! - [`Node`] / [`ObjectNode`] / [`TableNode`] - the typed declarative tree
//! - [`StateSnapshot`] - the caller's previously known tree
//! - [`Path`] - structured `field.N.subfield` addressing
//! - [`FieldDescriptor`] - per-field schema metadata
//! - [`Version`] - semantically ordered API versions

pub mod descriptor;
pub mod error;
pub mod node;
pub mod options;
pub mod path;
pub mod version;
pub mod wire;

pub use descriptor::{Constraints, FieldDescriptor, FieldKind, ScalarType};
pub use error::{CoreError, ErrorCategory, Result};
pub use node::{Node, ObjectNode, Row, Scalar, StateSnapshot, TableNode};
pub use options::{EngineOptions, SortMode};
pub use path::{Path, Segment};
pub use version::Version;
pub use wire::{WireMap, WireValue, wire_kind};
