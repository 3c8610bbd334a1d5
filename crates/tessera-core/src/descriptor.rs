//! Declarative field metadata driving both transcoding directions.
//!
//! A resource schema is a tree of [`FieldDescriptor`]s rooted at an object
//! descriptor. Descriptors are plain data: they can be built in code with the
//! builder methods below or loaded from JSON/TOML catalogs.
//!
//! ```
//! use tessera_core::descriptor::FieldDescriptor;
//! use tessera_core::version::Version;
//!
//! let policy = FieldDescriptor::resource("firewall_policy", vec![
//!     FieldDescriptor::integer("policyid"),
//!     FieldDescriptor::string("name").max_length(35),
//!     FieldDescriptor::string("action").one_of(["accept", "deny"]),
//!     FieldDescriptor::table("srcaddr", "name", vec![FieldDescriptor::string("name")])
//!         .sort_by("name"),
//!     FieldDescriptor::string("internet_service6")
//!         .since(Version::new(6, 4, 0)),
//! ]);
//! assert!(policy.validate().is_ok());
//! assert_eq!(policy.child("internet_service6").unwrap().wire_key(), "internet-service6");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use crate::error::CoreError;
use crate::version::Version;
use crate::wire::default_wire_key;

/// Semantic type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    String,
    Integer,
    Float,
    Boolean,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Shape of a field: one of the scalar types, a nested object, or a table of objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    Object {
        #[serde(default)]
        fields: Vec<FieldDescriptor>,
    },
    Table {
        /// Field used to match rows across reconciliation passes
        identity_key: String,
        /// Field rows are ordered by when canonical sorting is on; defaults to `identity_key`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sort_key: Option<String>,
        /// Never sort this table, even when canonical sorting is enabled
        #[serde(default)]
        preserve_order: bool,
        #[serde(default)]
        fields: Vec<FieldDescriptor>,
    },
}

impl FieldKind {
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Self::String => Some(ScalarType::String),
            Self::Integer => Some(ScalarType::Integer),
            Self::Float => Some(ScalarType::Float),
            Self::Boolean => Some(ScalarType::Boolean),
            Self::Object { .. } | Self::Table { .. } => None,
        }
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Object { .. } => "object",
            Self::Table { .. } => "table",
        }
    }
}

impl From<ScalarType> for FieldKind {
    fn from(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::String => Self::String,
            ScalarType::Integer => Self::Integer,
            ScalarType::Float => Self::Float,
            ScalarType::Boolean => Self::Boolean,
        }
    }
}

/// Value constraints for scalar fields, checked on the outbound path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Maximum string length in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Inclusive lower bound for integers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    /// Inclusive upper bound for integers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    /// Allowed string values; empty means unrestricted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.max_length.is_none() && self.min.is_none() && self.max.is_none() && self.one_of.is_empty()
    }
}

/// Static metadata for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// State-side field name (snake_case)
    pub name: String,

    /// Wire-side key; derived from `name` when absent
    #[serde(default, rename = "wire_key", skip_serializing_if = "Option::is_none")]
    pub wire_key_override: Option<String>,

    #[serde(flatten)]
    pub kind: FieldKind,

    /// Write-only field the remote system never echoes back
    #[serde(default)]
    pub sensitive: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<Version>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<Version>,

    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

impl FieldDescriptor {
    fn with_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            wire_key_override: None,
            kind,
            sensitive: false,
            min_version: None,
            max_version: None,
            constraints: Constraints::default(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Boolean)
    }

    pub fn object(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::with_kind(name, FieldKind::Object { fields })
    }

    /// Root object of a resource schema.
    pub fn resource(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::object(name, fields)
    }

    pub fn table(
        name: impl Into<String>,
        identity_key: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self::with_kind(
            name,
            FieldKind::Table {
                identity_key: identity_key.into(),
                sort_key: None,
                preserve_order: false,
                fields,
            },
        )
    }

    /// Parse a descriptor tree from its JSON form and validate it.
    pub fn from_json(value: &Value) -> Result<Self, CoreError> {
        let descriptor: Self = serde_json::from_value(value.clone())?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn with_wire_key(mut self, key: impl Into<String>) -> Self {
        self.wire_key_override = Some(key.into());
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// First API version the field exists in.
    pub fn since(mut self, version: Version) -> Self {
        self.min_version = Some(version);
        self
    }

    /// Last API version the field exists in.
    pub fn until(mut self, version: Version) -> Self {
        self.max_version = Some(version);
        self
    }

    /// Sort rows by `key` instead of the identity key when canonical sorting is on.
    /// No effect on non-table fields.
    pub fn sort_by(mut self, key: impl Into<String>) -> Self {
        if let FieldKind::Table { sort_key, .. } = &mut self.kind {
            *sort_key = Some(key.into());
        }
        self
    }

    /// Keep remote order for this table even when canonical sorting is on.
    pub fn preserve_order(mut self) -> Self {
        if let FieldKind::Table { preserve_order, .. } = &mut self.kind {
            *preserve_order = true;
        }
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.constraints.min = Some(min);
        self.constraints.max = Some(max);
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    /// Key this field is stored under on the wire.
    pub fn wire_key(&self) -> Cow<'_, str> {
        match &self.wire_key_override {
            Some(key) => Cow::Borrowed(key.as_str()),
            None => Cow::Owned(default_wire_key(&self.name)),
        }
    }

    pub fn scalar_type(&self) -> Option<ScalarType> {
        self.kind.scalar_type()
    }

    pub fn is_table(&self) -> bool {
        matches!(self.kind, FieldKind::Table { .. })
    }

    /// Child descriptors of an object or table row; empty for scalars.
    pub fn children(&self) -> &[FieldDescriptor] {
        match &self.kind {
            FieldKind::Object { fields } | FieldKind::Table { fields, .. } => fields,
            _ => &[],
        }
    }

    pub fn child(&self, name: &str) -> Option<&FieldDescriptor> {
        self.children().iter().find(|c| c.name == name)
    }

    pub fn identity_key(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Table { identity_key, .. } => Some(identity_key),
            _ => None,
        }
    }

    /// Effective sort key of a table, `None` for order-preserving tables and non-tables.
    pub fn sort_key(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Table {
                preserve_order: true,
                ..
            } => None,
            FieldKind::Table {
                identity_key,
                sort_key,
                ..
            } => Some(sort_key.as_deref().unwrap_or(identity_key)),
            _ => None,
        }
    }

    /// Check internal consistency of the descriptor tree.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.is_empty() {
            return Err(CoreError::invalid_descriptor("field name must not be empty"));
        }

        if let (Some(min), Some(max)) = (self.min_version, self.max_version) {
            if min > max {
                return Err(CoreError::invalid_descriptor(format!(
                    "'{}': min_version {min} is after max_version {max}",
                    self.name
                )));
            }
        }

        match &self.kind {
            FieldKind::Object { fields } => self.validate_children(fields)?,
            FieldKind::Table {
                identity_key,
                sort_key,
                fields,
                ..
            } => {
                self.validate_children(fields)?;
                for key in std::iter::once(identity_key).chain(sort_key.as_ref()) {
                    let Some(field) = fields.iter().find(|f| &f.name == key) else {
                        return Err(CoreError::invalid_descriptor(format!(
                            "table '{}' has no field '{key}'",
                            self.name
                        )));
                    };
                    if field.scalar_type().is_none() {
                        return Err(CoreError::invalid_descriptor(format!(
                            "table '{}': key field '{key}' must be a scalar",
                            self.name
                        )));
                    }
                }
                if let Some(key_field) = fields.iter().find(|f| &f.name == identity_key) {
                    if key_field.sensitive {
                        return Err(CoreError::invalid_descriptor(format!(
                            "table '{}': identity key '{identity_key}' cannot be sensitive",
                            self.name
                        )));
                    }
                    if key_field.min_version.is_some() || key_field.max_version.is_some() {
                        return Err(CoreError::invalid_descriptor(format!(
                            "table '{}': identity key '{identity_key}' cannot be version-gated",
                            self.name
                        )));
                    }
                }
            }
            _ => {}
        }

        if self.sensitive && self.scalar_type().is_none() {
            return Err(CoreError::invalid_descriptor(format!(
                "'{}': only scalar fields can be sensitive",
                self.name
            )));
        }

        if !self.constraints.is_empty() && self.scalar_type().is_none() {
            return Err(CoreError::invalid_descriptor(format!(
                "'{}': constraints only apply to scalar fields",
                self.name
            )));
        }

        Ok(())
    }

    fn validate_children(&self, fields: &[FieldDescriptor]) -> Result<(), CoreError> {
        let mut names = HashSet::new();
        let mut wire_keys = HashSet::new();
        for field in fields {
            if !names.insert(field.name.as_str()) {
                return Err(CoreError::invalid_descriptor(format!(
                    "'{}' declares field '{}' twice",
                    self.name, field.name
                )));
            }
            if !wire_keys.insert(field.wire_key().into_owned()) {
                return Err(CoreError::invalid_descriptor(format!(
                    "'{}' maps two fields to wire key '{}'",
                    self.name,
                    field.wire_key()
                )));
            }
            field.validate()?;
        }
        Ok(())
    }
}
