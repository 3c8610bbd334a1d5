//! Outbound transcoding: declarative tree to wire payload ("expand").
//!
//! Unlike the inbound path, expansion is strict. The first field that does
//! not fit its descriptor aborts the whole conversion with an error naming
//! the field's full path. Table rows are emitted in the order the caller
//! declared them; only the inbound path reorders.

use tessera_core::{
    Constraints, FieldDescriptor, FieldKind, Node, ObjectNode, Path, Scalar, ScalarType,
    TableNode, Version, WireMap, WireValue,
};
use tracing::debug;

use crate::gate;
use crate::{Result, TranscodeError};

/// Expansion at one API version.
#[derive(Debug, Clone, Copy)]
pub struct Outbound {
    version: Version,
}

impl Outbound {
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Convert `node`, the value of the field described by `desc` at `path`.
    ///
    /// Returns `Ok(None)` when the field does not exist at this version and
    /// must be left out of the payload entirely. [`Node::Cleared`] expands
    /// to an explicit wire `null`.
    pub fn expand(
        &self,
        node: &Node,
        desc: &FieldDescriptor,
        path: &Path,
    ) -> Result<Option<WireValue>> {
        if !gate::included(desc, &self.version) {
            debug!(path = %path, version = %self.version, "field omitted at version");
            return Ok(None);
        }

        let wire = match (&desc.kind, node) {
            (_, Node::Cleared) => WireValue::Null,
            (FieldKind::Object { fields }, Node::Object(object)) => {
                WireValue::Object(self.expand_object(object, fields, path)?)
            }
            (FieldKind::Table { fields, .. }, Node::Table(table)) => {
                self.expand_table(table, fields, path)?
            }
            (kind, Node::Scalar(scalar)) => match kind.scalar_type() {
                Some(target) => expand_scalar(scalar, target, &desc.constraints, path)?,
                None => return Err(mismatch(path, kind.name(), node)),
            },
            (kind, other) => return Err(mismatch(path, kind.name(), other)),
        };
        Ok(Some(wire))
    }

    /// Expand the children of an object (or a table row) in declaration order.
    ///
    /// Children absent from `object` produce no wire key.
    pub fn expand_object(
        &self,
        object: &ObjectNode,
        fields: &[FieldDescriptor],
        path: &Path,
    ) -> Result<WireMap> {
        if let Some(unknown) = object
            .names()
            .find(|name| !fields.iter().any(|f| f.name == *name))
        {
            return Err(TranscodeError::unknown_field(path.field(unknown)));
        }

        let mut map = WireMap::new();
        for child in fields {
            let Some(node) = object.get(&child.name) else {
                continue;
            };
            if let Some(wire) = self.expand(node, child, &path.field(&child.name))? {
                map.insert(child.wire_key().into_owned(), wire);
            }
        }
        Ok(map)
    }

    fn expand_table(
        &self,
        table: &TableNode,
        fields: &[FieldDescriptor],
        path: &Path,
    ) -> Result<WireValue> {
        table
            .iter()
            .enumerate()
            .map(|(index, row)| {
                self.expand_object(&row.fields, fields, &path.index(index))
                    .map(WireValue::Object)
            })
            .collect::<Result<Vec<_>>>()
            .map(WireValue::Array)
    }
}

fn expand_scalar(
    scalar: &Scalar,
    target: ScalarType,
    constraints: &Constraints,
    path: &Path,
) -> Result<WireValue> {
    let value = match (target, scalar) {
        (ScalarType::String, Scalar::String(s)) => {
            check_string(s, constraints, path)?;
            WireValue::String(s.clone())
        }
        (ScalarType::Integer, Scalar::Integer(i)) => {
            check_integer(*i, constraints, path)?;
            WireValue::from(*i)
        }
        (ScalarType::Float, Scalar::Float(_) | Scalar::Integer(_)) => {
            let widened = match scalar {
                Scalar::Integer(i) => Scalar::Float(*i as f64),
                other => other.clone(),
            };
            widened.to_wire().ok_or_else(|| {
                TranscodeError::constraint_violation(path.clone(), "value is not a finite number")
            })?
        }
        (ScalarType::Boolean, Scalar::Bool(b)) => WireValue::Bool(*b),
        _ => {
            return Err(TranscodeError::type_mismatch(
                path.clone(),
                target.to_string(),
                scalar.scalar_type().to_string(),
            ));
        }
    };
    Ok(value)
}

fn check_string(value: &str, constraints: &Constraints, path: &Path) -> Result<()> {
    if let Some(max) = constraints.max_length {
        let len = value.chars().count();
        if len > max {
            return Err(TranscodeError::constraint_violation(
                path.clone(),
                format!("length {len} exceeds maximum {max}"),
            ));
        }
    }
    if !constraints.one_of.is_empty() && !constraints.one_of.iter().any(|v| v == value) {
        return Err(TranscodeError::constraint_violation(
            path.clone(),
            format!(
                "'{value}' is not one of: {}",
                constraints.one_of.join(", ")
            ),
        ));
    }
    Ok(())
}

fn check_integer(value: i64, constraints: &Constraints, path: &Path) -> Result<()> {
    if let Some(min) = constraints.min.filter(|min| value < *min) {
        return Err(TranscodeError::constraint_violation(
            path.clone(),
            format!("{value} is below minimum {min}"),
        ));
    }
    if let Some(max) = constraints.max.filter(|max| value > *max) {
        return Err(TranscodeError::constraint_violation(
            path.clone(),
            format!("{value} is above maximum {max}"),
        ));
    }
    Ok(())
}

fn mismatch(path: &Path, expected: &str, found: &Node) -> TranscodeError {
    TranscodeError::type_mismatch(path.clone(), expected, found.kind_name())
}
