//! The typed declarative tree produced by inbound transcoding and consumed by
//! outbound transcoding.
//!
//! A tree is rebuilt for every transcoding call and never mutated across
//! calls; the previous tree is handed back in as a read-only
//! [`StateSnapshot`].

use indexmap::IndexMap;
use std::fmt;

use crate::descriptor::ScalarType;
use crate::path::{Path, Segment};
use crate::wire::WireValue;

/// A primitive leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::String(_) => ScalarType::String,
            Self::Integer(_) => ScalarType::Integer,
            Self::Float(_) => ScalarType::Float,
            Self::Bool(_) => ScalarType::Boolean,
        }
    }

    /// Only the empty string counts as empty; `0` and `false` are real values.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Wire form of the value. Non-finite floats have no JSON form.
    pub fn to_wire(&self) -> Option<WireValue> {
        match self {
            Self::String(s) => Some(WireValue::String(s.clone())),
            Self::Integer(i) => Some(WireValue::from(*i)),
            Self::Float(f) => serde_json::Number::from_f64(*f).map(WireValue::Number),
            Self::Bool(b) => Some(WireValue::Bool(*b)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A node of the declarative tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Object(ObjectNode),
    Table(TableNode),
    /// Explicitly cleared by the caller; expands to wire `null`.
    ///
    /// Distinct from an absent field, which expands to no wire key at all.
    Cleared,
}

impl Node {
    pub fn string(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::String(value.into()))
    }

    pub fn integer(value: i64) -> Self {
        Self::Scalar(Scalar::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableNode> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Short name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(s) => match s.scalar_type() {
                ScalarType::String => "string",
                ScalarType::Integer => "integer",
                ScalarType::Float => "float",
                ScalarType::Boolean => "boolean",
            },
            Self::Object(_) => "object",
            Self::Table(_) => "table",
            Self::Cleared => "cleared",
        }
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<ObjectNode> for Node {
    fn from(value: ObjectNode) -> Self {
        Self::Object(value)
    }
}

impl From<TableNode> for Node {
    fn from(value: TableNode) -> Self {
        Self::Table(value)
    }
}

/// Ordered mapping of field name to node. Iteration follows insertion order,
/// which the transcoders keep equal to descriptor declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    fields: IndexMap<String, Node>,
}

impl ObjectNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.fields.insert(name.into(), node.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<Node>) -> Option<Node> {
        self.fields.insert(name.into(), node.into())
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }

    pub fn get_scalar(&self, name: &str) -> Option<&Scalar> {
        self.get(name).and_then(Node::as_scalar)
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.fields.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Node addressed by `path`, relative to this object. Paths ending on a
    /// table index address a [`Row`]; use [`ObjectNode::row_at`] for those.
    pub fn get_path(&self, path: &Path) -> Option<&Node> {
        match resolve(self, path.segments())? {
            Resolved::Node(node) => Some(node),
            Resolved::Row(_) | Resolved::Root(_) => None,
        }
    }

    /// Table row addressed by a path ending on an index.
    pub fn row_at(&self, path: &Path) -> Option<&Row> {
        match resolve(self, path.segments())? {
            Resolved::Row(row) => Some(row),
            Resolved::Node(_) | Resolved::Root(_) => None,
        }
    }

    /// Object addressed by `path`: the root itself, a row, or a nested object.
    pub fn object_at(&self, path: &Path) -> Option<&ObjectNode> {
        match resolve(self, path.segments())? {
            Resolved::Root(object) => Some(object),
            Resolved::Row(row) => Some(&row.fields),
            Resolved::Node(node) => node.as_object(),
        }
    }
}

impl FromIterator<(String, Node)> for ObjectNode {
    fn from_iter<T: IntoIterator<Item = (String, Node)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

enum Resolved<'a> {
    Root(&'a ObjectNode),
    Node(&'a Node),
    Row(&'a Row),
}

fn resolve<'a>(root: &'a ObjectNode, segments: &[Segment]) -> Option<Resolved<'a>> {
    let mut current = Resolved::Root(root);
    for segment in segments {
        current = match (current, segment) {
            (Resolved::Root(object), Segment::Field(name)) => Resolved::Node(object.get(name)?),
            (Resolved::Row(row), Segment::Field(name)) => Resolved::Node(row.fields.get(name)?),
            (Resolved::Node(Node::Object(object)), Segment::Field(name)) => {
                Resolved::Node(object.get(name)?)
            }
            (Resolved::Node(Node::Table(table)), Segment::Index(index)) => {
                Resolved::Row(table.rows.get(*index)?)
            }
            _ => return None,
        };
    }
    Some(current)
}

/// One row of a table plus its reconciliation tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub fields: ObjectNode,
    /// The row matched a row of the previous state by identity key
    pub existing: bool,
    /// Position of the matched row in the previous state
    pub previous_index: Option<usize>,
}

impl Row {
    pub fn new(fields: ObjectNode) -> Self {
        Self {
            fields,
            existing: false,
            previous_index: None,
        }
    }

    /// Row bound to position `previous_index` of the previous state.
    pub fn existing(fields: ObjectNode, previous_index: usize) -> Self {
        Self {
            fields,
            existing: true,
            previous_index: Some(previous_index),
        }
    }
}

impl From<ObjectNode> for Row {
    fn from(fields: ObjectNode) -> Self {
        Self::new(fields)
    }
}

/// Ordered sequence of identity-keyed rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableNode {
    pub rows: Vec<Row>,
}

impl TableNode {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Untagged rows, as a caller declares them.
    pub fn from_objects(objects: impl IntoIterator<Item = ObjectNode>) -> Self {
        Self {
            rows: objects.into_iter().map(Row::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Identity values of the rows in order, rendered as strings. Rows
    /// without a scalar at `key` yield `None`.
    pub fn keys<'a>(&'a self, key: &'a str) -> impl Iterator<Item = Option<String>> + 'a {
        self.rows
            .iter()
            .map(move |row| row.fields.get_scalar(key).map(Scalar::to_string))
    }
}

/// What the caller previously believed about a resource.
///
/// The engine only ever reads a snapshot; it is owned by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateSnapshot {
    root: ObjectNode,
}

impl StateSnapshot {
    pub fn new(root: ObjectNode) -> Self {
        Self { root }
    }

    /// Snapshot of a resource never seen before (create and import flows).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &ObjectNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&Node> {
        self.root.get_path(path)
    }

    pub fn row(&self, path: &Path) -> Option<&Row> {
        self.root.row_at(path)
    }

    pub fn table(&self, path: &Path) -> Option<&TableNode> {
        self.get(path).and_then(Node::as_table)
    }

    pub fn scalar(&self, path: &Path) -> Option<&Scalar> {
        self.get(path).and_then(Node::as_scalar)
    }
}

impl From<ObjectNode> for StateSnapshot {
    fn from(root: ObjectNode) -> Self {
        Self::new(root)
    }
}
