//! The engine facade: one set of options, every direction.

use tessera_core::{
    EngineOptions, FieldDescriptor, Node, ObjectNode, Path, Row, StateSnapshot, TableNode,
    Version, WireValue,
};

use crate::Result;
use crate::inbound::{Flattened, Inbound};
use crate::outbound::Outbound;
use crate::reconcile::{Reconciled, reconcile};
use crate::sort::sort_rows;

/// Stateless transcoding engine.
///
/// Every call is a pure function of its arguments and the options the engine
/// was built with, so one engine can be shared freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Read `wire`, the value of the field `desc` at `base`, against `state`.
    pub fn flatten(
        &self,
        wire: &WireValue,
        desc: &FieldDescriptor,
        base: &Path,
        state: &StateSnapshot,
        version: Version,
    ) -> Flattened {
        Inbound::new(state, version, self.options).flatten(wire, desc, base)
    }

    /// Read a whole resource payload; `resource` describes the root object.
    pub fn flatten_resource(
        &self,
        wire: &WireValue,
        resource: &FieldDescriptor,
        state: &StateSnapshot,
        version: Version,
    ) -> Flattened {
        self.flatten(wire, resource, &Path::root(), state, version)
    }

    /// Write `node`, the value of the field `desc` at `path`.
    pub fn expand(
        &self,
        node: &Node,
        desc: &FieldDescriptor,
        path: &Path,
        version: Version,
    ) -> Result<Option<WireValue>> {
        Outbound::new(version).expand(node, desc, path)
    }

    /// Write a whole resource; the result is always a wire object.
    pub fn expand_resource(
        &self,
        root: &ObjectNode,
        resource: &FieldDescriptor,
        version: Version,
    ) -> Result<WireValue> {
        Outbound::new(version)
            .expand_object(root, resource.children(), &Path::root())
            .map(WireValue::Object)
    }

    pub fn reconcile(
        &self,
        rows: Vec<ObjectNode>,
        previous: Option<&TableNode>,
        key_field: &str,
        path: &Path,
    ) -> Reconciled {
        reconcile(rows, previous, key_field, path)
    }

    /// Canonical ordering per the engine's `dynamic_sort_subtable` mode.
    pub fn sort(&self, rows: Vec<Row>, key_field: &str) -> Vec<Row> {
        sort_rows(rows, key_field, self.options.dynamic_sort_subtable)
    }
}
