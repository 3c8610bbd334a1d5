//! Inbound transcoding: wire payload to declarative tree ("flatten").
//!
//! Reading never fails as a whole. A field whose wire value cannot be
//! converted is skipped and reported as a [`Diagnostic`]; absent and `null`
//! wire values yield an absent node ("not reported"), never a cleared one.
//!
//! Table rows are matched against the previous state by identity value
//! before their nested fields are read, so nested state lookups (sensitive
//! carry-forward, nested tables) address the row's previous position rather
//! than its wire position. Diagnostics always name the wire position.

use tessera_core::{
    EngineOptions, FieldDescriptor, FieldKind, Node, ObjectNode, Path, Scalar, ScalarType,
    StateSnapshot, TableNode, Version, WireMap, WireValue, wire_kind,
};
use tracing::{debug, warn};

use crate::TranscodeError;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::gate;
use crate::reconcile::Reconciler;
use crate::sort::sort_rows;
use crate::vault::resolve_sensitive;

/// Output of an inbound pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flattened {
    /// `None` when the field was absent, not reported, or version-gated out
    pub node: Option<Node>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Flattened {
    /// Snapshot for the next read cycle when the flattened node is an object.
    pub fn into_state(self) -> StateSnapshot {
        match self.node {
            Some(Node::Object(root)) => StateSnapshot::new(root),
            _ => StateSnapshot::empty(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// One inbound pass over a wire payload.
pub struct Inbound<'a> {
    state: &'a StateSnapshot,
    version: Version,
    options: EngineOptions,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Inbound<'a> {
    pub fn new(state: &'a StateSnapshot, version: Version, options: EngineOptions) -> Self {
        Self {
            state,
            version,
            options,
            diagnostics: Vec::new(),
        }
    }

    /// Convert `wire`, the value of the field described by `desc` at `base`,
    /// into a node.
    pub fn flatten(mut self, wire: &WireValue, desc: &FieldDescriptor, base: &Path) -> Flattened {
        let node = match self.flatten_field(Some(wire), desc, &Site::new(base), true) {
            Ok(node) => node,
            Err(err) => {
                self.skip(err);
                None
            }
        };
        Flattened {
            node,
            diagnostics: self.diagnostics,
        }
    }

    /// `exists` is false inside rows with no previous counterpart; no state
    /// is consulted below such a row.
    fn flatten_field(
        &mut self,
        wire: Option<&WireValue>,
        desc: &FieldDescriptor,
        site: &Site,
        exists: bool,
    ) -> Result<Option<Node>, TranscodeError> {
        if !gate::included(desc, &self.version) {
            debug!(path = %site.wire, version = %self.version, "field not available at version");
            return Ok(None);
        }

        if desc.sensitive {
            let previous = if exists { self.state.scalar(&site.state) } else { None };
            return Ok(resolve_sensitive(None, previous).map(Node::Scalar));
        }

        let Some(wire) = wire.filter(|w| !w.is_null()) else {
            return Ok(None);
        };

        match &desc.kind {
            FieldKind::Object { fields } => {
                let map = expect_map(wire, &site.wire)?;
                let object = self.flatten_children(map, fields, site, exists);
                Ok(Some(Node::Object(object)))
            }
            FieldKind::Table { identity_key, .. } => {
                self.flatten_table(wire, desc, identity_key, site, exists)
            }
            kind => {
                let scalar_type = kind
                    .scalar_type()
                    .ok_or_else(|| mismatch(&site.wire, kind.name(), wire))?;
                let scalar = coerce(wire, scalar_type)
                    .ok_or_else(|| mismatch(&site.wire, kind.name(), wire))?;
                Ok(Some(Node::Scalar(scalar)))
            }
        }
    }

    fn flatten_children(
        &mut self,
        map: &WireMap,
        fields: &[FieldDescriptor],
        site: &Site,
        exists: bool,
    ) -> ObjectNode {
        let mut object = ObjectNode::new();
        for child in fields {
            let child_wire = map.get(child.wire_key().as_ref());
            match self.flatten_field(child_wire, child, &site.field(&child.name), exists) {
                Ok(Some(node)) => {
                    object.insert(child.name.clone(), node);
                }
                Ok(None) => {}
                Err(err) => self.skip(err),
            }
        }
        object
    }

    fn flatten_table(
        &mut self,
        wire: &WireValue,
        desc: &FieldDescriptor,
        identity_key: &str,
        site: &Site,
        exists: bool,
    ) -> Result<Option<Node>, TranscodeError> {
        let state = self.state;
        let previous = if exists { state.table(&site.state) } else { None };

        if !site.wire.is_within_table() && !self.options.get_all_tables && previous.is_none() {
            debug!(path = %site.wire, "table not declared in state, not reading");
            return Ok(None);
        }

        let WireValue::Array(elements) = wire else {
            return Err(mismatch(&site.wire, "table", wire));
        };

        let reconciler = Reconciler::new(identity_key, previous);
        let key_desc = desc.child(identity_key);
        let mut rows = Vec::with_capacity(elements.len());

        for (wire_index, element) in elements.iter().enumerate() {
            let map = match expect_map(element, &site.wire.index(wire_index)) {
                Ok(map) => map,
                Err(err) => {
                    self.skip(err);
                    continue;
                }
            };

            let previous_index = key_desc
                .and_then(|kd| identity_of(map, kd))
                .and_then(|identity| reconciler.lookup(&identity));
            let fields = self.flatten_children(
                map,
                desc.children(),
                &site.row(wire_index, previous_index),
                previous_index.is_some(),
            );
            rows.push((wire_index, fields));
        }

        let reconciled = reconciler.reconcile_indexed(rows, &site.wire);
        self.diagnostics.extend(reconciled.diagnostics);

        let mode = self.options.dynamic_sort_subtable;
        let rows = match desc.sort_key() {
            Some(sort_key) => sort_rows(reconciled.rows, sort_key, mode),
            None => reconciled.rows,
        };

        Ok(Some(Node::Table(TableNode::new(rows))))
    }

    fn skip(&mut self, err: TranscodeError) {
        match err {
            TranscodeError::TypeMismatch {
                path,
                expected,
                found,
            } => {
                warn!(path = %path, expected = %expected, found = %found, "skipping field with mismatched type");
                self.diagnostics.push(Diagnostic::new(
                    path,
                    DiagnosticKind::TypeMismatch { expected, found },
                ));
            }
            other => warn!(error = %other, "skipping field"),
        }
    }
}

/// Where a node is read from and where its previous value lives.
///
/// Rows are addressed by wire index in `wire` and by the previous position
/// they bound to in `state`. Diagnostics always report `wire`.
#[derive(Debug, Clone)]
struct Site {
    state: Path,
    wire: Path,
}

impl Site {
    fn new(base: &Path) -> Self {
        Self {
            state: base.clone(),
            wire: base.clone(),
        }
    }

    fn field(&self, name: &str) -> Self {
        Self {
            state: self.state.field(name),
            wire: self.wire.field(name),
        }
    }

    fn row(&self, wire_index: usize, previous_index: Option<usize>) -> Self {
        Self {
            state: self.state.index(previous_index.unwrap_or(wire_index)),
            wire: self.wire.index(wire_index),
        }
    }
}

fn expect_map<'w>(wire: &'w WireValue, path: &Path) -> Result<&'w WireMap, TranscodeError> {
    match wire {
        WireValue::Object(map) => Ok(map),
        other => Err(mismatch(path, "object", other)),
    }
}

fn mismatch(path: &Path, expected: &str, found: &WireValue) -> TranscodeError {
    TranscodeError::type_mismatch(path.clone(), expected, wire_kind(found))
}

/// Identity value of a wire row, converted with the key field's declared type.
fn identity_of(map: &WireMap, key_desc: &FieldDescriptor) -> Option<Scalar> {
    let wire = map.get(key_desc.wire_key().as_ref())?;
    coerce(wire, key_desc.scalar_type()?)
}

/// Convert a wire primitive to `target`, widening where the conversion is lossless.
pub fn coerce(wire: &WireValue, target: ScalarType) -> Option<Scalar> {
    match (target, wire) {
        (ScalarType::String, WireValue::String(s)) => Some(Scalar::String(s.clone())),
        (ScalarType::String, WireValue::Number(n)) => Some(Scalar::String(n.to_string())),

        (ScalarType::Integer, WireValue::Number(n)) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Scalar::Integer),
        (ScalarType::Integer, WireValue::String(s)) => s.trim().parse().ok().map(Scalar::Integer),

        (ScalarType::Float, WireValue::Number(n)) => n.as_f64().map(Scalar::Float),
        (ScalarType::Float, WireValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Scalar::Float),

        (ScalarType::Boolean, WireValue::Bool(b)) => Some(Scalar::Bool(*b)),
        (ScalarType::Boolean, WireValue::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Some(Scalar::Bool(true)),
            "false" => Some(Scalar::Bool(false)),
            _ => None,
        },

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_core::SortMode;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn read(
        wire: &WireValue,
        desc: &FieldDescriptor,
        state: &StateSnapshot,
        options: EngineOptions,
    ) -> Flattened {
        Inbound::new(state, v("7.2.0"), options).flatten(wire, desc, &Path::root())
    }

    fn zone() -> FieldDescriptor {
        FieldDescriptor::resource(
            "system_zone",
            vec![
                FieldDescriptor::string("name"),
                FieldDescriptor::string("intrazone"),
                FieldDescriptor::table(
                    "interface",
                    "interface_name",
                    vec![FieldDescriptor::string("interface_name")],
                ),
            ],
        )
    }

    #[test]
    fn test_coerce_matrix() {
        use ScalarType::*;
        assert_eq!(coerce(&json!("a"), String), Some(Scalar::from("a")));
        assert_eq!(coerce(&json!(443), String), Some(Scalar::from("443")));
        assert_eq!(coerce(&json!(true), String), None);

        assert_eq!(coerce(&json!(7), Integer), Some(Scalar::Integer(7)));
        assert_eq!(coerce(&json!(7.0), Integer), Some(Scalar::Integer(7)));
        assert_eq!(coerce(&json!(7.5), Integer), None);
        assert_eq!(coerce(&json!(" 42 "), Integer), Some(Scalar::Integer(42)));
        assert_eq!(coerce(&json!(u64::MAX), Integer), None);
        assert_eq!(coerce(&json!("x"), Integer), None);

        assert_eq!(coerce(&json!(3), Float), Some(Scalar::Float(3.0)));
        assert_eq!(coerce(&json!("2.5"), Float), Some(Scalar::Float(2.5)));
        assert_eq!(coerce(&json!("inf"), Float), None);

        assert_eq!(coerce(&json!(false), Boolean), Some(Scalar::Bool(false)));
        assert_eq!(coerce(&json!("TRUE"), Boolean), Some(Scalar::Bool(true)));
        assert_eq!(coerce(&json!(1), Boolean), None);
        assert_eq!(coerce(&json!([1]), Integer), None);
    }

    #[test]
    fn test_object_in_declaration_order() {
        let wire = json!({"intrazone": "deny", "name": "z1", "extra": 1});
        let out = read(&wire, &zone(), &StateSnapshot::empty(), EngineOptions::default());

        let Some(Node::Object(object)) = out.node else {
            panic!("expected object");
        };
        assert_eq!(object.names().collect::<Vec<_>>(), vec!["name", "intrazone"]);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_and_null_fields_are_absent() {
        let wire = json!({"name": null});
        let out = read(&wire, &zone(), &StateSnapshot::empty(), EngineOptions::default());
        let object = out.node.unwrap();
        assert!(object.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_type_mismatch_skipped_with_diagnostic() {
        let desc = FieldDescriptor::resource(
            "r",
            vec![
                FieldDescriptor::integer("mtu"),
                FieldDescriptor::string("name"),
            ],
        );
        let wire = json!({"mtu": [1500], "name": "wan1"});
        let out = read(&wire, &desc, &StateSnapshot::empty(), EngineOptions::default());

        let object = out.node.unwrap();
        let object = object.as_object().unwrap();
        assert!(!object.contains("mtu"));
        assert_eq!(object.get_scalar("name"), Some(&Scalar::from("wan1")));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].path.to_string(), "mtu");
        assert_eq!(
            out.diagnostics[0].kind,
            DiagnosticKind::TypeMismatch {
                expected: "integer".into(),
                found: "array".into()
            }
        );
    }

    #[test]
    fn test_undeclared_table_not_read_without_get_all_tables() {
        let wire = json!({"name": "z1", "interface": [{"interface-name": "port1"}]});

        let out = read(&wire, &zone(), &StateSnapshot::empty(), EngineOptions::default());
        assert!(!out.node.unwrap().as_object().unwrap().contains("interface"));

        let out = read(
            &wire,
            &zone(),
            &StateSnapshot::empty(),
            EngineOptions::default().with_all_tables(true),
        );
        let node = out.node.unwrap();
        let table = node.as_object().unwrap().get("interface").unwrap();
        assert_eq!(table.as_table().unwrap().len(), 1);
    }

    #[test]
    fn test_declared_table_is_read() {
        let state = StateSnapshot::new(
            ObjectNode::new().with("interface", TableNode::default()),
        );
        let wire = json!({"interface": [{"interface-name": "port1"}]});
        let out = read(&wire, &zone(), &state, EngineOptions::default());
        let node = out.node.unwrap();
        let rows = &node.as_object().unwrap().get("interface").unwrap().as_table().unwrap().rows;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].existing);
    }

    #[test]
    fn test_non_object_rows_skipped() {
        let wire = json!({"interface": [{"interface-name": "port1"}, "junk"]});
        let out = read(
            &wire,
            &zone(),
            &StateSnapshot::empty(),
            EngineOptions::default().with_all_tables(true),
        );
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].path.to_string(), "interface.1");
    }

    #[test]
    fn test_table_sorted_when_enabled() {
        let wire = json!({"interface": [
            {"interface-name": "port3"},
            {"interface-name": "port1"},
            {"interface-name": "port2"}
        ]});
        let options = EngineOptions::default()
            .with_all_tables(true)
            .with_sort(SortMode::Lexical);
        let out = read(&wire, &zone(), &StateSnapshot::empty(), options);
        let node = out.node.unwrap();
        let table = node.as_object().unwrap().get("interface").unwrap().as_table().unwrap();
        let keys: Vec<_> = table.keys("interface_name").flatten().collect();
        assert_eq!(keys, vec!["port1", "port2", "port3"]);
    }

    #[test]
    fn test_sensitive_never_read_from_wire() {
        let desc = FieldDescriptor::resource(
            "user",
            vec![FieldDescriptor::string("passwd").sensitive()],
        );
        let wire = json!({"passwd": "ENC XXXX"});
        let out = read(&wire, &desc, &StateSnapshot::empty(), EngineOptions::default());
        assert!(out.node.unwrap().as_object().unwrap().is_empty());
    }

    #[test]
    fn test_version_gated_field_not_reported() {
        let desc = FieldDescriptor::resource(
            "r",
            vec![FieldDescriptor::string("new_field").since(v("7.4.0"))],
        );
        let out = read(
            &json!({"new-field": "x"}),
            &desc,
            &StateSnapshot::empty(),
            EngineOptions::default(),
        );
        assert!(out.node.unwrap().as_object().unwrap().is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_root_mismatch_reported() {
        let out = read(&json!([1, 2]), &zone(), &StateSnapshot::empty(), EngineOptions::default());
        assert!(out.node.is_none());
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].path.is_root());
    }

    #[test]
    fn test_into_state() {
        let out = read(
            &json!({"name": "z1"}),
            &zone(),
            &StateSnapshot::empty(),
            EngineOptions::default(),
        );
        let state = out.into_state();
        assert_eq!(
            state.scalar(&Path::root().field("name")),
            Some(&Scalar::from("z1"))
        );
    }

    #[test]
    fn test_row_diagnostics_use_wire_positions() {
        let desc = FieldDescriptor::resource(
            "policy",
            vec![FieldDescriptor::table(
                "rule",
                "id",
                vec![
                    FieldDescriptor::integer("id"),
                    FieldDescriptor::integer("port"),
                ],
            )],
        );
        let state = StateSnapshot::new(ObjectNode::new().with(
            "rule",
            TableNode::from_objects([
                ObjectNode::new().with("id", Node::integer(1)),
                ObjectNode::new().with("id", Node::integer(2)),
            ]),
        ));
        let wire = json!({"rule": [{"id": 2, "port": "x"}, {"id": 9, "port": "y"}]});

        let out = read(&wire, &desc, &state, EngineOptions::default());
        let paths: Vec<_> = out.diagnostics.iter().map(|d| d.path.to_string()).collect();
        assert_eq!(paths, vec!["rule.0.port", "rule.1.port"]);

        let node = out.node.unwrap();
        let rows = &node.as_object().unwrap().get("rule").unwrap().as_table().unwrap().rows;
        assert_eq!(rows[0].previous_index, Some(1));
        assert!(!rows[1].existing);
    }

    #[test]
    fn test_missing_identity_after_skipped_element_uses_wire_index() {
        let wire = json!({"interface": ["junk", {"other": 1}]});
        let out = read(
            &wire,
            &zone(),
            &StateSnapshot::empty(),
            EngineOptions::default().with_all_tables(true),
        );
        let paths: Vec<_> = out.diagnostics.iter().map(|d| d.path.to_string()).collect();
        assert_eq!(paths, vec!["interface.0", "interface.1"]);
    }
}
