//! Merge-by-key alignment of freshly read table rows against previous state.
//!
//! The remote system may return rows in an order unrelated to what the
//! caller declared. Rows are matched by identity value so that a row that
//! merely moved is recognised as the same row. Output keeps wire order;
//! each row is tagged `existing` and remembers the previous position it
//! bound to. Rows that disappeared are simply absent from the output.
//!
//! Duplicate identity values bind to the first match and are reported as
//! [`DiagnosticKind::DuplicateIdentity`] warnings.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tessera_core::{ObjectNode, Path, Row, Scalar, TableNode};
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, DiagnosticKind, RowSource};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciled {
    pub rows: Vec<Row>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Reconciled {
    pub fn existing_count(&self) -> usize {
        self.rows.iter().filter(|r| r.existing).count()
    }
}

/// Identity index over the previous rows of one table.
#[derive(Debug, Clone)]
pub struct Reconciler<'a> {
    key_field: &'a str,
    positions: HashMap<String, usize>,
    previous_duplicates: Vec<(String, usize, usize)>,
}

impl<'a> Reconciler<'a> {
    /// Index `previous` by the value of `key_field`, first occurrence wins.
    pub fn new(key_field: &'a str, previous: Option<&TableNode>) -> Self {
        let mut positions = HashMap::new();
        let mut previous_duplicates = Vec::new();

        for (index, key) in previous
            .into_iter()
            .flat_map(|table| table.keys(key_field))
            .enumerate()
        {
            let Some(key) = key else { continue };
            match positions.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
                Entry::Occupied(slot) => {
                    previous_duplicates.push((slot.key().clone(), *slot.get(), index));
                }
            }
        }

        Self {
            key_field,
            positions,
            previous_duplicates,
        }
    }

    pub fn key_field(&self) -> &str {
        self.key_field
    }

    /// Previous position bound to `identity`, if any.
    pub fn lookup(&self, identity: &Scalar) -> Option<usize> {
        self.positions.get(&identity.to_string()).copied()
    }

    /// Tag `rows` (in wire order) against the indexed previous rows.
    ///
    /// `path` addresses the table and anchors diagnostics. Pure: the same
    /// inputs always yield the same output.
    pub fn reconcile(&self, rows: Vec<ObjectNode>, path: &Path) -> Reconciled {
        self.reconcile_indexed(rows.into_iter().enumerate(), path)
    }

    /// Like [`Reconciler::reconcile`], for rows that carry their own wire
    /// index (some wire elements may have been dropped before reconciling).
    pub fn reconcile_indexed(
        &self,
        rows: impl IntoIterator<Item = (usize, ObjectNode)>,
        path: &Path,
    ) -> Reconciled {
        let rows = rows.into_iter();
        let mut diagnostics: Vec<Diagnostic> = self
            .previous_duplicates
            .iter()
            .map(|(key, first, duplicate)| {
                duplicate_identity(path, key, *first, *duplicate, RowSource::Previous)
            })
            .collect();

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut out = Vec::with_capacity(rows.size_hint().0);

        for (wire_index, fields) in rows {
            let Some(identity) = fields.get_scalar(self.key_field) else {
                diagnostics.push(Diagnostic::new(
                    path.index(wire_index),
                    DiagnosticKind::MissingIdentity {
                        key_field: self.key_field.to_string(),
                    },
                ));
                out.push(Row::new(fields));
                continue;
            };

            let key = identity.to_string();
            match seen.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(wire_index);
                }
                Entry::Occupied(slot) => {
                    diagnostics.push(duplicate_identity(
                        path,
                        &key,
                        *slot.get(),
                        wire_index,
                        RowSource::Wire,
                    ));
                }
            }

            match self.positions.get(&key) {
                Some(&previous_index) => out.push(Row::existing(fields, previous_index)),
                None => out.push(Row::new(fields)),
            }
        }

        let reconciled = Reconciled {
            rows: out,
            diagnostics,
        };
        debug!(
            path = %path,
            rows = reconciled.rows.len(),
            existing = reconciled.existing_count(),
            "reconciled table rows"
        );
        reconciled
    }
}

fn duplicate_identity(
    path: &Path,
    key: &str,
    first: usize,
    duplicate: usize,
    source: RowSource,
) -> Diagnostic {
    warn!(path = %path, key = %key, first, duplicate, source = %source, "duplicate identity value");
    Diagnostic::new(
        path.clone(),
        DiagnosticKind::DuplicateIdentity {
            key: key.to_string(),
            first,
            duplicate,
            source,
        },
    )
}

/// Reconcile `rows` against `previous` in one call.
pub fn reconcile(
    rows: Vec<ObjectNode>,
    previous: Option<&TableNode>,
    key_field: &str,
    path: &Path,
) -> Reconciled {
    Reconciler::new(key_field, previous).reconcile(rows, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Node;

    fn row(id: i64, x: &str) -> ObjectNode {
        ObjectNode::new()
            .with("id", Node::integer(id))
            .with("x", Node::string(x))
    }

    fn table_path() -> Path {
        Path::root().field("rule")
    }

    #[test]
    fn test_reordered_rows_are_existing_in_wire_order() {
        let previous = TableNode::from_objects([row(1, "a"), row(2, "b")]);
        let result = reconcile(
            vec![row(2, "b"), row(1, "a")],
            Some(&previous),
            "id",
            &table_path(),
        );

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].fields, row(2, "b"));
        assert_eq!(result.rows[1].fields, row(1, "a"));
        assert!(result.rows.iter().all(|r| r.existing));
        assert_eq!(result.rows[0].previous_index, Some(1));
        assert_eq!(result.rows[1].previous_index, Some(0));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let previous = TableNode::from_objects([row(1, "a"), row(2, "b")]);
        let rows = vec![row(2, "b"), row(3, "c"), row(1, "z")];

        let first = reconcile(rows.clone(), Some(&previous), "id", &table_path());
        let second = reconcile(rows, Some(&previous), "id", &table_path());
        assert_eq!(first, second);
    }

    #[test]
    fn test_new_and_removed_rows() {
        let previous = TableNode::from_objects([row(1, "a"), row(2, "b")]);
        let result = reconcile(
            vec![row(3, "c"), row(1, "changed")],
            Some(&previous),
            "id",
            &table_path(),
        );

        assert_eq!(result.rows.len(), 2);
        assert!(!result.rows[0].existing);
        assert_eq!(result.rows[0].previous_index, None);
        assert!(result.rows[1].existing);
        assert_eq!(result.rows[1].fields.get_scalar("x"), Some(&Scalar::from("changed")));
        assert_eq!(result.existing_count(), 1);
    }

    #[test]
    fn test_no_previous_state() {
        let result = reconcile(vec![row(1, "a")], None, "id", &table_path());
        assert!(!result.rows[0].existing);
    }

    #[test]
    fn test_duplicate_previous_binds_first_match() {
        let previous = TableNode::from_objects([row(1, "a"), row(1, "dup")]);
        let result = reconcile(vec![row(1, "a")], Some(&previous), "id", &table_path());

        assert_eq!(result.rows[0].previous_index, Some(0));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics[0].kind,
            DiagnosticKind::DuplicateIdentity {
                key: "1".into(),
                first: 0,
                duplicate: 1,
                source: RowSource::Previous,
            }
        );
    }

    #[test]
    fn test_duplicate_wire_rows_bind_same_previous_row() {
        let previous = TableNode::from_objects([row(1, "a"), row(2, "b")]);
        let result = reconcile(
            vec![row(1, "a"), row(1, "again")],
            Some(&previous),
            "id",
            &table_path(),
        );

        assert_eq!(result.rows[0].previous_index, Some(0));
        assert_eq!(result.rows[1].previous_index, Some(0));
        assert!(result.diagnostics.iter().all(Diagnostic::is_ambiguity));
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_missing_identity_is_new_row() {
        let previous = TableNode::from_objects([row(1, "a")]);
        let keyless = ObjectNode::new().with("x", Node::string("a"));
        let result = reconcile(vec![keyless], Some(&previous), "id", &table_path());

        assert!(!result.rows[0].existing);
        assert_eq!(result.diagnostics[0].path.to_string(), "rule.0");
        assert!(matches!(
            result.diagnostics[0].kind,
            DiagnosticKind::MissingIdentity { .. }
        ));
    }

    #[test]
    fn test_indexed_rows_report_wire_positions() {
        let keyless = ObjectNode::new().with("x", Node::string("a"));
        let result = Reconciler::new("id", None)
            .reconcile_indexed([(0, row(1, "a")), (2, row(1, "b")), (3, keyless)], &table_path());

        assert_eq!(result.rows.len(), 3);
        assert_eq!(
            result.diagnostics[0].kind,
            DiagnosticKind::DuplicateIdentity {
                key: "1".into(),
                first: 0,
                duplicate: 2,
                source: RowSource::Wire,
            }
        );
        assert_eq!(result.diagnostics[1].path.to_string(), "rule.3");
    }

    #[test]
    fn test_lookup() {
        let previous = TableNode::from_objects([row(4, "a"), row(9, "b")]);
        let reconciler = Reconciler::new("id", Some(&previous));
        assert_eq!(reconciler.lookup(&Scalar::Integer(9)), Some(1));
        assert_eq!(reconciler.lookup(&Scalar::Integer(5)), None);
        assert_eq!(reconciler.key_field(), "id");
    }
}
