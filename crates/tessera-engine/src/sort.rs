//! Canonical ordering of table rows.
//!
//! Runs after reconciliation, never before: identity alignment must see
//! rows in wire order.

use std::cmp::Ordering;

use tessera_core::{Row, Scalar, SortMode};

/// Stable sort of `rows` by the scalar at `key_field`, ascending.
///
/// Integers and floats compare numerically, strings per `mode`, booleans
/// `false` before `true`. Rows without a value at `key_field` keep their
/// relative order after all keyed rows. `SortMode::Disabled` returns the
/// input unchanged.
pub fn sort_rows(mut rows: Vec<Row>, key_field: &str, mode: SortMode) -> Vec<Row> {
    if !mode.is_enabled() {
        return rows;
    }

    rows.sort_by(|a, b| {
        match (
            a.fields.get_scalar(key_field),
            b.fields.get_scalar(key_field),
        ) {
            (Some(x), Some(y)) => compare_scalars(x, y, mode),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    rows
}

fn compare_scalars(a: &Scalar, b: &Scalar, mode: SortMode) -> Ordering {
    match (a, b) {
        (Scalar::Integer(x), Scalar::Integer(y)) => x.cmp(y),
        (Scalar::Float(x), Scalar::Float(y)) => x.total_cmp(y),
        (Scalar::Integer(x), Scalar::Float(y)) => (*x as f64).total_cmp(y),
        (Scalar::Float(x), Scalar::Integer(y)) => x.total_cmp(&(*y as f64)),
        (Scalar::String(x), Scalar::String(y)) => mode.compare_str(x, y),
        (Scalar::Bool(x), Scalar::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(scalar: &Scalar) -> u8 {
    match scalar {
        Scalar::Bool(_) => 0,
        Scalar::Integer(_) | Scalar::Float(_) => 1,
        Scalar::String(_) => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{Node, ObjectNode};

    fn rows_with_ids(ids: &[i64]) -> Vec<Row> {
        ids.iter()
            .map(|id| Row::new(ObjectNode::new().with("id", Node::integer(*id))))
            .collect()
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter()
            .filter_map(|r| r.fields.get_scalar("id").and_then(Scalar::as_i64))
            .collect()
    }

    fn names(rows: &[Row]) -> Vec<&str> {
        rows.iter()
            .filter_map(|r| r.fields.get_scalar("name").and_then(Scalar::as_str))
            .collect()
    }

    fn rows_with_names(names: &[&str]) -> Vec<Row> {
        names
            .iter()
            .map(|n| Row::new(ObjectNode::new().with("name", Node::string(*n))))
            .collect()
    }

    #[test]
    fn test_sort_enabled() {
        let sorted = sort_rows(rows_with_ids(&[3, 1, 2]), "id", SortMode::Lexical);
        assert_eq!(ids(&sorted), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_disabled_preserves_order() {
        let sorted = sort_rows(rows_with_ids(&[3, 1, 2]), "id", SortMode::Disabled);
        assert_eq!(ids(&sorted), vec![3, 1, 2]);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let sorted = sort_rows(rows_with_ids(&[10, 9, 100]), "id", SortMode::Lexical);
        assert_eq!(ids(&sorted), vec![9, 10, 100]);
    }

    #[test]
    fn test_lexical_vs_natural_strings() {
        let input = ["port10", "port2", "port1"];
        let lexical = sort_rows(rows_with_names(&input), "name", SortMode::Lexical);
        assert_eq!(names(&lexical), vec!["port1", "port10", "port2"]);

        let natural = sort_rows(rows_with_names(&input), "name", SortMode::Natural);
        assert_eq!(names(&natural), vec!["port1", "port2", "port10"]);
    }

    #[test]
    fn test_stable_and_missing_keys_last() {
        let mut rows = rows_with_ids(&[2, 1]);
        rows.insert(0, Row::new(ObjectNode::new().with("tag", Node::string("first"))));
        rows.push(Row::new(ObjectNode::new().with("tag", Node::string("second"))));
        rows.push(Row::new(
            ObjectNode::new()
                .with("id", Node::integer(1))
                .with("tag", Node::string("dup")),
        ));

        let sorted = sort_rows(rows, "id", SortMode::Lexical);
        let tags: Vec<_> = sorted
            .iter()
            .map(|r| r.fields.get_scalar("tag").map(Scalar::to_string))
            .collect();
        assert_eq!(ids(&sorted), vec![1, 1, 2]);
        assert_eq!(
            tags,
            vec![
                None,
                Some("dup".to_string()),
                None,
                Some("first".to_string()),
                Some("second".to_string())
            ]
        );
    }

    #[test]
    fn test_sort_keeps_reconciliation_tags() {
        let rows = vec![
            Row::existing(ObjectNode::new().with("id", Node::integer(2)), 0),
            Row::new(ObjectNode::new().with("id", Node::integer(1))),
        ];
        let sorted = sort_rows(rows, "id", SortMode::Lexical);
        assert!(!sorted[0].existing);
        assert!(sorted[1].existing);
        assert_eq!(sorted[1].previous_index, Some(0));
    }
}
