//! Path resolution and value comparison for assignments

use super::ast::PathSegment;
use serde_json::{Number, Value};

/// Walk `path` into `value`, returning `None` when a step does not exist
pub fn resolve_path<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let mut current = value;

    for segment in path {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
            (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
            (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
            _ => return None,
        };
    }

    Some(current)
}

/// Compare two values structurally; numbers compare by exact value
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => numbers_equal(l, r),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l
                    .iter()
                    .all(|(k, v)| r.get(k).is_some_and(|rv| values_equal(v, rv)))
        }
        _ => left == right,
    }
}

/// Exact numeric equality: integers compare as integers, an integer equals
/// a float only when the float holds exactly that integer.
fn numbers_equal(left: &Number, right: &Number) -> bool {
    match (as_integer(left), as_integer(right)) {
        (Some(l), Some(r)) => l == r,
        (Some(int), None) => right.as_f64().is_some_and(|f| float_is_integer(f, int)),
        (None, Some(int)) => left.as_f64().is_some_and(|f| float_is_integer(f, int)),
        (None, None) => left.as_f64() == right.as_f64(),
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

// `as` saturates, so floats beyond the u64 range never match
fn float_is_integer(f: f64, int: i128) -> bool {
    f.fract() == 0.0 && f as i128 == int
}
