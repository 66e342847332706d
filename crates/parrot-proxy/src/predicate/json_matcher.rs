//! Structural JSON comparison.

use crate::model::MatchType;
use serde_json::Value;
use tracing::warn;

/// Compare JSON text structurally.
///
/// An expectation that is not valid JSON falls back to trimmed text
/// equality. An actual body that is not valid JSON never matches.
pub fn json_matches(expected: &str, actual: &str, match_type: MatchType) -> bool {
    let expected_value: Value = match serde_json::from_str(expected) {
        Ok(value) => value,
        Err(e) => {
            warn!("JSON expectation is not valid JSON, comparing as text: {}", e);
            return expected.trim() == actual.trim();
        }
    };
    match serde_json::from_str::<Value>(actual) {
        Ok(actual_value) => json_deep_equals(&actual_value, &expected_value, match_type),
        Err(_) => false,
    }
}

/// Deep comparison of `actual` against `expected`.
///
/// `Strict`: identical key sets at every level and arrays in order.
/// `OnlyMatchingFields`: expected keys must be present with equal values,
/// extra keys are ignored and array elements may appear in any order
/// (arrays must still have the same length).
pub fn json_deep_equals(actual: &Value, expected: &Value, match_type: MatchType) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b || a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return false;
            }
            match match_type {
                MatchType::Strict => a
                    .iter()
                    .zip(b.iter())
                    .all(|(x, y)| json_deep_equals(x, y, match_type)),
                MatchType::OnlyMatchingFields => assign_unordered(a, b, match_type),
            }
        }
        (Value::Object(a), Value::Object(b)) => {
            if match_type == MatchType::Strict && a.len() != b.len() {
                return false;
            }
            b.iter().all(|(key, expected_val)| {
                a.get(key).is_some_and(|actual_val| {
                    json_deep_equals(actual_val, expected_val, match_type)
                })
            })
        }
        _ => false,
    }
}

/// Pair every expected element with a distinct actual element.
///
/// Compatibility is computed once per element pair, then pairs are found by
/// augmenting paths (Kuhn's bipartite matching), so the cost stays
/// polynomial however many elements are interchangeable.
fn assign_unordered(actual: &[Value], expected: &[Value], match_type: MatchType) -> bool {
    let compatible: Vec<Vec<usize>> = expected
        .iter()
        .map(|expected_item| {
            actual
                .iter()
                .enumerate()
                .filter(|(_, actual_item)| json_deep_equals(actual_item, expected_item, match_type))
                .map(|(column, _)| column)
                .collect()
        })
        .collect();
    if compatible.iter().any(Vec::is_empty) {
        return false;
    }

    let mut owner: Vec<Option<usize>> = vec![None; actual.len()];
    (0..expected.len()).all(|row| {
        let mut seen = vec![false; actual.len()];
        augment(row, &compatible, &mut owner, &mut seen)
    })
}

fn augment(
    row: usize,
    compatible: &[Vec<usize>],
    owner: &mut [Option<usize>],
    seen: &mut [bool],
) -> bool {
    for &column in &compatible[row] {
        if seen[column] {
            continue;
        }
        seen[column] = true;
        let free = match owner[column] {
            None => true,
            Some(other) => augment(other, compatible, owner, seen),
        };
        if free {
            owner[column] = Some(row);
            return true;
        }
    }
    false
}
