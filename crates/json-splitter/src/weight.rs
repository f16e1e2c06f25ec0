//! Weight functions for cluster candidates.
//!
//! The clusterer treats cost as a black box: any fallible function
//! from a [`ClusterCandidate`] to an integer weight. The default
//! measures the serialized JSON length of the candidate's value,
//! computed without allocating the intermediate string.

use crate::cluster::ClusterCandidate;
use serde_json::Value;

/// Error raised by a caller-supplied weight function.
///
/// Propagates uncaught through the clusterer; the core performs no
/// retries on this path.
pub type WeightError = Box<dyn std::error::Error + Send + Sync>;

/// A pluggable cost function evaluated on tentative merges.
///
/// May be expensive (e.g. an external tokenizer); results are cached
/// per candidate signature within one clustering attempt.
pub type WeightFn<'a> = dyn Fn(&ClusterCandidate) -> Result<u64, WeightError> + 'a;

/// Default weight function: serialized JSON length in bytes.
pub fn serialized_weight(candidate: &ClusterCandidate) -> Result<u64, WeightError> {
    Ok(serialized_size(&candidate.value) as u64)
}

/// Exact byte length of a value's compact JSON serialization.
///
/// Matches `serde_json::to_string(value).len()` without building the
/// string.
///
/// # Example
///
/// ```
/// use json_splitter::weight::serialized_size;
/// use serde_json::json;
///
/// assert_eq!(serialized_size(&json!(null)), 4);
/// assert_eq!(serialized_size(&json!({"a": [1, 20]})), 12);
/// ```
pub fn serialized_size(value: &Value) -> usize {
    match value {
        Value::Null => 4,
        Value::Bool(true) => 4,
        Value::Bool(false) => 5,
        Value::Number(n) => n.to_string().len(),
        Value::String(s) => string_size(s),
        Value::Array(items) => {
            let mut size = 2 + items.len().saturating_sub(1);
            for item in items {
                size += serialized_size(item);
            }
            size
        }
        Value::Object(map) => {
            let mut size = 2 + map.len().saturating_sub(1);
            for (key, item) in map {
                size += string_size(key) + 1 + serialized_size(item);
            }
            size
        }
    }
}

/// JSON-encoded size of a string, including quotes and escapes.
fn string_size(s: &str) -> usize {
    let mut size = 2;
    for ch in s.chars() {
        match ch {
            '\u{0008}' | '\t' | '\n' | '\u{000C}' | '\r' | '"' | '\\' => size += 2,
            c if c.is_control() => size += 6,
            c => size += c.len_utf8(),
        }
    }
    size
}
