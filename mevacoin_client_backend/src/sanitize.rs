//! Clamping of untrusted numeric fields.
//!
//! The daemon's sync responses originate from JavaScript-family tooling in which every
//! number is an IEEE 754 double, so any integer above 2^53 − 1 has already lost
//! precision by the time it reaches the wire, and passing such a value onward silently
//! corrupts comparisons and arithmetic. Before a response is decoded, every numeric
//! field above that boundary is capped to exactly the boundary. Clamping is a cap,
//! not a validation failure: no error is raised.

use serde_json::Value;

/// The largest integer exactly representable by the daemon's JSON encoding
/// (`Number.MAX_SAFE_INTEGER`, 2^53 − 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Recursively visits every field of `value`, capping any number whose magnitude
/// exceeds [`MAX_SAFE_INTEGER`] down to exactly that boundary.
///
/// Non-numeric, non-container values pass through unchanged.
pub fn clamp_unsafe_integers(value: &mut Value) {
    match value {
        Value::Number(n) => {
            let exceeds = match (n.as_u64(), n.as_f64()) {
                (Some(u), _) => u > MAX_SAFE_INTEGER,
                (None, Some(f)) => f > MAX_SAFE_INTEGER as f64,
                (None, None) => false,
            };
            if exceeds {
                *value = Value::from(MAX_SAFE_INTEGER);
            }
        }
        Value::Array(elements) => {
            for element in elements {
                clamp_unsafe_integers(element);
            }
        }
        Value::Object(fields) => {
            for field in fields.values_mut() {
                clamp_unsafe_integers(field);
            }
        }
        Value::Null | Value::Bool(_) | Value::String(_) => {}
    }
}
