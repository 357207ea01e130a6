//! # Canonical Serialization — JCS-Compatible Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used in policy pattern-matching and digest computation across the
//! Governor: the `pattern` match field in a PolicyRule matches against
//! `CanonicalBytes::new(&params)`, and `policy_version`/event hash chaining
//! both hash `CanonicalBytes`.
//!
//! ## Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which applies a
//! type-coercion pipeline (float rejection, datetime normalization, key
//! stringification) before JCS serialization. Any function that needs
//! canonical bytes must accept `&CanonicalBytes`, and the only way to
//! produce one is through this pipeline — so two call sites can never
//! silently diverge on how the "same" value gets serialized.
//!
//! ## Coercion rules
//!
//! 1. **Reject floats** — amounts must be strings or integers. Floats have
//!    non-deterministic JCS number serialization edge cases.
//! 2. **Normalize datetimes** — UTC ISO8601 with `Z` suffix, truncated to seconds.
//!    Naive datetimes are assumed UTC. Non-UTC offsets are converted.
//! 3. **Coerce non-string keys** — all object keys become strings via `to_string()`.
//! 4. **Convert tuples to lists** — tuples serialize as JSON arrays.
//! 5. **Unknown types** — fall back to `to_string()`.
//!
//! After coercion, serialization uses `serde_jcs` for RFC 8785 (JSON
//! Canonicalization Scheme) compliant output: sorted keys, compact separators,
//! deterministic byte sequence.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS-compatible canonicalization with the
/// Governor's type coercion rules.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - All datetime values are normalized to UTC ISO8601 with Z suffix, truncated to seconds.
/// - All numeric amounts are integers or strings, never floats.
/// - All dict keys are strings.
/// - Tuples/sequences are JSON arrays.
/// - Serialization uses sorted keys with compact separators (RFC 8785).
///
/// These invariants are enforced by the constructor and cannot be violated
/// by downstream code because the inner `Vec<u8>` is private.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// Applies the full type coercion pipeline before JCS serialization.
    /// This is the ONLY way to construct `CanonicalBytes`. All policy
    /// pattern matching and digest computation must flow through this
    /// constructor.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains float
    /// numbers. Returns `CanonicalizationError::SerializationFailed` if JCS
    /// serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let coerced = coerce_json_value(value)?;
        let bytes = serialize_canonical(&coerced)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively coerce JSON values according to the canonicalization rules.
///
/// 1. `null`, `bool`, `string`, `integer` — pass through unchanged.
/// 2. `float` (non-integer) — **rejected** with `FloatRejected` error.
/// 3. `object` — keys coerced to strings (already strings in JSON), values recursed.
/// 4. `array` — elements recursed.
///
/// In the Rust/serde world, datetime and tuple coercion happen at the
/// serialization boundary (`Serialize` impl), not in the JSON value tree.
/// Chrono's `DateTime<Utc>` serializes to an ISO8601 string, and Rust tuples
/// serialize to JSON arrays. The `Timestamp` type in this crate ensures the
/// Z-suffix and second-precision invariants.
fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            // Reject pure floats (not representable as i64/u64).
            // This matches Python's: if isinstance(obj, float): raise ValueError(...)
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                // Keys are already strings in JSON (serde_json::Map<String, Value>).
                // This matches Python's: out[str(k)] = _coerce_json_types(v)
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => {
            let coerced: Result<Vec<_>, _> = arr.into_iter().map(coerce_json_value).collect();
            Ok(Value::Array(coerced?))
        }
    }
}

/// Serialize a JSON value in JCS-canonical form (RFC 8785).
///
/// Uses `serde_jcs` for deterministic output: sorted keys, compact separators,
/// no trailing whitespace. The output is UTF-8 encoded bytes matching the
/// Python equivalent: `json.dumps(obj, sort_keys=True, separators=(",", ":"), ensure_ascii=False).encode("utf-8")`
fn serialize_canonical(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let s = serde_jcs::to_string(value)?;
    Ok(s.into_bytes())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for generating JSON-compatible values without floats.
    /// Mirrors the restricted domain of `_coerce_json_types()`.
    fn json_value_no_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,50}".prop_map(|s| Value::String(s)),
        ];
        leaf.prop_recursive(
            4,  // depth
            64, // desired size
            8,  // items per collection
            |inner| {
                prop_oneof![
                    // Arrays
                    prop::collection::vec(inner.clone(), 0..8)
                        .prop_map(Value::Array),
                    // Objects with string keys
                    prop::collection::btree_map("[a-z]{1,10}", inner, 0..8)
                        .prop_map(|m| {
                            let map: serde_json::Map<String, Value> =
                                m.into_iter().collect();
                            Value::Object(map)
                        }),
                ]
            },
        )
    }

    proptest! {
        /// Canonicalization never panics for float-free values.
        #[test]
        fn canonical_bytes_never_panics(value in json_value_no_floats()) {
            let result = CanonicalBytes::new(&value);
            prop_assert!(result.is_ok(), "Canonicalization failed: {:?}", result.err());
        }

        /// Canonicalization is deterministic: same input always produces same bytes.
        #[test]
        fn canonical_bytes_deterministic(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        /// Canonical bytes are valid UTF-8 (required for cross-language compat).
        #[test]
        fn canonical_bytes_valid_utf8(value in json_value_no_floats()) {
            let cb = CanonicalBytes::new(&value).unwrap();
            prop_assert!(std::str::from_utf8(cb.as_bytes()).is_ok());
        }

        /// Canonical bytes are valid JSON (can round-trip through serde_json).
        #[test]
        fn canonical_bytes_valid_json(value in json_value_no_floats()) {
            let cb = CanonicalBytes::new(&value).unwrap();
            let parsed: Result<Value, _> = serde_json::from_slice(cb.as_bytes());
            prop_assert!(parsed.is_ok(), "Not valid JSON: {:?}", parsed.err());
        }

        /// Object keys are sorted lexicographically in canonical output.
        #[test]
        fn canonical_bytes_sorted_keys(
            keys in prop::collection::btree_set("[a-z]{1,8}", 2..6)
        ) {
            let map: serde_json::Map<String, Value> = keys.iter()
                .enumerate()
                .map(|(i, k)| (k.clone(), serde_json::json!(i)))
                .collect();
            let value = Value::Object(map);
            let cb = CanonicalBytes::new(&value).unwrap();
            let s = std::str::from_utf8(cb.as_bytes()).unwrap();

            // Extract keys from the canonical JSON string
            let parsed: serde_json::Map<String, Value> =
                serde_json::from_str(s).unwrap();
            let output_keys: Vec<&String> = parsed.keys().collect();
            let mut sorted_keys = output_keys.clone();
            sorted_keys.sort();
            prop_assert_eq!(output_keys, sorted_keys, "Keys not sorted in canonical output");
        }

        /// Any value containing a float is rejected.
        #[test]
        fn float_always_rejected(f in any::<f64>().prop_filter("not integer", |f| {
            f.fract() != 0.0 && f.is_finite()
        })) {
            let data = serde_json::json!({"val": f});
            let result = CanonicalBytes::new(&data);
            prop_assert!(result.is_err());
        }
    }
}
