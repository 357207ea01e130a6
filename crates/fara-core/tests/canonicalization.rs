//! Canonicalization conformance vectors.
//!
//! `fara-policy`'s `version = H(source_text)` and any future event hash
//! chain both depend on `CanonicalBytes` producing a stable, JCS-style byte
//! sequence (sorted object keys, no insignificant whitespace) regardless of
//! how the input was constructed. These vectors pin that byte sequence down
//! so a future change to `canonical.rs` can't silently drift it.

use fara_core::{sha256_digest, sha256_hex, CanonicalBytes};

fn canonical_str(data: &impl serde::Serialize) -> String {
    let cb = CanonicalBytes::new(data).expect("canonicalization should succeed");
    std::str::from_utf8(cb.as_bytes()).unwrap().to_string()
}

#[test]
fn object_keys_are_sorted() {
    let data = serde_json::json!({"b": 2, "a": 1, "c": "hello"});
    assert_eq!(canonical_str(&data), r#"{"a":1,"b":2,"c":"hello"}"#);
}

#[test]
fn nested_object_keys_sort_recursively() {
    let data = serde_json::json!({
        "outer": {"z": 1, "a": 2},
        "inner": {"m": [3, 2, 1], "b": true}
    });
    assert_eq!(canonical_str(&data), r#"{"inner":{"b":true,"m":[3,2,1]},"outer":{"a":2,"z":1}}"#);
}

#[test]
fn array_element_order_is_preserved() {
    let data = serde_json::json!([3, 2, 1]);
    assert_eq!(canonical_str(&data), "[3,2,1]");
}

#[test]
fn empty_containers_round_trip() {
    assert_eq!(canonical_str(&serde_json::json!({})), "{}");
    assert_eq!(canonical_str(&serde_json::json!([])), "[]");
}

#[test]
fn booleans_and_null() {
    let data = serde_json::json!({"flag": true, "nope": false, "nothing": null});
    assert_eq!(canonical_str(&data), r#"{"flag":true,"nope":false,"nothing":null}"#);
}

#[test]
fn negative_and_large_integers() {
    let data = serde_json::json!({"neg": -42, "zero": 0, "big": 9999999999i64, "small": 1});
    assert_eq!(canonical_str(&data), r#"{"big":9999999999,"neg":-42,"small":1,"zero":0}"#);
}

#[test]
fn deep_nesting() {
    let data = serde_json::json!({"level1": {"level2": {"level3": {"value": "deep"}}}});
    assert_eq!(canonical_str(&data), r#"{"level1":{"level2":{"level3":{"value":"deep"}}}}"#);
}

#[test]
fn mixed_array_of_types() {
    let data = serde_json::json!([1, "two", true, null, {"k": "v"}]);
    assert_eq!(canonical_str(&data), r#"[1,"two",true,null,{"k":"v"}]"#);
}

#[test]
fn identical_logical_values_hash_identically_regardless_of_key_order() {
    let a = serde_json::json!({"tool": "shell", "op": "run"});
    let b = serde_json::json!({"op": "run", "tool": "shell"});
    let ha = sha256_hex(&CanonicalBytes::new(&a).unwrap());
    let hb = sha256_hex(&CanonicalBytes::new(&b).unwrap());
    assert_eq!(ha, hb);
}

#[test]
fn digest_and_hex_agree() {
    let data = serde_json::json!({"a": 1});
    let cb = CanonicalBytes::new(&data).unwrap();
    assert_eq!(sha256_digest(&cb).to_hex(), sha256_hex(&cb));
}
