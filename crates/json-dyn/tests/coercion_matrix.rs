//! Scalar coercion matrix: every source variant against every target type,
//! through both `Value::coerce` and the typed decoder.

use json_dyn::{Blob, Error, Value};
use serde_json::json;

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

// ---------------------------------------------------------------------------
// bool
// ---------------------------------------------------------------------------

#[test]
fn bool_from_each_variant() {
    assert_eq!(Value::Bool(true).coerce::<bool>().unwrap(), true);
    assert_eq!(Value::Int(-2).coerce::<bool>().unwrap(), true);
    assert_eq!(Value::Int(0).coerce::<bool>().unwrap(), false);
    assert_eq!(Value::Double(0.0).coerce::<bool>().unwrap(), false);
    assert_eq!(Value::from("true").coerce::<bool>().unwrap(), true);
    assert!(Value::from("TRUE").coerce::<bool>().is_err());
    assert!(Value::from("1").coerce::<bool>().is_err());
    assert!(Value::Null.coerce::<bool>().is_err());
    assert!(v(json!([true])).coerce::<bool>().is_err());
    assert!(v(json!({})).coerce::<bool>().is_err());
}

// ---------------------------------------------------------------------------
// integers
// ---------------------------------------------------------------------------

#[test]
fn integers_from_each_variant() {
    assert_eq!(Value::Bool(false).coerce::<u8>().unwrap(), 0);
    assert_eq!(Value::Int(i64::MIN).coerce::<i64>().unwrap(), i64::MIN);
    assert_eq!(Value::Double(2.999).coerce::<i16>().unwrap(), 2);
    assert_eq!(Value::from("-17").coerce::<i32>().unwrap(), -17);
    assert_eq!(Value::from("+17").coerce::<i32>().unwrap(), 17);
    assert!(Value::from(" 17").coerce::<i32>().is_err());
    assert!(Value::Null.coerce::<i32>().is_err());
    assert!(v(json!([1])).coerce::<i32>().is_err());
}

#[test]
fn integer_range_is_checked_per_width() {
    assert!(Value::Int(128).coerce::<i8>().is_err());
    assert_eq!(Value::Int(127).coerce::<i8>().unwrap(), 127);
    assert!(Value::Int(65_536).coerce::<u16>().is_err());
    assert!(Value::Int(-1).coerce::<usize>().is_err());
    assert!(Value::from("99999999999999999999").coerce::<i64>().is_err());
    assert_eq!(
        Value::from("99999999999999999999").coerce::<u128>().unwrap(),
        99_999_999_999_999_999_999
    );
    assert!(Value::Double(f64::INFINITY).coerce::<u64>().is_err());
    assert!(Value::Double(-1.5).coerce::<u32>().is_err());
}

// ---------------------------------------------------------------------------
// floats
// ---------------------------------------------------------------------------

#[test]
fn floats_from_each_variant() {
    assert_eq!(Value::Bool(false).coerce::<f64>().unwrap(), 0.0);
    assert_eq!(Value::Int(-3).coerce::<f64>().unwrap(), -3.0);
    assert_eq!(Value::Double(0.25).coerce::<f32>().unwrap(), 0.25);
    assert_eq!(Value::from("1e3").coerce::<f64>().unwrap(), 1000.0);
    assert!(Value::Null.coerce::<f64>().is_err());
    assert!(v(json!({"a": 1})).coerce::<f64>().is_err());
}

// ---------------------------------------------------------------------------
// strings
// ---------------------------------------------------------------------------

#[test]
fn strings_from_each_variant() {
    assert_eq!(Value::Bool(true).coerce::<String>().unwrap(), "true");
    assert_eq!(Value::Int(42).coerce::<String>().unwrap(), "42");
    assert_eq!(Value::Double(0.1).coerce::<String>().unwrap(), "0.1");
    assert_eq!(Value::Double(1e21).coerce::<String>().unwrap(), "1e21");
    assert_eq!(Value::from("s").coerce::<String>().unwrap(), "s");
    assert!(Value::Null.coerce::<String>().is_err());
    assert!(v(json!(["a"])).coerce::<String>().is_err());
}

// ---------------------------------------------------------------------------
// binary
// ---------------------------------------------------------------------------

#[test]
fn blob_only_from_base64_strings() {
    assert_eq!(
        Value::from("AP8=").coerce::<Blob>().unwrap(),
        Blob::new(vec![0x00, 0xff])
    );
    assert!(Value::from("AP8").coerce::<Blob>().is_err());
    assert!(v(json!([0, 255])).coerce::<Blob>().is_err());
    assert_eq!(Value::from(Blob::new(vec![0x00, 0xff])), Value::from("AP8="));
}

// ---------------------------------------------------------------------------
// the typed decoder applies the same table
// ---------------------------------------------------------------------------

#[test]
fn decoder_matches_coerce_for_scalars() {
    let samples = [
        Value::Null,
        Value::Bool(true),
        Value::Int(7),
        Value::Double(7.9),
        Value::from("7"),
        Value::from("x"),
        v(json!([7])),
        v(json!({"a": 7})),
    ];
    for sample in &samples {
        assert_eq!(
            sample.coerce::<i64>().ok(),
            sample.decode::<i64>().ok(),
            "i64 from {sample:?}"
        );
        assert_eq!(
            sample.coerce::<bool>().ok(),
            sample.decode::<bool>().ok(),
            "bool from {sample:?}"
        );
        assert_eq!(
            sample.coerce::<String>().ok(),
            sample.decode::<String>().ok(),
            "String from {sample:?}"
        );
    }
}

#[test]
fn conversion_errors_keep_the_offending_value() {
    let err = v(json!({"a": {"b": [null]}}))
        .decode::<std::collections::HashMap<String, std::collections::HashMap<String, Vec<u8>>>>()
        .unwrap_err();
    match err {
        Error::Conversion {
            target,
            value,
            path,
        } => {
            assert_eq!(target, "u8");
            assert_eq!(*value, Value::Null);
            assert_eq!(path.to_pointer(), "/a/b/0");
            assert_eq!(path.to_json_path(), "$['a']['b'][0]");
        }
        other => panic!("expected conversion error, got {other:?}"),
    }
}
