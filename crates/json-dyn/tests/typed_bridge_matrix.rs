//! Typed decode/encode matrix: derived structs and enums against dynamic
//! values, coding paths in errors and fallback decoding.

use std::cell::Cell;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use json_dyn::{from_value, to_value, Blob, Config, Error, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct Nested {
    x: i32,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct Record {
    id: u64,
    arr: Vec<i32>,
    nested: Nested,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(try_from = "i64", into = "i64")]
enum Priority {
    Low = 1,
    High = 2,
}

impl TryFrom<i64> for Priority {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::High),
            other => Err(format!("unknown priority {other}")),
        }
    }
}

impl From<Priority> for i64 {
    fn from(p: Priority) -> i64 {
        p as i64
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
enum Shape {
    Empty,
    Circle(f64),
    Rect { w: u32, h: u32 },
    Pair(i32, i32),
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[test]
fn record_with_mixed_array_decodes() {
    let value = json_dyn::from_str(r#"{"id":5,"arr":[1,"2",3.4],"nested":{"x":1}}"#).unwrap();
    let record: Record = value.decode().unwrap();
    assert_eq!(
        record,
        Record {
            id: 5,
            arr: vec![1, 2, 3],
            nested: Nested { x: 1 },
        }
    );
    assert_eq!(value["arr"][1].decode::<i32>().unwrap(), 2);
}

#[test]
fn missing_field_reports_key_and_path() {
    let value = v(json!({"id": 1, "arr": [], "nested": {}}));
    match value.decode::<Record>() {
        Err(Error::KeyNotFound { key, path }) => {
            assert_eq!(key, "x");
            assert_eq!(path.to_pointer(), "/nested");
        }
        other => panic!("expected missing key, got {other:?}"),
    }
}

#[test]
fn conversion_error_points_at_element() {
    let value = v(json!({"id": 1, "arr": [1, "two"], "nested": {"x": 0}}));
    let err = value.decode::<Record>().unwrap_err();
    assert!(err.is_conversion());
    assert_eq!(err.path().unwrap().to_pointer(), "/arr/1");
    assert!(err.to_string().contains("`/arr/1`"), "{err}");
}

#[test]
fn unknown_fields_are_ignored() {
    let value = v(json!({"x": 3, "extra": {"deep": [1, 2]}}));
    assert_eq!(value.decode::<Nested>().unwrap(), Nested { x: 3 });
}

#[test]
fn struct_from_array_is_positional() {
    let value = v(json!([7]));
    assert_eq!(value.decode::<Nested>().unwrap(), Nested { x: 7 });
}

#[test]
fn raw_value_enum_decodes_through_integer() {
    assert_eq!(Value::Int(2).decode::<Priority>().unwrap(), Priority::High);
    assert_eq!(Value::from("1").decode::<Priority>().unwrap(), Priority::Low);
    assert!(Value::Int(9).decode::<Priority>().is_err());
    assert_eq!(to_value(&Priority::High).unwrap(), Value::Int(2));
}

#[test]
fn externally_tagged_enums() {
    assert_eq!(Value::from("Empty").decode::<Shape>().unwrap(), Shape::Empty);
    assert_eq!(
        v(json!({"Circle": "1.5"})).decode::<Shape>().unwrap(),
        Shape::Circle(1.5)
    );
    assert_eq!(
        v(json!({"Rect": {"w": 2, "h": "3"}})).decode::<Shape>().unwrap(),
        Shape::Rect { w: 2, h: 3 }
    );
    assert_eq!(
        v(json!({"Pair": [1, 2]})).decode::<Shape>().unwrap(),
        Shape::Pair(1, 2)
    );
    assert!(Value::from("Circle").decode::<Shape>().is_err());
    assert!(v(json!({"Circle": 1, "Empty": null})).decode::<Shape>().is_err());

    let err = v(json!({"Rect": {"w": 2, "h": "x"}})).decode::<Shape>().unwrap_err();
    assert_eq!(err.path().unwrap().to_pointer(), "/Rect/h");
}

#[test]
fn url_blob_and_datetime_fields() {
    #[derive(Debug, Deserialize)]
    struct Attachment {
        link: Url,
        data: Blob,
        #[serde(deserialize_with = "json_dyn::coerced")]
        created: DateTime<Utc>,
        #[serde(deserialize_with = "json_dyn::coerced")]
        updated: DateTime<Utc>,
    }

    let value = v(json!({
        "link": "https://example.com/file",
        "data": "aGVsbG8=",
        "created": 86400,
        "updated": "2024-03-01T12:00:00Z",
    }));
    let attachment: Attachment = value.decode().unwrap();
    assert_eq!(attachment.link.path(), "/file");
    assert_eq!(attachment.data.as_bytes(), b"hello");
    assert_eq!(attachment.created.timestamp(), 86_400);
    assert_eq!(attachment.updated.timestamp(), 1_709_294_400);

    let bad = v(json!({
        "link": "nope",
        "data": "aGVsbG8=",
        "created": 0,
        "updated": 0,
    }));
    let err = bad.decode::<Attachment>().unwrap_err();
    assert_eq!(err.path().unwrap().to_pointer(), "/link");
}

#[test]
fn map_with_integer_keys() {
    let value = v(json!({"1": "one", "2": "two"}));
    let map: BTreeMap<u8, String> = value.decode().unwrap();
    assert_eq!(map[&2], "two");
}

#[test]
fn owned_decode_consumes_value() {
    let value = v(json!({"x": "42"}));
    let nested: Nested = from_value(value).unwrap();
    assert_eq!(nested.x, 42);
}

#[test]
fn strict_config_disables_scalar_coercion() {
    let strict = Config::default().with_lenient_scalars(false);
    let value = v(json!({"x": "42"}));
    assert!(value.decode_with::<Nested>(strict).is_err());
    assert!(value.decode_with::<Nested>(Config::default()).is_ok());
    assert!(json_dyn::from_value_with::<Nested>(v(json!({"x": 42})), strict).is_ok());
    assert!(json_dyn::from_value_with::<Nested>(v(json!({"x": "42"})), strict).is_err());
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[test]
fn record_encodes_to_object() {
    let record = Record {
        id: 5,
        arr: vec![1, 2],
        nested: Nested { x: 1 },
    };
    let value = Value::encode(&record).unwrap();
    assert_eq!(value, v(json!({"id": 5, "arr": [1, 2], "nested": {"x": 1}})));
    assert_eq!(value.decode::<Record>().unwrap(), record);
}

#[test]
fn enums_encode_externally_tagged() {
    assert_eq!(to_value(&Shape::Empty).unwrap(), Value::from("Empty"));
    assert_eq!(
        to_value(&Shape::Circle(0.5)).unwrap(),
        v(json!({"Circle": 0.5}))
    );
    assert_eq!(
        to_value(&Shape::Rect { w: 1, h: 2 }).unwrap(),
        v(json!({"Rect": {"w": 1, "h": 2}}))
    );
    assert_eq!(
        to_value(&Shape::Pair(3, 4)).unwrap(),
        v(json!({"Pair": [3, 4]}))
    );
}

#[test]
fn temporal_fields_encode_as_epoch_seconds() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Event {
        name: String,
        #[serde(
            serialize_with = "json_dyn::encoded",
            deserialize_with = "json_dyn::coerced"
        )]
        at: DateTime<Utc>,
    }

    let at = DateTime::from_timestamp(86_400, 500_000_000).unwrap();
    let event = Event {
        name: "boot".into(),
        at,
    };
    let value = to_value(&event).unwrap();
    assert_eq!(value, v(json!({"name": "boot", "at": 86400.5})));
    assert_eq!(value.decode::<Event>().unwrap(), event);
    assert_eq!(to_value(&Value::from(at)).unwrap(), Value::Double(86_400.5));
}

// ---------------------------------------------------------------------------
// Fallback decoding
// ---------------------------------------------------------------------------

#[test]
fn fallback_only_runs_when_needed() {
    let runs = Cell::new(0);
    let value = v(json!({"n": "12", "bad": "x", "none": null}));

    let n: i32 = value["n"].decode_or_else(|| {
        runs.set(runs.get() + 1);
        -1
    });
    assert_eq!((n, runs.get()), (12, 0));

    let bad: i32 = value["bad"].decode_or_else(|| {
        runs.set(runs.get() + 1);
        -1
    });
    assert_eq!((bad, runs.get()), (-1, 1));

    let none: i32 = value["none"].decode_or_else(|| {
        runs.set(runs.get() + 1);
        -1
    });
    assert_eq!((none, runs.get()), (-1, 2));

    assert_eq!(value["missing"].decode_or(String::from("default")), "default");
}
