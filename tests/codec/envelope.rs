use eql_codec::{
    decode, encode, encode_json, CodecError, Document, EncryptedColumn, PlaintextKind,
};
use serde_json::{json, Value};

// ============================================================================
// Helpers
// ============================================================================

const TABLE: &str = "goexamples";

fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("object fixture")
}

/// What the proxy hands back on read: the plaintext echo plus its own
/// metadata.
fn proxy_echo(envelope: &[u8]) -> Vec<u8> {
    let mut value: Value = serde_json::from_slice(envelope).unwrap();
    let obj = value.as_object_mut().unwrap();
    obj.insert("c".to_string(), json!("mBbKmsMMkbKBSN..."));
    obj.insert("o".to_string(), json!(["ore-term"]));
    obj.insert("u".to_string(), json!("unique-term"));
    serde_json::to_vec(&value).unwrap()
}

/// An ORM row with one column binding per encrypted field.
struct Example {
    encrypted_text_field: Option<String>,
    encrypted_int_field: Option<i64>,
    encrypted_bool_field: Option<bool>,
    encrypted_jsonb_field: Option<Document>,
}

struct ExampleColumns {
    text: EncryptedColumn<String>,
    int: EncryptedColumn<i64>,
    boolean: EncryptedColumn<bool>,
    jsonb: EncryptedColumn<Document>,
}

impl ExampleColumns {
    fn new() -> Self {
        Self {
            text: EncryptedColumn::new(TABLE, "encrypted_text_field").unwrap(),
            int: EncryptedColumn::new(TABLE, "encrypted_int_field").unwrap(),
            boolean: EncryptedColumn::new(TABLE, "encrypted_bool_field").unwrap(),
            jsonb: EncryptedColumn::new(TABLE, "encrypted_jsonb_field").unwrap(),
        }
    }

    fn write(&self, row: &Example) -> [Option<Vec<u8>>; 4] {
        [
            self.text.to_db_nullable(row.encrypted_text_field.as_ref()).unwrap(),
            self.int.to_db_nullable(row.encrypted_int_field.as_ref()).unwrap(),
            self.boolean.to_db_nullable(row.encrypted_bool_field.as_ref()).unwrap(),
            self.jsonb.to_db_nullable(row.encrypted_jsonb_field.as_ref()).unwrap(),
        ]
    }

    fn read(&self, stored: &[Option<Vec<u8>>; 4]) -> Example {
        let echoed: Vec<Option<Vec<u8>>> = stored
            .iter()
            .map(|c| c.as_deref().map(proxy_echo))
            .collect();
        Example {
            encrypted_text_field: self.text.from_db_nullable(echoed[0].as_deref()).unwrap(),
            encrypted_int_field: self.int.from_db_nullable(echoed[1].as_deref()).unwrap(),
            encrypted_bool_field: self.boolean.from_db_nullable(echoed[2].as_deref()).unwrap(),
            encrypted_jsonb_field: self.jsonb.from_db_nullable(echoed[3].as_deref()).unwrap(),
        }
    }
}

// ============================================================================
// Round trips through a proxy echo
// ============================================================================

#[test]
fn row_round_trips_through_proxy_echo() {
    let columns = ExampleColumns::new();
    let row = Example {
        encrypted_text_field: Some("test@test.com".to_string()),
        encrypted_int_field: Some(23),
        encrypted_bool_field: Some(false),
        encrypted_jsonb_field: Some(doc(json!({
            "top": {"integer": 101, "nested": ["hello"]},
            "bottom": "value_three"
        }))),
    };

    let read = columns.read(&columns.write(&row));
    assert_eq!(read.encrypted_text_field, row.encrypted_text_field);
    assert_eq!(read.encrypted_int_field, row.encrypted_int_field);
    assert_eq!(read.encrypted_bool_field, row.encrypted_bool_field);
    assert_eq!(read.encrypted_jsonb_field, row.encrypted_jsonb_field);
}

#[test]
fn null_and_empty_document_are_different_rows() {
    let columns = ExampleColumns::new();
    let null_row = Example {
        encrypted_text_field: None,
        encrypted_int_field: None,
        encrypted_bool_field: None,
        encrypted_jsonb_field: None,
    };
    let empty_row = Example {
        encrypted_text_field: None,
        encrypted_int_field: None,
        encrypted_bool_field: None,
        encrypted_jsonb_field: Some(Document::new()),
    };

    let stored_null = columns.write(&null_row);
    let stored_empty = columns.write(&empty_row);
    assert!(stored_null.iter().all(Option::is_none));
    assert!(stored_empty[3].is_some());

    assert_eq!(columns.read(&stored_null).encrypted_jsonb_field, None);
    assert_eq!(
        columns.read(&stored_empty).encrypted_jsonb_field,
        Some(Document::new())
    );
}

#[test]
fn integer_extremes_round_trip() {
    for n in [i64::MIN, -1, 0, 1, i64::MAX] {
        let encoded = encode(&n, TABLE, "encrypted_int_field").unwrap();
        assert_eq!(decode::<i64>(&proxy_echo(&encoded)).unwrap(), n);
    }
}

#[test]
fn text_with_json_metacharacters_round_trips() {
    let tricky = r#"she said "hi" \ {"not": "json"} ünïcødé"#.to_string();
    let encoded = encode(&tricky, TABLE, "encrypted_text_field").unwrap();
    assert_eq!(decode::<String>(&encoded).unwrap(), tricky);
}

// ============================================================================
// Envelope contract
// ============================================================================

#[test]
fn every_kind_produces_the_same_envelope_shape() {
    let payloads = [
        encode(&"hello".to_string(), TABLE, "a").unwrap(),
        encode(&42i64, TABLE, "b").unwrap(),
        encode(&true, TABLE, "c").unwrap(),
        encode(&doc(json!({"a": {"b": 1}})), TABLE, "d").unwrap(),
    ];
    let expected_p = ["hello", "42", "true", r#"{"a":{"b":1}}"#];
    let columns = ["a", "b", "c", "d"];

    for ((payload, p), column) in payloads.iter().zip(expected_p).zip(columns) {
        let value: Value = serde_json::from_slice(payload).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["k"], "pt");
        assert_eq!(obj["p"], p);
        assert_eq!(obj["i"]["t"], TABLE);
        assert_eq!(obj["i"]["c"], column);
        assert_eq!(obj["v"], 1);
    }
}

#[test]
fn dynamic_values_reject_unsupported_kinds() {
    for value in [json!(1.234), json!(["a"]), json!(null)] {
        assert!(matches!(
            encode_json(&value, TABLE, "c"),
            Err(CodecError::UnsupportedType(_))
        ));
    }
}

#[test]
fn ciphertext_without_echo_is_missing_plaintext() {
    let payload = json!({"k": "ct", "c": "mBbK...", "i": {"t": TABLE, "c": "c"}, "v": 1});
    let bytes = serde_json::to_vec(&payload).unwrap();
    assert!(matches!(
        decode::<String>(&bytes),
        Err(CodecError::MissingPlaintextField)
    ));
}

#[test]
fn column_kind_follows_binding_type() {
    let columns = ExampleColumns::new();
    assert_eq!(columns.text.kind(), PlaintextKind::Text);
    assert_eq!(columns.int.kind(), PlaintextKind::Integer);
    assert_eq!(columns.boolean.kind(), PlaintextKind::Boolean);
    assert_eq!(columns.jsonb.kind(), PlaintextKind::Document);
}
