use std::io::Write;

use eql_codec::{
    ejson_path_query, encode, jsonb_query, match_query, ore_query, unique_query, CodecError,
    CompareOp, Document, EncryptConfig, EncryptedColumn, FragmentBuilder, Placeholder,
    PlaintextValue, QueryMode, SqlOptions,
};
use serde_json::{json, Value};

// ============================================================================
// Helpers
// ============================================================================

const CONFIG: &str = r#"{
    "v": 1,
    "tables": {
        "goexamples": {
            "encrypted_text_field": {
                "cast_as": "text",
                "indexes": {"unique": {"token_filters": [{"kind": "downcase"}]}, "match": {}, "ore": {}}
            },
            "encrypted_int_field": {"cast_as": "int", "indexes": {"ore": {}}},
            "encrypted_jsonb_field": {
                "cast_as": "jsonb",
                "indexes": {"ste_vec": {"prefix": "goexamples/encrypted_jsonb_field"}}
            }
        }
    }
}"#;

fn load_config() -> EncryptConfig {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    EncryptConfig::from_path(file.path()).unwrap()
}

fn p_of(operand: &[u8]) -> Value {
    let value: Value = serde_json::from_slice(operand).unwrap();
    value["p"].clone()
}

// ============================================================================
// Operands
// ============================================================================

#[test]
fn operand_variants_equal_plain_encoding() {
    let table = "goexamples";
    let text = "this".to_string();
    let expected = encode(&text, table, "encrypted_text_field").unwrap();

    assert_eq!(match_query(&text, table, "encrypted_text_field").unwrap(), expected);
    assert_eq!(ore_query(&text, table, "encrypted_text_field").unwrap(), expected);
    assert_eq!(unique_query(&text, table, "encrypted_text_field").unwrap(), expected);
    assert_eq!(jsonb_query(&text, table, "encrypted_text_field").unwrap(), expected);
}

#[test]
fn path_operand_is_not_json_reencoded() {
    let operand = ejson_path_query("$.top.nested", "goexamples", "encrypted_jsonb_field").unwrap();
    assert_eq!(p_of(&operand), json!("$.top.nested"));

    let as_value = jsonb_query(&"$.top.nested".to_string(), "goexamples", "encrypted_jsonb_field")
        .unwrap();
    assert_eq!(operand, as_value);
}

#[test]
fn containment_operand_double_encodes_document() {
    let query: Document = json!({"top": {"nested": ["first"]}})
        .as_object()
        .cloned()
        .unwrap();
    let operand = jsonb_query(&query, "goexamples", "encrypted_jsonb_field").unwrap();
    assert_eq!(p_of(&operand), json!(r#"{"top":{"nested":["first"]}}"#));
}

// ============================================================================
// Config-checked operands
// ============================================================================

#[test]
fn config_from_file_checks_indexes() {
    let config = load_config();

    let ok = config
        .query_operand(
            "goexamples",
            "encrypted_text_field",
            QueryMode::Match,
            &PlaintextValue::from("some"),
        )
        .unwrap();
    assert_eq!(p_of(&ok), json!("some"));

    assert!(matches!(
        config.query_operand(
            "goexamples",
            "encrypted_int_field",
            QueryMode::Unique,
            &PlaintextValue::Integer(1),
        ),
        Err(CodecError::IndexNotConfigured { .. })
    ));
    assert!(matches!(
        config.query_operand(
            "examples",
            "encrypted_text_field",
            QueryMode::Match,
            &PlaintextValue::from("x"),
        ),
        Err(CodecError::UnknownColumn { .. })
    ));
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("encrypt-config.json");
    assert!(matches!(
        EncryptConfig::from_path(&missing),
        Err(CodecError::Io { .. })
    ));
}

// ============================================================================
// SQL fragments
// ============================================================================

#[test]
fn xorm_style_where_clauses() {
    let mut builder = FragmentBuilder::new(SqlOptions {
        placeholder: Placeholder::Positional,
        ..Default::default()
    });
    let text = EncryptedColumn::<String>::new("goexamples", "encrypted_text_field").unwrap();
    let int = EncryptedColumn::<i64>::new("goexamples", "encrypted_int_field").unwrap();

    let by_match = builder
        .match_contains(text.target(), &"this".to_string())
        .unwrap();
    assert_eq!(
        by_match.sql,
        "cs_match_v1(encrypted_text_field) @> cs_match_v1(?)"
    );
    assert_eq!(by_match.params, vec![text.operand(&"this".to_string(), QueryMode::Match).unwrap()]);

    let by_range = builder.ore_compare(int.target(), CompareOp::Gt, &32i64).unwrap();
    assert_eq!(
        by_range.sql,
        "cs_ore_64_8_v1(encrypted_int_field) > cs_ore_64_8_v1(?)"
    );
    assert_eq!(p_of(&by_range.params[0]), json!("32"));
}

#[test]
fn terms_subquery_binds_path_then_value() {
    let mut builder = FragmentBuilder::default();
    let jsonb = EncryptedColumn::<Document>::new("goexamples", "encrypted_jsonb_field").unwrap();

    let terms = builder.ste_vec_terms(jsonb.target(), "$.top.nums[*]").unwrap();
    let sql = format!(
        "SELECT * FROM goexamples WHERE EXISTS (SELECT 1 FROM unnest({}) AS term WHERE term > cs_ste_vec_term_v1(${}))",
        terms.sql,
        builder.next_param()
    );
    assert_eq!(
        sql,
        "SELECT * FROM goexamples WHERE EXISTS (SELECT 1 FROM unnest(cs_ste_vec_terms_v1(encrypted_jsonb_field, $1)) AS term WHERE term > cs_ste_vec_term_v1($2))"
    );
    assert_eq!(p_of(&terms.params[0]), json!("$.top.nums[*]"));
}
