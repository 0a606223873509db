//! Validates contract fixtures against frozen JSON schemas and the parsers
//! that consume them.

use dropzone_contract::{parse_server_error, parse_upload_response};
use jsonschema::JSONSchema;
use serde_json::{Value, json};

fn read(path: &str) -> String {
    std::fs::read_to_string(path).expect("json file should be readable")
}

fn load_json(path: &str) -> Value {
    serde_json::from_str(&read(path)).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

const UPLOAD_SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/upload-response.schema.json"
);
const UPLOAD_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/upload-response.valid.json"
);
const SERVER_ERROR_SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/server-error.schema.json"
);
const SERVER_ERROR_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/server-error.valid.json"
);

#[test]
fn upload_response_fixture_matches_schema() {
    let validator = compile_validator(UPLOAD_SCHEMA);
    let fixture = load_json(UPLOAD_FIXTURE);
    assert!(
        validator.is_valid(&fixture),
        "upload response fixture should validate against schema"
    );

    let parsed = parse_upload_response(Some("application/json"), &read(UPLOAD_FIXTURE))
        .expect("fixture should parse");
    assert!(parsed.ok);
}

#[test]
fn upload_response_schema_rejects_non_boolean_flag() {
    let validator = compile_validator(UPLOAD_SCHEMA);
    let invalid = json!({ "success": "true" });
    assert!(!validator.is_valid(&invalid));
    assert!(parse_upload_response(Some("application/json"), &invalid.to_string()).is_err());
}

#[test]
fn server_error_fixture_matches_schema() {
    let validator = compile_validator(SERVER_ERROR_SCHEMA);
    let fixture = load_json(SERVER_ERROR_FIXTURE);
    assert!(
        validator.is_valid(&fixture),
        "server error fixture should validate against schema"
    );

    let parsed = parse_server_error(&read(SERVER_ERROR_FIXTURE)).expect("fixture should parse");
    assert_eq!(parsed.display_text(), "java.io.IOException: disk full");
}

#[test]
fn server_error_schema_requires_exception_and_message() {
    let validator = compile_validator(SERVER_ERROR_SCHEMA);
    let invalid = json!({ "status": 500, "message": "disk full" });
    assert!(!validator.is_valid(&invalid));
    assert!(parse_server_error(&invalid.to_string()).is_err());
}
