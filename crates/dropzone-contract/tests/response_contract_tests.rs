//! Integration tests for success flag and server error parsing.

use dropzone_contract::{
    BodyKind, parse_server_error, parse_upload_response, render_server_error_html,
};

#[test]
fn response_contract_tests_success_flag_selects_outcome() {
    let accepted = parse_upload_response(Some("application/json"), r#"{"success":true}"#)
        .expect("json body should parse");
    let rejected = parse_upload_response(Some("application/json"), r#"{"success":false}"#)
        .expect("json body should parse");
    let missing = parse_upload_response(Some("application/problem+json"), r#"{"detail":"x"}"#)
        .expect("json body should parse");

    assert!(accepted.ok);
    assert!(!rejected.ok);
    assert!(!missing.ok);
    assert_eq!(accepted.kind, BodyKind::Json);
}

#[test]
fn response_contract_tests_fragment_without_flag_is_not_ok() {
    let fragment = parse_upload_response(Some("text/html"), "<div>validation report</div>")
        .expect("fragment should parse");

    assert_eq!(fragment.kind, BodyKind::Fragment);
    assert!(!fragment.ok);
    assert_eq!(fragment.payload, "<div>validation report</div>");
}

#[test]
fn response_contract_tests_renders_exception_and_message() {
    let body = r#"{
        "timestamp": 1488000000000,
        "status": 500,
        "error": "Internal Server Error",
        "exception": "IOException",
        "message": "disk full",
        "path": "/"
    }"#;

    let parsed = parse_server_error(body).expect("error body should parse");
    assert_eq!(parsed.display_text(), "IOException: disk full");
    assert!(render_server_error_html(&parsed).contains("IOException: disk full"));
}

#[test]
fn response_contract_tests_rejects_error_body_without_message() {
    assert!(parse_server_error(r#"{"exception":"IOException"}"#).is_err());
    assert!(parse_upload_response(Some("application/json"), "not json").is_err());
}
