#![warn(missing_docs)]
//! # dropzone-contract
//!
//! ## Purpose
//! Defines the upload endpoint's response contract and client-side parsing.
//!
//! ## Responsibilities
//! - Classify a completed response body as an HTML fragment or a JSON object.
//! - Read the boolean `success` flag that selects the success/error class.
//! - Parse the structured `{exception, message}` body sent with 5xx errors and
//!   render it as user-facing text.
//!
//! ## Data flow
//! Raw response body -> [`parse_upload_response`] -> [`UploadResponse`] ->
//! widget class selection and rendering.
//! Raw 5xx body -> [`parse_server_error`] -> [`render_server_error_html`] ->
//! error region.
//!
//! ## Ownership and lifetimes
//! Parsed values own their strings so they can outlive transport buffers.
//!
//! ## Error model
//! Malformed JSON and contract violations return [`ContractError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Header shown above structured server errors.
pub const ERROR_HEADER_HTML: &str =
    "<span class='error'>An error occurred while processing your request. Details below:</span>";

/// How the response body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// HTML fragment or full page, rendered as-is.
    Fragment,
    /// JSON object carrying a `success` flag.
    Json,
}

/// Response body validated at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    /// Whether the widget should end in the success state.
    pub ok: bool,
    /// Interpretation of the body.
    pub kind: BodyKind,
    /// Raw body text, rendered unchanged.
    pub payload: String,
}

/// Structured error body sent with 5xx responses.
///
/// Extra fields such as `timestamp`, `status`, or `path` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerErrorBody {
    /// Exception type name reported by the server.
    pub exception: String,
    /// Human-readable failure message.
    pub message: String,
}

impl ServerErrorBody {
    /// Returns `"<exception>: <message>"`.
    pub fn display_text(&self) -> String {
        format!("{}: {}", self.exception, self.message)
    }
}

/// Interprets a successful response body.
///
/// A body is JSON when the content type says so, or when no content type was
/// reported and the body parses as a JSON object. JSON bodies are `ok` only
/// when `success` is literally `true`; a missing flag means failure. Anything
/// else is an HTML fragment: it has no `success` flag, so it is never `ok`,
/// but its payload is still rendered.
///
/// # Errors
/// Returns [`ContractError::Decode`] when a JSON content type carries invalid
/// JSON, and [`ContractError::InvalidContract`] when the JSON is not an object
/// or `success` is not a boolean.
pub fn parse_upload_response(
    content_type: Option<&str>,
    body: &str,
) -> Result<UploadResponse, ContractError> {
    let declared_json = content_type.is_some_and(is_json_media_type);

    let object = if declared_json {
        Some(serde_json::from_str::<Value>(body).map_err(ContractError::Decode)?)
    } else if content_type.is_none() && body.trim_start().starts_with('{') {
        serde_json::from_str::<Value>(body)
            .ok()
            .filter(Value::is_object)
    } else {
        None
    };

    let Some(value) = object else {
        return Ok(UploadResponse {
            ok: false,
            kind: BodyKind::Fragment,
            payload: body.to_string(),
        });
    };

    let Value::Object(map) = value else {
        return Err(ContractError::InvalidContract(
            "json response must be an object".to_string(),
        ));
    };

    let ok = match map.get("success") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(ContractError::InvalidContract(format!(
                "success must be a boolean, got {other}"
            )));
        }
    };

    Ok(UploadResponse {
        ok,
        kind: BodyKind::Json,
        payload: body.to_string(),
    })
}

/// Parses the structured body of a 5xx response.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON or missing fields.
pub fn parse_server_error(body: &str) -> Result<ServerErrorBody, ContractError> {
    serde_json::from_str(body).map_err(ContractError::Decode)
}

/// Renders a structured server error for the error region.
///
/// Exception and message text is HTML-escaped; the header is markup.
pub fn render_server_error_html(error: &ServerErrorBody) -> String {
    format!(
        "{ERROR_HEADER_HTML}{}",
        html_escape::encode_text(&error.display_text())
    )
}

/// Renders a failure that has no structured body.
pub fn render_plain_error_html(detail: &str) -> String {
    format!("{ERROR_HEADER_HTML}{}", html_escape::encode_text(detail))
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Response contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure.
    #[error("response decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed body violates contract expectations.
    #[error("response contract violation: {0}")]
    InvalidContract(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for body classification and error rendering.

    use super::*;

    #[test]
    fn html_fragment_is_not_ok() {
        let response =
            parse_upload_response(Some("text/html;charset=UTF-8"), "<div id='content'/>").unwrap();
        assert_eq!(response.kind, BodyKind::Fragment);
        assert!(!response.ok);
        assert_eq!(response.payload, "<div id='content'/>");
    }

    #[test]
    fn sniffs_json_without_content_type() {
        let response = parse_upload_response(None, r#" {"success": true}"#).unwrap();
        assert_eq!(response.kind, BodyKind::Json);
        assert!(response.ok);

        let fragment = parse_upload_response(None, "{not json").unwrap();
        assert_eq!(fragment.kind, BodyKind::Fragment);
    }

    #[test]
    fn non_boolean_success_violates_contract() {
        let result = parse_upload_response(Some("application/json"), r#"{"success":"yes"}"#);
        assert!(matches!(result, Err(ContractError::InvalidContract(_))));
    }

    #[test]
    fn escapes_markup_in_server_messages() {
        let html = render_server_error_html(&ServerErrorBody {
            exception: "IllegalArgumentException".to_string(),
            message: "<b>bad</b>".to_string(),
        });
        assert!(html.starts_with(ERROR_HEADER_HTML));
        assert!(html.ends_with("IllegalArgumentException: &lt;b&gt;bad&lt;/b&gt;"));
    }

    #[test]
    fn escapes_ampersands_in_plain_errors() {
        let html = render_plain_error_html("Server responded with status 503 & <retry>");
        assert!(html.ends_with("status 503 &amp; &lt;retry&gt;"));
    }
}
