#![warn(missing_docs)]
//! # dropzone-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `dropzone` workspace.
//!
//! ## Responsibilities
//! - Represent the declared upload form and the files attached to it.
//! - Assemble multipart payloads from picker selections and dropped files.
//! - Encode payloads as `multipart/form-data` request bodies.
//! - Name the CSS state classes the widget toggles.
//! - Resolve the form's declared method and action into a request target.
//!
//! ## Data flow
//! The host reads a [`FormSnapshot`] from the page, the widget merges any
//! dropped [`FileEntry`] values into a [`MultipartPayload`], and transports
//! call [`MultipartPayload::encode`] to obtain the wire body.
//!
//! ## Ownership and lifetimes
//! File entries own their byte buffers so a payload can outlive the event that
//! produced it and be handed to an asynchronous transport.
//!
//! ## Error model
//! Invalid methods, unresolvable actions, and blank field names return
//! [`CoreError`] variants.
//!
//! ## Example
//! ```rust
//! use dropzone_core::{FileEntry, FormSnapshot, MultipartPayload};
//!
//! let form = FormSnapshot::new("/upload", "file");
//! let dropped = vec![FileEntry::new("a.txt", "text/plain", b"abc".to_vec())];
//! let payload = MultipartPayload::from_form(&form, &dropped).unwrap();
//! assert_eq!(payload.files_under("file").count(), 1);
//! ```

use std::fmt;

use rand::Rng;
use thiserror::Error;
use url::Url;

/// Class applied to the drop target while a drag hovers it.
pub const DRAGOVER_CLASS: &str = "dragover";

/// Content type used when the platform reports none for a file.
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

const CRLF: &[u8] = b"\r\n";

/// CSS classes expressing widget state on the form element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateClass {
    /// A request is in flight; new submissions are rejected.
    Uploading,
    /// The last request completed and the server reported success.
    Success,
    /// The last request failed or the server reported failure.
    Error,
}

impl StateClass {
    /// Returns the CSS class name.
    pub fn as_str(self) -> &'static str {
        match self {
            StateClass::Uploading => "is-uploading",
            StateClass::Success => "is-success",
            StateClass::Error => "is-error",
        }
    }
}

impl fmt::Display for StateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP methods a multipart form may be submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `POST`, also used when the form declares no method.
    Post,
    /// `PUT`.
    Put,
    /// `PATCH`.
    Patch,
}

impl HttpMethod {
    /// Parses the form's `method` attribute.
    ///
    /// Missing or blank attributes fall back to `POST`. Matching is
    /// case-insensitive.
    ///
    /// # Errors
    /// Returns [`CoreError::UnsupportedMethod`] for methods that cannot carry a
    /// multipart body (for example `GET`).
    pub fn from_form_attr(raw: Option<&str>) -> Result<Self, CoreError> {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(HttpMethod::Post);
        };

        match raw.to_ascii_uppercase().as_str() {
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            _ => Err(CoreError::UnsupportedMethod(raw.to_string())),
        }
    }

    /// Returns the canonical upper-case method token.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file attached by the picker or by a drop.
#[derive(Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name reported by the platform.
    pub name: String,
    /// MIME type reported by the platform.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl FileEntry {
    /// Creates a file entry, defaulting a blank content type to
    /// [`DEFAULT_FILE_CONTENT_TYPE`].
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let content_type = content_type.into();
        let content_type = if content_type.trim().is_empty() {
            DEFAULT_FILE_CONTENT_TYPE.to_string()
        } else {
            content_type
        };

        Self {
            name: name.into(),
            content_type,
            bytes,
        }
    }

    /// Returns the file size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for zero-length files.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Contents are left out so debug logs never dump uploaded files.
impl fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One non-file form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
}

impl FormField {
    /// Creates a text field.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The declared upload form as seen at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    /// Raw `action` attribute; may be relative or empty.
    pub action: String,
    /// Raw `method` attribute, if any.
    pub method: Option<String>,
    /// Non-file fields in document order.
    pub fields: Vec<FormField>,
    /// `name` attribute of the file input.
    pub file_field: String,
    /// Files currently selected in the file input.
    pub selected_files: Vec<FileEntry>,
}

impl FormSnapshot {
    /// Creates a form with no fields and no selected files.
    pub fn new(action: impl Into<String>, file_field: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            method: None,
            fields: Vec::new(),
            file_field: file_field.into(),
            selected_files: Vec::new(),
        }
    }

    /// Sets the declared method attribute.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Appends a text field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField::new(name, value));
        self
    }

    /// Replaces the file input selection.
    pub fn with_selected_files(mut self, files: Vec<FileEntry>) -> Self {
        self.selected_files = files;
        self
    }

    /// Parses the declared method.
    ///
    /// # Errors
    /// See [`HttpMethod::from_form_attr`].
    pub fn http_method(&self) -> Result<HttpMethod, CoreError> {
        HttpMethod::from_form_attr(self.method.as_deref())
    }

    /// Resolves the declared action against the page URL.
    ///
    /// # Errors
    /// See [`resolve_action`].
    pub fn target_url(&self, page: &Url) -> Result<Url, CoreError> {
        resolve_action(page, &self.action)
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain text field.
    Field(FormField),
    /// File under a field name.
    File {
        /// Field name carrying the file.
        name: String,
        /// Attached file.
        file: FileEntry,
    },
}

impl Part {
    /// Returns the field name of this part.
    pub fn name(&self) -> &str {
        match self {
            Part::Field(field) => &field.name,
            Part::File { name, .. } => name,
        }
    }
}

/// Ordered multipart payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    parts: Vec<Part>,
}

impl MultipartPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles the payload for one submission.
    ///
    /// Form fields come first in document order, then the file input's
    /// selection, then `dropped` files. Picker files and dropped files are both
    /// carried under the file input's name.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyFieldName`] when files must be attached but the
    /// file input has no name.
    pub fn from_form(form: &FormSnapshot, dropped: &[FileEntry]) -> Result<Self, CoreError> {
        let has_files = !form.selected_files.is_empty() || !dropped.is_empty();
        if has_files && form.file_field.trim().is_empty() {
            return Err(CoreError::EmptyFieldName);
        }

        let mut payload = Self::new();
        for field in &form.fields {
            payload.push_field(field.name.clone(), field.value.clone());
        }
        for file in form.selected_files.iter().chain(dropped) {
            payload.push_file(form.file_field.clone(), file.clone());
        }

        Ok(payload)
    }

    /// Appends a text field.
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts.push(Part::Field(FormField::new(name, value)));
    }

    /// Appends a file under `name`.
    pub fn push_file(&mut self, name: impl Into<String>, file: FileEntry) {
        self.parts.push(Part::File {
            name: name.into(),
            file,
        });
    }

    /// Returns all parts in order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Returns the files carried under `name`.
    pub fn files_under<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FileEntry> + 'a {
        self.parts
            .iter()
            .filter(move |part| part.name() == name)
            .filter_map(|part| match part {
                Part::File { file, .. } => Some(file),
                Part::Field(_) => None,
            })
    }

    /// Returns the number of file parts.
    pub fn file_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, Part::File { .. }))
            .count()
    }

    /// Returns `true` when the payload has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Encodes the payload with a caller-supplied boundary.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidBoundary`] when the boundary is empty, longer
    /// than 70 characters, or occurs inside any part.
    pub fn encode(&self, boundary: &str) -> Result<EncodedBody, CoreError> {
        validate_boundary(boundary)?;

        let mut bytes = Vec::new();
        for part in &self.parts {
            bytes.extend_from_slice(b"--");
            bytes.extend_from_slice(boundary.as_bytes());
            bytes.extend_from_slice(CRLF);

            match part {
                Part::Field(field) => {
                    if contains(field.value.as_bytes(), boundary.as_bytes()) {
                        return Err(CoreError::InvalidBoundary(
                            "boundary occurs inside a field value".to_string(),
                        ));
                    }
                    bytes.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"",
                            escape_disposition(&field.name)
                        )
                        .as_bytes(),
                    );
                    bytes.extend_from_slice(CRLF);
                    bytes.extend_from_slice(CRLF);
                    bytes.extend_from_slice(field.value.as_bytes());
                }
                Part::File { name, file } => {
                    if contains(&file.bytes, boundary.as_bytes()) {
                        return Err(CoreError::InvalidBoundary(format!(
                            "boundary occurs inside file '{}'",
                            file.name
                        )));
                    }
                    bytes.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                            escape_disposition(name),
                            escape_disposition(&file.name)
                        )
                        .as_bytes(),
                    );
                    bytes.extend_from_slice(CRLF);
                    bytes.extend_from_slice(format!("Content-Type: {}", file.content_type).as_bytes());
                    bytes.extend_from_slice(CRLF);
                    bytes.extend_from_slice(CRLF);
                    bytes.extend_from_slice(&file.bytes);
                }
            }
            bytes.extend_from_slice(CRLF);
        }

        bytes.extend_from_slice(b"--");
        bytes.extend_from_slice(boundary.as_bytes());
        bytes.extend_from_slice(b"--");
        bytes.extend_from_slice(CRLF);

        Ok(EncodedBody {
            content_type: format!("multipart/form-data; boundary={boundary}"),
            boundary: boundary.to_string(),
            bytes,
        })
    }

    /// Encodes the payload with a freshly generated boundary.
    ///
    /// A new boundary is drawn if the first one collides with part contents.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidBoundary`] if no collision-free boundary was
    /// found.
    pub fn encode_with_random_boundary(&self) -> Result<EncodedBody, CoreError> {
        let mut last_error = None;
        for _ in 0..4 {
            match self.encode(&generate_boundary()) {
                Ok(body) => return Ok(body),
                Err(error) => last_error = Some(error),
            }
        }

        Err(last_error
            .unwrap_or_else(|| CoreError::InvalidBoundary("no boundary generated".to_string())))
    }
}

/// Wire form of a multipart payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// Boundary separating parts.
    pub boundary: String,
    /// Value for the `Content-Type` request header.
    pub content_type: String,
    /// Encoded body bytes.
    pub bytes: Vec<u8>,
}

/// Generates a random multipart boundary.
pub fn generate_boundary() -> String {
    let mut rng = rand::rng();
    format!(
        "----dropzone{:016x}{:016x}",
        rng.random::<u64>(),
        rng.random::<u64>()
    )
}

/// Resolves a form `action` against the page URL.
///
/// An empty action targets the page itself, matching browser form semantics.
///
/// # Errors
/// Returns [`CoreError::InvalidAction`] when the action cannot be joined onto
/// the page URL or resolves to a non-HTTP scheme.
pub fn resolve_action(page: &Url, action: &str) -> Result<Url, CoreError> {
    let action = action.trim();
    let resolved = if action.is_empty() {
        page.clone()
    } else {
        page.join(action).map_err(|error| CoreError::InvalidAction {
            action: action.to_string(),
            reason: error.to_string(),
        })?
    };

    match resolved.scheme() {
        "http" | "https" => Ok(resolved),
        scheme => Err(CoreError::InvalidAction {
            action: action.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

fn validate_boundary(boundary: &str) -> Result<(), CoreError> {
    if boundary.is_empty() || boundary.len() > 70 {
        return Err(CoreError::InvalidBoundary(
            "boundary must be 1 to 70 characters".to_string(),
        ));
    }
    if boundary
        .bytes()
        .any(|byte| !byte.is_ascii_graphic() || byte == b'"')
    {
        return Err(CoreError::InvalidBoundary(
            "boundary must be printable ascii without quotes".to_string(),
        ));
    }
    Ok(())
}

fn escape_disposition(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

/// Error type for form model and encoding failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Declared method cannot carry a multipart body.
    #[error("unsupported form method: {0}")]
    UnsupportedMethod(String),
    /// Declared action cannot be resolved into an HTTP URL.
    #[error("invalid form action '{action}': {reason}")]
    InvalidAction {
        /// Raw action attribute.
        action: String,
        /// Resolution failure detail.
        reason: String,
    },
    /// File input has no name, so files cannot be attached.
    #[error("file input has no name")]
    EmptyFieldName,
    /// Multipart boundary is malformed or collides with content.
    #[error("invalid multipart boundary: {0}")]
    InvalidBoundary(String),
}
