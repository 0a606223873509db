#![warn(missing_docs)]
//! # dropzone-upload
//!
//! ## Purpose
//! Models the single in-flight upload request and the transports that carry it.
//!
//! ## Responsibilities
//! - Build an [`UploadRequest`] from a form snapshot and dropped files.
//! - Define the injectable [`UploadTransport`] and its cancellable
//!   [`RequestHandle`].
//! - Classify transport outcomes into success or an [`UploadFailure`] and pick
//!   the [`RecoveryAction`] for each failure class.
//! - Fingerprint payloads for log correlation.
//! - Provide a `reqwest` transport driven by `tokio` (feature `http`).
//!
//! ## Data flow
//! Widget builds [`UploadRequest`] -> [`UploadTransport::dispatch`] returns a
//! [`RequestHandle`] -> the transport later delivers a [`Completion`] into the
//! widget's event loop -> [`classify_outcome`] -> widget state transition.
//!
//! ## Ownership and lifetimes
//! Requests are moved into the transport; only the handle stays with the
//! widget. Completions are owned values so they can cross a channel.
//!
//! ## Error model
//! Requests that cannot be built or dispatched return [`UploadError`].
//! Failures after dispatch are never errors; they arrive as
//! [`TransportOutcome`] values and are classified, not propagated.
//!
//! ## Security and privacy notes
//! Payload bytes are never logged; [`payload_fingerprint`] stands in for them.

#[cfg(feature = "http")]
mod http;

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use dropzone_core::{CoreError, FileEntry, FormSnapshot, HttpMethod, MultipartPayload, Part};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

#[cfg(feature = "http")]
pub use http::HttpTransport;

/// Identifier distinguishing one request from its successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Lifecycle status of one upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Dispatched and awaiting completion.
    Pending,
    /// Completed with a 2xx response.
    Succeeded,
    /// Completed with a failure other than a user abort.
    Failed,
    /// Cancelled by the user.
    Aborted,
}

impl RequestStatus {
    /// Returns `true` for statuses that end a request.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// One upload ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Request identifier.
    pub id: RequestId,
    /// Resolved action URL.
    pub url: Url,
    /// Declared form method.
    pub method: HttpMethod,
    /// Multipart body parts.
    pub payload: MultipartPayload,
}

impl UploadRequest {
    /// Builds a request for the given form.
    ///
    /// # Errors
    /// Returns [`UploadError::Form`] when the method is unsupported, the action
    /// does not resolve, or files cannot be attached.
    pub fn from_form(
        id: RequestId,
        form: &FormSnapshot,
        dropped: &[FileEntry],
        page: &Url,
    ) -> Result<Self, UploadError> {
        Ok(Self {
            id,
            url: form.target_url(page)?,
            method: form.http_method()?,
            payload: MultipartPayload::from_form(form, dropped)?,
        })
    }

    /// Returns the payload fingerprint.
    pub fn fingerprint(&self) -> String {
        payload_fingerprint(&self.payload)
    }
}

/// Cancellation handle for a dispatched request.
pub trait RequestHandle {
    /// Requests transport-level abort.
    ///
    /// Must be a no-op once the request has completed. A transport that honors
    /// the abort still delivers a [`Completion`] for the request.
    fn abort(&self);
}

/// Abstract transport used by the widget.
pub trait UploadTransport {
    /// Starts sending `request` and returns immediately.
    ///
    /// The outcome is delivered later as a [`Completion`] carrying
    /// `request.id`.
    ///
    /// # Errors
    /// Returns [`UploadError`] when the request cannot be started at all.
    fn dispatch(&self, request: UploadRequest) -> Result<Box<dyn RequestHandle>, UploadError>;
}

impl<T: UploadTransport + ?Sized> UploadTransport for Rc<T> {
    fn dispatch(&self, request: UploadRequest) -> Result<Box<dyn RequestHandle>, UploadError> {
        (**self).dispatch(request)
    }
}

impl<T: UploadTransport + ?Sized> UploadTransport for Arc<T> {
    fn dispatch(&self, request: UploadRequest) -> Result<Box<dyn RequestHandle>, UploadError> {
        (**self).dispatch(request)
    }
}

/// Response received from the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if present.
    pub content_type: Option<String>,
    /// Response body text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }
}

/// Raw result reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// A response with a non-zero status arrived.
    Response(HttpResponse),
    /// The transport aborted the request.
    Aborted,
    /// The request failed without a status (connection reset, DNS, CORS).
    NetworkFailure(String),
}

/// Transport outcome tagged with the request it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Request identifier.
    pub id: RequestId,
    /// Transport outcome.
    pub outcome: TransportOutcome,
}

/// Failure classes after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// The user cancelled the request.
    ClientAbort,
    /// The server answered with a 5xx status.
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Raw body, expected to carry `exception` and `message`.
        body: String,
    },
    /// Zero-status failure the user did not cause.
    Transport {
        /// Transport-reported reason.
        reason: String,
    },
    /// Any other non-2xx status.
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },
}

/// Classified result of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestResult {
    /// 2xx response.
    Succeeded(HttpResponse),
    /// Any failure.
    Failed(UploadFailure),
}

impl RequestResult {
    /// Returns the terminal request status for this result.
    pub fn status(&self) -> RequestStatus {
        match self {
            RequestResult::Succeeded(_) => RequestStatus::Succeeded,
            RequestResult::Failed(UploadFailure::ClientAbort) => RequestStatus::Aborted,
            RequestResult::Failed(_) => RequestStatus::Failed,
        }
    }
}

/// Page-level reaction to a failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Nothing user-visible.
    None,
    /// Show the structured server error in the error region.
    ShowServerError,
    /// Show a generic status message in the error region.
    ShowStatus,
    /// Reload the whole page.
    ReloadPage,
}

/// Classifies a transport outcome.
///
/// `user_aborted` wins over whatever the transport reported, so a response that
/// raced a cancellation is still treated as an abort.
pub fn classify_outcome(outcome: TransportOutcome, user_aborted: bool) -> RequestResult {
    if user_aborted {
        return RequestResult::Failed(UploadFailure::ClientAbort);
    }

    match outcome {
        TransportOutcome::Response(response) => match response.status {
            200..=299 => RequestResult::Succeeded(response),
            500..=599 => RequestResult::Failed(UploadFailure::ServerError {
                status: response.status,
                body: response.body,
            }),
            0 => RequestResult::Failed(UploadFailure::Transport {
                reason: "response without status".to_string(),
            }),
            status => RequestResult::Failed(UploadFailure::UnexpectedStatus { status }),
        },
        TransportOutcome::Aborted => RequestResult::Failed(UploadFailure::Transport {
            reason: "aborted by transport".to_string(),
        }),
        TransportOutcome::NetworkFailure(reason) => {
            RequestResult::Failed(UploadFailure::Transport { reason })
        }
    }
}

/// Returns the page-level reaction for a failure.
pub fn recovery_for(failure: &UploadFailure) -> RecoveryAction {
    match failure {
        UploadFailure::ClientAbort => RecoveryAction::None,
        UploadFailure::ServerError { .. } => RecoveryAction::ShowServerError,
        UploadFailure::Transport { .. } => RecoveryAction::ReloadPage,
        UploadFailure::UnexpectedStatus { .. } => RecoveryAction::ShowStatus,
    }
}

/// Computes a stable hex SHA-256 fingerprint of payload shape and contents.
///
/// Identical field names, values, and files in the same order give identical
/// fingerprints regardless of how the files were attached.
pub fn payload_fingerprint(payload: &MultipartPayload) -> String {
    let mut hasher = Sha256::new();
    for part in payload.parts() {
        match part {
            Part::Field(field) => {
                hasher.update([0_u8]);
                update_framed(&mut hasher, part.name().as_bytes());
                update_framed(&mut hasher, field.value.as_bytes());
            }
            Part::File { file, .. } => {
                hasher.update([1_u8]);
                update_framed(&mut hasher, part.name().as_bytes());
                update_framed(&mut hasher, file.name.as_bytes());
                update_framed(&mut hasher, file.content_type.as_bytes());
                update_framed(&mut hasher, &file.bytes);
            }
        }
    }
    hex::encode(hasher.finalize())
}

fn update_framed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Errors raised before a request is in flight.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Form could not be turned into a request.
    #[error("invalid upload form: {0}")]
    Form(#[from] CoreError),
    /// Transport refused to start the request.
    #[error("upload transport failure: {0}")]
    Transport(String),
}
