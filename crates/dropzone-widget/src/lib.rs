#![warn(missing_docs)]
//! # dropzone-widget
//!
//! ## Purpose
//! Implements the upload widget: a guarded state machine that turns drag,
//! drop, picker, and keyboard events into at most one in-flight upload.
//!
//! ## Responsibilities
//! - Bind drag-and-drop handling only when the platform supports it.
//! - Reject submissions while an upload is in flight.
//! - Toggle `is-uploading`, `is-success`, `is-error`, and `dragover`.
//! - Render successful responses into the document or the content region.
//! - Classify failures and apply the configured recovery.
//! - Cancel the pending request on Escape.
//!
//! ## Data flow
//! Host event -> [`UploadWidget`] transition -> [`UploadTransport::dispatch`]
//! -> host delivers [`Completion`] -> [`UploadWidget::on_complete`] ->
//! [`Document`] updates.
//!
//! ## Ownership and lifetimes
//! The widget owns its document, its transport, and the handle of the current
//! request. Hosts drive it from a single event loop, so no locking is needed.
//!
//! ## Error model
//! Submissions that cannot be dispatched roll the widget back to idle with
//! `is-error` and return [`WidgetError`]. Failures after dispatch are handled
//! in place and reported through [`CompletionReport`].
//!
//! ## Example
//! ```rust
//! use std::rc::Rc;
//!
//! use dropzone_core::FormSnapshot;
//! use dropzone_ui::{Document, Element, HeadlessDocument};
//! use dropzone_upload::{RequestHandle, UploadError, UploadRequest, UploadTransport};
//! use dropzone_widget::{SubmitOutcome, UploadWidget, WidgetConfig};
//!
//! struct Noop;
//! struct NoopHandle;
//! impl RequestHandle for NoopHandle {
//!     fn abort(&self) {}
//! }
//! impl UploadTransport for Noop {
//!     fn dispatch(&self, _: UploadRequest) -> Result<Box<dyn RequestHandle>, UploadError> {
//!         Ok(Box::new(NoopHandle))
//!     }
//! }
//!
//! let page = HeadlessDocument::new("https://example.test/".parse().unwrap());
//! let mut widget = UploadWidget::new(WidgetConfig::default(), page, Box::new(Rc::new(Noop)));
//! let outcome = widget.on_file_selected(FormSnapshot::new("/", "file")).unwrap();
//! assert!(matches!(outcome, SubmitOutcome::Dispatched(_)));
//! assert!(widget.document().has_class(Element::Form, "is-uploading"));
//! ```

mod config;

use dropzone_contract::{
    parse_server_error, parse_upload_response, render_plain_error_html, render_server_error_html,
};
use dropzone_core::{DRAGOVER_CLASS, FileEntry, FormSnapshot, StateClass};
use dropzone_ui::{BusyIndicator, Document, Element};
use dropzone_upload::{
    Completion, HttpResponse, RecoveryAction, RequestHandle, RequestId, RequestResult,
    RequestStatus, UploadError, UploadFailure, UploadRequest, UploadTransport, classify_outcome,
    recovery_for,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub use config::{FailureHandling, RenderTarget, UnknownValue, WidgetConfig};

/// Key value that cancels the pending upload.
pub const CANCEL_KEY: &str = "Escape";

/// Explicit widget state kept in lockstep with `is-uploading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    /// Ready to submit.
    Idle,
    /// One request is in flight.
    Uploading,
}

/// Drag events delivered to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    /// `dragenter`.
    Enter,
    /// `dragover`.
    Over,
    /// `dragleave`.
    Leave,
    /// `dragend`.
    End,
}

/// Whether the host should suppress the browser default for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Handled; prevent default and stop propagation.
    Handled,
    /// Not bound on this platform; let the event through.
    Ignored,
}

/// Result of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A request was dispatched.
    Dispatched(RequestId),
    /// An upload is already in flight; nothing was sent.
    Rejected,
    /// Drag-and-drop is not bound on this platform.
    Unsupported,
}

/// Result of a cancellation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The pending request was marked aborted and the transport asked to stop.
    Aborted(RequestId),
    /// No request was pending.
    NothingPending,
}

/// Terminal state the form reached for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    /// Form carries `is-success`.
    Success,
    /// Form carries `is-error`.
    Error,
    /// User cancelled; no error shown.
    Aborted,
}

/// Summary of a handled completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    /// Completed request.
    pub id: RequestId,
    /// Terminal request status.
    pub status: RequestStatus,
    /// Form state reached.
    pub exit: ExitState,
    /// Page reaction applied for failures.
    pub recovery: RecoveryAction,
}

/// Flat state projection for hosts and status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSnapshot {
    /// Explicit widget state.
    pub state: WidgetState,
    /// State classes present on the form.
    pub form_classes: Vec<StateClass>,
    /// Whether the drop target carries `dragover`.
    pub drag_over: bool,
    /// In-flight request and its status.
    pub current: Option<(RequestId, RequestStatus)>,
    /// Most recently completed request and its terminal status.
    pub last: Option<(RequestId, RequestStatus)>,
}

struct InFlight {
    id: RequestId,
    status: RequestStatus,
    fingerprint: String,
    handle: Box<dyn RequestHandle>,
}

/// Upload widget bound to one document and one transport.
pub struct UploadWidget<D: Document> {
    config: WidgetConfig,
    document: D,
    transport: Box<dyn UploadTransport>,
    drag_enabled: bool,
    dropped: Vec<FileEntry>,
    in_flight: Option<InFlight>,
    busy: BusyIndicator,
    next_id: u64,
    last: Option<(RequestId, RequestStatus)>,
}

impl<D: Document> UploadWidget<D> {
    /// Creates a widget and probes drag-and-drop support.
    pub fn new(config: WidgetConfig, document: D, transport: Box<dyn UploadTransport>) -> Self {
        let capabilities = document.capabilities();
        let drag_enabled = capabilities.advanced_upload();
        info!(drag_enabled, ?capabilities, "upload widget initialized");

        Self {
            config,
            document,
            transport,
            drag_enabled,
            dropped: Vec::new(),
            in_flight: None,
            busy: BusyIndicator::new(),
            next_id: 1,
            last: None,
        }
    }

    /// Returns the widget configuration.
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Returns the document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Returns the document mutably.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Returns `true` when drag-and-drop handlers are bound.
    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }

    /// Returns the explicit widget state.
    pub fn state(&self) -> WidgetState {
        if self.in_flight.is_some() {
            WidgetState::Uploading
        } else {
            WidgetState::Idle
        }
    }

    /// Returns `true` while a request is in flight or the form is marked
    /// uploading.
    pub fn is_uploading(&self) -> bool {
        self.in_flight.is_some()
            || self
                .document
                .has_class(Element::Form, StateClass::Uploading.as_str())
    }

    /// Returns the in-flight request and its status.
    pub fn current_request(&self) -> Option<(RequestId, RequestStatus)> {
        self.in_flight
            .as_ref()
            .map(|in_flight| (in_flight.id, in_flight.status))
    }

    /// Returns the most recently completed request and its terminal status.
    pub fn last_request(&self) -> Option<(RequestId, RequestStatus)> {
        self.last
    }

    /// Returns the busy indicator.
    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    /// Projects widget state into a flat snapshot.
    pub fn snapshot(&self) -> WidgetSnapshot {
        let form_classes = [StateClass::Uploading, StateClass::Success, StateClass::Error]
            .into_iter()
            .filter(|class| self.document.has_class(Element::Form, class.as_str()))
            .collect();

        WidgetSnapshot {
            state: self.state(),
            form_classes,
            drag_over: self.document.has_class(Element::DropTarget, DRAGOVER_CLASS),
            current: self.current_request(),
            last: self.last,
        }
    }

    /// Handles drag hover events on the drop target.
    ///
    /// Only toggles `dragover`; never starts a request.
    pub fn on_drag(&mut self, event: DragEvent) -> EventDisposition {
        if !self.drag_enabled {
            return EventDisposition::Ignored;
        }

        match event {
            DragEvent::Enter | DragEvent::Over => {
                self.document.add_class(Element::DropTarget, DRAGOVER_CLASS);
            }
            DragEvent::Leave | DragEvent::End => {
                self.document
                    .remove_class(Element::DropTarget, DRAGOVER_CLASS);
            }
        }
        EventDisposition::Handled
    }

    /// Handles a drop of `files` onto the drop target and submits `form`.
    ///
    /// # Errors
    /// See [`UploadWidget::submit`].
    pub fn on_drop(
        &mut self,
        form: FormSnapshot,
        files: Vec<FileEntry>,
    ) -> Result<SubmitOutcome, WidgetError> {
        if !self.drag_enabled {
            debug!("drop ignored, drag-and-drop not supported");
            return Ok(SubmitOutcome::Unsupported);
        }

        self.document
            .remove_class(Element::DropTarget, DRAGOVER_CLASS);
        if self.is_uploading() {
            debug!(files = files.len(), "drop rejected, upload in progress");
            return Ok(SubmitOutcome::Rejected);
        }

        self.dropped = files;
        self.submit(form)
    }

    /// Handles a file picker change by submitting the form.
    ///
    /// # Errors
    /// See [`UploadWidget::submit`].
    pub fn on_file_selected(&mut self, form: FormSnapshot) -> Result<SubmitOutcome, WidgetError> {
        self.submit(form)
    }

    /// Submits the form together with any dropped files.
    ///
    /// Returns [`SubmitOutcome::Rejected`] without side effects while an upload
    /// is in flight.
    ///
    /// # Errors
    /// Returns [`WidgetError::Upload`] when the request cannot be built or the
    /// transport refuses it; the form is left idle with `is-error`.
    pub fn submit(&mut self, form: FormSnapshot) -> Result<SubmitOutcome, WidgetError> {
        if self.is_uploading() {
            debug!("submit rejected, upload in progress");
            return Ok(SubmitOutcome::Rejected);
        }

        self.document.set_html(Element::ErrorMessage, "");
        self.document
            .add_class(Element::Form, StateClass::Uploading.as_str());
        self.document
            .remove_class(Element::Form, StateClass::Error.as_str());
        self.document
            .remove_class(Element::Form, StateClass::Success.as_str());

        let id = RequestId(self.next_id);
        self.next_id += 1;

        let location = self.document.location();
        let request = match UploadRequest::from_form(id, &form, &self.dropped, &location) {
            Ok(request) => request,
            Err(error) => {
                error!(%id, %error, "upload request could not be built");
                self.roll_back();
                return Err(error.into());
            }
        };

        let fingerprint = request.fingerprint();
        let files = request.payload.file_count();
        let url = request.url.clone();

        self.busy.request_started(&mut self.document);
        match self.transport.dispatch(request) {
            Ok(handle) => {
                info!(%id, %url, files, fingerprint = %fingerprint, "upload dispatched");
                self.dropped.clear();
                self.in_flight = Some(InFlight {
                    id,
                    status: RequestStatus::Pending,
                    fingerprint,
                    handle,
                });
                Ok(SubmitOutcome::Dispatched(id))
            }
            Err(error) => {
                error!(%id, %error, "upload dispatch failed");
                self.busy.request_finished(&mut self.document);
                self.roll_back();
                Err(error.into())
            }
        }
    }

    /// Handles a key release; [`CANCEL_KEY`] cancels the pending upload.
    pub fn on_key_up(&mut self, key: &str) -> Option<CancelOutcome> {
        (key == CANCEL_KEY).then(|| self.cancel())
    }

    /// Cancels the pending request, if any.
    ///
    /// The request is marked aborted before the transport is asked to stop, so
    /// whatever completion follows is handled as a client abort.
    pub fn cancel(&mut self) -> CancelOutcome {
        match self.in_flight.as_mut() {
            Some(in_flight) if !in_flight.status.is_terminal() => {
                in_flight.status = RequestStatus::Aborted;
                info!(id = %in_flight.id, "upload cancelled by user");
                in_flight.handle.abort();
                CancelOutcome::Aborted(in_flight.id)
            }
            _ => CancelOutcome::NothingPending,
        }
    }

    /// Applies a transport completion.
    ///
    /// Completions for anything but the in-flight request are ignored and
    /// return `None`.
    pub fn on_complete(&mut self, completion: Completion) -> Option<CompletionReport> {
        let in_flight = match self.in_flight.take() {
            Some(in_flight) if in_flight.id == completion.id => in_flight,
            other => {
                debug!(id = %completion.id, "ignoring stale completion");
                self.in_flight = other;
                return None;
            }
        };

        let user_aborted = in_flight.status == RequestStatus::Aborted;
        let result = classify_outcome(completion.outcome, user_aborted);
        let status = result.status();

        self.document
            .remove_class(Element::Form, StateClass::Uploading.as_str());
        self.busy.request_finished(&mut self.document);

        let (exit, recovery) = match &result {
            RequestResult::Succeeded(response) => {
                (self.render_success(response), RecoveryAction::None)
            }
            RequestResult::Failed(failure) => self.handle_failure(failure),
        };

        info!(
            id = %in_flight.id,
            ?status,
            ?exit,
            fingerprint = %in_flight.fingerprint,
            "upload finished"
        );
        self.last = Some((in_flight.id, status));

        Some(CompletionReport {
            id: in_flight.id,
            status,
            exit,
            recovery,
        })
    }

    fn render_success(&mut self, response: &HttpResponse) -> ExitState {
        let (ok, payload) =
            match parse_upload_response(response.content_type.as_deref(), &response.body) {
                Ok(parsed) => (parsed.ok, parsed.payload),
                Err(error) => {
                    warn!(%error, "response violates upload contract");
                    (false, response.body.clone())
                }
            };

        let class = if ok {
            StateClass::Success
        } else {
            StateClass::Error
        };
        self.document.add_class(Element::Form, class.as_str());

        match self.config.render_target {
            RenderTarget::Document => self.document.write_document(&payload),
            RenderTarget::Content => self.document.set_html(Element::MainContent, &payload),
        }

        if ok { ExitState::Success } else { ExitState::Error }
    }

    fn handle_failure(&mut self, failure: &UploadFailure) -> (ExitState, RecoveryAction) {
        if matches!(failure, UploadFailure::ClientAbort) {
            info!("upload aborted, no recovery needed");
            return (ExitState::Aborted, RecoveryAction::None);
        }

        self.document
            .add_class(Element::Form, StateClass::Error.as_str());

        if self.config.failure_handling == FailureHandling::LogOnly {
            warn!(?failure, "upload failed");
            return (ExitState::Error, RecoveryAction::None);
        }

        let recovery = recovery_for(failure);
        match failure {
            UploadFailure::ServerError { status, body } => {
                let html = match parse_server_error(body) {
                    Ok(server_error) => render_server_error_html(&server_error),
                    Err(error) => {
                        warn!(status, %error, "server error body is not structured");
                        render_plain_error_html(&format!("Server responded with status {status}"))
                    }
                };
                self.document.set_html(Element::ErrorMessage, &html);
            }
            UploadFailure::UnexpectedStatus { status } => {
                warn!(status, "unexpected upload response status");
                self.document.set_html(
                    Element::ErrorMessage,
                    &render_plain_error_html(&format!("Unexpected response status {status}")),
                );
            }
            UploadFailure::Transport { reason } => {
                warn!(%reason, "upload lost without status, reloading page");
                self.document.reload();
            }
            UploadFailure::ClientAbort => {}
        }

        (ExitState::Error, recovery)
    }

    fn roll_back(&mut self) {
        self.document
            .remove_class(Element::Form, StateClass::Uploading.as_str());
        self.document
            .add_class(Element::Form, StateClass::Error.as_str());
    }
}

/// Errors raised when a submission cannot start.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// Request could not be built or dispatched.
    #[error("upload could not start: {0}")]
    Upload(#[from] UploadError),
}
