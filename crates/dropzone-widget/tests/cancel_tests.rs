//! Integration tests for Escape-key cancellation.

mod common;

use dropzone_core::StateClass;
use dropzone_ui::{Document, Element};
use dropzone_upload::{Completion, RecoveryAction, RequestStatus, TransportOutcome};
use dropzone_widget::{CancelOutcome, ExitState, SubmitOutcome, WidgetState};

#[test]
fn cancel_tests_escape_aborts_pending_request_without_reload() {
    let (mut widget, transport) = common::widget();
    let SubmitOutcome::Dispatched(id) = widget.submit(common::fixture_form()).expect("submit")
    else {
        panic!("submission should dispatch");
    };

    assert_eq!(widget.on_key_up("Escape"), Some(CancelOutcome::Aborted(id)));
    assert_eq!(widget.current_request(), Some((id, RequestStatus::Aborted)));
    assert_eq!(transport.aborts.get(), 1);

    let report = widget
        .on_complete(Completion {
            id,
            outcome: TransportOutcome::Aborted,
        })
        .expect("report");

    assert_eq!(report.exit, ExitState::Aborted);
    assert_eq!(report.status, RequestStatus::Aborted);
    assert_eq!(report.recovery, RecoveryAction::None);
    assert_eq!(widget.document().reload_count(), 0);
    assert_eq!(widget.state(), WidgetState::Idle);
    assert!(widget.snapshot().form_classes.is_empty());
    assert_eq!(widget.last_request(), Some((id, RequestStatus::Aborted)));
}

#[test]
fn cancel_tests_escape_without_pending_request_changes_nothing() {
    let (mut widget, transport) = common::widget();
    let before = widget.snapshot();

    assert_eq!(widget.on_key_up("Escape"), Some(CancelOutcome::NothingPending));
    assert_eq!(widget.snapshot(), before);
    assert_eq!(transport.aborts.get(), 0);
}

#[test]
fn cancel_tests_second_escape_is_noop() {
    let (mut widget, transport) = common::widget();
    widget.submit(common::fixture_form()).expect("submit");

    widget.cancel();
    assert_eq!(widget.cancel(), CancelOutcome::NothingPending);
    assert_eq!(transport.aborts.get(), 1);
    assert_eq!(widget.on_key_up("Enter"), None);
}

#[test]
fn cancel_tests_response_racing_abort_is_treated_as_abort() {
    let (mut widget, _transport) = common::widget();
    let SubmitOutcome::Dispatched(id) = widget.submit(common::fixture_form()).expect("submit")
    else {
        panic!("submission should dispatch");
    };
    widget.cancel();

    let report = widget
        .on_complete(common::response(id, 200, Some("text/html"), "<p>late</p>"))
        .expect("report");

    assert_eq!(report.exit, ExitState::Aborted);
    assert_eq!(widget.document().written_document(), None);
    assert!(
        !widget
            .document()
            .has_class(Element::Form, StateClass::Error.as_str())
    );
}
