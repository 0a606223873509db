//! Integration tests for the single in-flight upload guard.

mod common;

use dropzone_core::StateClass;
use dropzone_ui::{Document, Element};
use dropzone_widget::{SubmitOutcome, WidgetState};

#[test]
fn submit_guard_tests_rejects_submissions_while_uploading() {
    let (mut widget, transport) = common::widget();

    let first = widget
        .on_file_selected(common::fixture_form().with_selected_files(common::fixture_files()))
        .expect("first submit");
    let SubmitOutcome::Dispatched(id) = first else {
        panic!("first submission should dispatch, got {first:?}");
    };

    assert_eq!(widget.state(), WidgetState::Uploading);
    assert_eq!(
        widget.on_file_selected(common::fixture_form()).expect("second submit"),
        SubmitOutcome::Rejected
    );
    assert_eq!(
        widget
            .on_drop(common::fixture_form(), common::fixture_files())
            .expect("drop while busy"),
        SubmitOutcome::Rejected
    );
    assert_eq!(transport.requests.borrow().len(), 1);

    widget.on_complete(common::response(id, 200, Some("text/html"), "<div/>"));
    assert_eq!(widget.state(), WidgetState::Idle);
    assert!(matches!(
        widget.on_file_selected(common::fixture_form()).expect("third submit"),
        SubmitOutcome::Dispatched(_)
    ));
    assert_eq!(transport.requests.borrow().len(), 2);
}

#[test]
fn submit_guard_tests_respects_uploading_class_set_by_page() {
    let (mut widget, transport) = common::widget();
    widget
        .document_mut()
        .add_class(Element::Form, StateClass::Uploading.as_str());

    assert_eq!(
        widget.submit(common::fixture_form()).expect("submit"),
        SubmitOutcome::Rejected
    );
    assert!(transport.requests.borrow().is_empty());
}

#[test]
fn submit_guard_tests_clears_previous_error_on_new_submission() {
    let (mut widget, _transport) = common::widget();
    widget
        .document_mut()
        .add_class(Element::Form, StateClass::Error.as_str());
    widget
        .document_mut()
        .set_html(Element::ErrorMessage, "old failure");

    widget.submit(common::fixture_form()).expect("submit");

    assert_eq!(widget.snapshot().form_classes, vec![StateClass::Uploading]);
    assert_eq!(widget.document().html_of(Element::ErrorMessage), Some(""));
}
