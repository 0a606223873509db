//! Integration tests for driving one upload to completion.

mod common;

use dropzone_app::{await_completion, build_form, summarize};
use dropzone_upload::HttpResponse;
use dropzone_widget::{ExitState, RenderTarget, SubmitOutcome, WidgetConfig};

#[tokio::test]
async fn upload_run_tests_success_renders_response() {
    let (mut widget, mut completions) = common::scripted_widget(
        WidgetConfig {
            render_target: RenderTarget::Content,
            ..WidgetConfig::default()
        },
        Some(HttpResponse::new(
            200,
            Some("application/json"),
            r#"{"success":true,"message":"No errors found"}"#,
        )),
    );
    let outcome = widget
        .on_file_selected(build_form("/", None, Vec::new(), "file"))
        .expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Dispatched(_)));

    let report = await_completion(&mut widget, &mut completions, std::future::pending::<()>())
        .await
        .expect("report");
    assert_eq!(report.exit, ExitState::Success);

    let summary = summarize(&widget, &report);
    assert!(summary.contains("form: is-success"));
    assert!(summary.ends_with("---\n{\"success\":true,\"message\":\"No errors found\"}\n"));
}

#[tokio::test]
async fn upload_run_tests_fragment_reply_exits_with_error() {
    let (mut widget, mut completions) = common::scripted_widget(
        WidgetConfig {
            render_target: RenderTarget::Content,
            ..WidgetConfig::default()
        },
        Some(HttpResponse::new(200, Some("text/html"), "<p>2 errors found</p>")),
    );
    widget
        .on_file_selected(build_form("/", None, Vec::new(), "file"))
        .expect("submit");

    let report = await_completion(&mut widget, &mut completions, std::future::pending::<()>())
        .await
        .expect("report");
    assert_eq!(report.exit, ExitState::Error);

    let summary = summarize(&widget, &report);
    assert!(summary.contains("form: is-error"));
    assert!(summary.ends_with("---\n<p>2 errors found</p>\n"));
}

#[tokio::test]
async fn upload_run_tests_server_error_is_summarized() {
    let (mut widget, mut completions) = common::scripted_widget(
        WidgetConfig::default(),
        Some(HttpResponse::new(
            500,
            Some("application/json"),
            r#"{"exception":"IOException","message":"disk full"}"#,
        )),
    );
    widget
        .on_file_selected(build_form("/", None, Vec::new(), "file"))
        .expect("submit");

    let report = await_completion(&mut widget, &mut completions, std::future::pending::<()>())
        .await
        .expect("report");
    assert_eq!(report.exit, ExitState::Error);

    let summary = summarize(&widget, &report);
    assert!(summary.contains("form: is-error"));
    assert!(summary.contains("IOException: disk full"));
    assert!(!summary.contains("---"));
}

#[tokio::test]
async fn upload_run_tests_interrupt_cancels_pending_upload() {
    let (mut widget, mut completions) = common::scripted_widget(WidgetConfig::default(), None);
    widget
        .on_file_selected(build_form("/", None, Vec::new(), "file"))
        .expect("submit");

    let report = await_completion(&mut widget, &mut completions, async {})
        .await
        .expect("report");
    assert_eq!(report.exit, ExitState::Aborted);

    let summary = summarize(&widget, &report);
    assert!(summary.contains("form: -"));
    assert!(!summary.contains("page: reloaded"));
}
