//! Integration tests for config file loading and environment overrides.

use std::fs;

use dropzone_app::{FAILURE_HANDLING_ENV, RENDER_TARGET_ENV, load_config};
use dropzone_widget::{FailureHandling, RenderTarget, WidgetConfig};

#[test]
fn config_override_tests_file_then_env() {
    // Safety:
    // - This binary holds the only test touching these variables.
    // - Variables are removed before returning.
    unsafe { std::env::remove_var(RENDER_TARGET_ENV) };
    // Safety: see rationale above.
    unsafe { std::env::remove_var(FAILURE_HANDLING_ENV) };
    assert_eq!(load_config(None).expect("defaults"), WidgetConfig::default());

    let path = std::env::temp_dir().join(format!("dropzone-config-{}.json", std::process::id()));
    fs::write(
        &path,
        r#"{"render_target":"content","ids":{"main_content":"results"}}"#,
    )
    .expect("config fixture should write");

    let config = load_config(Some(&path)).expect("file config");
    assert_eq!(config.render_target, RenderTarget::Content);
    assert_eq!(config.failure_handling, FailureHandling::Report);
    assert_eq!(config.ids.main_content, "results");
    assert_eq!(config.ids.drop_target, "dropzone");

    // Safety: see rationale above.
    unsafe { std::env::set_var(RENDER_TARGET_ENV, "Document") };
    // Safety: see rationale above.
    unsafe { std::env::set_var(FAILURE_HANDLING_ENV, "log-only") };
    let config = load_config(Some(&path)).expect("env overrides");
    assert_eq!(config.render_target, RenderTarget::Document);
    assert_eq!(config.failure_handling, FailureHandling::LogOnly);

    // Safety: see rationale above.
    unsafe { std::env::set_var(RENDER_TARGET_ENV, "sidebar") };
    let config = load_config(Some(&path)).expect("unknown override ignored");
    assert_eq!(config.render_target, RenderTarget::Content);

    // Safety: see rationale above.
    unsafe { std::env::remove_var(RENDER_TARGET_ENV) };
    // Safety: see rationale above.
    unsafe { std::env::remove_var(FAILURE_HANDLING_ENV) };
    let _ = fs::remove_file(&path);
}

#[test]
fn config_override_tests_rejects_malformed_file() {
    let path = std::env::temp_dir().join(format!("dropzone-bad-{}.json", std::process::id()));
    fs::write(&path, r#"{"render_target":"sidebar"}"#).expect("config fixture should write");

    assert!(load_config(Some(&path)).is_err());
    assert!(load_config(Some(&path.with_extension("missing"))).is_err());
    let _ = fs::remove_file(&path);
}
