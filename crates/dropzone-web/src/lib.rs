#![warn(missing_docs)]
//! # dropzone-web
//!
//! ## Purpose
//! Browser host for the upload widget, compiled to `wasm32`.
//!
//! ## Responsibilities
//! - Map the widget's [`dropzone_ui::Document`] surface onto the live DOM.
//! - Send uploads as `FormData` over `XMLHttpRequest` and deliver completions
//!   back to the widget on a later task.
//! - Bind drag, drop, picker, submit, and keyboard listeners.
//! - Read dropped and picked files into memory before submission.
//!
//! ## Data flow
//! DOM event -> listener snapshots the form and reads files asynchronously ->
//! widget transition -> `XhrTransport` -> `loadend` -> deferred
//! `on_complete`.
//!
//! ## Ownership and lifetimes
//! The mounted widget lives in an `Rc<RefCell<_>>` shared by every listener.
//! Completions only hold a weak reference so unmounting drops the widget.
//!
//! ## Error model
//! DOM lookups that fail are ignored, matching empty jQuery selections.
//! Submissions that cannot start are logged to the browser console.
//!
//! On non-`wasm32` targets only the platform-neutral helpers are compiled.

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod form;
#[cfg(target_arch = "wasm32")]
mod mount;
#[cfg(target_arch = "wasm32")]
mod xhr;

#[cfg(target_arch = "wasm32")]
pub use dom::WebDocument;
#[cfg(target_arch = "wasm32")]
pub use form::form_fields;
#[cfg(target_arch = "wasm32")]
pub use mount::{MountError, MountedWidget, mount, start};
#[cfg(target_arch = "wasm32")]
pub use xhr::{CompletionSink, XhrTransport, form_data_for};

/// Formats a CSS pixel length.
pub fn px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}px")
    } else {
        format!("{value}px")
    }
}

/// Returns `true` when a form control contributes a text field to the upload.
///
/// Mirrors what the browser puts into `FormData`: named, enabled controls,
/// with checkboxes and radios only when checked. File inputs are collected
/// separately, and buttons never contribute.
pub fn control_contributes(name: &str, kind: &str, disabled: bool, checked: bool) -> bool {
    if name.is_empty() || disabled {
        return false;
    }
    match kind.to_ascii_lowercase().as_str() {
        "file" | "submit" | "button" | "reset" | "image" => false,
        "checkbox" | "radio" => checked,
        _ => true,
    }
}

/// Returns the `(name, value)` fields a `<select>` contributes.
///
/// Every selected option is sent under the control's name, so a `multiple`
/// select may send several. Unnamed or disabled selects send nothing.
pub fn select_contributions(
    name: &str,
    disabled: bool,
    selected: Vec<String>,
) -> Vec<(String, String)> {
    if name.is_empty() || disabled {
        return Vec::new();
    }
    selected
        .into_iter()
        .map(|value| (name.to_string(), value))
        .collect()
}
