#![cfg(target_arch = "wasm32")]
//! Browser tests for form field collection and `FormData` bodies.

use dropzone_core::{FileEntry, MultipartPayload};
use dropzone_web::{form_data_for, form_fields};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{File, HtmlFormElement};

wasm_bindgen_test_configure!(run_in_browser);

fn form_with(markup: &str) -> HtmlFormElement {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .expect("document");
    let form = document
        .create_element("form")
        .expect("form")
        .dyn_into::<HtmlFormElement>()
        .expect("form element");
    form.set_inner_html(markup);
    form
}

#[wasm_bindgen_test]
fn browser_form_tests_collects_select_fields() {
    let form = form_with(
        r#"<input type="hidden" name="_csrf" value="token-value">
        <select name="submissionType">
          <option value="GROUP_A">Group A</option>
          <option value="GROUP_B" selected>Group B</option>
        </select>
        <select name="flags" multiple>
          <option value="a" selected>A</option>
          <option value="b">B</option>
          <option value="c" selected>C</option>
          <option value="d" selected disabled>D</option>
        </select>
        <select name="retired" disabled><option value="x" selected>X</option></select>
        <input type="file" name="file">"#,
    );

    let fields = form_fields(&form);
    let fields: Vec<(&str, &str)> = fields
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    assert_eq!(
        fields,
        [
            ("_csrf", "token-value"),
            ("submissionType", "GROUP_B"),
            ("flags", "a"),
            ("flags", "c"),
        ]
    );
}

#[wasm_bindgen_test]
fn browser_form_tests_form_data_carries_fields_and_files() {
    let mut payload = MultipartPayload::new();
    payload.push_field("agency", "WV0000000");
    payload.push_file(
        "file",
        FileEntry::new("group-a.txt", "text/plain", b"GROUP A".to_vec()),
    );
    payload.push_file(
        "file",
        FileEntry::new("group-b.xml", "application/xml", b"<Submission/>".to_vec()),
    );

    let form_data = form_data_for(&payload).expect("form data");

    assert_eq!(
        form_data.get("agency").as_string().as_deref(),
        Some("WV0000000")
    );
    let files = form_data.get_all("file");
    assert_eq!(files.length(), 2);
    let first: File = files.get(0).dyn_into().expect("file entry");
    assert_eq!(first.name(), "group-a.txt");
    assert_eq!(first.type_(), "text/plain");
    assert_eq!(first.size(), 7.0);
    let second: File = files.get(1).dyn_into().expect("file entry");
    assert_eq!(second.name(), "group-b.xml");
}
