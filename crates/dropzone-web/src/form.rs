//! Form control collection.

use wasm_bindgen::JsCast;
use web_sys::{
    HtmlFormElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement,
};

use crate::{control_contributes, select_contributions};

/// Returns the text fields `form` contributes, in document order.
///
/// File inputs are skipped; their files are read separately.
pub fn form_fields(form: &HtmlFormElement) -> Vec<(String, String)> {
    let controls = form.elements();
    let mut fields = Vec::new();
    for index in 0..controls.length() {
        let Some(control) = controls.item(index) else {
            continue;
        };
        if let Some(input) = control.dyn_ref::<HtmlInputElement>() {
            let name = input.name();
            if control_contributes(&name, &input.type_(), input.disabled(), input.checked()) {
                fields.push((name, input.value()));
            }
        } else if let Some(area) = control.dyn_ref::<HtmlTextAreaElement>() {
            let name = area.name();
            if control_contributes(&name, "textarea", area.disabled(), false) {
                fields.push((name, area.value()));
            }
        } else if let Some(select) = control.dyn_ref::<HtmlSelectElement>() {
            fields.extend(select_contributions(
                &select.name(),
                select.disabled(),
                selected_values(select),
            ));
        }
    }
    fields
}

fn selected_values(select: &HtmlSelectElement) -> Vec<String> {
    let options = select.selected_options();
    (0..options.length())
        .filter_map(|index| options.item(index))
        .filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
        .filter(|option| !option.disabled())
        .map(|option| option.value())
        .collect()
}
