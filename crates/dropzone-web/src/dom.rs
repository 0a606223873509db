//! `Document` implementation over the live DOM.

use dropzone_ui::{Capabilities, Document, DomIds, Element, Size};
use js_sys::Reflect;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlDocument, HtmlElement, HtmlFormElement, Window};

use crate::px;

/// Page surface backed by `web_sys`.
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
    ids: DomIds,
    location: Url,
    capabilities: Capabilities,
}

impl WebDocument {
    /// Binds to the window's document and probes capabilities.
    ///
    /// Returns `None` outside a browser window or when the page URL does not
    /// parse.
    pub fn new(window: Window, ids: DomIds) -> Option<Self> {
        let document = window.document()?;
        let location = Url::parse(&window.location().href().ok()?).ok()?;
        let capabilities = probe_capabilities(&window, &document);

        Some(Self {
            window,
            document,
            ids,
            location,
            capabilities,
        })
    }

    /// Returns the element ids in use.
    pub fn ids(&self) -> &DomIds {
        &self.ids
    }

    /// Returns the upload form, the first `form.<form_class>` on the page.
    pub fn form(&self) -> Option<HtmlFormElement> {
        self.document
            .query_selector(&format!("form.{}", self.ids.form_class))
            .ok()
            .flatten()
            .and_then(|element| element.dyn_into::<HtmlFormElement>().ok())
    }

    /// Looks up a page element.
    pub fn element(&self, element: Element) -> Option<web_sys::Element> {
        match element {
            Element::Form => self.form().map(Into::into),
            other => self
                .document
                .get_element_by_id(self.ids.selector_for(other)),
        }
    }

    fn html_element(&self, element: Element) -> Option<HtmlElement> {
        self.element(element)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
    }
}

fn probe_capabilities(window: &Window, document: &web_sys::Document) -> Capabilities {
    let has = |target: &JsValue, key: &str| {
        Reflect::has(target, &JsValue::from_str(key)).unwrap_or(false)
    };
    let (draggable, drag_events) = match document.create_element("div") {
        Ok(div) => (
            has(&div, "draggable"),
            has(&div, "ondragstart") && has(&div, "ondrop"),
        ),
        Err(_) => (false, false),
    };

    Capabilities {
        draggable,
        drag_events,
        form_data: has(window, "FormData"),
        file_reader: has(window, "FileReader"),
    }
}

impl Document for WebDocument {
    fn location(&self) -> Url {
        self.location.clone()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn add_class(&mut self, element: Element, class: &str) {
        if let Some(node) = self.element(element) {
            let _ = node.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, element: Element, class: &str) {
        if let Some(node) = self.element(element) {
            let _ = node.class_list().remove_1(class);
        }
    }

    fn has_class(&self, element: Element, class: &str) -> bool {
        self.element(element)
            .is_some_and(|node| node.class_list().contains(class))
    }

    fn set_html(&mut self, element: Element, html: &str) {
        if let Some(node) = self.element(element) {
            node.set_inner_html(html);
        }
    }

    fn write_document(&mut self, html: &str) {
        let Some(document) = self.document.dyn_ref::<HtmlDocument>() else {
            return;
        };
        if document.open().is_ok() {
            let _ = document.write_1(html);
            let _ = document.close();
        }
    }

    fn element_size(&self, element: Element) -> Option<Size> {
        let rect = self.element(element)?.get_bounding_client_rect();
        Some(Size {
            width: rect.width(),
            height: rect.height(),
        })
    }

    fn show(&mut self, element: Element, size: Option<Size>) {
        let Some(node) = self.html_element(element) else {
            return;
        };
        let style = node.style();
        if let Some(size) = size {
            let _ = style.set_property("width", &px(size.width));
            let _ = style.set_property("height", &px(size.height));
        }
        let _ = style.set_property("display", "block");
    }

    fn hide(&mut self, element: Element) {
        if let Some(node) = self.html_element(element) {
            let _ = node.style().set_property("display", "none");
        }
    }

    fn reload(&mut self) {
        let _ = self.window.location().reload();
    }
}
