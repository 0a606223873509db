#![warn(missing_docs)]
//! # dropzone-ui
//!
//! ## Purpose
//! Defines the page surface the upload widget reads and mutates.
//!
//! ## Responsibilities
//! - Name the page elements the widget touches and their default ids.
//! - Abstract class toggling, HTML injection, sizing, and reload behind the
//!   [`Document`] trait.
//! - Detect drag-and-drop capability from probed platform features.
//! - Drive the global busy indicator across outstanding requests.
//! - Provide [`HeadlessDocument`], an in-memory page for native hosts and tests.
//!
//! ## Data flow
//! Widget transitions call [`Document`] methods; browser hosts map them to the
//! DOM, native hosts record them in [`HeadlessDocument`].
//!
//! ## Ownership and lifetimes
//! The widget owns its document value; hosts inspect it through accessors.
//!
//! ## Error model
//! Document operations are infallible from the widget's point of view. Browser
//! bindings swallow missing elements the same way jQuery selections do.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Page elements the widget interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    /// Upload form carrying `action` and `method`.
    Form,
    /// Classic file picker.
    FileInput,
    /// Drag-and-drop region.
    DropTarget,
    /// Busy overlay shown while requests are outstanding.
    BusyIndicator,
    /// Container for user-facing error text.
    ErrorMessage,
    /// Region receiving partial-page responses.
    MainContent,
}

/// Element ids (and the form's class) used to locate page elements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DomIds {
    /// Class selecting the upload form.
    pub form_class: String,
    /// Id of the file input.
    pub file_input: String,
    /// Id of the drop target.
    pub drop_target: String,
    /// Id of the busy overlay.
    pub busy_indicator: String,
    /// Id of the error container.
    pub error_message: String,
    /// Id of the main content region.
    pub main_content: String,
}

impl Default for DomIds {
    fn default() -> Self {
        Self {
            form_class: "box".to_string(),
            file_input: "file".to_string(),
            drop_target: "dropzone".to_string(),
            busy_indicator: "loadingAjaxPane".to_string(),
            error_message: "errorMsg".to_string(),
            main_content: "mainContent".to_string(),
        }
    }
}

impl DomIds {
    /// Returns the id for an element; for [`Element::Form`] this is the class.
    pub fn selector_for(&self, element: Element) -> &str {
        match element {
            Element::Form => &self.form_class,
            Element::FileInput => &self.file_input,
            Element::DropTarget => &self.drop_target,
            Element::BusyIndicator => &self.busy_indicator,
            Element::ErrorMessage => &self.error_message,
            Element::MainContent => &self.main_content,
        }
    }
}

/// Probed platform features relevant to uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Elements expose `draggable`.
    pub draggable: bool,
    /// Elements expose both `ondragstart` and `ondrop`.
    pub drag_events: bool,
    /// `FormData` is available.
    pub form_data: bool,
    /// `FileReader` is available.
    pub file_reader: bool,
}

impl Capabilities {
    /// Capabilities of a modern browser.
    pub fn full() -> Self {
        Self {
            draggable: true,
            drag_events: true,
            form_data: true,
            file_reader: true,
        }
    }

    /// Capabilities of an environment with only the classic file picker.
    pub fn picker_only() -> Self {
        Self {
            draggable: false,
            drag_events: false,
            form_data: true,
            file_reader: true,
        }
    }

    /// Returns `true` when drag-and-drop uploads can be bound.
    pub fn advanced_upload(&self) -> bool {
        (self.draggable || self.drag_events) && self.form_data && self.file_reader
    }
}

/// Pixel dimensions of an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

/// Page surface used by the widget.
pub trait Document {
    /// Returns the page URL used to resolve relative form actions.
    fn location(&self) -> Url;

    /// Returns probed platform capabilities.
    fn capabilities(&self) -> Capabilities;

    /// Adds a CSS class to an element.
    fn add_class(&mut self, element: Element, class: &str);

    /// Removes a CSS class from an element.
    fn remove_class(&mut self, element: Element, class: &str);

    /// Returns `true` when the element carries the class.
    fn has_class(&self, element: Element, class: &str) -> bool;

    /// Replaces an element's inner HTML.
    fn set_html(&mut self, element: Element, html: &str);

    /// Replaces the whole document with `html`.
    fn write_document(&mut self, html: &str);

    /// Returns the element's current rendered size, if it is laid out.
    fn element_size(&self, element: Element) -> Option<Size>;

    /// Shows an element, optionally resizing it first.
    fn show(&mut self, element: Element, size: Option<Size>);

    /// Hides an element.
    fn hide(&mut self, element: Element);

    /// Reloads the page.
    fn reload(&mut self);
}

/// Global busy overlay tracking every outstanding request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyIndicator {
    active: usize,
}

impl BusyIndicator {
    /// Creates an idle indicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a started request; the first one shows the overlay sized to the
    /// drop target.
    pub fn request_started<D: Document + ?Sized>(&mut self, document: &mut D) {
        if self.active == 0 {
            let size = document.element_size(Element::DropTarget);
            document.show(Element::BusyIndicator, size);
        }
        self.active += 1;
    }

    /// Records a finished request; the last one hides the overlay.
    pub fn request_finished<D: Document + ?Sized>(&mut self, document: &mut D) {
        if self.active == 0 {
            debug!("busy indicator finish without matching start");
            return;
        }
        self.active -= 1;
        if self.active == 0 {
            document.hide(Element::BusyIndicator);
        }
    }

    /// Returns the number of outstanding requests.
    pub fn active(&self) -> usize {
        self.active
    }
}

/// In-memory document for native hosts and tests.
#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    location: Url,
    capabilities: Capabilities,
    classes: BTreeMap<Element, BTreeSet<String>>,
    html: BTreeMap<Element, String>,
    sizes: BTreeMap<Element, Size>,
    shown: BTreeMap<Element, Option<Size>>,
    written: Option<String>,
    reloads: usize,
}

impl HeadlessDocument {
    /// Creates an empty page at `location` with full capabilities.
    pub fn new(location: Url) -> Self {
        Self {
            location,
            capabilities: Capabilities::full(),
            classes: BTreeMap::new(),
            html: BTreeMap::new(),
            sizes: BTreeMap::new(),
            shown: BTreeMap::new(),
            written: None,
            reloads: 0,
        }
    }

    /// Overrides probed capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the rendered size reported for an element.
    pub fn set_element_size(&mut self, element: Element, size: Size) {
        self.sizes.insert(element, size);
    }

    /// Returns the classes on an element in sorted order.
    pub fn classes_of(&self, element: Element) -> Vec<&str> {
        self.classes
            .get(&element)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns an element's inner HTML.
    pub fn html_of(&self, element: Element) -> Option<&str> {
        self.html.get(&element).map(String::as_str)
    }

    /// Returns the last full-document write.
    pub fn written_document(&self) -> Option<&str> {
        self.written.as_deref()
    }

    /// Returns `true` when an element is shown.
    pub fn is_shown(&self, element: Element) -> bool {
        self.shown.contains_key(&element)
    }

    /// Returns the size an element was shown with.
    pub fn shown_size(&self, element: Element) -> Option<Size> {
        self.shown.get(&element).copied().flatten()
    }

    /// Returns how often the page was reloaded.
    pub fn reload_count(&self) -> usize {
        self.reloads
    }
}

impl Document for HeadlessDocument {
    fn location(&self) -> Url {
        self.location.clone()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn add_class(&mut self, element: Element, class: &str) {
        self.classes
            .entry(element)
            .or_default()
            .insert(class.to_string());
    }

    fn remove_class(&mut self, element: Element, class: &str) {
        if let Some(set) = self.classes.get_mut(&element) {
            set.remove(class);
        }
    }

    fn has_class(&self, element: Element, class: &str) -> bool {
        self.classes
            .get(&element)
            .is_some_and(|set| set.contains(class))
    }

    fn set_html(&mut self, element: Element, html: &str) {
        self.html.insert(element, html.to_string());
    }

    fn write_document(&mut self, html: &str) {
        self.written = Some(html.to_string());
    }

    fn element_size(&self, element: Element) -> Option<Size> {
        self.sizes.get(&element).copied()
    }

    fn show(&mut self, element: Element, size: Option<Size>) {
        if let Some(size) = size {
            self.sizes.insert(element, size);
        }
        self.shown.insert(element, size);
    }

    fn hide(&mut self, element: Element) {
        self.shown.remove(&element);
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }
}
