//! Event binding for a page hosting the upload form.

use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use dropzone_core::{FileEntry, FormSnapshot};
use dropzone_ui::Element;
use dropzone_upload::Completion;
use dropzone_widget::{
    CANCEL_KEY, DragEvent, SubmitOutcome, UploadWidget, WidgetConfig, WidgetError,
    WidgetSnapshot,
};
use gloo::events::{EventListener, EventListenerOptions};
use js_sys::Uint8Array;
use thiserror::Error;
use tracing::debug;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{File, FileList, HtmlFormElement, HtmlInputElement};

use crate::dom::WebDocument;
use crate::form::form_fields;
use crate::xhr::{CompletionSink, XhrTransport};

type SharedWidget = Rc<RefCell<UploadWidget<WebDocument>>>;

/// Widget mounted on the page together with its listeners.
///
/// Dropping it unbinds every listener.
pub struct MountedWidget {
    widget: SharedWidget,
    _listeners: Vec<EventListener>,
}

impl MountedWidget {
    /// Returns the current widget state, or `None` while a handler holds it.
    pub fn snapshot(&self) -> Option<WidgetSnapshot> {
        self.widget
            .try_borrow()
            .ok()
            .map(|widget| widget.snapshot())
    }

    /// Keeps the widget bound for the lifetime of the page.
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

/// Errors raised while mounting.
#[derive(Debug, Error)]
pub enum MountError {
    /// No browser window or document.
    #[error("no browser document available")]
    NoDocument,
    /// The upload form is missing from the page.
    #[error("upload form 'form.{0}' not found")]
    MissingForm(String),
}

/// Mounts the widget on the current page.
///
/// # Errors
/// Returns [`MountError`] when there is no document or no upload form.
pub fn mount(config: WidgetConfig) -> Result<MountedWidget, MountError> {
    let window = web_sys::window().ok_or(MountError::NoDocument)?;
    let page = window.document().ok_or(MountError::NoDocument)?;
    let document = WebDocument::new(window, config.ids.clone()).ok_or(MountError::NoDocument)?;
    let form = document
        .form()
        .ok_or_else(|| MountError::MissingForm(config.ids.form_class.clone()))?;
    let file_input = document
        .element(Element::FileInput)
        .and_then(|element| element.dyn_into::<HtmlInputElement>().ok());
    let drop_target = document.element(Element::DropTarget);
    let default_field = config.ids.file_input.clone();

    let slot: Rc<OnceCell<Weak<RefCell<UploadWidget<WebDocument>>>>> = Rc::new(OnceCell::new());
    let sink: CompletionSink = {
        let slot = Rc::clone(&slot);
        Rc::new(move |completion| deliver(&slot, completion))
    };
    let widget: SharedWidget = Rc::new(RefCell::new(UploadWidget::new(
        config,
        document,
        Box::new(XhrTransport::new(sink)),
    )));
    let _ = slot.set(Rc::downgrade(&widget));

    let source = FormSource {
        form: form.clone(),
        file_input: file_input.clone(),
        default_field,
    };
    let options = EventListenerOptions::enable_prevent_default();
    let mut listeners = Vec::new();

    let drag_enabled = widget.borrow().drag_enabled();
    if let Some(target) = drop_target.filter(|_| drag_enabled) {
        let hover = [
            ("drag", None),
            ("dragstart", None),
            ("dragenter", Some(DragEvent::Enter)),
            ("dragover", Some(DragEvent::Over)),
            ("dragleave", Some(DragEvent::Leave)),
            ("dragend", Some(DragEvent::End)),
        ];
        for (name, drag) in hover {
            let widget = Rc::clone(&widget);
            listeners.push(EventListener::new_with_options(
                &target,
                name,
                options,
                move |event| {
                    event.prevent_default();
                    event.stop_propagation();
                    if let (Some(drag), Ok(mut widget)) = (drag, widget.try_borrow_mut()) {
                        widget.on_drag(drag);
                    }
                },
            ));
        }

        let widget = Rc::clone(&widget);
        let source = source.clone();
        listeners.push(EventListener::new_with_options(
            &target,
            "drop",
            options,
            move |event| {
                event.prevent_default();
                event.stop_propagation();
                if let Ok(mut widget) = widget.try_borrow_mut() {
                    widget.on_drag(DragEvent::Leave);
                    if widget.is_uploading() {
                        debug!("drop ignored, upload in progress");
                        return;
                    }
                }

                let files = event
                    .dyn_ref::<web_sys::DragEvent>()
                    .and_then(|event| event.data_transfer())
                    .and_then(|transfer| transfer.files())
                    .map(list_files)
                    .unwrap_or_default();
                let widget = Rc::clone(&widget);
                let source = source.clone();
                spawn_local(async move {
                    let dropped = read_files(files).await;
                    let form = source.snapshot().await;
                    if let Ok(mut widget) = widget.try_borrow_mut() {
                        report(widget.on_drop(form, dropped));
                    }
                });
            },
        ));
    }

    if let Some(input) = file_input {
        let widget = Rc::clone(&widget);
        let source = source.clone();
        let target = input.clone();
        listeners.push(EventListener::new(&target, "change", move |_| {
            let _ = input.remove_attribute("form");
            let widget = Rc::clone(&widget);
            let source = source.clone();
            spawn_local(async move {
                let form = source.snapshot().await;
                if let Ok(mut widget) = widget.try_borrow_mut() {
                    report(widget.on_file_selected(form));
                }
            });
        }));
    }

    {
        let widget = Rc::clone(&widget);
        let source = source.clone();
        listeners.push(EventListener::new_with_options(
            &form,
            "submit",
            options,
            move |event| {
                event.prevent_default();
                let widget = Rc::clone(&widget);
                let source = source.clone();
                spawn_local(async move {
                    let form = source.snapshot().await;
                    if let Ok(mut widget) = widget.try_borrow_mut() {
                        report(widget.submit(form));
                    }
                });
            },
        ));
    }

    {
        let widget = Rc::clone(&widget);
        listeners.push(EventListener::new_with_options(
            &page,
            "keyup",
            options,
            move |event| {
                let Some(key) = event
                    .dyn_ref::<web_sys::KeyboardEvent>()
                    .map(web_sys::KeyboardEvent::key)
                else {
                    return;
                };
                if key == CANCEL_KEY {
                    event.prevent_default();
                    event.stop_propagation();
                }
                if let Ok(mut widget) = widget.try_borrow_mut() {
                    if let Some(outcome) = widget.on_key_up(&key) {
                        debug!(?outcome, "cancel key handled");
                    }
                }
            },
        ));
    }

    Ok(MountedWidget {
        widget,
        _listeners: listeners,
    })
}

/// Mounts the widget with default configuration when the module loads.
#[wasm_bindgen(start)]
pub fn start() {
    match mount(WidgetConfig::default()) {
        Ok(mounted) => mounted.forget(),
        Err(error) => gloo::console::warn!("dropzone not mounted", error.to_string()),
    }
}

fn deliver(slot: &OnceCell<Weak<RefCell<UploadWidget<WebDocument>>>>, completion: Completion) {
    let Some(widget) = slot.get().and_then(Weak::upgrade) else {
        return;
    };
    let Ok(mut widget) = widget.try_borrow_mut() else {
        gloo::console::warn!("dropzone completion dropped, widget busy", completion.id.to_string());
        return;
    };
    if let Some(report) = widget.on_complete(completion) {
        debug!(?report, "completion applied");
    }
}

fn report(result: Result<SubmitOutcome, WidgetError>) {
    match result {
        Ok(outcome) => debug!(?outcome, "submission handled"),
        Err(error) => gloo::console::warn!("upload could not start", error.to_string()),
    }
}

#[derive(Clone)]
struct FormSource {
    form: HtmlFormElement,
    file_input: Option<HtmlInputElement>,
    default_field: String,
}

impl FormSource {
    async fn snapshot(&self) -> FormSnapshot {
        let file_field = self
            .file_input
            .as_ref()
            .map(HtmlInputElement::name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.default_field.clone());
        let mut snapshot = FormSnapshot::new(
            self.form.get_attribute("action").unwrap_or_default(),
            file_field,
        );
        if let Some(method) = self.form.get_attribute("method") {
            snapshot = snapshot.with_method(method);
        }

        for (name, value) in form_fields(&self.form) {
            snapshot = snapshot.with_field(name, value);
        }

        let selected = self
            .file_input
            .as_ref()
            .and_then(HtmlInputElement::files)
            .map(list_files)
            .unwrap_or_default();
        snapshot.with_selected_files(read_files(selected).await)
    }
}

fn list_files(list: FileList) -> Vec<File> {
    (0..list.length()).filter_map(|index| list.get(index)).collect()
}

async fn read_files(files: Vec<File>) -> Vec<FileEntry> {
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        match read_file(&file).await {
            Ok(entry) => entries.push(entry),
            Err(error) => gloo::console::warn!("skipping unreadable file", file.name(), error),
        }
    }
    entries
}

async fn read_file(file: &File) -> Result<FileEntry, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    Ok(FileEntry::new(
        file.name(),
        file.type_(),
        Uint8Array::new(&buffer).to_vec(),
    ))
}
