//! Shared fixtures for widget integration tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dropzone_core::{FileEntry, FormSnapshot};
use dropzone_ui::{Element, HeadlessDocument, Size};
use dropzone_upload::{
    Completion, HttpResponse, RequestHandle, RequestId, TransportOutcome, UploadError,
    UploadRequest, UploadTransport,
};
use dropzone_widget::{UploadWidget, WidgetConfig};
use url::Url;

/// Transport that records dispatched requests and abort calls.
///
/// Setting `refuse_next` makes the next dispatch fail without recording it.
#[derive(Default)]
pub struct RecordingTransport {
    pub requests: RefCell<Vec<UploadRequest>>,
    pub aborts: Rc<Cell<usize>>,
    pub refuse_next: Cell<bool>,
}

struct RecordingHandle {
    aborts: Rc<Cell<usize>>,
}

impl RequestHandle for RecordingHandle {
    fn abort(&self) {
        self.aborts.set(self.aborts.get() + 1);
    }
}

impl UploadTransport for RecordingTransport {
    fn dispatch(&self, request: UploadRequest) -> Result<Box<dyn RequestHandle>, UploadError> {
        if self.refuse_next.replace(false) {
            return Err(UploadError::Transport("connection refused".to_string()));
        }
        self.requests.borrow_mut().push(request);
        Ok(Box::new(RecordingHandle {
            aborts: Rc::clone(&self.aborts),
        }))
    }
}

/// Drop target size used by busy indicator assertions.
#[allow(dead_code)]
pub const DROP_TARGET_SIZE: Size = Size {
    width: 480.0,
    height: 200.0,
};

/// Creates a widget over a headless page with a recording transport.
pub fn widget_with(
    config: WidgetConfig,
) -> (UploadWidget<HeadlessDocument>, Rc<RecordingTransport>) {
    let transport = Rc::new(RecordingTransport::default());
    let mut document =
        HeadlessDocument::new(Url::parse("https://nibrs.example.test/").expect("page url"));
    document.set_element_size(Element::DropTarget, DROP_TARGET_SIZE);

    let widget = UploadWidget::new(config, document, Box::new(Rc::clone(&transport)));
    (widget, transport)
}

/// Creates a widget with default configuration.
#[allow(dead_code)]
pub fn widget() -> (UploadWidget<HeadlessDocument>, Rc<RecordingTransport>) {
    widget_with(WidgetConfig::default())
}

/// Upload form as rendered by the validation page.
pub fn fixture_form() -> FormSnapshot {
    FormSnapshot::new("/", "file")
        .with_method("post")
        .with_field("_csrf", "token-value")
}

/// Two submission files.
#[allow(dead_code)]
pub fn fixture_files() -> Vec<FileEntry> {
    vec![
        FileEntry::new("group-a.txt", "text/plain", b"00001 GROUP A".to_vec()),
        FileEntry::new("group-b.xml", "application/xml", b"<Submission/>".to_vec()),
    ]
}

/// Completion carrying an HTTP response.
#[allow(dead_code)]
pub fn response(id: RequestId, status: u16, content_type: Option<&str>, body: &str) -> Completion {
    Completion {
        id,
        outcome: TransportOutcome::Response(HttpResponse::new(status, content_type, body)),
    }
}
