//! `XMLHttpRequest` transport.

use std::cell::Cell;
use std::rc::Rc;

use dropzone_core::{MultipartPayload, Part};
use dropzone_upload::{
    Completion, HttpResponse, RequestHandle, RequestId, TransportOutcome, UploadError,
    UploadRequest, UploadTransport,
};
use js_sys::{Array, Uint8Array};
use tracing::{debug, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Blob, BlobPropertyBag, FormData, XmlHttpRequest};

/// Receives completions on a task after the XHR callback returns.
pub type CompletionSink = Rc<dyn Fn(Completion)>;

/// Browser transport delivering completions through a sink.
#[derive(Clone)]
pub struct XhrTransport {
    sink: CompletionSink,
}

impl XhrTransport {
    /// Creates a transport reporting to `sink`.
    pub fn new(sink: CompletionSink) -> Self {
        Self { sink }
    }
}

fn js_error(context: &str, value: JsValue) -> UploadError {
    UploadError::Transport(format!("{context}: {value:?}"))
}

/// Builds the `FormData` body for `payload`, parts in order.
///
/// Each file becomes a `Blob` typed with its content type and appended under
/// its file name. The browser writes the multipart framing and boundary.
///
/// # Errors
/// Returns the browser's exception when `FormData` or `Blob` construction
/// fails.
pub fn form_data_for(payload: &MultipartPayload) -> Result<FormData, JsValue> {
    let form_data = FormData::new()?;
    for part in payload.parts() {
        match part {
            Part::Field(field) => form_data.append_with_str(part.name(), &field.value)?,
            Part::File { file, .. } => {
                let options = BlobPropertyBag::new();
                options.set_type(&file.content_type);
                let bytes = Uint8Array::from(file.bytes.as_slice());
                let blob =
                    Blob::new_with_u8_array_sequence_and_options(&Array::of1(&bytes), &options)?;
                form_data.append_with_blob_and_filename(part.name(), &blob, &file.name)?;
            }
        }
    }
    Ok(form_data)
}

impl UploadTransport for XhrTransport {
    fn dispatch(&self, request: UploadRequest) -> Result<Box<dyn RequestHandle>, UploadError> {
        let body =
            form_data_for(&request.payload).map_err(|error| js_error("build form data", error))?;
        let xhr = XmlHttpRequest::new().map_err(|error| js_error("create xhr", error))?;
        xhr.open_with_async(request.method.as_str(), request.url.as_str(), true)
            .map_err(|error| js_error("open", error))?;

        let id = request.id;
        let aborted = Rc::new(Cell::new(false));
        let on_loadend = {
            let xhr = xhr.clone();
            let aborted = Rc::clone(&aborted);
            let sink = Rc::clone(&self.sink);
            Closure::once_into_js(move || {
                let outcome = read_outcome(&xhr, aborted.get());
                // Abort fires loadend synchronously inside the widget's
                // cancel call, so delivery waits for the next task.
                spawn_local(async move { sink(Completion { id, outcome }) });
            })
        };
        xhr.set_onloadend(Some(on_loadend.unchecked_ref()));

        info!(
            %id,
            method = %request.method,
            url = %request.url,
            files = request.payload.file_count(),
            "sending upload"
        );
        xhr.send_with_opt_form_data(Some(&body))
            .map_err(|error| js_error("send", error))?;

        Ok(Box::new(XhrHandle { id, xhr, aborted }))
    }
}

fn read_outcome(xhr: &XmlHttpRequest, aborted: bool) -> TransportOutcome {
    if aborted {
        return TransportOutcome::Aborted;
    }
    match xhr.status().unwrap_or(0) {
        0 => TransportOutcome::NetworkFailure("request ended without status".to_string()),
        status => TransportOutcome::Response(HttpResponse {
            status,
            content_type: xhr.get_response_header("Content-Type").ok().flatten(),
            body: xhr.response_text().ok().flatten().unwrap_or_default(),
        }),
    }
}

struct XhrHandle {
    id: RequestId,
    xhr: XmlHttpRequest,
    aborted: Rc<Cell<bool>>,
}

impl RequestHandle for XhrHandle {
    fn abort(&self) {
        if self.xhr.ready_state() == XmlHttpRequest::DONE {
            debug!(id = %self.id, "abort ignored, request already finished");
            return;
        }
        self.aborted.set(true);
        let _ = self.xhr.abort();
    }
}
