//! Shared fixtures for app integration tests.

use dropzone_ui::HeadlessDocument;
use dropzone_upload::{
    Completion, HttpResponse, RequestHandle, RequestId, TransportOutcome, UploadError,
    UploadRequest, UploadTransport,
};
use dropzone_widget::{UploadWidget, WidgetConfig};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use url::Url;

/// Transport that answers every request with a fixed response, or holds it
/// open until aborted when no response is scripted.
pub struct ScriptedTransport {
    response: Option<HttpResponse>,
    completions: UnboundedSender<Completion>,
}

struct ScriptedHandle {
    id: RequestId,
    completions: UnboundedSender<Completion>,
}

impl RequestHandle for ScriptedHandle {
    fn abort(&self) {
        let _ = self.completions.send(Completion {
            id: self.id,
            outcome: TransportOutcome::Aborted,
        });
    }
}

impl UploadTransport for ScriptedTransport {
    fn dispatch(&self, request: UploadRequest) -> Result<Box<dyn RequestHandle>, UploadError> {
        if let Some(response) = &self.response {
            let _ = self.completions.send(Completion {
                id: request.id,
                outcome: TransportOutcome::Response(response.clone()),
            });
        }
        Ok(Box::new(ScriptedHandle {
            id: request.id,
            completions: self.completions.clone(),
        }))
    }
}

/// Creates a widget whose transport replies with `response`.
#[allow(dead_code)]
pub fn scripted_widget(
    config: WidgetConfig,
    response: Option<HttpResponse>,
) -> (UploadWidget<HeadlessDocument>, UnboundedReceiver<Completion>) {
    let (completions, receiver) = unbounded_channel();
    let transport = ScriptedTransport {
        response,
        completions,
    };
    let page = Url::parse("http://localhost:8080/").expect("page url fixture");
    let widget = UploadWidget::new(config, HeadlessDocument::new(page), Box::new(transport));
    (widget, receiver)
}
