//! `reqwest` transport that runs uploads on a `tokio` runtime and reports
//! completions over an unbounded channel.

use dropzone_core::HttpMethod;
use reqwest::header::CONTENT_TYPE;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::{
    Completion, HttpResponse, RequestHandle, RequestId, TransportOutcome, UploadError,
    UploadRequest, UploadTransport,
};

/// HTTP transport for native hosts.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    completions: UnboundedSender<Completion>,
    runtime: Handle,
}

impl HttpTransport {
    /// Creates a transport bound to the current `tokio` runtime.
    ///
    /// # Errors
    /// Returns [`UploadError::Transport`] when called outside a runtime or when
    /// the HTTP client cannot be built.
    pub fn new(completions: UnboundedSender<Completion>) -> Result<Self, UploadError> {
        let runtime = Handle::try_current()
            .map_err(|error| UploadError::Transport(format!("no tokio runtime: {error}")))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("dropzone/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| UploadError::Transport(format!("http client: {error}")))?;

        Ok(Self::with_client(client, completions, runtime))
    }

    /// Creates a transport from explicit parts.
    pub fn with_client(
        client: reqwest::Client,
        completions: UnboundedSender<Completion>,
        runtime: Handle,
    ) -> Self {
        Self {
            client,
            completions,
            runtime,
        }
    }
}

impl UploadTransport for HttpTransport {
    fn dispatch(&self, request: UploadRequest) -> Result<Box<dyn RequestHandle>, UploadError> {
        let body = request.payload.encode_with_random_boundary()?;
        let method = match request.method {
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
        };

        info!(
            id = %request.id,
            method = %request.method,
            url = %request.url,
            bytes = body.bytes.len(),
            "sending upload"
        );

        let pending = self
            .client
            .request(method, request.url)
            .header(CONTENT_TYPE, body.content_type)
            .body(body.bytes);
        let completions = self.completions.clone();
        let id = request.id;

        let task = self.runtime.spawn(async move {
            let outcome = match pending.send().await {
                Ok(response) => read_response(response).await,
                Err(error) => TransportOutcome::NetworkFailure(error.to_string()),
            };
            // Receiver gone means the widget loop has shut down.
            let _ = completions.send(Completion { id, outcome });
        });

        Ok(Box::new(HttpRequestHandle {
            id,
            task: task.abort_handle(),
            completions: self.completions.clone(),
        }))
    }
}

async fn read_response(response: reqwest::Response) -> TransportOutcome {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match response.text().await {
        Ok(body) => TransportOutcome::Response(HttpResponse {
            status,
            content_type,
            body,
        }),
        Err(error) => TransportOutcome::NetworkFailure(format!("reading body: {error}")),
    }
}

struct HttpRequestHandle {
    id: RequestId,
    task: AbortHandle,
    completions: UnboundedSender<Completion>,
}

impl RequestHandle for HttpRequestHandle {
    fn abort(&self) {
        if self.task.is_finished() {
            debug!(id = %self.id, "abort ignored, request already finished");
            return;
        }

        self.task.abort();
        let _ = self.completions.send(Completion {
            id: self.id,
            outcome: TransportOutcome::Aborted,
        });
    }
}
