//! HTTP surface of the host.
//!
//! The axum layer is deliberately thin: every request, regardless of path,
//! becomes a [`RuntimeMessage::Request`] delivered to the runtime task, and
//! the handler waits on a oneshot channel for whatever response the
//! sequencer eventually addresses to that request id. Routing by path is
//! the sequencer's job, not axum's, so the router here is a single fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::effects::HttpResponse;
use crate::events::HttpRequestEvent;
use crate::runtime::{RuntimeMessage, now_millis};
use crate::types::RequestId;

/// Upper bound on accepted request body size.
const BODY_LIMIT: usize = 1024 * 1024;

/// Shared application state passed to the handler via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Channel into the runtime task.
    runtime_tx: mpsc::Sender<RuntimeMessage>,

    /// Counter for generating request ids.
    next_request_id: AtomicU64,
}

impl AppState {
    /// Creates state wrapping a runtime channel.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeMessage>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                runtime_tx,
                next_request_id: AtomicU64::new(1),
            }),
        }
    }

    fn allocate_request_id(&self) -> RequestId {
        let n = self.inner.next_request_id.fetch_add(1, Ordering::Relaxed);
        RequestId::new(format!("req-{n}"))
    }
}

/// Errors the transport layer can produce on its own.
///
/// Everything past these is the sequencer's decision and arrives as a
/// regular [`HttpResponse`].
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    BodyRead(String),

    /// The runtime task is gone; the process is shutting down.
    #[error("host runtime is unavailable")]
    RuntimeUnavailable,

    /// The runtime dropped the response channel without answering.
    #[error("host runtime dropped the request")]
    ResponseDropped,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ServerError::RuntimeUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::ResponseDropped => StatusCode::BAD_GATEWAY,
        };
        (status, self.to_string()).into_response()
    }
}

/// Forwards one HTTP request into the runtime and awaits its response.
pub async fn request_handler(
    State(app_state): State<AppState>,
    request: Request,
) -> Result<Response, ServerError> {
    let uri_path = request.uri().path().to_string();
    let body = axum::body::to_bytes(request.into_body(), BODY_LIMIT)
        .await
        .map_err(|e| ServerError::BodyRead(e.to_string()))?;

    let event = HttpRequestEvent {
        id: app_state.allocate_request_id(),
        uri_path,
        body: body.to_vec(),
        posix_time_millis: now_millis(),
    };

    let (respond_to, response_rx) = oneshot::channel();
    app_state
        .inner
        .runtime_tx
        .send(RuntimeMessage::Request { event, respond_to })
        .await
        .map_err(|_| ServerError::RuntimeUnavailable)?;

    let response = response_rx
        .await
        .map_err(|_| ServerError::ResponseDropped)?;

    Ok(into_axum_response(response))
}

/// Converts a sequencer response into an axum response.
fn into_axum_response(response: HttpResponse) -> Response {
    let mut builder = Response::builder().status(response.status);
    for header in &response.headers {
        builder = builder.header(header.name.as_str(), header.value.as_str());
    }
    builder
        .body(Body::from(response.body))
        // Status and headers come from our own command types; an invalid
        // combination is a bug in the sequencer.
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Builds the axum router: one fallback handler for every path and method.
pub fn build_router(app_state: AppState) -> axum::Router {
    axum::Router::new()
        .fallback(request_handler)
        .with_state(app_state)
}
