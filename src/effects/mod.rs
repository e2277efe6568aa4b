//! Commands-as-data for transport and worker operations.
//!
//! The sequencer never performs I/O. It returns command values describing the
//! operations to perform; the runtime interprets them. This keeps the core
//! logic pure, testable without I/O, and makes every intended operation
//! loggable.

use serde::{Deserialize, Serialize};

use crate::types::{ProcessId, RequestId};

pub mod child_process;
pub mod interpreter;

pub use child_process::ChildProcessHost;
pub use interpreter::{EchoWorkerHost, ExecuteOutcome, WorkerHost};

/// An HTTP header on an outbound response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// An outbound HTTP response, addressed by request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// The request this response answers.
    pub request_id: RequestId,

    /// HTTP status code.
    pub status: u16,

    /// Response body bytes.
    pub body: Vec<u8>,

    /// Response headers.
    pub headers: Vec<Header>,
}

impl HttpResponse {
    /// Creates a response with no headers.
    pub fn new(request_id: RequestId, status: u16, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse {
            request_id,
            status,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// A 200 response carrying HTML.
    pub fn html(request_id: RequestId, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse::new(request_id, 200, body).with_header("content-type", "text/html")
    }

    /// A 200 response carrying JSON.
    pub fn json(request_id: RequestId, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse::new(request_id, 200, body).with_header("content-type", "application/json")
    }

    /// A 200 response carrying plain text.
    pub fn text(request_id: RequestId, body: impl Into<String>) -> Self {
        HttpResponse::new(request_id, 200, body.into().into_bytes())
            .with_header("content-type", "text/plain")
    }

    /// A 400 response describing why the request could not be decoded.
    pub fn bad_request(request_id: RequestId, description: impl Into<String>) -> Self {
        HttpResponse::new(request_id, 400, description.into().into_bytes())
            .with_header("content-type", "text/plain")
    }

    /// A 503 response for a delegation whose worker disappeared mid-flight.
    pub fn retryable_error(request_id: RequestId, description: impl Into<String>) -> Self {
        HttpResponse::new(request_id, 503, description.into().into_bytes())
            .with_header("content-type", "text/plain")
            .with_header("retry-after", "1")
    }
}

/// A command emitted by the sequencer for the runtime to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command_type", rename_all = "snake_case")]
pub enum Command {
    /// Send an HTTP response to the transport.
    Respond(HttpResponse),

    /// Provision a new worker process running the bootstrap program.
    ProvisionWorker { program: String },

    /// Run an instruction in the worker on behalf of a pending request.
    RunInWorker {
        process_id: ProcessId,
        request_id: RequestId,
        instruction: String,
    },
}

impl Command {
    /// Returns the response if this command is a `Respond`.
    pub fn as_response(&self) -> Option<&HttpResponse> {
        match self {
            Command::Respond(response) => Some(response),
            _ => None,
        }
    }
}
