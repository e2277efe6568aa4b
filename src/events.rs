//! Events fed into the sequencer.
//!
//! The host processes exactly one event at a time: an HTTP request arrival,
//! the outcome of a provisioning attempt, or the completion of a delegated
//! operation. Asynchronous work never suspends the sequencer; it re-enters
//! through one of these events.

use serde::{Deserialize, Serialize};

use crate::api::RunResult;
use crate::types::{ProcessId, RequestId};

/// An inbound HTTP request, as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequestEvent {
    /// Correlation key; the transport expects exactly one response per id.
    pub id: RequestId,

    /// The request path, e.g. `/api`.
    pub uri_path: String,

    /// Raw request body bytes.
    pub body: Vec<u8>,

    /// Time reported by the transport for this event.
    pub posix_time_millis: i64,
}

/// How a delegated operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome_type", rename_all = "snake_case")]
pub enum DelegationOutcome {
    /// The worker ran the instruction. A failure of the instruction itself
    /// is reported inside the result, not as a separate variant.
    Completed { result: RunResult },

    /// The addressed worker process no longer exists.
    ProcessNotFound,
}

/// An event entering the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum HostEvent {
    /// An HTTP request arrived.
    HttpRequest(HttpRequestEvent),

    /// A provisioning command finished, successfully or not.
    ProvisionOutcome {
        posix_time_millis: i64,
        result: Result<ProcessId, String>,
    },

    /// A delegated operation finished.
    DelegationOutcome {
        posix_time_millis: i64,
        /// The HTTP request that triggered the delegation.
        request_id: RequestId,
        outcome: DelegationOutcome,
    },
}

impl HostEvent {
    /// The time reported with this event.
    pub fn posix_time_millis(&self) -> i64 {
        match self {
            HostEvent::HttpRequest(request) => request.posix_time_millis,
            HostEvent::ProvisionOutcome {
                posix_time_millis, ..
            } => *posix_time_millis,
            HostEvent::DelegationOutcome {
                posix_time_millis, ..
            } => *posix_time_millis,
        }
    }
}
