//! The sequencer: the single entry point through which every event flows.
//!
//! All host logic is the pure-state function [`process_event`]: it advances
//! the clock, handles the event, reconciles the worker lifecycle, and
//! returns the commands to execute. No I/O happens here; the runtime in
//! [`crate::runtime`] interprets the commands.

use tracing::warn;

use crate::api::{self, ApiResponse};
use crate::document::FrontendDocuments;
use crate::effects::{Command, HttpResponse};
use crate::events::{DelegationOutcome, HostEvent, HttpRequestEvent};
use crate::router::{self, Route};
use crate::state::HostState;
use crate::types::RequestId;

pub mod dispatch;
pub mod lifecycle;


/// Immutable collaborators the sequencer needs: the served documents and the
/// worker's bootstrap program.
#[derive(Debug, Clone)]
pub struct HostContext {
    /// Pre-built front-end document blobs, served verbatim.
    pub documents: FrontendDocuments,

    /// Bootstrap program handed to the worker host on provisioning.
    pub worker_program: String,
}

impl HostContext {
    pub fn new(documents: FrontendDocuments, worker_program: impl Into<String>) -> Self {
        HostContext {
            documents,
            worker_program: worker_program.into(),
        }
    }
}

/// Processes one event and returns the outbound commands.
///
/// The clock is advanced before any other mutation, for every event kind.
/// The lifecycle reconcile runs after the event is handled, so a gap in
/// worker coverage is repaired at the latest opportunity within the same
/// event.
pub fn process_event(
    state: &mut HostState,
    event: HostEvent,
    context: &HostContext,
) -> Vec<Command> {
    state.advance_clock(event.posix_time_millis());

    let mut commands = match event {
        HostEvent::HttpRequest(request) => handle_http_request(state, request, context),
        HostEvent::ProvisionOutcome { result, .. } => {
            lifecycle::apply_provision_outcome(state, result);
            Vec::new()
        }
        HostEvent::DelegationOutcome {
            request_id,
            outcome,
            ..
        } => handle_delegation_outcome(state, request_id, outcome),
    };

    commands.extend(lifecycle::reconcile(state, &context.worker_program));
    commands
}

/// Routes an HTTP request: documents resolve immediately, `/api` dispatches.
fn handle_http_request(
    state: &mut HostState,
    request: HttpRequestEvent,
    context: &HostContext,
) -> Vec<Command> {
    match router::classify(&request.uri_path) {
        Route::PlainDocument => vec![Command::Respond(HttpResponse::html(
            request.id,
            context.documents.plain(),
        ))],
        Route::InspectableDocument => vec![Command::Respond(HttpResponse::html(
            request.id,
            context.documents.inspector(),
        ))],
        Route::Api => dispatch::handle_api_request(state, request),
    }
}

/// Resolves a completed delegation back to its originating request.
fn handle_delegation_outcome(
    state: &mut HostState,
    request_id: RequestId,
    outcome: DelegationOutcome,
) -> Vec<Command> {
    match outcome {
        DelegationOutcome::Completed { result } => {
            if !state.pending_requests.remove(&request_id) {
                // The transport contract resolves each id exactly once; a
                // second completion has nothing left to answer.
                warn!(%request_id, "Completion for a request that is not pending");
                return Vec::new();
            }

            if let Some(error) = &result.error {
                state.log_message(format!("Delegated task failed: {error}"));
            }

            let body = api::encode_response(&ApiResponse::RunInVolatileHostComplete { result });
            vec![Command::Respond(HttpResponse::json(request_id, body))]
        }

        DelegationOutcome::ProcessNotFound => {
            // The worker is gone no matter which request noticed it first.
            lifecycle::reset_after_process_loss(state);

            if !state.pending_requests.remove(&request_id) {
                warn!(%request_id, "Process loss reported for a request that is not pending");
                return Vec::new();
            }

            // Answer the affected caller instead of leaving it pending
            // forever; the reconcile that follows re-provisions.
            vec![Command::Respond(HttpResponse::retryable_error(
                request_id,
                "The volatile process was lost; a new one is being provisioned. Retry.",
            ))]
        }
    }
}
