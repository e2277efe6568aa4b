//! API dispatcher.
//!
//! Decodes the body of an `/api` request and either answers immediately
//! (decode failures, log reads, worker-not-ready) or records a pending
//! delegation and emits the command that runs it in the worker.

use tracing::debug;

use crate::api::{self, ApiRequest, ApiResponse};
use crate::effects::{Command, HttpResponse};
use crate::events::HttpRequestEvent;
use crate::state::HostState;

/// Body of the not-ready indication. An HTTP 200 at the transport level;
/// callers detect the condition from the body.
const SETUP_NOT_COMPLETE_MESSAGE: &str = "Setup of the volatile process is not complete";

/// Handles an API-classified request.
///
/// The clock has already been advanced by the sequencer. Decode failures and
/// log reads mutate nothing further; a delegation adds exactly one entry to
/// the pending set and emits exactly one `RunInWorker` command.
pub fn handle_api_request(state: &mut HostState, request: HttpRequestEvent) -> Vec<Command> {
    let api_request = match api::decode_request(&request.body) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!(request_id = %request.id, error = %e, "API request failed to decode");
            return vec![Command::Respond(HttpResponse::bad_request(
                request.id,
                e.to_string(),
            ))];
        }
    };

    match api_request {
        ApiRequest::ReadLog => {
            vec![Command::Respond(HttpResponse::text(
                request.id,
                state.log.render(),
            ))]
        }

        ApiRequest::RunInVolatileHost { payload } => {
            let Some(process_id) = state.setup.process_id.clone() else {
                let body = api::encode_response(&ApiResponse::SetupNotComplete {
                    message: SETUP_NOT_COMPLETE_MESSAGE.to_string(),
                });
                return vec![Command::Respond(HttpResponse::json(request.id, body))];
            };

            state.pending_requests.insert(request.id.clone());
            state.tasks_created += 1;
            debug!(
                request_id = %request.id,
                %process_id,
                task = state.tasks_created,
                "Delegating to volatile process"
            );

            vec![Command::RunInWorker {
                process_id,
                request_id: request.id,
                instruction: payload,
            }]
        }
    }
}
