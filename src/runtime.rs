//! The tokio task that owns the host state.
//!
//! A single runtime task receives every event through one channel and feeds
//! it to the sequencer, so no locking is needed around [`HostState`]. The
//! commands returned by the sequencer are interpreted here: responses are
//! resolved against per-request oneshot channels, and worker operations are
//! spawned so they complete out-of-band and re-enter as later events.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::RunResult;
use crate::effects::{Command, ExecuteOutcome, HttpResponse, WorkerHost};
use crate::events::{DelegationOutcome, HostEvent, HttpRequestEvent};
use crate::host::{HostContext, process_event};
use crate::state::HostState;
use crate::types::RequestId;

/// Default channel capacity for runtime messages.
const CHANNEL_CAPACITY: usize = 256;

/// Messages delivered to the runtime task.
#[derive(Debug)]
pub enum RuntimeMessage {
    /// An HTTP request from the transport. The runtime sends exactly one
    /// response on `respond_to`, possibly much later than the request.
    Request {
        event: HttpRequestEvent,
        respond_to: oneshot::Sender<HttpResponse>,
    },

    /// An internal event: a provisioning or delegation outcome.
    Event(HostEvent),

    /// Request a graceful shutdown.
    Shutdown,
}

/// The event loop owning [`HostState`].
pub struct HostRuntime<W> {
    state: HostState,
    context: HostContext,
    worker_host: W,

    /// Response channels for requests whose answer is still pending.
    responders: HashMap<RequestId, oneshot::Sender<HttpResponse>>,

    rx: mpsc::Receiver<RuntimeMessage>,

    /// Sender clone used by spawned worker operations to feed their
    /// completion back into the loop.
    feedback_tx: mpsc::Sender<RuntimeMessage>,
}

impl<W> HostRuntime<W>
where
    W: WorkerHost + Clone + Send + Sync + 'static,
{
    /// Creates a runtime and the sender used to talk to it.
    pub fn new(context: HostContext, worker_host: W) -> (Self, mpsc::Sender<RuntimeMessage>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let runtime = HostRuntime {
            state: HostState::new(),
            context,
            worker_host,
            responders: HashMap::new(),
            rx,
            feedback_tx: tx.clone(),
        };
        (runtime, tx)
    }

    /// Runs the event loop until shutdown.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Host runtime started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping runtime");
                    break;
                }

                msg = self.rx.recv() => {
                    match msg {
                        Some(RuntimeMessage::Request { event, respond_to }) => {
                            self.handle_request(event, respond_to);
                        }
                        Some(RuntimeMessage::Event(event)) => {
                            self.handle_event(event);
                        }
                        Some(RuntimeMessage::Shutdown) => {
                            info!("Shutdown message received");
                            break;
                        }
                        None => {
                            info!("Message channel closed");
                            break;
                        }
                    }
                }
            }
        }

        info!(
            unanswered = self.responders.len(),
            "Host runtime stopped"
        );
    }

    /// Registers the response channel and sequences the request event.
    fn handle_request(
        &mut self,
        event: HttpRequestEvent,
        respond_to: oneshot::Sender<HttpResponse>,
    ) {
        if self
            .responders
            .insert(event.id.clone(), respond_to)
            .is_some()
        {
            // The transport must not reuse ids for concurrently live
            // requests; the earlier channel is dropped, aborting that caller.
            warn!(request_id = %event.id, "Duplicate in-flight request id");
        }

        self.handle_event(HostEvent::HttpRequest(event));
    }

    /// Sequences one event and interprets the resulting commands.
    fn handle_event(&mut self, event: HostEvent) {
        let commands = process_event(&mut self.state, event, &self.context);
        for command in commands {
            self.execute(command);
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Respond(response) => self.respond(response),
            Command::ProvisionWorker { program } => self.spawn_provision(program),
            Command::RunInWorker {
                process_id,
                request_id,
                instruction,
            } => self.spawn_delegation(process_id, request_id, instruction),
        }
    }

    /// Resolves a response against its oneshot channel.
    fn respond(&mut self, response: HttpResponse) {
        let request_id = response.request_id.clone();
        match self.responders.remove(&request_id) {
            Some(respond_to) => {
                if respond_to.send(response).is_err() {
                    // The caller hung up; nothing left to do.
                    debug!(%request_id, "Response channel closed by caller");
                }
            }
            None => {
                warn!(%request_id, "Response for an unknown request id");
            }
        }
    }

    /// Provisions a worker out-of-band; the outcome re-enters as an event.
    fn spawn_provision(&self, program: String) {
        let worker_host = self.worker_host.clone();
        let feedback_tx = self.feedback_tx.clone();

        tokio::spawn(async move {
            let result = worker_host
                .provision(&program)
                .await
                .map_err(|e| e.to_string());

            let event = HostEvent::ProvisionOutcome {
                posix_time_millis: now_millis(),
                result,
            };
            if feedback_tx.send(RuntimeMessage::Event(event)).await.is_err() {
                debug!("Runtime stopped before provision outcome was delivered");
            }
        });
    }

    /// Runs an instruction out-of-band; the outcome re-enters as an event.
    ///
    /// An infrastructure error from the worker host is reported to the
    /// caller as a completed delegation with a failure description, since
    /// from the caller's perspective the instruction did not run.
    fn spawn_delegation(
        &self,
        process_id: crate::types::ProcessId,
        request_id: RequestId,
        instruction: String,
    ) {
        let worker_host = self.worker_host.clone();
        let feedback_tx = self.feedback_tx.clone();

        tokio::spawn(async move {
            let outcome = match worker_host.execute(&process_id, &instruction).await {
                Ok(ExecuteOutcome::Completed(result)) => DelegationOutcome::Completed { result },
                Ok(ExecuteOutcome::ProcessNotFound) => DelegationOutcome::ProcessNotFound,
                Err(e) => DelegationOutcome::Completed {
                    result: RunResult {
                        value: None,
                        error: Some(format!("worker host error: {e}")),
                    },
                },
            };

            let event = HostEvent::DelegationOutcome {
                posix_time_millis: now_millis(),
                request_id,
                outcome,
            };
            if feedback_tx.send(RuntimeMessage::Event(event)).await.is_err() {
                debug!("Runtime stopped before delegation outcome was delivered");
            }
        });
    }
}

/// Current wall-clock time in posix milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FrontendDocuments;
    use crate::effects::EchoWorkerHost;

    fn start_runtime() -> (mpsc::Sender<RuntimeMessage>, CancellationToken) {
        let context = HostContext::new(
            FrontendDocuments::new("<html>plain</html>", "<html>inspector</html>"),
            "bootstrap",
        );
        let (runtime, tx) = HostRuntime::new(context, EchoWorkerHost::new());
        let shutdown = CancellationToken::new();
        tokio::spawn(runtime.run(shutdown.clone()));
        (tx, shutdown)
    }

    async fn send_request(
        tx: &mpsc::Sender<RuntimeMessage>,
        id: &str,
        path: &str,
        body: &[u8],
    ) -> HttpResponse {
        let (respond_to, response_rx) = oneshot::channel();
        tx.send(RuntimeMessage::Request {
            event: HttpRequestEvent {
                id: RequestId::new(id),
                uri_path: path.to_string(),
                body: body.to_vec(),
                posix_time_millis: now_millis(),
            },
            respond_to,
        })
        .await
        .unwrap();
        response_rx.await.unwrap()
    }

    #[tokio::test]
    async fn document_request_is_answered_immediately() {
        let (tx, shutdown) = start_runtime();

        let response = send_request(&tx, "r1", "/", b"").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"<html>plain</html>");

        shutdown.cancel();
    }

    #[tokio::test]
    async fn delegation_round_trips_through_the_echo_host() {
        let (tx, shutdown) = start_runtime();

        // First request kicks off provisioning as a side effect.
        let response = send_request(&tx, "r0", "/", b"").await;
        assert_eq!(response.status, 200);

        // Provisioning completes asynchronously; retry until the worker is up.
        let body = br#"{"request_type":"run_in_volatile_host","payload":"ping"}"#;
        let mut answered = None;
        for attempt in 0..50 {
            let response = send_request(&tx, &format!("r{attempt}-run"), "/api", body).await;
            let text = String::from_utf8_lossy(&response.body).to_string();
            if text.contains("run_in_volatile_host_complete") {
                answered = Some(text);
                break;
            }
            assert!(text.contains("setup_not_complete"));
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let text = answered.expect("delegation eventually completed");
        assert!(text.contains("ping"));

        shutdown.cancel();
    }

    #[tokio::test]
    async fn shutdown_message_stops_the_loop() {
        let context = HostContext::new(FrontendDocuments::built_in(), "bootstrap");
        let (runtime, tx) = HostRuntime::new(context, EchoWorkerHost::new());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(runtime.run(shutdown));

        tx.send(RuntimeMessage::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}
