//! Worker lifecycle management.
//!
//! Pure transition functions guaranteeing eventual existence of exactly one
//! worker process. Liveness is never probed proactively; loss is detected
//! reactively when a delegation comes back `ProcessNotFound`, and recovery
//! is a full reset followed by re-provisioning on the next reconcile.

use tracing::{info, warn};

use crate::effects::Command;
use crate::state::HostState;
use crate::types::ProcessId;

/// Ensures a provisioning command is outstanding whenever no worker is known.
///
/// Called after every processed event. Emits at most one `ProvisionWorker`
/// command; the `provision_in_flight` gate keeps a single attempt outstanding
/// per gap, and retry throughput is bounded by the event arrival rate.
pub fn reconcile(state: &mut HostState, worker_program: &str) -> Vec<Command> {
    if state.setup.process_id.is_some() || state.setup.provision_in_flight {
        return Vec::new();
    }

    state.setup.provision_in_flight = true;
    vec![Command::ProvisionWorker {
        program: worker_program.to_string(),
    }]
}

/// Applies the outcome of a provisioning attempt.
///
/// Success records the new process id and clears advisory metadata; failure
/// is logged and leaves the record empty so the next reconcile retries.
pub fn apply_provision_outcome(state: &mut HostState, result: Result<ProcessId, String>) {
    state.setup.provision_in_flight = false;

    match result {
        Ok(process_id) => {
            info!(%process_id, "Volatile process provisioned");
            state.log_message(format!("Created volatile process {process_id}"));
            state.setup.process_id = Some(process_id);
            state.setup.last_provision_error = None;
        }
        Err(description) => {
            warn!(error = %description, "Volatile process provisioning failed");
            state.log_message(format!("Failed to create volatile process: {description}"));
            state.setup.last_provision_error = Some(description);
        }
    }
}

/// Resets the lifecycle record after the worker disappeared mid-flight.
///
/// The next reconcile re-provisions.
pub fn reset_after_process_loss(state: &mut HostState) {
    warn!("Volatile process not found, resetting setup");
    state.setup.reset();
    state.log_message("Volatile process not found, resetting setup");
}
