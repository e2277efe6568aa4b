//! Process-wide host state.
//!
//! A single [`HostState`] value exists per process. It is created once at
//! startup and mutated only by the sequencer in [`crate::host`]; there are no
//! ambient globals. The state is serializable so it can be exposed on an
//! observability endpoint.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{ProcessId, RequestId};

pub mod log;

pub use log::{DiagnosticLog, LogEntry};

/// Worker lifecycle record.
///
/// `process_id` is the only field that affects control flow; the rest is
/// advisory state carried for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSetup {
    /// The provisioned worker process, if one is currently known to exist.
    pub process_id: Option<ProcessId>,

    /// True while a provisioning command is outstanding. Gates the reconcile
    /// loop so at most one provisioning attempt is in flight per gap.
    pub provision_in_flight: bool,

    /// Advisory: description of the most recent provisioning failure.
    pub last_provision_error: Option<String>,
}

impl WorkerSetup {
    /// Resets the record to its initial empty state.
    ///
    /// Used on worker loss so the next reconcile re-provisions.
    pub fn reset(&mut self) {
        *self = WorkerSetup::default();
    }
}

/// The single mutable state value of the host process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostState {
    /// Posix milliseconds of the most recently processed event.
    /// Monotonically non-decreasing.
    pub clock_millis: i64,

    /// Worker lifecycle record.
    pub setup: WorkerSetup,

    /// HTTP request ids currently awaiting a worker result.
    /// Each id appears at most once.
    pub pending_requests: HashSet<RequestId>,

    /// Monotonically increasing count of delegations dispatched.
    /// Diagnostic only; never affects correctness.
    pub tasks_created: u64,

    /// Bounded ring of recent diagnostic messages.
    pub log: DiagnosticLog,
}

impl HostState {
    /// Creates the initial state: empty log, no pending requests, no worker.
    pub fn new() -> Self {
        HostState {
            clock_millis: 0,
            setup: WorkerSetup::default(),
            pending_requests: HashSet::new(),
            tasks_created: 0,
            log: DiagnosticLog::new(),
        }
    }

    /// Advances the clock to the event's reported time.
    ///
    /// The clock never moves backwards: a stale reported time leaves it
    /// unchanged.
    pub fn advance_clock(&mut self, posix_time_millis: i64) {
        self.clock_millis = self.clock_millis.max(posix_time_millis);
    }

    /// Appends one diagnostic message stamped with the current clock.
    pub fn log_message(&mut self, message: impl Into<String>) {
        self.log.append(self.clock_millis, message);
    }
}

impl Default for HostState {
    fn default() -> Self {
        Self::new()
    }
}
