//! Worker host interpreter trait.
//!
//! The sequencer describes worker operations as data ([`super::Command`]);
//! an interpreter executes them against an actual worker host. The
//! trait-based design enables:
//! - Mock interpreters for testing
//! - A logging echo interpreter for dry-run operation
//! - The real child-process host in [`super::child_process`]

use std::future::Future;

use tracing::debug;

use crate::api::RunResult;
use crate::types::ProcessId;

/// Outcome of executing an instruction in a worker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// The worker ran the instruction and produced a result.
    Completed(RunResult),

    /// No process with the given id exists (never provisioned, crashed, or
    /// exited). The lifecycle manager reacts by re-provisioning.
    ProcessNotFound,
}

/// Executes provisioning and delegation commands against a worker host.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct FixedWorkerHost;
///
/// impl WorkerHost for FixedWorkerHost {
///     type Error = std::convert::Infallible;
///
///     async fn provision(&self, _program: &str) -> Result<ProcessId, Self::Error> {
///         Ok(ProcessId::new("p-fixed"))
///     }
///
///     async fn execute(
///         &self,
///         _process_id: &ProcessId,
///         instruction: &str,
///     ) -> Result<ExecuteOutcome, Self::Error> {
///         Ok(ExecuteOutcome::Completed(RunResult {
///             value: Some(instruction.to_uppercase()),
///             error: None,
///         }))
///     }
/// }
/// ```
pub trait WorkerHost {
    /// The error type for provisioning failures. Execution failures of the
    /// instruction itself are not errors; they travel inside
    /// [`ExecuteOutcome::Completed`].
    type Error: std::fmt::Display;

    /// Provisions a new worker process running `program`.
    fn provision(
        &self,
        program: &str,
    ) -> impl Future<Output = Result<ProcessId, Self::Error>> + Send;

    /// Runs an instruction in an existing worker process.
    fn execute(
        &self,
        process_id: &ProcessId,
        instruction: &str,
    ) -> impl Future<Output = Result<ExecuteOutcome, Self::Error>> + Send;
}

/// A worker host that logs operations and echoes instructions back.
///
/// Used in tests and dry-run mode: provisioning always succeeds with a
/// deterministic process id, and execution returns the instruction verbatim
/// as the result value.
#[derive(Debug, Clone, Default)]
pub struct EchoWorkerHost;

impl EchoWorkerHost {
    pub fn new() -> Self {
        EchoWorkerHost
    }
}

impl WorkerHost for EchoWorkerHost {
    type Error = std::convert::Infallible;

    fn provision(
        &self,
        program: &str,
    ) -> impl Future<Output = Result<ProcessId, Self::Error>> + Send {
        debug!(
            program_len = program.len(),
            "EchoWorkerHost: provision (not executed)"
        );
        async { Ok(ProcessId::new("echo-worker")) }
    }

    fn execute(
        &self,
        process_id: &ProcessId,
        instruction: &str,
    ) -> impl Future<Output = Result<ExecuteOutcome, Self::Error>> + Send {
        debug!(%process_id, "EchoWorkerHost: execute (echoing instruction)");
        let value = instruction.to_string();
        async move {
            Ok(ExecuteOutcome::Completed(RunResult {
                value: Some(value),
                error: None,
            }))
        }
    }
}
