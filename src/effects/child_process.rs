//! Worker host backed by real child processes.
//!
//! Each provisioned worker is an OS child process running the configured
//! interpreter command. The bootstrap program is delivered as the first line
//! on the child's stdin (JSON-string encoded so multi-line programs stay on
//! one wire line), and each delegated instruction is one further line. The
//! child answers one line per instruction.
//!
//! # Reply format
//!
//! A reply line that parses as a [`RunResult`] object is taken as-is; any
//! other line is wrapped verbatim as the result value. This keeps trivial
//! workers (e.g. `cat`) usable without a JSON layer.
//!
//! # Process loss
//!
//! A write or read failure on the child's pipes means the process is gone.
//! The entry is dropped from the table and the outcome is `ProcessNotFound`,
//! which the lifecycle manager turns into a re-provision.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::RunResult;
use crate::types::ProcessId;

use super::interpreter::{ExecuteOutcome, WorkerHost};

/// Errors from provisioning a child worker process.
#[derive(Debug, Error)]
pub enum ChildProcessError {
    /// The interpreter command could not be spawned.
    #[error("failed to spawn worker command: {0}")]
    Spawn(#[source] std::io::Error),

    /// The spawned child did not expose the expected stdio pipes.
    #[error("worker process is missing a stdio pipe: {0}")]
    MissingPipe(&'static str),

    /// The bootstrap program could not be delivered to the child.
    #[error("failed to deliver bootstrap program: {0}")]
    Bootstrap(#[source] std::io::Error),
}

/// A live child worker and its wire handles.
struct WorkerProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// A [`WorkerHost`] that spawns and talks to OS child processes.
///
/// Cloning is cheap; clones share the process table.
#[derive(Clone)]
pub struct ChildProcessHost {
    /// Interpreter executable.
    program: String,

    /// Arguments passed to the interpreter.
    args: Vec<String>,

    /// Live processes keyed by id.
    processes: Arc<Mutex<HashMap<ProcessId, WorkerProcess>>>,

    /// Counter for generating process ids.
    next_id: Arc<AtomicU64>,
}

impl ChildProcessHost {
    /// Creates a host that spawns `program` with `args` for each worker.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        ChildProcessHost {
            program: program.into(),
            args,
            processes: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Number of live worker processes.
    pub async fn process_count(&self) -> usize {
        self.processes.lock().await.len()
    }

    /// Terminates a worker process and removes it from the table.
    ///
    /// A missing id is not an error; termination is idempotent.
    pub async fn terminate(&self, process_id: &ProcessId) {
        if let Some(mut process) = self.processes.lock().await.remove(process_id) {
            if let Err(e) = process.child.start_kill() {
                warn!(%process_id, error = %e, "Failed to kill worker process");
            }
        }
    }

    fn allocate_id(&self) -> ProcessId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        ProcessId::new(format!("wp-{n}"))
    }
}

impl WorkerHost for ChildProcessHost {
    type Error = ChildProcessError;

    async fn provision(&self, program: &str) -> Result<ProcessId, Self::Error> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ChildProcessError::Spawn)?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or(ChildProcessError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ChildProcessError::MissingPipe("stdout"))?;

        // Bootstrap program as the first wire line, JSON-string encoded so a
        // multi-line program stays on one line.
        let bootstrap_line = serde_json::to_string(program)
            .expect("string serialization is infallible");
        stdin
            .write_all(bootstrap_line.as_bytes())
            .await
            .map_err(ChildProcessError::Bootstrap)?;
        stdin
            .write_all(b"\n")
            .await
            .map_err(ChildProcessError::Bootstrap)?;

        let process_id = self.allocate_id();
        debug!(%process_id, "Provisioned worker child process");

        self.processes.lock().await.insert(
            process_id.clone(),
            WorkerProcess {
                child,
                stdin,
                stdout: BufReader::new(stdout),
            },
        );

        Ok(process_id)
    }

    async fn execute(
        &self,
        process_id: &ProcessId,
        instruction: &str,
    ) -> Result<ExecuteOutcome, Self::Error> {
        let mut processes = self.processes.lock().await;

        let Some(process) = processes.get_mut(process_id) else {
            debug!(%process_id, "Execute addressed an unknown worker process");
            return Ok(ExecuteOutcome::ProcessNotFound);
        };

        // A child that already exited counts as not found.
        if let Ok(Some(status)) = process.child.try_wait() {
            debug!(%process_id, %status, "Worker process exited");
            processes.remove(process_id);
            return Ok(ExecuteOutcome::ProcessNotFound);
        }

        let instruction_line =
            serde_json::to_string(instruction).expect("string serialization is infallible");

        let write_result = async {
            process.stdin.write_all(instruction_line.as_bytes()).await?;
            process.stdin.write_all(b"\n").await?;
            process.stdin.flush().await
        }
        .await;

        if let Err(e) = write_result {
            warn!(%process_id, error = %e, "Worker process pipe broken on write");
            processes.remove(process_id);
            return Ok(ExecuteOutcome::ProcessNotFound);
        }

        let mut reply = String::new();
        match process.stdout.read_line(&mut reply).await {
            Ok(0) => {
                warn!(%process_id, "Worker process closed stdout");
                processes.remove(process_id);
                Ok(ExecuteOutcome::ProcessNotFound)
            }
            Ok(_) => Ok(ExecuteOutcome::Completed(parse_reply(reply.trim_end()))),
            Err(e) => {
                warn!(%process_id, error = %e, "Worker process pipe broken on read");
                processes.remove(process_id);
                Ok(ExecuteOutcome::ProcessNotFound)
            }
        }
    }
}

/// Parses one reply line from a worker.
fn parse_reply(line: &str) -> RunResult {
    match serde_json::from_str::<RunResult>(line) {
        Ok(result) => result,
        Err(_) => RunResult {
            value: Some(line.to_string()),
            error: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reply_accepts_structured_result() {
        let result = parse_reply(r#"{"value":"42","error":null}"#);
        assert_eq!(result.value.as_deref(), Some("42"));
        assert!(result.error.is_none());
    }

    #[test]
    fn parse_reply_wraps_raw_lines() {
        let result = parse_reply("hello");
        assert_eq!(result.value.as_deref(), Some("hello"));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn execute_on_unknown_process_is_not_found() {
        let host = ChildProcessHost::new("cat", vec![]);
        let outcome = host
            .execute(&ProcessId::new("wp-missing"), "noop")
            .await
            .unwrap();
        assert_eq!(outcome, ExecuteOutcome::ProcessNotFound);
    }

    #[tokio::test]
    async fn cat_worker_echoes_lines() {
        // `cat` echoes the bootstrap line first, then each instruction line.
        let host = ChildProcessHost::new("cat", vec![]);
        let process_id = host.provision("bootstrap").await.unwrap();
        assert_eq!(host.process_count().await, 1);

        // First reply is the echoed bootstrap line.
        let outcome = host.execute(&process_id, "ignored").await.unwrap();
        let ExecuteOutcome::Completed(result) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(result.value.as_deref(), Some("\"bootstrap\""));

        host.terminate(&process_id).await;
        assert_eq!(host.process_count().await, 0);
    }

    #[tokio::test]
    async fn vanished_process_reports_not_found() {
        // `true` exits immediately, so the pipes break on first use.
        let host = ChildProcessHost::new("true", vec![]);
        let process_id = match host.provision("bootstrap").await {
            Ok(id) => id,
            // The child may exit before the bootstrap line is written.
            Err(ChildProcessError::Bootstrap(_)) => return,
            Err(e) => panic!("unexpected provision error: {e}"),
        };

        let outcome = host.execute(&process_id, "noop").await.unwrap();
        assert_eq!(outcome, ExecuteOutcome::ProcessNotFound);
        assert_eq!(host.process_count().await, 0);
    }
}
