//! Host configuration.
//!
//! Everything the binary needs at startup: where to listen, how to spawn
//! worker processes, the bootstrap program, and optionally which files to
//! serve as the front-end document. All values have defaults so the binary
//! runs with no environment at all.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listen address.
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Default interpreter spawned per worker process.
const DEFAULT_WORKER_COMMAND: &str = "cat";

/// Default bootstrap program handed to a freshly spawned worker.
const DEFAULT_WORKER_PROGRAM: &str = "";

/// Configuration for the host process.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Address the HTTP server binds to.
    ///
    /// Default: `0.0.0.0:3000`. Configure via `VOLATILE_HOST_LISTEN_ADDR`.
    pub listen_addr: SocketAddr,

    /// Executable spawned for each worker process.
    ///
    /// Default: `cat` (a trivial echo worker). Configure via
    /// `VOLATILE_HOST_WORKER_COMMAND`.
    pub worker_command: String,

    /// Arguments passed to the worker executable.
    ///
    /// Configure via `VOLATILE_HOST_WORKER_ARGS` (whitespace-separated).
    pub worker_args: Vec<String>,

    /// Bootstrap program delivered to every provisioned worker.
    ///
    /// Configure via `VOLATILE_HOST_WORKER_PROGRAM`.
    pub worker_program: String,

    /// Path to the plain front-end document file, if any.
    ///
    /// Configure via `VOLATILE_HOST_DOCUMENT`. When unset, a built-in
    /// placeholder is served.
    pub document_path: Option<PathBuf>,

    /// Path to the inspector-enabled document file, if any.
    ///
    /// Configure via `VOLATILE_HOST_INSPECTOR_DOCUMENT`.
    pub inspector_document_path: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HostConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        HostConfig {
            listen_addr: DEFAULT_LISTEN_ADDR
                .parse()
                .expect("default listen address is valid"),
            worker_command: DEFAULT_WORKER_COMMAND.to_string(),
            worker_args: Vec::new(),
            worker_program: DEFAULT_WORKER_PROGRAM.to_string(),
            document_path: None,
            inspector_document_path: None,
        }
    }

    /// Creates a config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::new();

        let listen_addr = std::env::var("VOLATILE_HOST_LISTEN_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.listen_addr);

        let worker_command =
            std::env::var("VOLATILE_HOST_WORKER_COMMAND").unwrap_or(defaults.worker_command);

        let worker_args = std::env::var("VOLATILE_HOST_WORKER_ARGS")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let worker_program =
            std::env::var("VOLATILE_HOST_WORKER_PROGRAM").unwrap_or(defaults.worker_program);

        let document_path = std::env::var("VOLATILE_HOST_DOCUMENT").ok().map(PathBuf::from);
        let inspector_document_path = std::env::var("VOLATILE_HOST_INSPECTOR_DOCUMENT")
            .ok()
            .map(PathBuf::from);

        HostConfig {
            listen_addr,
            worker_command,
            worker_args,
            worker_program,
            document_path,
            inspector_document_path,
        }
    }
}
