//! Volatile-process host — a backend gateway that serves a compiled
//! front-end document, accepts JSON API requests from it, and delegates a
//! subset of those requests to a supervised external worker process,
//! correlating each HTTP request with the eventual asynchronous result.
//!
//! All control logic lives in the sequencer ([`host::process_event`]); the
//! rest of the crate is the runtime shell that feeds it events and executes
//! the commands it returns.

pub mod api;
pub mod config;
pub mod document;
pub mod effects;
pub mod events;
pub mod host;
pub mod router;
pub mod runtime;
pub mod server;
pub mod state;
pub mod types;
