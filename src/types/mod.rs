//! Core domain types shared across the host.

mod ids;

pub use ids::{ProcessId, RequestId};
