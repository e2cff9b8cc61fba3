//! Session-history and backend status endpoints.

pub mod client;
pub mod types;

pub use client::{RenameOutcome, SessionClient};
pub use types::{AgentStatus, ApiError, Health};
