//! # Core Chat Logic
//!
//! Everything that decides what the conversation looks like. It knows
//! nothing about HTTP or terminals.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Message (model)      │
//!                    │  • Transcript (reducer) │
//!                    │  • update() (turns)     │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │ inference  │      │    api     │      │    cli     │
//!     │ (stream)   │      │ (sessions) │      │ (terminal) │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`message`]: the `Message` tagged union
//! - [`reducer`]: `Transcript::apply`, the event → message-list transition
//! - [`correlation`]: pairing tool uses with tool results
//! - [`tools`]: classifying tool payloads for display
//! - [`state`] / [`action`]: the turn handler's state and `update()`
//! - [`history`] / [`title`]: session sidebar and optimistic rename
//! - [`config`]: settings resolution

pub mod action;
pub mod config;
pub mod correlation;
pub mod history;
pub mod message;
pub mod reducer;
pub mod state;
pub mod title;
pub mod tools;
