//! Lens library exports for testing

pub mod api;
pub mod cli;
pub mod core;
pub mod inference;

#[cfg(test)]
pub mod test_support;
