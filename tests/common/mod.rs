//! Shared helpers for integration tests.
//!
//! - `log_capture`: collects tracing events emitted by library code
//! - `scenario`: a throwaway host (fake `/proc`, ledger, outbox, config file)
//!   for driving the binary

pub mod log_capture;
pub mod scenario;
