//! CLI argument parsing and command dispatch.

pub mod args;
pub mod config;
pub mod report;
pub mod trend;

pub use args::{Cli, Commands, OutputFormat};
