//! Command-line interface for promptforge.
//!
//! Provides commands for browsing and searching the prompt library,
//! validating record files, and running the test harness.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli};
