//! Command-line interface for judgeforge.
//!
//! Provides commands for creating problems, attaching test data, and
//! inspecting the problem store.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli, Commands};
