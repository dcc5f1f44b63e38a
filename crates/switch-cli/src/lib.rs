//! Command-line wrapper around the switch runtime.
//!
//! Exposes the clap argument model and the runner used by the `switch-rs`
//! binary, backed by the JSON-file channel store under `--state-dir`.

pub mod cli_args;
pub mod cli_runner;

pub use cli_args::{Cli, CliCommand};
pub use cli_runner::run_cli;
