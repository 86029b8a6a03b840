//! CLI module for MotionDesk.
//!
//! `motiondesk daemon` runs the daemon in the foreground. Every other command
//! talks to a running daemon over its IPC socket.

mod client;
mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::MotionDeskError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), MotionDeskError> {
    let cli = Cli::parse();
    cli.execute()
}
