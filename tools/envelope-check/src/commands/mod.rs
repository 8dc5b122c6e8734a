//! CLI commands.

mod ack;
mod reply;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Validate switchboard envelopes and derive replies and events from them.
#[derive(Debug, Parser)]
#[command(name = "envelope-check")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate envelope files or directories of them.
    Validate(validate::ValidateCommand),

    /// Print the reply to a user message.
    Reply(reply::ReplyCommand),

    /// Print an ack event for a user message.
    Ack(ack::AckCommand),
}

impl Cli {
    /// Run the command, returning the process exit status.
    pub fn run(self) -> Result<i32> {
        match self.command {
            Commands::Validate(cmd) => cmd.run(),
            Commands::Reply(cmd) => cmd.run().map(|()| 0),
            Commands::Ack(cmd) => cmd.run().map(|()| 0),
        }
    }
}
