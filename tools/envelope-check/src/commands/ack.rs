//! `ack` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use switchboard_message::{Envelope, Event};
use tracing::debug;

use crate::envelopes;

#[derive(Debug, Args)]
pub struct AckCommand {
    /// File holding the user message being acknowledged.
    file: PathBuf,

    /// Id the transport assigned to the sent message.
    #[arg(long)]
    sent_message_id: String,
}

impl AckCommand {
    pub fn run(self) -> Result<()> {
        let message = envelopes::load_user_message(&self.file)?;
        let mut event = Event::ack(message.message_id().clone(), self.sent_message_id)
            .context("failed to build ack")?;
        event.set_routing_endpoint(Some(message.routing_endpoint()));

        debug!(
            user_message_id = %message.message_id(),
            event_id = %event.event_id(),
            "Ack built"
        );
        println!("{}", event.to_json()?);
        Ok(())
    }
}
