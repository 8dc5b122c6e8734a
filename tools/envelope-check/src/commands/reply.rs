//! `reply` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use switchboard_message::{Envelope, ReplyOptions};
use tracing::debug;

use crate::envelopes;

#[derive(Debug, Args)]
pub struct ReplyCommand {
    /// File holding the user message to answer.
    file: PathBuf,

    /// Reply content.
    #[arg(long)]
    content: Option<String>,

    /// Close the session after this reply.
    #[arg(long)]
    close: bool,

    /// Address the whole group when the message came from one.
    #[arg(long)]
    group: bool,
}

impl ReplyCommand {
    pub fn run(self) -> Result<()> {
        let message = envelopes::load_user_message(&self.file)?;

        let mut options = ReplyOptions::default();
        if self.close {
            options = options.close_session();
        }

        let content = self.content.as_deref();
        let reply = if self.group {
            message.reply_group(content, options)
        } else {
            message.reply(content, options)
        }
        .context("failed to build reply")?;

        debug!(
            in_reply_to = %message.message_id(),
            message_id = %reply.message_id(),
            endpoint = reply.routing_endpoint(),
            "Reply built"
        );
        println!("{}", reply.to_json()?);
        Ok(())
    }
}
