//! `validate` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use crate::envelopes::{self, Checked};
use crate::output;

#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// JSON files, or directories searched for `*.json`.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Stop at the first invalid envelope.
    #[arg(long, env = "SWITCHBOARD_FAIL_FAST")]
    fail_fast: bool,
}

/// Envelope counts from one validation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    passed: usize,
    failed: usize,
}

impl ValidateCommand {
    pub fn run(self) -> Result<i32> {
        let tally = self.check()?;
        output::print_summary(tally.passed, tally.failed);
        Ok(if tally.failed == 0 { 0 } else { 1 })
    }

    fn check(&self) -> Result<Tally> {
        let files = envelopes::discover(&self.paths)?;
        info!(file_count = files.len(), "Validating envelopes");

        let mut tally = Tally::default();
        for path in &files {
            for checked in envelopes::check_file(path)? {
                if report(&checked) {
                    tally.passed += 1;
                } else {
                    tally.failed += 1;
                    if self.fail_fast {
                        return Ok(tally);
                    }
                }
            }
        }
        Ok(tally)
    }
}

fn report(checked: &Checked) -> bool {
    match &checked.result {
        Ok(envelope) => {
            info!(
                path = %checked.source,
                message_type = envelope.message_type(),
                id = envelope.id(),
                "Envelope valid"
            );
            output::print_ok(&checked.source, envelope.message_type(), envelope.id());
            true
        }
        Err(err) => {
            warn!(path = %checked.source, error = %err, "Envelope invalid");
            output::print_failure(&checked.source, &err.to_string());
            false
        }
    }
}
