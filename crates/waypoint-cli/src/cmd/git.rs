use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use waypoint_core::config::Config;
use waypoint_core::{vcs, Store};

#[derive(Subcommand)]
pub enum GitSubcommand {
    /// Record HEAD as the last known-good commit
    Mark,
    /// Commit all changes and mark the result known-good
    Checkpoint {
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Stash local changes and hard-reset to the last known-good commit
    Rollback,
}

pub fn run(root: &Path, subcmd: GitSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = Store::new(root);

    match subcmd {
        GitSubcommand::Mark => {
            let commit = vcs::mark_working_state(&store, &config.vcs)
                .context("failed to mark working state")?;
            report_commit(commit, "could not read HEAD", json)
        }
        GitSubcommand::Checkpoint { message } => {
            let commit = vcs::checkpoint_commit(&store, &config.vcs, &message.join(" "))
                .context("failed to create checkpoint commit")?;
            report_commit(commit, "checkpoint commit did not complete", json)
        }
        GitSubcommand::Rollback => {
            let rolled_back = vcs::rollback_to_checkpoint(&store, &config.vcs)
                .context("failed to roll back")?;
            if json {
                print_json(&serde_json::json!({ "rolledBack": rolled_back }))?;
            }
            if !rolled_back {
                anyhow::bail!("rollback did not happen (no known-good commit, or git failed)");
            }
            if !json {
                println!("Rolled back to last known-good commit.");
            }
            Ok(())
        }
    }
}

fn report_commit(commit: Option<String>, failure: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({ "commit": commit }))?;
    }
    let Some(commit) = commit else {
        anyhow::bail!("{failure}");
    };
    if !json {
        println!("{commit}");
    }
    Ok(())
}
