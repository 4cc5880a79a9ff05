use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use waypoint_core::config::Config;
use waypoint_core::Store;

#[derive(Subcommand)]
pub enum ProgressSubcommand {
    /// Append a line to the progress log
    Log {
        #[arg(required = true)]
        message: Vec<String>,
        #[arg(long)]
        story: Option<String>,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Print the most recent entries
    Tail {
        /// Defaults to progress.recent_lines
        #[arg(long, short = 'n')]
        lines: Option<usize>,
    },
    /// Drop all but the most recent entries
    Trim {
        /// Defaults to progress.trim_lines
        #[arg(long)]
        max: Option<usize>,
    },
}

pub fn run(root: &Path, subcmd: ProgressSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    let config = Config::load(root).context("failed to load config")?;
    match subcmd {
        ProgressSubcommand::Log {
            message,
            story,
            agent,
        } => {
            store.log_progress(&message.join(" "), story.as_deref(), agent.as_deref());
            if json {
                print_json(&serde_json::json!({ "logged": true }))?;
            }
        }
        ProgressSubcommand::Tail { lines } => {
            let lines = store.recent_progress(lines.unwrap_or(config.progress.recent_lines));
            if json {
                print_json(&lines)?;
            } else {
                for line in &lines {
                    println!("{line}");
                }
            }
        }
        ProgressSubcommand::Trim { max } => {
            let max = max.unwrap_or(config.progress.trim_lines);
            let trimmed = store
                .trim_progress(max)
                .context("failed to trim progress log")?;
            if json {
                print_json(&serde_json::json!({ "trimmed": trimmed, "maxLines": max }))?;
            } else if trimmed {
                println!("Trimmed progress log to {max} lines.");
            } else {
                println!("Progress log already within {max} lines.");
            }
        }
    }
    Ok(())
}
