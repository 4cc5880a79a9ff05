use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use waypoint_core::clarification;
use waypoint_core::Store;

#[derive(Subcommand)]
pub enum ClarifySubcommand {
    /// Record a question and its answer
    Add {
        question: String,
        answer: String,
        /// Defaults to the workflow's current phase
        #[arg(long)]
        phase: Option<String>,
        #[arg(long, default_value = "general")]
        category: String,
    },
    /// List clarifications, optionally filtered
    List {
        #[arg(long)]
        phase: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: ClarifySubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    match subcmd {
        ClarifySubcommand::Add {
            question,
            answer,
            phase,
            category,
        } => {
            let record = clarification::add_clarification(
                &store,
                &question,
                &answer,
                phase.as_deref(),
                &category,
            )
            .context("failed to record clarification")?;
            if json {
                print_json(&record)?;
            } else {
                println!("Recorded clarification ({}/{})", record.phase, record.category);
            }
        }
        ClarifySubcommand::List { phase, category } => {
            let records =
                clarification::clarifications(&store, phase.as_deref(), category.as_deref());
            if json {
                print_json(&records)?;
            } else if records.is_empty() {
                println!("No clarifications.");
            } else {
                for c in &records {
                    println!("[{}/{}] Q: {}", c.phase, c.category, c.question);
                    println!("    A: {}", c.answer);
                }
            }
        }
    }
    Ok(())
}
