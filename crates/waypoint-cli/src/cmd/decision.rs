use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use waypoint_core::decision;
use waypoint_core::Store;

#[derive(Subcommand)]
pub enum DecisionSubcommand {
    /// Record an accepted decision
    Add {
        title: String,
        choice: String,
        rationale: String,
    },
    /// List recorded decisions
    List,
}

pub fn run(root: &Path, subcmd: DecisionSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    match subcmd {
        DecisionSubcommand::Add {
            title,
            choice,
            rationale,
        } => {
            let d = decision::add_decision(&store, &title, &choice, &rationale)
                .context("failed to record decision")?;
            if json {
                print_json(&d)?;
            } else {
                println!("{}: {} -> {}", d.id, d.title, d.choice);
            }
        }
        DecisionSubcommand::List => {
            let decisions = store.require().context("failed to load workflow")?.decisions;
            if json {
                print_json(&decisions)?;
            } else if decisions.is_empty() {
                println!("No decisions.");
            } else {
                let rows: Vec<Vec<String>> = decisions
                    .iter()
                    .map(|d| vec![d.id.clone(), d.title.clone(), d.choice.clone()])
                    .collect();
                print_table(&["ID", "TITLE", "CHOICE"], &rows);
            }
        }
    }
    Ok(())
}
