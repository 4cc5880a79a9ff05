use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use waypoint_core::tdd;
use waypoint_core::types::TddPhase;
use waypoint_core::Store;

#[derive(Subcommand)]
pub enum TddSubcommand {
    /// Record the story's current TDD phase
    Set {
        id: String,
        /// red, green, refactor or verify
        phase: String,
    },
    /// Check whether moving to a phase follows the cycle (exit 1 when not)
    Check { id: String, phase: String },
}

pub fn run(root: &Path, subcmd: TddSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    match subcmd {
        TddSubcommand::Set { id, phase } => {
            let phase: TddPhase = phase.parse()?;
            tdd::set_tdd_phase(&store, &id, phase)
                .with_context(|| format!("failed to set TDD phase for '{id}'"))?;
            if json {
                print_json(&serde_json::json!({ "id": id, "phase": phase }))?;
            } else {
                println!("[{id}] TDD phase: {phase}");
            }
            Ok(())
        }
        TddSubcommand::Check { id, phase } => {
            let phase: TddPhase = phase.parse()?;
            let check = tdd::validate_tdd_transition(&store, &id, phase)
                .with_context(|| format!("failed to validate TDD transition for '{id}'"))?;
            if json {
                print_json(&check)?;
            } else {
                println!("[{id}] {}", check.describe());
            }
            if !check.valid {
                anyhow::bail!(
                    "invalid TDD transition for '{id}': expected {}",
                    check.expected
                );
            }
            Ok(())
        }
    }
}
