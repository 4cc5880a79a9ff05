use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use waypoint_core::Store;

#[derive(Subcommand)]
pub enum IterationSubcommand {
    /// Bump the counter and print the new value
    Increment,
    /// Print the current value
    Show,
    /// Reset the counter to zero
    Reset,
}

pub fn run(root: &Path, subcmd: IterationSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    let count = match subcmd {
        IterationSubcommand::Increment => store
            .increment_iteration()
            .context("failed to write iteration counter")?,
        IterationSubcommand::Show => store.iteration_count(),
        IterationSubcommand::Reset => {
            store.reset_iterations();
            0
        }
    };

    if json {
        print_json(&serde_json::json!({ "iteration": count }))?;
    } else {
        println!("{count}");
    }
    Ok(())
}
