use crate::output::{print_json, yes_no};
use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use std::path::Path;
use waypoint_core::story;
use waypoint_core::types::VerificationCheck;
use waypoint_core::Store;

#[derive(Clone, Copy, ValueEnum)]
pub enum Outcome {
    Pass,
    Fail,
}

#[derive(Subcommand)]
pub enum VerifySubcommand {
    /// Record one verification result
    Record {
        id: String,
        /// testsPass, coverageMet, reviewApproved or securityCleared
        check: String,
        #[arg(value_enum)]
        outcome: Outcome,
        #[arg(long)]
        details: Option<String>,
    },
    /// Show the verification gates for a story
    Show { id: String },
}

pub fn run(root: &Path, subcmd: VerifySubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    match subcmd {
        VerifySubcommand::Record {
            id,
            check,
            outcome,
            details,
        } => record(&store, &id, &check, outcome, details.as_deref(), json),
        VerifySubcommand::Show { id } => show(&store, &id, json),
    }
}

fn record(
    store: &Store,
    id: &str,
    check: &str,
    outcome: Outcome,
    details: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let check: VerificationCheck = check.parse()?;
    let passed = matches!(outcome, Outcome::Pass);
    let result = story::update_verification(store, id, check, passed, details)
        .with_context(|| format!("failed to record {check} for '{id}'"))?;

    if json {
        print_json(&result)?;
    } else {
        println!(
            "[{id}] {check}: {}",
            if passed { "passed" } else { "FAILED" }
        );
        if result.revoked {
            println!("[{id}] completion revoked -> verified");
        }
        if result.promoted {
            println!("[{id}] all checks passed -> verified");
        }
    }
    Ok(())
}

fn show(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let s = story::get(store, id).with_context(|| format!("failed to load story '{id}'"))?;
    let checks = &s.verification_checks;

    if json {
        return print_json(&serde_json::json!({
            "id": s.id,
            "status": s.status,
            "checks": checks,
            "allPassed": checks.all_passed(),
        }));
    }
    for check in VerificationCheck::all() {
        println!("{:<16} {}", check.as_str(), yes_no(checks.get(*check)));
    }
    Ok(())
}
