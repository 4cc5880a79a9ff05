use crate::exit::ExitSignal;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use waypoint_core::blocker;
use waypoint_core::types::{Severity, WorkflowStatus};
use waypoint_core::Store;

#[derive(Subcommand)]
pub enum BlockerSubcommand {
    /// Record a blocker; the workflow becomes blocked
    Add {
        #[arg(required = true)]
        description: Vec<String>,
        /// low, medium, high or critical
        #[arg(long, default_value = "medium")]
        severity: String,
    },
    /// Resolve a blocker by its index (see `blocker list`)
    Resolve { index: usize },
    /// List all blockers
    List,
    /// Exit 3 while the workflow is blocked
    Check,
}

pub fn run(root: &Path, subcmd: BlockerSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    match subcmd {
        BlockerSubcommand::Add {
            description,
            severity,
        } => {
            let severity: Severity = severity.parse()?;
            let description = description.join(" ");
            let index = blocker::add_blocker(&store, &description, severity)
                .context("failed to add blocker")?;
            if json {
                print_json(&serde_json::json!({
                    "index": index,
                    "description": description,
                    "severity": severity,
                }))?;
            } else {
                println!("Blocker #{index} [{severity}]: {description}");
            }
            Ok(())
        }
        BlockerSubcommand::Resolve { index } => {
            let status = blocker::resolve_blocker(&store, index)
                .with_context(|| format!("failed to resolve blocker #{index}"))?;
            if json {
                print_json(&serde_json::json!({ "index": index, "workflowStatus": status }))?;
            } else {
                println!("Resolved blocker #{index}; workflow is {status}");
            }
            Ok(())
        }
        BlockerSubcommand::List => {
            let wf = store.require().context("failed to load workflow")?;
            if json {
                return print_json(&wf.blockers);
            }
            if wf.blockers.is_empty() {
                println!("No blockers.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = wf
                .blockers
                .iter()
                .enumerate()
                .map(|(i, b)| {
                    vec![
                        i.to_string(),
                        b.severity.to_string(),
                        if b.resolved { "resolved" } else { "open" }.to_string(),
                        b.description.clone(),
                    ]
                })
                .collect();
            print_table(&["#", "SEVERITY", "STATE", "DESCRIPTION"], &rows);
            Ok(())
        }
        BlockerSubcommand::Check => {
            let wf = store.require().context("failed to load workflow")?;
            let open = wf.open_blockers().len();
            if json {
                print_json(&serde_json::json!({ "status": wf.status, "openBlockers": open }))?;
            } else {
                println!("{} ({open} open blocker(s))", wf.status);
            }
            if wf.status == WorkflowStatus::Blocked {
                return Err(ExitSignal::Blocked { open }.into());
            }
            Ok(())
        }
    }
}

pub fn await_user(
    root: &Path,
    description: &str,
    check_command: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let store = Store::new(root);
    blocker::await_user(&store, description, check_command)
        .context("failed to record user intervention")?;
    if json {
        print_json(&serde_json::json!({
            "status": WorkflowStatus::AwaitingUser,
            "description": description,
            "checkCommand": check_command,
        }))?;
    } else {
        println!("Awaiting user: {description}");
        if let Some(cmd) = check_command {
            println!("Verify with: {cmd}");
        }
        println!("Resume with: waypoint user-fix-complete");
    }
    Ok(())
}

pub fn user_fix_complete(root: &Path, notes: Option<&str>, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    let resolved =
        blocker::user_fix_complete(&store, notes).context("failed to resume workflow")?;
    if json {
        print_json(&serde_json::json!({
            "status": WorkflowStatus::InProgress,
            "interventionResolved": resolved,
        }))?;
    } else if resolved {
        println!("User fix recorded; workflow resumed.");
    } else {
        println!("No open intervention; workflow resumed.");
    }
    Ok(())
}
