use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use waypoint_core::{workflow, Store};

pub fn init(root: &Path, goal: &str, session: Option<&str>, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    let outcome = workflow::initialize(&store, goal, session).context("failed to initialize workflow")?;
    let wf = &outcome.workflow;

    if json {
        print_json(&serde_json::json!({
            "workflowId": wf.workflow_id,
            "goal": wf.goal,
            "resumed": outcome.resumed,
            "status": wf.status,
        }))?;
    } else if outcome.resumed {
        println!("Resumed workflow {}: {}", wf.workflow_id, wf.goal);
    } else {
        println!("Started workflow {}: {}", wf.workflow_id, wf.goal);
    }
    Ok(())
}

pub fn complete(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    let summary = workflow::complete(&store).context("failed to complete workflow")?;

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "Workflow {} completed: {}/{} stories in {}",
            summary.workflow_id, summary.completed_stories, summary.total_stories, summary.elapsed
        );
    }
    Ok(())
}

pub fn phase(root: &Path, phase: &str, agent: Option<&str>, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    workflow::update_phase(&store, phase, agent).context("failed to update phase")?;

    if json {
        print_json(&serde_json::json!({ "phase": phase, "agent": agent }))?;
    } else {
        match agent {
            Some(a) => println!("Phase: {phase} ({a})"),
            None => println!("Phase: {phase}"),
        }
    }
    Ok(())
}

pub fn timeout(
    root: &Path,
    story: Option<u32>,
    iteration: Option<u32>,
    clarification: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let store = Store::new(root);
    let timeouts = workflow::set_timeouts(&store, story, iteration, clarification)
        .context("failed to update timeouts")?;

    if json {
        print_json(&timeouts)?;
    } else {
        println!("Story:         {} min", timeouts.story_max_minutes);
        println!("Iteration:     {} min", timeouts.iteration_max_minutes);
        println!("Clarification: {} min", timeouts.clarification_wait_minutes);
    }
    Ok(())
}
