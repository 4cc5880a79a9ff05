use crate::output::{print_json, yes_no};
use anyhow::Context;
use std::path::Path;
use waypoint_core::config::Config;
use waypoint_core::summary::{self, Summary};
use waypoint_core::Store;

fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).context("failed to load .claude/waypoint.yaml")
}

pub fn status(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let store = Store::new(root);
    let Some(s) = summary::summary(&store, &config) else {
        anyhow::bail!("no active workflow: run 'waypoint init <goal>'");
    };

    if json {
        return print_json(&s);
    }
    print_summary(&s);
    Ok(())
}

fn print_summary(s: &Summary) {
    let p = &s.progress;
    println!("Workflow:   {} ({})", s.workflow_id, s.status);
    println!("Goal:       {}", s.goal);
    println!("Phase:      {} / {}", s.current_phase, s.current_agent);
    println!("Elapsed:    {} ({} iterations)", s.elapsed, s.iterations);
    println!(
        "Stories:    {}/{} completed ({}%), {} active, {} pending, {} blocked",
        p.completed, p.total, p.percentage, p.in_progress, p.pending, p.blocked
    );
    match &s.current_story {
        Some(cur) => println!(
            "Current:    [{}] {} ({}, attempt {})",
            cur.id, cur.title, cur.status, cur.attempts
        ),
        None => println!("Current:    none"),
    }
    println!("Review due: {}", yes_no(s.checkpoint_due));
    println!("Report due: {}", yes_no(s.progress_report_due));
    if !s.blockers.is_empty() {
        println!();
        println!("Blockers:");
        for b in &s.blockers {
            println!("  - [{}] {}", b.severity, b.description);
        }
    }
    if let Some(ui) = &s.user_intervention {
        println!();
        println!("Awaiting user: {}", ui.description);
        if let Some(check) = &ui.check_command {
            println!("  check with: {check}");
        }
    }
}

pub fn recover(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let store = Store::new(root);
    let info = summary::recovery_info(&store, &config);

    if json {
        return print_json(&info);
    }
    match &info.summary {
        Some(s) => print_summary(s),
        None => println!("No active workflow."),
    }
    if let Some(commit) = &info.last_working_commit {
        println!("Last good:  {commit}");
    }
    if !info.recent_progress.is_empty() {
        println!();
        println!("Recent progress:");
        for line in &info.recent_progress {
            println!("  {line}");
        }
    }
    Ok(())
}

pub fn context(root: &Path) -> anyhow::Result<()> {
    let config = load_config(root)?;
    println!("{}", summary::compact_context(&Store::new(root), &config));
    Ok(())
}
