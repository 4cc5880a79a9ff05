use crate::exit::ExitSignal;
use crate::output::print_json;
use anyhow::Context;
use chrono::Utc;
use std::path::Path;
use waypoint_core::alert;
use waypoint_core::config::Config;
use waypoint_core::Store;

pub fn alerts(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = Store::new(root);
    let alerts = alert::check_alerts(&store, &config).context("failed to check alerts")?;

    if json {
        print_json(&alerts)?;
    } else if alerts.is_empty() {
        println!("No alerts.");
    } else {
        for a in &alerts {
            println!("[{}] {}", a.severity, a.message);
        }
    }
    Ok(())
}

/// Human-review cadence: exit 2 while due, `--ack` resets it.
pub fn checkpoint(root: &Path, ack: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = Store::new(root);

    if ack {
        alert::record_human_review(&store).context("failed to record human review")?;
        if json {
            print_json(&serde_json::json!({ "due": false, "acknowledged": true }))?;
        } else {
            println!("Human review recorded.");
        }
        return Ok(());
    }

    let wf = store.require().context("failed to load workflow")?;
    let due = alert::checkpoint_due(&wf, &config.alerts);
    if json {
        print_json(&serde_json::json!({
            "due": due,
            "storiesSinceReview": wf.checkpoints.stories_since_review,
            "lastHumanReview": wf.checkpoints.last_human_review,
        }))?;
    } else {
        println!(
            "{} stories completed since last review (every {})",
            wf.checkpoints.stories_since_review, config.alerts.stories_per_review
        );
    }

    if due {
        return Err(ExitSignal::CheckpointDue.into());
    }
    Ok(())
}

/// Progress-report cadence: exit 2 while due, `--ack` resets it.
pub fn report(root: &Path, ack: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = Store::new(root);

    if ack {
        alert::record_progress_report(&store).context("failed to record progress report")?;
        if json {
            print_json(&serde_json::json!({ "due": false, "acknowledged": true }))?;
        } else {
            println!("Progress report recorded.");
        }
        return Ok(());
    }

    let wf = store.require().context("failed to load workflow")?;
    let due = alert::progress_report_due(&wf, &config.alerts, Utc::now());
    if json {
        print_json(&serde_json::json!({
            "due": due,
            "storiesSinceReport": wf.checkpoints.stories_since_report,
            "lastProgressReport": wf.checkpoints.last_progress_report,
        }))?;
    } else {
        println!(
            "{} stories completed since last report, last report at {}",
            wf.checkpoints.stories_since_report,
            wf.checkpoints.last_progress_report.format("%Y-%m-%d %H:%M UTC")
        );
    }

    if due {
        return Err(ExitSignal::ReportDue.into());
    }
    Ok(())
}
