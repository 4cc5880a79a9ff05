use crate::config::{AlertThresholds, Config};
use crate::error::Result;
use crate::store::Store;
use crate::story::story_timeout;
use crate::workflow::{format_elapsed, Workflow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ProgressReportDue,
    ExtendedWorkflow,
    VeryLongWorkflow,
    StoryTimeout,
    HighIterationCount,
    HumanReviewDue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind, severity: AlertSeverity, message: String) -> Self {
        Self {
            kind,
            severity,
            message,
        }
    }
}

pub fn progress_report_due(wf: &Workflow, thresholds: &AlertThresholds, now: DateTime<Utc>) -> bool {
    let since = (now - wf.checkpoints.last_progress_report).num_minutes();
    since >= thresholds.report_interval_minutes
        || wf.checkpoints.stories_since_report >= thresholds.stories_per_report
}

/// Human-review cadence, counted in completed stories.
pub fn checkpoint_due(wf: &Workflow, thresholds: &AlertThresholds) -> bool {
    wf.checkpoints.stories_since_review >= thresholds.stories_per_review
}

/// Every alert that currently applies. Pure; the caller decides whether to persist.
///
/// The two duration alerts escalate exclusively: past the very-long threshold
/// only the critical alert is raised.
pub fn evaluate(
    wf: &Workflow,
    iterations: u64,
    thresholds: &AlertThresholds,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if progress_report_due(wf, thresholds, now) {
        let since = (now - wf.checkpoints.last_progress_report).num_minutes();
        alerts.push(Alert::new(
            AlertKind::ProgressReportDue,
            AlertSeverity::Info,
            format!(
                "Progress report due ({} since last report, {} stories completed since)",
                format_elapsed(since),
                wf.checkpoints.stories_since_report
            ),
        ));
    }

    let elapsed = wf.elapsed_minutes(now);
    if elapsed >= thresholds.very_long_workflow_minutes {
        alerts.push(Alert::new(
            AlertKind::VeryLongWorkflow,
            AlertSeverity::Critical,
            format!(
                "Workflow running for {}; consider splitting the goal",
                format_elapsed(elapsed)
            ),
        ));
    } else if elapsed >= thresholds.extended_workflow_minutes {
        alerts.push(Alert::new(
            AlertKind::ExtendedWorkflow,
            AlertSeverity::Warning,
            format!("Workflow running for {}", format_elapsed(elapsed)),
        ));
    }

    if let Some(story) = wf.next_story().filter(|s| s.status.is_active()) {
        let timeout = story_timeout(story, &wf.timeouts, now);
        if timeout.exceeded {
            alerts.push(Alert::new(
                AlertKind::StoryTimeout,
                AlertSeverity::Warning,
                format!(
                    "Story {} has been active {:.1} min (limit {} min)",
                    story.id, timeout.elapsed_minutes, timeout.max_minutes
                ),
            ));
        }
    }

    if iterations >= thresholds.high_iteration_count {
        alerts.push(Alert::new(
            AlertKind::HighIterationCount,
            AlertSeverity::Warning,
            format!("{iterations} iterations recorded"),
        ));
    }

    if checkpoint_due(wf, thresholds) {
        alerts.push(Alert::new(
            AlertKind::HumanReviewDue,
            AlertSeverity::Warning,
            format!(
                "Human review due ({} stories completed since last review)",
                wf.checkpoints.stories_since_review
            ),
        ));
    }

    alerts
}

/// Recompute alerts, overwrite the workflow's `alerts` field, and return them.
pub fn check_alerts(store: &Store, config: &Config) -> Result<Vec<Alert>> {
    let iterations = store.iteration_count();
    let alerts = store.update(|wf| {
        wf.alerts = evaluate(wf, iterations, &config.alerts, Utc::now());
        Ok(wf.alerts.clone())
    })?;
    debug!(count = alerts.len(), "alerts evaluated");
    Ok(alerts)
}

pub fn record_progress_report(store: &Store) -> Result<()> {
    store.update(|wf| {
        wf.checkpoints.last_progress_report = Utc::now();
        wf.checkpoints.stories_since_report = 0;
        Ok(())
    })?;
    store.log_progress("Progress report generated", None, None);
    Ok(())
}

pub fn record_human_review(store: &Store) -> Result<()> {
    store.update(|wf| {
        wf.checkpoints.last_human_review = Utc::now();
        wf.checkpoints.stories_since_review = 0;
        Ok(())
    })?;
    store.log_progress("Human review checkpoint completed", None, None);
    Ok(())
}
