//! Read-only views derived from the workflow document: the status summary,
//! session-recovery info, and a compact plain-text recap.

use crate::alert::{checkpoint_due, progress_report_due};
use crate::blocker::{Blocker, UserIntervention};
use crate::config::Config;
use crate::store::Store;
use crate::story::{Story, VerificationChecks};
use crate::types::{StoryStatus, WorkflowStatus};
use crate::workflow::{format_elapsed, Metrics, Workflow};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const RECOVERY_PROGRESS_LINES: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStory {
    pub id: String,
    pub title: String,
    pub status: StoryStatus,
    pub attempts: u32,
    pub verification: VerificationChecks,
}

impl From<&Story> for CurrentStory {
    fn from(s: &Story) -> Self {
        Self {
            id: s.id.clone(),
            title: s.title.clone(),
            status: s.status,
            attempts: s.attempts,
            verification: s.verification_checks.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCounts {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub blocked: usize,
    pub percentage: u32,
}

impl StoryCounts {
    pub fn of(wf: &Workflow) -> Self {
        let total = wf.stories.len();
        let completed = wf.completed_count();
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        Self {
            total,
            completed,
            in_progress: wf.count_with(StoryStatus::is_active),
            pending: wf.count_with(|s| s == StoryStatus::Pending),
            blocked: wf.count_with(|s| s == StoryStatus::Blocked),
            percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub workflow_id: String,
    pub goal: String,
    pub status: WorkflowStatus,
    pub current_phase: String,
    pub current_agent: String,
    pub elapsed: String,
    pub iterations: u64,
    pub current_story: Option<CurrentStory>,
    pub progress: StoryCounts,
    pub metrics: Metrics,
    pub checkpoint_due: bool,
    pub progress_report_due: bool,
    pub blockers: Vec<Blocker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_intervention: Option<UserIntervention>,
}

pub fn build_summary(wf: &Workflow, iterations: u64, config: &Config, now: DateTime<Utc>) -> Summary {
    Summary {
        workflow_id: wf.workflow_id.clone(),
        goal: wf.goal.clone(),
        status: wf.status,
        current_phase: wf.current_phase.clone(),
        current_agent: wf.current_agent.clone(),
        elapsed: format_elapsed(wf.elapsed_minutes(now)),
        iterations,
        current_story: wf.next_story().map(CurrentStory::from),
        progress: StoryCounts::of(wf),
        metrics: wf.metrics.clone(),
        checkpoint_due: checkpoint_due(wf, &config.alerts),
        progress_report_due: progress_report_due(wf, &config.alerts, now),
        blockers: wf.open_blockers().into_iter().cloned().collect(),
        user_intervention: wf.user_intervention.clone().filter(|ui| !ui.resolved),
    }
}

/// `None` without a workflow.
pub fn summary(store: &Store, config: &Config) -> Option<Summary> {
    let wf = store.load()?;
    Some(build_summary(&wf, store.iteration_count(), config, Utc::now()))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryInfo {
    pub has_active_workflow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_working_commit: Option<String>,
    pub recent_progress: Vec<String>,
}

/// Everything a fresh session needs to pick up where the last one stopped.
/// Works with or without a workflow.
pub fn recovery_info(store: &Store, config: &Config) -> RecoveryInfo {
    let recent_progress = store.recent_progress(RECOVERY_PROGRESS_LINES);
    match store.load() {
        Some(wf) => RecoveryInfo {
            has_active_workflow: true,
            last_working_commit: wf.last_working_commit.clone(),
            summary: Some(build_summary(&wf, store.iteration_count(), config, Utc::now())),
            recent_progress,
        },
        None => RecoveryInfo {
            has_active_workflow: false,
            summary: None,
            last_working_commit: None,
            recent_progress,
        },
    }
}

pub fn render_compact(s: &Summary) -> String {
    let p = &s.progress;
    let mut lines = vec![
        format!("=== Workflow {} ===", s.workflow_id),
        format!("Goal: {}", s.goal),
        format!("Phase: {}", s.current_phase),
        format!("Elapsed: {}", s.elapsed),
        format!("Iterations: {}", s.iterations),
        format!("Progress: {}/{} ({}%)", p.completed, p.total, p.percentage),
        String::new(),
    ];

    if let Some(cur) = &s.current_story {
        lines.push(format!("CURRENT: [{}] {}", cur.id, cur.title));
        lines.push(format!("  Status: {}, Attempts: {}", cur.status, cur.attempts));
        let checks: Vec<String> = crate::types::VerificationCheck::all()
            .iter()
            .map(|c| format!("{c}={}", if cur.verification.get(*c) { 'Y' } else { 'N' }))
            .collect();
        lines.push(format!("  Checks: {}", checks.join(", ")));
        lines.push(String::new());
    }

    if !s.blockers.is_empty() {
        lines.push("BLOCKERS:".to_string());
        for b in &s.blockers {
            lines.push(format!("  - [{}] {}", b.severity, b.description));
        }
    }

    lines.join("\n")
}

pub fn compact_context(store: &Store, config: &Config) -> String {
    match summary(store, config) {
        Some(s) => render_compact(&s),
        None => "No active workflow".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocker::add_blocker;
    use crate::story::{add_story, set_status, update_verification, NewStory};
    use crate::types::{Severity, VerificationCheck};
    use crate::workflow::initialize;
    use tempfile::TempDir;

    fn populated() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        initialize(&store, "ship login", None).unwrap();
        for title in ["form", "api", "docs"] {
            add_story(&store, NewStory::titled(title)).unwrap();
        }
        for check in VerificationCheck::all() {
            update_verification(&store, "S1", *check, true, None).unwrap();
        }
        set_status(&store, "S1", StoryStatus::Completed, None).unwrap();
        set_status(&store, "S2", StoryStatus::InProgress, Some("dev")).unwrap();
        (dir, store)
    }

    #[test]
    fn counts_and_current_story() {
        let (_dir, store) = populated();
        let s = summary(&store, &Config::default()).unwrap();
        assert_eq!(
            s.progress,
            StoryCounts {
                total: 3,
                completed: 1,
                in_progress: 1,
                pending: 1,
                blocked: 0,
                percentage: 33,
            }
        );
        let cur = s.current_story.unwrap();
        assert_eq!(cur.id, "S2");
        assert_eq!(cur.attempts, 1);
        assert_eq!(s.metrics.stories_completed, 1);
        assert!(!s.checkpoint_due);
    }

    #[test]
    fn summary_json_is_camel_case() {
        let (_dir, store) = populated();
        let json = serde_json::to_value(summary(&store, &Config::default()).unwrap()).unwrap();
        assert_eq!(json["currentStory"]["id"], "S2");
        assert_eq!(json["progress"]["inProgress"], 1);
        assert_eq!(json["progressReportDue"], false);
    }

    #[test]
    fn recovery_without_workflow_still_has_progress() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.log_progress("left over", None, None);
        let info = recovery_info(&store, &Config::default());
        assert!(!info.has_active_workflow);
        assert!(info.summary.is_none());
        assert_eq!(info.recent_progress.len(), 1);
        assert_eq!(compact_context(&store, &Config::default()), "No active workflow");
    }

    #[test]
    fn recovery_caps_progress_lines() {
        let (_dir, store) = populated();
        for i in 0..30 {
            store.log_progress(&format!("tick {i}"), None, None);
        }
        let info = recovery_info(&store, &Config::default());
        assert!(info.has_active_workflow);
        assert_eq!(info.recent_progress.len(), RECOVERY_PROGRESS_LINES);
        assert!(info.recent_progress[14].ends_with("tick 29"));
    }

    #[test]
    fn compact_context_lists_current_story_and_blockers() {
        let (_dir, store) = populated();
        add_blocker(&store, "staging db offline", Severity::High).unwrap();
        let text = compact_context(&store, &Config::default());
        assert!(text.starts_with("=== Workflow "));
        assert!(text.contains("Goal: ship login"));
        assert!(text.contains("Progress: 1/3 (33%)"));
        assert!(text.contains("CURRENT: [S2] api"));
        assert!(text.contains("  Status: in_progress, Attempts: 1"));
        assert!(text.contains(
            "  Checks: testsPass=N, coverageMet=N, reviewApproved=N, securityCleared=Y"
        ));
        assert!(text.contains("BLOCKERS:\n  - [high] staging db offline"));
    }
}
