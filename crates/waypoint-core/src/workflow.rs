use crate::alert::Alert;
use crate::blocker::{Blocker, UserIntervention};
use crate::clarification::Clarification;
use crate::decision::Decision;
use crate::error::{Result, WaypointError};
use crate::failure::{Failure, FailureCategory};
use crate::store::Store;
use crate::story::Story;
use crate::types::{StoryStatus, WorkflowStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

pub const INITIAL_PHASE: &str = "analysis";
pub const INITIAL_AGENT: &str = "orchestrator";

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(default)]
    pub stories_completed: u32,
    #[serde(default)]
    pub total_attempts: u32,
    #[serde(default)]
    pub failed_verifications: u32,
    #[serde(default)]
    pub failures_by_category: BTreeMap<FailureCategory, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoints {
    pub last_human_review: DateTime<Utc>,
    #[serde(default)]
    pub stories_since_review: u32,
    pub last_progress_report: DateTime<Utc>,
    #[serde(default)]
    pub stories_since_report: u32,
}

impl Checkpoints {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            last_human_review: now,
            stories_since_review: 0,
            last_progress_report: now,
            stories_since_report: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeouts {
    #[serde(default = "default_story_minutes")]
    pub story_max_minutes: u32,
    #[serde(default = "default_iteration_minutes")]
    pub iteration_max_minutes: u32,
    #[serde(default = "default_clarification_minutes")]
    pub clarification_wait_minutes: u32,
}

fn default_story_minutes() -> u32 {
    30
}

fn default_iteration_minutes() -> u32 {
    10
}

fn default_clarification_minutes() -> u32 {
    5
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            story_max_minutes: default_story_minutes(),
            iteration_max_minutes: default_iteration_minutes(),
            clarification_wait_minutes: default_clarification_minutes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub workflow_id: String,
    #[serde(default = "default_session")]
    pub session_id: String,
    pub goal: String,
    pub status: WorkflowStatus,
    #[serde(default = "default_phase")]
    pub current_phase: String,
    #[serde(default = "default_agent")]
    pub current_agent: String,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_iterations: u64,
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub stories: Vec<Story>,
    #[serde(default)]
    pub blockers: Vec<Blocker>,
    #[serde(default)]
    pub failures: Vec<Failure>,
    #[serde(default)]
    pub clarifications: Vec<Clarification>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default = "default_checkpoints")]
    pub checkpoints: Checkpoints,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_intervention: Option<UserIntervention>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_working_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_working_at: Option<DateTime<Utc>>,
    /// Recomputed by every alert check; never accumulated.
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

fn default_session() -> String {
    "unknown".to_string()
}

fn default_phase() -> String {
    INITIAL_PHASE.to_string()
}

fn default_agent() -> String {
    INITIAL_AGENT.to_string()
}

fn default_checkpoints() -> Checkpoints {
    Checkpoints::starting_at(Utc::now())
}

impl Workflow {
    pub fn new(goal: impl Into<String>, session_id: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            workflow_id: generate_workflow_id(),
            session_id: session_id.map(str::to_string).unwrap_or_else(default_session),
            goal: goal.into(),
            status: WorkflowStatus::InProgress,
            current_phase: default_phase(),
            current_agent: default_agent(),
            started_at: now,
            last_updated: now,
            completed_at: None,
            total_iterations: 0,
            revision: 0,
            stories: Vec::new(),
            blockers: Vec::new(),
            failures: Vec::new(),
            clarifications: Vec::new(),
            decisions: Vec::new(),
            metrics: Metrics::default(),
            checkpoints: Checkpoints::starting_at(now),
            timeouts: Timeouts::default(),
            user_intervention: None,
            last_working_commit: None,
            last_working_at: None,
            alerts: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn story(&self, id: &str) -> Result<&Story> {
        self.stories
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| WaypointError::StoryNotFound(id.to_string()))
    }

    pub fn story_mut(&mut self, id: &str) -> Result<&mut Story> {
        self.stories
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| WaypointError::StoryNotFound(id.to_string()))
    }

    /// The single story the driver loop should work on next.
    ///
    /// Any in_progress/testing/review story (list order) wins over the first
    /// pending story.
    pub fn next_story(&self) -> Option<&Story> {
        self.stories
            .iter()
            .find(|s| s.status.is_active())
            .or_else(|| {
                self.stories
                    .iter()
                    .find(|s| s.status == StoryStatus::Pending)
            })
    }

    pub fn incomplete_stories(&self) -> Vec<&Story> {
        self.stories.iter().filter(|s| !s.status.is_done()).collect()
    }

    pub fn count_with(&self, pred: impl Fn(StoryStatus) -> bool) -> usize {
        self.stories.iter().filter(|s| pred(s.status)).count()
    }

    pub fn completed_count(&self) -> usize {
        self.count_with(|s| s == StoryStatus::Completed)
    }

    pub fn open_blockers(&self) -> Vec<&Blocker> {
        self.blockers.iter().filter(|b| !b.resolved).collect()
    }

    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_minutes()
    }
}

fn generate_workflow_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// "2h 5m" or "42m".
pub fn format_elapsed(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours > 0 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest}m")
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub workflow: Workflow,
    pub resumed: bool,
}

/// Start a workflow for `goal`, or resume the one already in progress.
pub fn initialize(store: &Store, goal: &str, session_id: Option<&str>) -> Result<InitOutcome> {
    if let Some(mut existing) = store.load() {
        if existing.status == WorkflowStatus::InProgress {
            if let Some(session) = session_id {
                existing.session_id = session.to_string();
            }
            store.save(&mut existing)?;
            store.log_progress(
                &format!(
                    "RESUMED workflow {} - Goal: {}",
                    existing.workflow_id, existing.goal
                ),
                None,
                None,
            );
            info!(workflow_id = %existing.workflow_id, "resumed workflow");
            return Ok(InitOutcome {
                workflow: existing,
                resumed: true,
            });
        }
    }

    store.reset_iterations();
    let mut workflow = Workflow::new(goal, session_id);
    store.save(&mut workflow)?;
    store.log_progress(
        &format!("STARTED workflow {} - Goal: {goal}", workflow.workflow_id),
        None,
        None,
    );
    info!(workflow_id = %workflow.workflow_id, "started workflow");
    Ok(InitOutcome {
        workflow,
        resumed: false,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub workflow_id: String,
    pub completed_stories: usize,
    pub total_stories: usize,
    pub elapsed: String,
    pub progress_archived: bool,
}

/// Close out the workflow: mark completed, reset the counter, archive the log.
pub fn complete(store: &Store) -> Result<CompletionSummary> {
    let mut workflow = store.require()?;
    let now = Utc::now();
    workflow.status = WorkflowStatus::Completed;
    workflow.completed_at = Some(now);
    store.save(&mut workflow)?;

    let completed = workflow.completed_count();
    let total = workflow.stories.len();
    let elapsed = format_elapsed(workflow.elapsed_minutes(now));
    store.log_progress(
        &format!("WORKFLOW COMPLETED - {completed}/{total} stories in {elapsed}"),
        None,
        None,
    );

    store.reset_iterations();
    let progress_archived = store.archive_progress();
    info!(workflow_id = %workflow.workflow_id, completed, total, "completed workflow");

    Ok(CompletionSummary {
        workflow_id: workflow.workflow_id,
        completed_stories: completed,
        total_stories: total,
        elapsed,
        progress_archived,
    })
}

pub fn update_phase(store: &Store, phase: &str, agent: Option<&str>) -> Result<()> {
    store.update(|wf| {
        wf.current_phase = phase.to_string();
        if let Some(agent) = agent {
            wf.current_agent = agent.to_string();
        }
        Ok(())
    })?;
    store.log_progress(&format!("Phase: {phase}"), None, agent);
    Ok(())
}

/// Override any subset of the per-workflow timeouts; returns the resulting set.
pub fn set_timeouts(
    store: &Store,
    story_minutes: Option<u32>,
    iteration_minutes: Option<u32>,
    clarification_minutes: Option<u32>,
) -> Result<Timeouts> {
    store.update(|wf| {
        if let Some(m) = story_minutes {
            wf.timeouts.story_max_minutes = m;
        }
        if let Some(m) = iteration_minutes {
            wf.timeouts.iteration_max_minutes = m;
        }
        if let Some(m) = clarification_minutes {
            wf.timeouts.clarification_wait_minutes = m;
        }
        Ok(wf.timeouts.clone())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
