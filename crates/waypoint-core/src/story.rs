use crate::error::Result;
use crate::store::Store;
use crate::tdd::TddHistoryEntry;
use crate::types::{StorySize, StoryStatus, TddPhase, VerificationCheck};
use crate::workflow::{Timeouts, Workflow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// VerificationChecks
// ---------------------------------------------------------------------------

/// Named gates that must all pass before a story may be completed.
///
/// A document written without this block loads with every gate closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationChecks {
    #[serde(default)]
    pub tests_pass: bool,
    #[serde(default)]
    pub coverage_met: bool,
    #[serde(default)]
    pub review_approved: bool,
    #[serde(default)]
    pub security_cleared: bool,
}

impl VerificationChecks {
    /// Non-sensitive stories are implicitly security-clear.
    pub fn for_story(security_sensitive: bool) -> Self {
        Self {
            security_cleared: !security_sensitive,
            ..Self::default()
        }
    }

    pub fn get(&self, check: VerificationCheck) -> bool {
        match check {
            VerificationCheck::TestsPass => self.tests_pass,
            VerificationCheck::CoverageMet => self.coverage_met,
            VerificationCheck::ReviewApproved => self.review_approved,
            VerificationCheck::SecurityCleared => self.security_cleared,
        }
    }

    pub fn set(&mut self, check: VerificationCheck, passed: bool) {
        match check {
            VerificationCheck::TestsPass => self.tests_pass = passed,
            VerificationCheck::CoverageMet => self.coverage_met = passed,
            VerificationCheck::ReviewApproved => self.review_approved = passed,
            VerificationCheck::SecurityCleared => self.security_cleared = passed,
        }
    }

    pub fn all_passed(&self) -> bool {
        VerificationCheck::all().iter().all(|c| self.get(*c))
    }

    pub fn failing(&self) -> Vec<VerificationCheck> {
        VerificationCheck::all()
            .iter()
            .copied()
            .filter(|c| !self.get(*c))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationRecord {
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub global_iteration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub size: StorySize,
    pub status: StoryStatus,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub security_sensitive: bool,
    #[serde(default)]
    pub assigned_agent: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub iterations: Vec<IterationRecord>,
    #[serde(default)]
    pub verification_checks: VerificationChecks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdd_phase: Option<TddPhase>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tdd_history: Vec<TddHistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Story {
    /// When the current attempt began: the latest iteration record, else the last update.
    pub fn active_since(&self) -> DateTime<Utc> {
        self.iterations
            .last()
            .map(|it| it.started_at)
            .unwrap_or(self.last_updated)
    }
}

/// Parameters for [`add_story`].
#[derive(Debug, Clone, Default)]
pub struct NewStory {
    pub title: String,
    pub size: StorySize,
    pub acceptance_criteria: Vec<String>,
    pub security_sensitive: bool,
}

impl NewStory {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Pure transitions (operate on a loaded Workflow)
// ---------------------------------------------------------------------------

/// Append a pending story with the next sequential id.
pub fn push_story(wf: &mut Workflow, new: NewStory, now: DateTime<Utc>) -> String {
    let id = format!("S{}", wf.stories.len() + 1);
    wf.stories.push(Story {
        id: id.clone(),
        title: new.title,
        size: new.size,
        status: StoryStatus::Pending,
        acceptance_criteria: new.acceptance_criteria,
        security_sensitive: new.security_sensitive,
        assigned_agent: None,
        attempts: 0,
        iterations: Vec::new(),
        verification_checks: VerificationChecks::for_story(new.security_sensitive),
        tdd_phase: None,
        tdd_history: Vec::new(),
        created_at: now,
        last_updated: now,
        completed_at: None,
    });
    id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub from: StoryStatus,
    pub requested: StoryStatus,
    /// What was actually stored; differs from `requested` when completion is gated.
    pub stored: StoryStatus,
}

impl StatusChange {
    pub fn downgraded(&self) -> bool {
        self.requested != self.stored
    }
}

/// Apply a status request to a story, enforcing the verification gate.
///
/// A completion request with any open check is stored as `verified`.
pub fn apply_status(
    wf: &mut Workflow,
    id: &str,
    requested: StoryStatus,
    agent: Option<&str>,
    global_iteration: u64,
    now: DateTime<Utc>,
) -> Result<StatusChange> {
    let story = wf.story_mut(id)?;
    let from = story.status;
    story.last_updated = now;
    if let Some(agent) = agent {
        story.assigned_agent = Some(agent.to_string());
    }

    let mut stored = requested;
    let mut newly_completed = false;
    match requested {
        StoryStatus::InProgress => {
            story.attempts += 1;
            story.iterations.push(IterationRecord {
                attempt: story.attempts,
                started_at: now,
                global_iteration,
            });
        }
        StoryStatus::Completed => {
            if story.verification_checks.all_passed() {
                // completed_at stays set across reopen-for-rework, so a
                // story is counted once until a failing check revokes it.
                newly_completed = story.completed_at.is_none();
                if newly_completed {
                    story.completed_at = Some(now);
                }
            } else {
                stored = StoryStatus::Verified;
            }
        }
        _ => {}
    }
    story.status = stored;

    if requested == StoryStatus::InProgress {
        wf.metrics.total_attempts += 1;
    }
    if newly_completed {
        wf.checkpoints.stories_since_review += 1;
        wf.checkpoints.stories_since_report += 1;
        wf.metrics.stories_completed += 1;
    }

    Ok(StatusChange {
        from,
        requested,
        stored,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub checks: VerificationChecks,
    pub status: StoryStatus,
    /// The update closed the last open gate and moved the story to `verified`.
    pub promoted: bool,
    /// A failing check pulled a completed story back to `verified`.
    pub revoked: bool,
}

/// Record one verification result; auto-advance to `verified` once every gate is open.
pub fn apply_verification(
    wf: &mut Workflow,
    id: &str,
    check: VerificationCheck,
    passed: bool,
    now: DateTime<Utc>,
) -> Result<VerificationOutcome> {
    let story = wf.story_mut(id)?;
    story.verification_checks.set(check, passed);
    story.last_updated = now;

    let promoted = story.verification_checks.all_passed()
        && !matches!(story.status, StoryStatus::Completed | StoryStatus::Verified);
    let revoked = !passed && story.status == StoryStatus::Completed;
    if promoted || revoked {
        story.status = StoryStatus::Verified;
    }
    if revoked {
        story.completed_at = None;
    }
    let outcome = VerificationOutcome {
        checks: story.verification_checks.clone(),
        status: story.status,
        promoted,
        revoked,
    };

    if !passed {
        wf.metrics.failed_verifications += 1;
    }
    if revoked {
        wf.metrics.stories_completed = wf.metrics.stories_completed.saturating_sub(1);
    }
    Ok(outcome)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryTimeout {
    pub story_id: String,
    pub active: bool,
    pub elapsed_minutes: f64,
    pub max_minutes: u32,
    pub exceeded: bool,
}

/// How long the story's current attempt has been running against its limit.
pub fn story_timeout(story: &Story, timeouts: &Timeouts, now: DateTime<Utc>) -> StoryTimeout {
    let active = story.status.is_active();
    let elapsed_minutes = if active {
        let secs = (now - story.active_since()).num_seconds().max(0);
        (secs as f64 / 60.0 * 10.0).round() / 10.0
    } else {
        0.0
    };
    StoryTimeout {
        story_id: story.id.clone(),
        active,
        elapsed_minutes,
        max_minutes: timeouts.story_max_minutes,
        exceeded: active && elapsed_minutes > f64::from(timeouts.story_max_minutes),
    }
}

// ---------------------------------------------------------------------------
// Store-level operations
// ---------------------------------------------------------------------------

pub fn add_story(store: &Store, new: NewStory) -> Result<String> {
    let title = new.title.clone();
    let size = new.size;
    let id = store.update(|wf| Ok(push_story(wf, new, Utc::now())))?;
    store.log_progress(
        &format!("Added story: {title} (size: {size})"),
        Some(&id),
        None,
    );
    Ok(id)
}

/// Move a story to `status`. Returns what was stored (see [`apply_status`]).
pub fn set_status(
    store: &Store,
    id: &str,
    status: StoryStatus,
    agent: Option<&str>,
) -> Result<StatusChange> {
    let iteration = store.iteration_count();
    let change = store.update(|wf| apply_status(wf, id, status, agent, iteration, Utc::now()))?;

    let message = match (change.requested, change.stored) {
        (StoryStatus::Completed, StoryStatus::Completed) => {
            "COMPLETED - all verification checks passed".to_string()
        }
        (StoryStatus::Completed, stored) => {
            format!("Status: {} -> {stored} (awaiting all checks)", change.from)
        }
        (_, stored) => format!("Status: {} -> {stored}", change.from),
    };
    store.log_progress(&message, Some(id), agent);
    debug!(story = id, from = %change.from, to = %change.stored, "story status changed");
    Ok(change)
}

pub fn update_verification(
    store: &Store,
    id: &str,
    check: VerificationCheck,
    passed: bool,
    details: Option<&str>,
) -> Result<VerificationOutcome> {
    let outcome = store.update(|wf| apply_verification(wf, id, check, passed, Utc::now()))?;

    let verdict = if passed { "PASSED" } else { "FAILED" };
    let detail = details.map(|d| format!(" - {d}")).unwrap_or_default();
    store.log_progress(
        &format!("Verification {check}: {verdict}{detail}"),
        Some(id),
        None,
    );
    if outcome.revoked {
        store.log_progress(
            "Completion revoked - status back to verified",
            Some(id),
            None,
        );
    }
    if outcome.promoted {
        store.log_progress(
            "All verification checks PASSED - ready for completion",
            Some(id),
            None,
        );
    }
    Ok(outcome)
}

pub fn get(store: &Store, id: &str) -> Result<Story> {
    Ok(store.require()?.story(id)?.clone())
}

/// The next story for the driver loop, or `None` when nothing is actionable
/// (or there is no workflow).
pub fn next_story(store: &Store) -> Option<Story> {
    store.load()?.next_story().cloned()
}

/// Every story not yet completed or skipped. Empty without a workflow.
pub fn incomplete_stories(store: &Store) -> Vec<Story> {
    store
        .load()
        .map(|wf| wf.incomplete_stories().into_iter().cloned().collect())
        .unwrap_or_default()
}

pub fn check_story_timeout(store: &Store, id: &str) -> Result<StoryTimeout> {
    let wf = store.require()?;
    Ok(story_timeout(wf.story(id)?, &wf.timeouts, Utc::now()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaypointError;
    use crate::workflow::initialize;
    use chrono::Duration;
    use tempfile::TempDir;

    fn wf_with(stories: &[(&str, bool)]) -> Workflow {
        let mut wf = Workflow::new("goal", None);
        for (title, sensitive) in stories {
            push_story(
                &mut wf,
                NewStory {
                    title: title.to_string(),
                    security_sensitive: *sensitive,
                    ..NewStory::default()
                },
                Utc::now(),
            );
        }
        wf
    }

    fn pass_all(wf: &mut Workflow, id: &str) {
        for check in VerificationCheck::all() {
            apply_verification(wf, id, *check, true, Utc::now()).unwrap();
        }
    }

    #[test]
    fn ids_are_sequential() {
        let wf = wf_with(&[("a", false), ("b", false), ("c", false)]);
        let ids: Vec<&str> = wf.stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["S1", "S2", "S3"]);
        assert!(wf.stories.iter().all(|s| s.status == StoryStatus::Pending));
    }

    #[test]
    fn security_cleared_defaults_by_sensitivity() {
        let wf = wf_with(&[("plain", false), ("auth", true)]);
        assert!(wf.stories[0].verification_checks.security_cleared);
        assert!(!wf.stories[1].verification_checks.security_cleared);
    }

    #[test]
    fn entering_in_progress_tracks_attempts() {
        let mut wf = wf_with(&[("a", false)]);
        apply_status(&mut wf, "S1", StoryStatus::InProgress, Some("dev"), 7, Utc::now()).unwrap();
        apply_status(&mut wf, "S1", StoryStatus::Testing, None, 8, Utc::now()).unwrap();
        apply_status(&mut wf, "S1", StoryStatus::InProgress, None, 9, Utc::now()).unwrap();

        let story = &wf.stories[0];
        assert_eq!(story.attempts, 2);
        assert_eq!(story.iterations.len(), 2);
        assert_eq!(story.iterations[0].global_iteration, 7);
        assert_eq!(story.iterations[1].attempt, 2);
        assert_eq!(story.assigned_agent.as_deref(), Some("dev"));
        assert_eq!(wf.metrics.total_attempts, 2);
    }

    #[test]
    fn completion_with_open_checks_downgrades_to_verified() {
        let mut wf = wf_with(&[("a", false)]);
        apply_verification(&mut wf, "S1", VerificationCheck::TestsPass, true, Utc::now()).unwrap();

        let change =
            apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();
        assert!(change.downgraded());
        assert_eq!(wf.stories[0].status, StoryStatus::Verified);
        assert!(wf.stories[0].completed_at.is_none());
        assert_eq!(wf.metrics.stories_completed, 0);
        assert_eq!(wf.checkpoints.stories_since_review, 0);
    }

    #[test]
    fn sensitive_story_needs_security_clearance() {
        let mut wf = wf_with(&[("auth", true)]);
        for check in [
            VerificationCheck::TestsPass,
            VerificationCheck::CoverageMet,
            VerificationCheck::ReviewApproved,
        ] {
            apply_verification(&mut wf, "S1", check, true, Utc::now()).unwrap();
        }
        let change =
            apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();
        assert_eq!(change.stored, StoryStatus::Verified);

        apply_verification(&mut wf, "S1", VerificationCheck::SecurityCleared, true, Utc::now())
            .unwrap();
        let change =
            apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();
        assert_eq!(change.stored, StoryStatus::Completed);
    }

    #[test]
    fn completion_with_all_checks_counts_once() {
        let mut wf = wf_with(&[("a", false)]);
        pass_all(&mut wf, "S1");

        apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();
        apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();

        assert_eq!(wf.stories[0].status, StoryStatus::Completed);
        assert!(wf.stories[0].completed_at.is_some());
        assert_eq!(wf.metrics.stories_completed, 1);
        assert_eq!(wf.checkpoints.stories_since_review, 1);
        assert_eq!(wf.checkpoints.stories_since_report, 1);
    }

    #[test]
    fn completed_always_implies_all_checks() {
        let mut wf = wf_with(&[("a", false), ("b", true), ("c", false)]);
        apply_verification(&mut wf, "S1", VerificationCheck::CoverageMet, true, Utc::now())
            .unwrap();
        pass_all(&mut wf, "S3");
        for id in ["S1", "S2", "S3"] {
            apply_status(&mut wf, id, StoryStatus::Completed, None, 0, Utc::now()).unwrap();
        }
        for story in &wf.stories {
            if story.status == StoryStatus::Completed {
                assert!(story.verification_checks.all_passed(), "{}", story.id);
            }
        }
        assert_eq!(wf.completed_count(), 1);
    }

    #[test]
    fn verification_auto_promotes_once_all_pass() {
        let mut wf = wf_with(&[("a", false)]);
        apply_status(&mut wf, "S1", StoryStatus::Review, None, 0, Utc::now()).unwrap();

        let out = apply_verification(&mut wf, "S1", VerificationCheck::TestsPass, true, Utc::now())
            .unwrap();
        assert!(!out.promoted);
        let out =
            apply_verification(&mut wf, "S1", VerificationCheck::CoverageMet, true, Utc::now())
                .unwrap();
        assert!(!out.promoted);
        let out =
            apply_verification(&mut wf, "S1", VerificationCheck::ReviewApproved, true, Utc::now())
                .unwrap();
        assert!(out.promoted);
        assert_eq!(out.status, StoryStatus::Verified);
    }

    #[test]
    fn passing_check_keeps_completed_story() {
        let mut wf = wf_with(&[("a", false)]);
        pass_all(&mut wf, "S1");
        apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();

        let out = apply_verification(&mut wf, "S1", VerificationCheck::TestsPass, true, Utc::now())
            .unwrap();
        assert!(!out.promoted);
        assert_eq!(out.status, StoryStatus::Completed);
    }

    #[test]
    fn failing_check_revokes_completion() {
        let mut wf = wf_with(&[("a", false)]);
        pass_all(&mut wf, "S1");
        apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();
        assert_eq!(wf.metrics.stories_completed, 1);

        let out =
            apply_verification(&mut wf, "S1", VerificationCheck::TestsPass, false, Utc::now())
                .unwrap();
        assert!(out.revoked);
        assert!(!out.promoted);
        assert_eq!(out.status, StoryStatus::Verified);
        let story = &wf.stories[0];
        assert_eq!(story.status, StoryStatus::Verified);
        assert!(story.completed_at.is_none());
        assert!(!story.verification_checks.tests_pass);
        assert_eq!(wf.metrics.stories_completed, 0);
        assert_eq!(wf.completed_count(), 0);

        // Re-passing promotes nothing past verified; completion must be requested again.
        let out = apply_verification(&mut wf, "S1", VerificationCheck::TestsPass, true, Utc::now())
            .unwrap();
        assert!(!out.promoted);
        let change =
            apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();
        assert_eq!(change.stored, StoryStatus::Completed);
        assert_eq!(wf.metrics.stories_completed, 1);
    }

    #[test]
    fn failing_check_on_open_story_is_not_a_revocation() {
        let mut wf = wf_with(&[("a", false)]);
        apply_status(&mut wf, "S1", StoryStatus::Testing, None, 0, Utc::now()).unwrap();
        let out =
            apply_verification(&mut wf, "S1", VerificationCheck::TestsPass, false, Utc::now())
                .unwrap();
        assert!(!out.revoked);
        assert_eq!(out.status, StoryStatus::Testing);
    }

    #[test]
    fn reopened_story_is_counted_once() {
        let mut wf = wf_with(&[("a", false)]);
        pass_all(&mut wf, "S1");
        apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();
        let first_completed_at = wf.stories[0].completed_at;

        apply_status(&mut wf, "S1", StoryStatus::InProgress, None, 1, Utc::now()).unwrap();
        apply_status(&mut wf, "S1", StoryStatus::Completed, None, 2, Utc::now()).unwrap();

        assert_eq!(wf.stories[0].status, StoryStatus::Completed);
        assert_eq!(wf.stories[0].completed_at, first_completed_at);
        assert_eq!(wf.metrics.stories_completed, 1);
        assert_eq!(wf.checkpoints.stories_since_review, 1);
        assert_eq!(wf.checkpoints.stories_since_report, 1);
    }

    #[test]
    fn failed_verification_is_counted() {
        let mut wf = wf_with(&[("a", false)]);
        apply_verification(&mut wf, "S1", VerificationCheck::TestsPass, false, Utc::now())
            .unwrap();
        apply_verification(&mut wf, "S1", VerificationCheck::CoverageMet, false, Utc::now())
            .unwrap();
        assert_eq!(wf.metrics.failed_verifications, 2);
    }

    #[test]
    fn unknown_story_is_rejected_without_mutation() {
        let mut wf = wf_with(&[("a", false)]);
        let before = wf.clone();
        let err =
            apply_status(&mut wf, "S9", StoryStatus::InProgress, None, 0, Utc::now()).unwrap_err();
        assert!(matches!(err, WaypointError::StoryNotFound(id) if id == "S9"));
        assert_eq!(wf, before);
    }

    #[test]
    fn next_story_prefers_active_over_pending() {
        let mut wf = wf_with(&[("a", false), ("b", false), ("c", false)]);
        assert_eq!(wf.next_story().unwrap().id, "S1");

        // An active story later in the list still wins over earlier pending ones.
        apply_status(&mut wf, "S3", StoryStatus::Review, None, 0, Utc::now()).unwrap();
        assert_eq!(wf.next_story().unwrap().id, "S3");

        apply_status(&mut wf, "S2", StoryStatus::Testing, None, 0, Utc::now()).unwrap();
        assert_eq!(wf.next_story().unwrap().id, "S2");
    }

    #[test]
    fn next_story_none_when_nothing_actionable() {
        let mut wf = wf_with(&[("a", false), ("b", false)]);
        apply_status(&mut wf, "S1", StoryStatus::Skipped, None, 0, Utc::now()).unwrap();
        apply_status(&mut wf, "S2", StoryStatus::Blocked, None, 0, Utc::now()).unwrap();
        assert!(wf.next_story().is_none());
    }

    #[test]
    fn incomplete_excludes_completed_and_skipped() {
        let mut wf = wf_with(&[("a", false), ("b", false), ("c", false)]);
        pass_all(&mut wf, "S1");
        apply_status(&mut wf, "S1", StoryStatus::Completed, None, 0, Utc::now()).unwrap();
        apply_status(&mut wf, "S2", StoryStatus::Skipped, None, 0, Utc::now()).unwrap();
        let ids: Vec<&str> = wf
            .incomplete_stories()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, ["S3"]);
    }

    #[test]
    fn story_timeout_measures_current_attempt() {
        let mut wf = wf_with(&[("a", false)]);
        let start = Utc::now() - Duration::minutes(45);
        apply_status(&mut wf, "S1", StoryStatus::InProgress, None, 0, start).unwrap();

        let t = story_timeout(&wf.stories[0], &wf.timeouts, Utc::now());
        assert!(t.active);
        assert!(t.exceeded);
        assert!(t.elapsed_minutes >= 45.0);

        let pending = wf_with(&[("b", false)]);
        let t = story_timeout(&pending.stories[0], &pending.timeouts, Utc::now());
        assert!(!t.active);
        assert!(!t.exceeded);
    }

    #[test]
    fn store_operations_persist_and_log() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        assert!(matches!(
            add_story(&store, NewStory::titled("x")),
            Err(WaypointError::NoActiveWorkflow)
        ));
        assert!(next_story(&store).is_none());
        assert!(incomplete_stories(&store).is_empty());

        initialize(&store, "goal", None).unwrap();
        let id = add_story(&store, NewStory::titled("Login form")).unwrap();
        assert_eq!(id, "S1");

        store.increment_iteration().unwrap();
        set_status(&store, &id, StoryStatus::InProgress, Some("dev")).unwrap();
        let change = set_status(&store, &id, StoryStatus::Completed, None).unwrap();
        assert_eq!(change.stored, StoryStatus::Verified);

        let story = get(&store, &id).unwrap();
        assert_eq!(story.status, StoryStatus::Verified);
        assert_eq!(story.iterations[0].global_iteration, 1);

        let log = store.recent_progress(10).join("\n");
        assert!(log.contains("[S1] Added story: Login form (size: M)"));
        assert!(log.contains("[S1] [dev] Status: pending -> in_progress"));
        assert!(log.contains("Status: in_progress -> verified (awaiting all checks)"));
    }

    #[test]
    fn store_verification_logs_promotion() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        initialize(&store, "goal", None).unwrap();
        let id = add_story(&store, NewStory::titled("a")).unwrap();

        update_verification(&store, &id, VerificationCheck::TestsPass, true, Some("42 passed"))
            .unwrap();
        update_verification(&store, &id, VerificationCheck::CoverageMet, true, None).unwrap();
        let out =
            update_verification(&store, &id, VerificationCheck::ReviewApproved, true, None)
                .unwrap();
        assert!(out.promoted);

        let log = store.recent_progress(10).join("\n");
        assert!(log.contains("Verification testsPass: PASSED - 42 passed"));
        assert!(log.contains("All verification checks PASSED - ready for completion"));
    }
}
