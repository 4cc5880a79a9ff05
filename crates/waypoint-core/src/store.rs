//! Durable storage for the single active workflow document.
//!
//! Layout (under the project root):
//!   .claude/workflow-state.json   the whole workflow, pretty-printed JSON
//!   .claude/claude-progress.txt   append-only, human-oriented event log
//!   .claude/.iteration-count      driver-loop iteration counter (raw integer)
//!
//! Every operation is load → mutate → save of the whole document. The log and
//! the counter are separate files and are not transactionally tied to it.

use crate::error::{Result, WaypointError};
use crate::io;
use crate::paths;
use crate::workflow::Workflow;
use chrono::{Local, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // -----------------------------------------------------------------------
    // Workflow document
    // -----------------------------------------------------------------------

    /// Load the workflow document. A missing or unparseable file is `None`.
    pub fn load(&self) -> Option<Workflow> {
        let path = paths::state_path(&self.root);
        if !path.exists() {
            return None;
        }
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read workflow state");
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(workflow) => Some(workflow),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "workflow state is not valid JSON; treating as absent");
                None
            }
        }
    }

    /// Load the workflow document or fail with [`WaypointError::NoActiveWorkflow`].
    pub fn require(&self) -> Result<Workflow> {
        self.load().ok_or(WaypointError::NoActiveWorkflow)
    }

    /// Persist the whole document.
    ///
    /// Stamps `lastUpdated`, copies the iteration counter into
    /// `totalIterations`, and bumps `revision`. A document whose revision is
    /// behind the copy on disk (same workflow id) is rejected with
    /// [`WaypointError::Conflict`] instead of silently overwriting it.
    pub fn save(&self, workflow: &mut Workflow) -> Result<()> {
        if let Some(on_disk) = self.load() {
            if on_disk.workflow_id == workflow.workflow_id && on_disk.revision > workflow.revision
            {
                return Err(WaypointError::Conflict {
                    workflow_id: workflow.workflow_id.clone(),
                    on_disk: on_disk.revision,
                    saving: workflow.revision,
                });
            }
        }

        workflow.last_updated = Utc::now();
        workflow.total_iterations = self.iteration_count();
        workflow.revision += 1;

        let data = serde_json::to_string_pretty(workflow)?;
        io::atomic_write(&paths::state_path(&self.root), data.as_bytes())?;
        debug!(
            workflow_id = %workflow.workflow_id,
            revision = workflow.revision,
            "saved workflow state"
        );
        Ok(())
    }

    /// Load, apply `f`, and save. The closure's error aborts without writing.
    pub fn update<T>(&self, f: impl FnOnce(&mut Workflow) -> Result<T>) -> Result<T> {
        let mut workflow = self.require()?;
        let out = f(&mut workflow)?;
        self.save(&mut workflow)?;
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Progress log
    // -----------------------------------------------------------------------

    /// Append `[timestamp] [story] [agent] message`. Write failures are logged and dropped.
    pub fn log_progress(&self, message: &str, story_id: Option<&str>, agent: Option<&str>) {
        let line = format_progress_line(
            &Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            message,
            story_id,
            agent,
        );
        if let Err(e) = io::append_text(&paths::progress_path(&self.root), &line) {
            warn!(error = %e, "failed to append progress entry");
        }
    }

    /// The most recent `lines` progress entries, oldest first.
    pub fn recent_progress(&self, lines: usize) -> Vec<String> {
        io::tail_lines(&paths::progress_path(&self.root), lines).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read progress log");
            Vec::new()
        })
    }

    /// Keep only the most recent `max_lines` entries. Returns whether anything was dropped.
    pub fn trim_progress(&self, max_lines: usize) -> Result<bool> {
        let trimmed = io::keep_last_lines(&paths::progress_path(&self.root), max_lines)?;
        if trimmed {
            self.log_progress(
                &format!("Trimmed progress file to {max_lines} lines"),
                None,
                None,
            );
        }
        Ok(trimmed)
    }

    /// Move the progress log aside to `claude-progress.old`. Best effort.
    pub fn archive_progress(&self) -> bool {
        let path = paths::progress_path(&self.root);
        if !path.exists() {
            return false;
        }
        match std::fs::rename(&path, paths::progress_archive_path(&self.root)) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to archive progress log");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Iteration counter
    // -----------------------------------------------------------------------

    /// Current driver-loop iteration. Missing or unreadable counter reads as 0.
    pub fn iteration_count(&self) -> u64 {
        std::fs::read_to_string(paths::iteration_path(&self.root))
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn increment_iteration(&self) -> Result<u64> {
        let count = self.iteration_count() + 1;
        io::atomic_write(&paths::iteration_path(&self.root), count.to_string().as_bytes())?;
        Ok(count)
    }

    pub fn reset_iterations(&self) {
        let path = paths::iteration_path(&self.root);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(error = %e, "failed to reset iteration counter");
            }
        }
    }
}

fn format_progress_line(
    timestamp: &str,
    message: &str,
    story_id: Option<&str>,
    agent: Option<&str>,
) -> String {
    let mut line = format!("[{timestamp}]");
    if let Some(story) = story_id {
        line.push_str(&format!(" [{story}]"));
    }
    if let Some(agent) = agent {
        line.push_str(&format!(" [{agent}]"));
    }
    line.push(' ');
    line.push_str(message);
    line.push('\n');
    line
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        assert!(store.load().is_none());
        assert!(matches!(
            store.require(),
            Err(WaypointError::NoActiveWorkflow)
        ));
    }

    #[test]
    fn load_corrupt_is_none() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        std::fs::write(dir.path().join(".claude/workflow-state.json"), "{ not json").unwrap();
        assert!(Store::new(dir.path()).load().is_none());
    }

    #[test]
    fn save_creates_parents_and_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let mut wf = Workflow::new("ship it", None);
        store.save(&mut wf).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.goal, "ship it");
        assert_eq!(loaded.revision, 1);
    }

    #[test]
    fn load_twice_is_structurally_equal() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let mut wf = Workflow::new("idempotent", Some("sess-1"));
        store.save(&mut wf).unwrap();

        assert_eq!(store.load().unwrap(), store.load().unwrap());
    }

    #[test]
    fn save_is_pretty_printed_camel_case() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let mut wf = Workflow::new("fmt", None);
        store.save(&mut wf).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(".claude/workflow-state.json")).unwrap();
        assert!(raw.contains("\n  \"workflowId\""));
        assert!(raw.contains("\"currentPhase\": \"analysis\""));
        assert!(raw.contains("\"status\": \"in_progress\""));
    }

    #[test]
    fn stale_save_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let mut wf = Workflow::new("race", None);
        store.save(&mut wf).unwrap();

        let mut first = store.load().unwrap();
        let mut second = store.load().unwrap();
        first.current_phase = "design".to_string();
        store.save(&mut first).unwrap();

        second.current_phase = "implementation".to_string();
        let err = store.save(&mut second).unwrap_err();
        assert!(matches!(err, WaypointError::Conflict { on_disk: 2, saving: 1, .. }));
        assert_eq!(store.load().unwrap().current_phase, "design");
    }

    #[test]
    fn update_does_not_write_on_error() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let mut wf = Workflow::new("abort", None);
        store.save(&mut wf).unwrap();

        let result: Result<()> = store.update(|wf| {
            wf.current_phase = "changed".to_string();
            Err(WaypointError::StoryNotFound("S9".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(store.load().unwrap().current_phase, "analysis");
    }

    #[test]
    fn iteration_counter_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        assert_eq!(store.iteration_count(), 0);
        assert_eq!(store.increment_iteration().unwrap(), 1);
        assert_eq!(store.increment_iteration().unwrap(), 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".claude/.iteration-count")).unwrap(),
            "2"
        );
        store.reset_iterations();
        assert_eq!(store.iteration_count(), 0);
    }

    #[test]
    fn save_copies_iteration_count() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.increment_iteration().unwrap();
        store.increment_iteration().unwrap();
        let mut wf = Workflow::new("count", None);
        store.save(&mut wf).unwrap();
        assert_eq!(store.load().unwrap().total_iterations, 2);
    }

    #[test]
    fn progress_line_format() {
        assert_eq!(
            format_progress_line("2026-01-01 10:00:00", "started", Some("S1"), Some("dev")),
            "[2026-01-01 10:00:00] [S1] [dev] started\n"
        );
        assert_eq!(
            format_progress_line("2026-01-01 10:00:00", "note", None, None),
            "[2026-01-01 10:00:00] note\n"
        );
    }

    #[test]
    fn progress_log_trim_and_archive() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        for i in 0..10 {
            store.log_progress(&format!("entry {i}"), None, None);
        }
        assert_eq!(store.recent_progress(3).len(), 3);
        assert!(store.recent_progress(3)[2].ends_with("entry 9"));

        assert!(store.trim_progress(4).unwrap());
        // Four kept entries plus the trim notice.
        let lines = store.recent_progress(100);
        assert_eq!(lines.len(), 5);
        assert!(lines[0].ends_with("entry 6"));
        assert!(lines[4].contains("Trimmed progress file to 4 lines"));

        assert!(store.archive_progress());
        assert!(dir.path().join(".claude/claude-progress.old").exists());
        assert!(store.recent_progress(10).is_empty());
    }
}
