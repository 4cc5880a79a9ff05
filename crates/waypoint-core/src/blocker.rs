use crate::error::{Result, WaypointError};
use crate::store::Store;
use crate::types::{Severity, WorkflowStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blocker {
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A deliberate pause waiting on a manual fix, as opposed to a [`Blocker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIntervention {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_command: Option<String>,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Record a blocker and move the workflow to `blocked`. Returns its index.
pub fn add_blocker(store: &Store, description: &str, severity: Severity) -> Result<usize> {
    let index = store.update(|wf| {
        wf.blockers.push(Blocker {
            description: description.to_string(),
            severity,
            created_at: Utc::now(),
            resolved: false,
            resolved_at: None,
        });
        wf.status = WorkflowStatus::Blocked;
        Ok(wf.blockers.len() - 1)
    })?;
    store.log_progress(&format!("BLOCKER [{severity}]: {description}"), None, None);
    info!(index, %severity, "blocker added");
    Ok(index)
}

/// Mark blocker `index` resolved. Returns the workflow status afterwards.
pub fn resolve_blocker(store: &Store, index: usize) -> Result<WorkflowStatus> {
    let (description, status) = store.update(|wf| {
        let len = wf.blockers.len();
        let blocker = wf
            .blockers
            .get_mut(index)
            .ok_or(WaypointError::BlockerIndexOutOfRange { index, len })?;
        blocker.resolved = true;
        blocker.resolved_at = Some(Utc::now());
        let description = blocker.description.clone();

        if wf.open_blockers().is_empty() {
            wf.status = WorkflowStatus::InProgress;
        }
        Ok((description, wf.status))
    })?;
    store.log_progress(&format!("RESOLVED blocker: {description}"), None, None);
    Ok(status)
}

pub fn await_user(store: &Store, description: &str, check_command: Option<&str>) -> Result<()> {
    store.update(|wf| {
        wf.status = WorkflowStatus::AwaitingUser;
        wf.user_intervention = Some(UserIntervention {
            description: description.to_string(),
            check_command: check_command.map(str::to_string),
            requested_at: Utc::now(),
            resolved: false,
            resolved_at: None,
            notes: None,
        });
        Ok(())
    })?;
    store.log_progress(&format!("AWAITING USER: {description}"), None, None);
    Ok(())
}

/// Resolve the open intervention, if any, and resume. Returns whether one was open.
pub fn user_fix_complete(store: &Store, notes: Option<&str>) -> Result<bool> {
    let resolved = store.update(|wf| {
        let open = wf.user_intervention.as_mut().filter(|ui| !ui.resolved);
        let resolved = match open {
            Some(ui) => {
                ui.resolved = true;
                ui.resolved_at = Some(Utc::now());
                ui.notes = notes.map(str::to_string);
                true
            }
            None => false,
        };
        wf.status = WorkflowStatus::InProgress;
        Ok(resolved)
    })?;
    let suffix = notes.map(|n| format!(" - {n}")).unwrap_or_default();
    store.log_progress(&format!("USER FIX COMPLETE{suffix}"), None, None);
    Ok(resolved)
}
