//! Red → green → refactor → verify sequencing for a single story.
//!
//! Validation is advisory. `set_tdd_phase` records whatever it is told; the
//! driver is expected to ask `validate_tdd_transition` first.

use crate::error::Result;
use crate::store::Store;
use crate::types::TddPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TddHistoryEntry {
    pub phase: TddPhase,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCheck {
    pub valid: bool,
    pub from: Option<TddPhase>,
    pub to: TddPhase,
    pub expected: TddPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl TransitionCheck {
    pub fn describe(&self) -> String {
        let from = self.from.map(|p| p.as_str()).unwrap_or("none");
        match (&self.warning, self.valid) {
            (Some(w), _) => format!("{from} -> {}: allowed ({w})", self.to),
            (None, true) => format!("{from} -> {}: ok", self.to),
            (None, false) => format!(
                "{from} -> {}: invalid, expected {}",
                self.to, self.expected
            ),
        }
    }
}

/// Judge moving from `current` to `next` without touching any state.
pub fn validate(current: Option<TddPhase>, next: TddPhase) -> TransitionCheck {
    let expected = current.map(TddPhase::next).unwrap_or(TddPhase::Red);
    let skipped_refactor = current == Some(TddPhase::Green) && next == TddPhase::Verify;
    TransitionCheck {
        valid: next == expected || skipped_refactor,
        from: current,
        to: next,
        expected,
        warning: skipped_refactor.then(|| "skipped refactor".to_string()),
    }
}

pub fn set_tdd_phase(store: &Store, story_id: &str, phase: TddPhase) -> Result<()> {
    store.update(|wf| {
        let story = wf.story_mut(story_id)?;
        let now = Utc::now();
        story.tdd_phase = Some(phase);
        story.tdd_history.push(TddHistoryEntry { phase, at: now });
        story.last_updated = now;
        Ok(())
    })?;
    store.log_progress(
        &format!("TDD phase: {}", phase.as_str().to_uppercase()),
        Some(story_id),
        None,
    );
    Ok(())
}

pub fn validate_tdd_transition(
    store: &Store,
    story_id: &str,
    next: TddPhase,
) -> Result<TransitionCheck> {
    let wf = store.require()?;
    Ok(validate(wf.story(story_id)?.tdd_phase, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaypointError;
    use crate::story::{add_story, NewStory};
    use crate::workflow::initialize;
    use tempfile::TempDir;

    #[test]
    fn first_phase_must_be_red() {
        assert!(validate(None, TddPhase::Red).valid);
        for phase in [TddPhase::Green, TddPhase::Refactor, TddPhase::Verify] {
            let check = validate(None, phase);
            assert!(!check.valid);
            assert_eq!(check.expected, TddPhase::Red);
        }
    }

    #[test]
    fn canonical_successors_are_valid() {
        for phase in TddPhase::all() {
            let check = validate(Some(*phase), phase.next());
            assert!(check.valid, "{phase} -> {}", phase.next());
            assert!(check.warning.is_none());
        }
    }

    #[test]
    fn green_to_verify_warns() {
        let check = validate(Some(TddPhase::Green), TddPhase::Verify);
        assert!(check.valid);
        assert_eq!(check.warning.as_deref(), Some("skipped refactor"));
    }

    #[test]
    fn other_jumps_are_invalid() {
        let check = validate(Some(TddPhase::Red), TddPhase::Refactor);
        assert!(!check.valid);
        assert_eq!(check.from, Some(TddPhase::Red));
        assert_eq!(check.expected, TddPhase::Green);
        assert_eq!(check.describe(), "red -> refactor: invalid, expected green");

        assert!(!validate(Some(TddPhase::Verify), TddPhase::Green).valid);
        assert!(!validate(Some(TddPhase::Red), TddPhase::Red).valid);
    }

    #[test]
    fn phases_are_recorded_in_history() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        initialize(&store, "goal", None).unwrap();
        let id = add_story(&store, NewStory::titled("a")).unwrap();

        assert!(validate_tdd_transition(&store, &id, TddPhase::Red).unwrap().valid);
        set_tdd_phase(&store, &id, TddPhase::Red).unwrap();
        set_tdd_phase(&store, &id, TddPhase::Green).unwrap();

        let check = validate_tdd_transition(&store, &id, TddPhase::Verify).unwrap();
        assert_eq!(check.warning.as_deref(), Some("skipped refactor"));

        let wf = store.load().unwrap();
        let story = wf.story(&id).unwrap();
        assert_eq!(story.tdd_phase, Some(TddPhase::Green));
        let phases: Vec<TddPhase> = story.tdd_history.iter().map(|h| h.phase).collect();
        assert_eq!(phases, [TddPhase::Red, TddPhase::Green]);
        assert!(store
            .recent_progress(5)
            .iter()
            .any(|l| l.ends_with("[S1] TDD phase: GREEN")));
    }

    #[test]
    fn unknown_story_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        initialize(&store, "goal", None).unwrap();
        assert!(matches!(
            set_tdd_phase(&store, "S4", TddPhase::Red),
            Err(WaypointError::StoryNotFound(_))
        ));
    }
}
