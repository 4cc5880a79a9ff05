use crate::error::Result;
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An architecture decision record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub title: String,
    pub choice: String,
    pub rationale: String,
    pub date: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "accepted".to_string()
}

/// Record a decision as `ADR-001`, `ADR-002`, … and return it.
pub fn add_decision(store: &Store, title: &str, choice: &str, rationale: &str) -> Result<Decision> {
    let decision = store.update(|wf| {
        let decision = Decision {
            id: format!("ADR-{:03}", wf.decisions.len() + 1),
            title: title.to_string(),
            choice: choice.to_string(),
            rationale: rationale.to_string(),
            date: Utc::now(),
            status: default_status(),
        };
        wf.decisions.push(decision.clone());
        Ok(decision)
    })?;
    store.log_progress(
        &format!("Decision {}: {title} -> {choice}", decision.id),
        None,
        None,
    );
    Ok(decision)
}
