use crate::error::Result;
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    pub answer: String,
    pub phase: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

/// Append a question/answer pair. `phase` defaults to the workflow's current phase.
pub fn add_clarification(
    store: &Store,
    question: &str,
    answer: &str,
    phase: Option<&str>,
    category: &str,
) -> Result<Clarification> {
    let record = store.update(|wf| {
        let record = Clarification {
            question: question.to_string(),
            answer: answer.to_string(),
            phase: phase.map(str::to_string).unwrap_or_else(|| wf.current_phase.clone()),
            category: category.to_string(),
            timestamp: Utc::now(),
        };
        wf.clarifications.push(record.clone());
        Ok(record)
    })?;
    let preview: String = question.chars().take(50).collect();
    store.log_progress(
        &format!("Clarification [{}]: {preview}", record.category),
        None,
        None,
    );
    Ok(record)
}

/// Clarifications matching every given filter, in insertion order.
pub fn clarifications(
    store: &Store,
    phase: Option<&str>,
    category: Option<&str>,
) -> Vec<Clarification> {
    let Some(wf) = store.load() else {
        return Vec::new();
    };
    wf.clarifications
        .into_iter()
        .filter(|c| phase.is_none_or(|p| c.phase == p))
        .filter(|c| category.is_none_or(|cat| c.category == cat))
        .collect()
}
