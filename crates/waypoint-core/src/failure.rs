use crate::error::{Result, WaypointError};
use crate::store::Store;
use crate::workflow::Workflow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MAX_MESSAGE_CHARS: usize = 500;
const RETRY_WINDOW: usize = 3;
const REPEAT_PREFIX_CHARS: usize = 50;
const BACKOFF_STEP_SECONDS: u64 = 30;

// ---------------------------------------------------------------------------
// FailureCategory
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Code,
    Test,
    Infra,
    External,
    Timeout,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::Code => "code",
            FailureCategory::Test => "test",
            FailureCategory::Infra => "infra",
            FailureCategory::External => "external",
            FailureCategory::Timeout => "timeout",
        }
    }

    pub fn policy(self) -> &'static CategoryPolicy {
        CATEGORY_TABLE
            .iter()
            .find(|row| row.category == self)
            .unwrap_or(&CATEGORY_TABLE[0])
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FailureCategory {
    type Err = WaypointError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CATEGORY_TABLE
            .iter()
            .map(|row| row.category)
            .find(|c| c.as_str() == s)
            .ok_or_else(|| WaypointError::InvalidCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Category table
// ---------------------------------------------------------------------------

pub struct CategoryPolicy {
    pub category: FailureCategory,
    pub description: &'static str,
    /// Lower-case substrings; any match selects the row.
    pub triggers: &'static [&'static str],
    pub retryable: bool,
    pub needs_backoff: bool,
    pub should_escalate: bool,
}

/// Consulted top to bottom; the first row with a matching trigger wins.
pub static CATEGORY_TABLE: [CategoryPolicy; 5] = [
    CategoryPolicy {
        category: FailureCategory::Code,
        description: "Compilation, runtime or logic error in the code under change",
        triggers: &[
            "error:",
            "exception:",
            "failed assertion",
            "null reference",
            "undefined",
        ],
        retryable: true,
        needs_backoff: false,
        should_escalate: false,
    },
    CategoryPolicy {
        category: FailureCategory::Test,
        description: "Test failure or broken test setup",
        triggers: &[
            "expected:",
            "actual:",
            "assertion failed",
            "test setup failed",
        ],
        retryable: true,
        needs_backoff: false,
        should_escalate: false,
    },
    CategoryPolicy {
        category: FailureCategory::Infra,
        description: "Local infrastructure problem (network, database, disk, permissions)",
        triggers: &[
            "connection refused",
            "timeout",
            "database",
            "network",
            "permission denied",
            "disk full",
        ],
        retryable: true,
        needs_backoff: true,
        should_escalate: false,
    },
    CategoryPolicy {
        category: FailureCategory::External,
        description: "Third-party service or credential problem outside the agent's control",
        triggers: &[
            "api key",
            "authentication",
            "rate limit",
            "401",
            "403",
            "503",
            "service unavailable",
        ],
        retryable: false,
        needs_backoff: false,
        should_escalate: true,
    },
    CategoryPolicy {
        category: FailureCategory::Timeout,
        description: "Operation exceeded its time limit",
        triggers: &["timed out", "deadline exceeded", "operation timeout"],
        retryable: true,
        needs_backoff: true,
        should_escalate: false,
    },
];

/// Classify a failure message by case-insensitive substring match, defaulting to `code`.
pub fn categorize(message: &str) -> FailureCategory {
    let lower = message.to_lowercase();
    CATEGORY_TABLE
        .iter()
        .find(|row| row.triggers.iter().any(|t| lower.contains(t)))
        .map(|row| row.category)
        .unwrap_or(FailureCategory::Code)
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub id: String,
    pub story_id: String,
    pub category: FailureCategory,
    pub message: String,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub iteration: u64,
    pub retryable: bool,
    pub needs_backoff: bool,
    pub should_escalate: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewFailure {
    pub story_id: String,
    pub message: String,
    /// `None` auto-categorizes from the message.
    pub category: Option<FailureCategory>,
    pub context: BTreeMap<String, serde_json::Value>,
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

pub fn push_failure(
    wf: &mut Workflow,
    new: NewFailure,
    iteration: u64,
    now: DateTime<Utc>,
) -> Failure {
    let category = new.category.unwrap_or_else(|| categorize(&new.message));
    let policy = category.policy();
    let failure = Failure {
        id: format!("F{}", wf.failures.len() + 1),
        story_id: new.story_id,
        category,
        message: truncate_chars(&new.message, MAX_MESSAGE_CHARS),
        context: new.context,
        timestamp: now,
        iteration,
        retryable: policy.retryable,
        needs_backoff: policy.needs_backoff,
        should_escalate: policy.should_escalate,
    };
    wf.failures.push(failure.clone());
    *wf.metrics.failures_by_category.entry(category).or_insert(0) += 1;
    failure
}

/// Append a failure to the workflow log. The story id is not required to exist.
pub fn record_failure(store: &Store, new: NewFailure) -> Result<Failure> {
    let iteration = store.iteration_count();
    let failure = store.update(|wf| Ok(push_failure(wf, new, iteration, Utc::now())))?;
    store.log_progress(
        &format!(
            "FAILURE [{}] {}: {}",
            failure.category,
            failure.id,
            truncate_chars(&failure.message, 100)
        ),
        Some(&failure.story_id),
        None,
    );
    Ok(failure)
}

pub fn failures_for(store: &Store, story_id: &str) -> Vec<Failure> {
    store
        .load()
        .map(|wf| {
            wf.failures
                .into_iter()
                .filter(|f| f.story_id == story_id)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Retry advice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryRecommendation {
    pub retry: bool,
    pub escalate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_seconds: Option<u64>,
    pub reason: String,
    pub failure_count: usize,
}

impl RetryRecommendation {
    fn retry(reason: impl Into<String>, failure_count: usize) -> Self {
        Self {
            retry: true,
            escalate: false,
            backoff_seconds: None,
            reason: reason.into(),
            failure_count,
        }
    }

    fn escalate(reason: impl Into<String>, failure_count: usize) -> Self {
        Self {
            retry: false,
            escalate: true,
            backoff_seconds: None,
            reason: reason.into(),
            failure_count,
        }
    }
}

/// Advice from a story's failure history, oldest first. Only the last three count.
pub fn recommend(history: &[&Failure]) -> RetryRecommendation {
    let total = history.len();
    if total == 0 {
        return RetryRecommendation::retry("no failures", 0);
    }
    let window = &history[total.saturating_sub(RETRY_WINDOW)..];

    let external = window
        .iter()
        .filter(|f| f.category == FailureCategory::External)
        .count();
    if external >= 2 {
        return RetryRecommendation::escalate(
            format!("{external} external failures in the last {}", window.len()),
            total,
        );
    }

    let backoff = window.iter().filter(|f| f.needs_backoff).count();
    if backoff > 0 {
        return RetryRecommendation {
            backoff_seconds: Some(BACKOFF_STEP_SECONDS * backoff as u64),
            ..RetryRecommendation::retry(format!("{backoff} failure(s) need backoff"), total)
        };
    }

    if window.len() == RETRY_WINDOW {
        let first = truncate_chars(&window[0].message, REPEAT_PREFIX_CHARS);
        if window
            .iter()
            .all(|f| truncate_chars(&f.message, REPEAT_PREFIX_CHARS) == first)
        {
            return RetryRecommendation::escalate("same error repeated", total);
        }
    }

    RetryRecommendation::retry("standard retry", total)
}

pub fn retry_recommendation(store: &Store, story_id: &str) -> RetryRecommendation {
    let history = failures_for(store, story_id);
    let refs: Vec<&Failure> = history.iter().collect();
    recommend(&refs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
