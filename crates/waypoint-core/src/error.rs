use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaypointError {
    #[error("no active workflow: run 'waypoint init <goal>'")]
    NoActiveWorkflow,

    #[error("story not found: {0}")]
    StoryNotFound(String),

    #[error("invalid story status '{0}': must be pending, in_progress, testing, review, verified, completed, blocked, or skipped")]
    InvalidStatus(String),

    #[error("invalid verification check '{0}': must be testsPass, coverageMet, reviewApproved, or securityCleared")]
    InvalidCheck(String),

    #[error("invalid TDD phase '{0}': must be red, green, refactor, or verify")]
    InvalidPhase(String),

    #[error("invalid story size '{0}': must be S, M, L, or XL")]
    InvalidSize(String),

    #[error("invalid severity '{0}': must be low, medium, high, or critical")]
    InvalidSeverity(String),

    #[error("invalid failure category '{0}': must be code, test, infra, external, or timeout")]
    InvalidCategory(String),

    #[error("blocker index {index} out of range ({len} blockers recorded)")]
    BlockerIndexOutOfRange { index: usize, len: usize },

    #[error("workflow {workflow_id} was modified concurrently (on disk: revision {on_disk}, saving: revision {saving})")]
    Conflict {
        workflow_id: String,
        on_disk: u64,
        saving: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WaypointError>;
