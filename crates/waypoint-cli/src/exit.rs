// ---------------------------------------------------------------------------
// ExitSignal: structured non-zero exits for the driver loop
// ---------------------------------------------------------------------------

/// Returned as an error by a command whose output already went to stdout but
/// whose outcome the driver must branch on. `main` maps it to the exit code.
#[derive(Debug)]
pub enum ExitSignal {
    CheckpointDue,
    ReportDue,
    Blocked { open: usize },
    TimeoutExceeded { story_id: String },
    Escalate { reason: String },
}

impl ExitSignal {
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitSignal::CheckpointDue | ExitSignal::ReportDue => 2,
            ExitSignal::Blocked { .. } | ExitSignal::TimeoutExceeded { .. } => 3,
            ExitSignal::Escalate { .. } => 4,
        }
    }
}

impl std::fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitSignal::CheckpointDue => write!(f, "human review checkpoint due"),
            ExitSignal::ReportDue => write!(f, "progress report due"),
            ExitSignal::Blocked { open } => write!(f, "workflow blocked ({open} open blocker(s))"),
            ExitSignal::TimeoutExceeded { story_id } => {
                write!(f, "story {story_id} exceeded its timeout")
            }
            ExitSignal::Escalate { reason } => write!(f, "escalate: {reason}"),
        }
    }
}

impl std::error::Error for ExitSignal {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_outcome() {
        assert_eq!(ExitSignal::CheckpointDue.exit_code(), 2);
        assert_eq!(ExitSignal::ReportDue.exit_code(), 2);
        assert_eq!(ExitSignal::Blocked { open: 1 }.exit_code(), 3);
        assert_eq!(
            ExitSignal::TimeoutExceeded {
                story_id: "S1".to_string()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            ExitSignal::Escalate {
                reason: "x".to_string()
            }
            .exit_code(),
            4
        );
    }

    #[test]
    fn survives_anyhow_roundtrip() {
        let err: anyhow::Error = ExitSignal::ReportDue.into();
        assert_eq!(err.downcast_ref::<ExitSignal>().map(|s| s.exit_code()), Some(2));
    }
}
