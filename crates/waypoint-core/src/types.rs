use crate::error::WaypointError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// WorkflowStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    InProgress,
    AwaitingUser,
    Blocked,
    Completed,
}

impl WorkflowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::AwaitingUser => "awaiting_user",
            WorkflowStatus::Blocked => "blocked",
            WorkflowStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StoryStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    Pending,
    InProgress,
    Testing,
    Review,
    Verified,
    Completed,
    Blocked,
    Skipped,
}

impl StoryStatus {
    pub fn all() -> &'static [StoryStatus] {
        &[
            StoryStatus::Pending,
            StoryStatus::InProgress,
            StoryStatus::Testing,
            StoryStatus::Review,
            StoryStatus::Verified,
            StoryStatus::Completed,
            StoryStatus::Blocked,
            StoryStatus::Skipped,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoryStatus::Pending => "pending",
            StoryStatus::InProgress => "in_progress",
            StoryStatus::Testing => "testing",
            StoryStatus::Review => "review",
            StoryStatus::Verified => "verified",
            StoryStatus::Completed => "completed",
            StoryStatus::Blocked => "blocked",
            StoryStatus::Skipped => "skipped",
        }
    }

    /// Work has started and not yet reached verification.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            StoryStatus::InProgress | StoryStatus::Testing | StoryStatus::Review
        )
    }

    /// Completed and skipped stories need no further work.
    pub fn is_done(self) -> bool {
        matches!(self, StoryStatus::Completed | StoryStatus::Skipped)
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoryStatus {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoryStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| WaypointError::InvalidStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// StorySize
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorySize {
    #[serde(rename = "S")]
    Small,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
}

impl StorySize {
    pub fn as_str(self) -> &'static str {
        match self {
            StorySize::Small => "S",
            StorySize::Medium => "M",
            StorySize::Large => "L",
            StorySize::ExtraLarge => "XL",
        }
    }
}

impl fmt::Display for StorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StorySize {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "S" => Ok(StorySize::Small),
            "M" => Ok(StorySize::Medium),
            "L" => Ok(StorySize::Large),
            "XL" => Ok(StorySize::ExtraLarge),
            _ => Err(WaypointError::InvalidSize(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(WaypointError::InvalidSeverity(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// VerificationCheck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationCheck {
    TestsPass,
    CoverageMet,
    ReviewApproved,
    SecurityCleared,
}

impl VerificationCheck {
    pub fn all() -> &'static [VerificationCheck] {
        &[
            VerificationCheck::TestsPass,
            VerificationCheck::CoverageMet,
            VerificationCheck::ReviewApproved,
            VerificationCheck::SecurityCleared,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VerificationCheck::TestsPass => "testsPass",
            VerificationCheck::CoverageMet => "coverageMet",
            VerificationCheck::ReviewApproved => "reviewApproved",
            VerificationCheck::SecurityCleared => "securityCleared",
        }
    }
}

impl fmt::Display for VerificationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VerificationCheck {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "testsPass" | "tests_pass" => Ok(VerificationCheck::TestsPass),
            "coverageMet" | "coverage_met" => Ok(VerificationCheck::CoverageMet),
            "reviewApproved" | "review_approved" => Ok(VerificationCheck::ReviewApproved),
            "securityCleared" | "security_cleared" => Ok(VerificationCheck::SecurityCleared),
            _ => Err(WaypointError::InvalidCheck(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TddPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TddPhase {
    Red,
    Green,
    Refactor,
    Verify,
}

impl TddPhase {
    pub fn all() -> &'static [TddPhase] {
        &[
            TddPhase::Red,
            TddPhase::Green,
            TddPhase::Refactor,
            TddPhase::Verify,
        ]
    }

    /// Canonical successor; `verify` wraps around to the next cycle's `red`.
    pub fn next(self) -> TddPhase {
        match self {
            TddPhase::Red => TddPhase::Green,
            TddPhase::Green => TddPhase::Refactor,
            TddPhase::Refactor => TddPhase::Verify,
            TddPhase::Verify => TddPhase::Red,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TddPhase::Red => "red",
            TddPhase::Green => "green",
            TddPhase::Refactor => "refactor",
            TddPhase::Verify => "verify",
        }
    }
}

impl fmt::Display for TddPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TddPhase {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(TddPhase::Red),
            "green" => Ok(TddPhase::Green),
            "refactor" => Ok(TddPhase::Refactor),
            "verify" => Ok(TddPhase::Verify),
            _ => Err(WaypointError::InvalidPhase(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_status_parses_every_known_name() {
        for status in StoryStatus::all() {
            let parsed: StoryStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, *status);
        }
    }

    #[test]
    fn story_status_rejects_unknown() {
        let err = "done".parse::<StoryStatus>().unwrap_err();
        assert!(matches!(err, WaypointError::InvalidStatus(s) if s == "done"));
    }

    #[test]
    fn story_status_serializes_snake_case() {
        let json = serde_json::to_string(&StoryStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn size_accepts_lowercase_and_serializes_short_form() {
        assert_eq!("xl".parse::<StorySize>().unwrap(), StorySize::ExtraLarge);
        assert_eq!(
            serde_json::to_string(&StorySize::ExtraLarge).unwrap(),
            "\"XL\""
        );
        assert!("huge".parse::<StorySize>().is_err());
    }

    #[test]
    fn verification_check_accepts_both_spellings() {
        assert_eq!(
            "testsPass".parse::<VerificationCheck>().unwrap(),
            VerificationCheck::TestsPass
        );
        assert_eq!(
            "security_cleared".parse::<VerificationCheck>().unwrap(),
            VerificationCheck::SecurityCleared
        );
        assert!(matches!(
            "lintClean".parse::<VerificationCheck>(),
            Err(WaypointError::InvalidCheck(_))
        ));
    }

    #[test]
    fn tdd_cycle_wraps() {
        assert_eq!(TddPhase::Red.next(), TddPhase::Green);
        assert_eq!(TddPhase::Verify.next(), TddPhase::Red);
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low < Severity::Medium);
    }
}
