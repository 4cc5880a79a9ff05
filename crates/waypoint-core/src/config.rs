use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// AlertThresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    #[serde(default = "default_report_interval")]
    pub report_interval_minutes: i64,
    #[serde(default = "default_stories_per_report")]
    pub stories_per_report: u32,
    #[serde(default = "default_stories_per_review")]
    pub stories_per_review: u32,
    #[serde(default = "default_extended")]
    pub extended_workflow_minutes: i64,
    #[serde(default = "default_very_long")]
    pub very_long_workflow_minutes: i64,
    #[serde(default = "default_high_iterations")]
    pub high_iteration_count: u64,
}

fn default_report_interval() -> i64 {
    30
}

fn default_stories_per_report() -> u32 {
    3
}

fn default_stories_per_review() -> u32 {
    5
}

fn default_extended() -> i64 {
    120
}

fn default_very_long() -> i64 {
    240
}

fn default_high_iterations() -> u64 {
    50
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            report_interval_minutes: default_report_interval(),
            stories_per_report: default_stories_per_report(),
            stories_per_review: default_stories_per_review(),
            extended_workflow_minutes: default_extended(),
            very_long_workflow_minutes: default_very_long(),
            high_iteration_count: default_high_iterations(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_recent_lines")]
    pub recent_lines: usize,
    #[serde(default = "default_trim_lines")]
    pub trim_lines: usize,
}

fn default_recent_lines() -> usize {
    20
}

fn default_trim_lines() -> usize {
    100
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            recent_lines: default_recent_lines(),
            trim_lines: default_trim_lines(),
        }
    }
}

// ---------------------------------------------------------------------------
// VcsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcsConfig {
    #[serde(default = "default_vcs_binary")]
    pub binary: String,
    #[serde(default = "default_vcs_timeout")]
    pub timeout_seconds: u64,
}

fn default_vcs_binary() -> String {
    "git".to_string()
}

fn default_vcs_timeout() -> u64 {
    10
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            binary: default_vcs_binary(),
            timeout_seconds: default_vcs_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub alerts: AlertThresholds,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub vcs: VcsConfig,
}

impl Config {
    /// Load `.claude/waypoint.yaml`, falling back to defaults when the file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let alerts = &self.alerts;

        if alerts.very_long_workflow_minutes <= alerts.extended_workflow_minutes {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "alerts.very_long_workflow_minutes ({}) should exceed \
                     alerts.extended_workflow_minutes ({})",
                    alerts.very_long_workflow_minutes, alerts.extended_workflow_minutes
                ),
            });
        }

        if alerts.report_interval_minutes <= 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "alerts.report_interval_minutes must be positive".to_string(),
            });
        }

        if alerts.stories_per_report == 0 || alerts.stories_per_review == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "a story cadence of 0 makes the checkpoint permanently due".to_string(),
            });
        }

        if self.progress.trim_lines < self.progress.recent_lines {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "progress.trim_lines ({}) is smaller than progress.recent_lines ({})",
                    self.progress.trim_lines, self.progress.recent_lines
                ),
            });
        }

        if self.vcs.timeout_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "vcs.timeout_seconds must be at least 1".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
