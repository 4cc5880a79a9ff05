use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STATE_DIR: &str = ".claude";

pub const STATE_FILE: &str = ".claude/workflow-state.json";
pub const PROGRESS_FILE: &str = ".claude/claude-progress.txt";
pub const PROGRESS_ARCHIVE: &str = ".claude/claude-progress.old";
pub const ITERATION_FILE: &str = ".claude/.iteration-count";
pub const CONFIG_FILE: &str = ".claude/waypoint.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn progress_path(root: &Path) -> PathBuf {
    root.join(PROGRESS_FILE)
}

pub fn progress_archive_path(root: &Path) -> PathBuf {
    root.join(PROGRESS_ARCHIVE)
}

pub fn iteration_path(root: &Path) -> PathBuf {
    root.join(ITERATION_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            state_path(root),
            PathBuf::from("/tmp/proj/.claude/workflow-state.json")
        );
        assert_eq!(
            progress_path(root),
            PathBuf::from("/tmp/proj/.claude/claude-progress.txt")
        );
        assert_eq!(
            iteration_path(root),
            PathBuf::from("/tmp/proj/.claude/.iteration-count")
        );
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.claude/waypoint.yaml")
        );
    }
}
