use std::path::{Path, PathBuf};

/// Resolve the project root that holds `.claude/`.
///
/// Priority:
/// 1. `--root` flag / `WAYPOINT_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of `cwd` holding `.claude/` or `.git/`
/// 3. `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd)
}

fn find_root_from(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|d| d.join(waypoint_core::paths::STATE_DIR).is_dir() || d.join(".git").is_dir())
        .unwrap_or(start)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn nearest_marker_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::create_dir_all(dir.path().join("app/.claude")).unwrap();
        let deep = dir.path().join("app/src/deep");
        std::fs::create_dir_all(&deep).unwrap();

        assert_eq!(find_root_from(&deep), dir.path().join("app"));
    }

    #[test]
    fn falls_back_to_start() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("repo/.git")).unwrap();
        let sub = dir.path().join("repo/pkg");
        std::fs::create_dir_all(&sub).unwrap();
        assert_eq!(find_root_from(&sub), dir.path().join("repo"));

        let lone = dir.path().join("lone");
        std::fs::create_dir_all(&lone).unwrap();
        // The temp dir itself may live under some repository; only assert when it does not.
        if !lone.ancestors().any(|d| d.join(".git").is_dir() || d.join(".claude").is_dir()) {
            assert_eq!(find_root_from(&lone), lone);
        }
    }
}
