//! Thin, time-boxed calls to git for known-good commit tracking.
//!
//! Nothing here returns an error for a git problem: a missing binary, a
//! non-zero exit, or a timeout all read as "did not happen" (`None`/`false`).
//! Only state-store failures propagate.

use crate::config::VcsConfig;
use crate::error::Result;
use crate::store::Store;
use chrono::Utc;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

pub const ROLLBACK_STASH_MESSAGE: &str = "Pre-rollback stash";

#[derive(Debug, Clone)]
pub struct Vcs {
    binary: PathBuf,
    workdir: PathBuf,
    timeout: Duration,
}

impl Vcs {
    pub fn new(binary: PathBuf, workdir: &Path, timeout: Duration) -> Self {
        Self {
            binary,
            workdir: workdir.to_path_buf(),
            timeout,
        }
    }

    /// Resolve the configured binary on `PATH`. `None` when it is not installed.
    pub fn locate(config: &VcsConfig, workdir: &Path) -> Option<Self> {
        match which::which(&config.binary) {
            Ok(binary) => Some(Self::new(
                binary,
                workdir,
                Duration::from_secs(config.timeout_seconds.max(1)),
            )),
            Err(e) => {
                warn!(binary = %config.binary, error = %e, "version control binary not found");
                None
            }
        }
    }

    /// Run one command; trimmed stdout on success, `None` otherwise.
    pub fn run(&self, args: &[&str]) -> Option<String> {
        let mut child = match Command::new(&self.binary)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(?args, error = %e, "failed to spawn version control command");
                return None;
            }
        };

        let mut stdout = child.stdout.take()?;
        let reader = thread::spawn(move || {
            let mut out = String::new();
            stdout.read_to_string(&mut out).map(|_| out)
        });

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                warn!(?args, timeout_secs = self.timeout.as_secs(), "version control command timed out, killing");
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Err(e) => {
                warn!(?args, error = %e, "failed waiting for version control command");
                return None;
            }
        };

        let out = reader.join().ok()?.ok()?;
        debug!(?args, exit_code = ?status.code(), "version control command finished");
        status.success().then(|| out.trim().to_string())
    }

    pub fn head(&self) -> Option<String> {
        self.run(&["rev-parse", "HEAD"]).filter(|s| !s.is_empty())
    }
}

/// Record HEAD as the last known-good commit. `Ok(None)` when git could not tell.
pub fn mark_working_state(store: &Store, config: &VcsConfig) -> Result<Option<String>> {
    store.require()?;
    let Some(commit) = Vcs::locate(config, store.root()).and_then(|vcs| vcs.head()) else {
        return Ok(None);
    };
    store.update(|wf| {
        wf.last_working_commit = Some(commit.clone());
        wf.last_working_at = Some(Utc::now());
        Ok(())
    })?;
    store.log_progress(&format!("Marked working state: {}", short(&commit)), None, None);
    Ok(Some(commit))
}

/// Commit everything (allowing an empty commit) and mark it known-good.
pub fn checkpoint_commit(store: &Store, config: &VcsConfig, message: &str) -> Result<Option<String>> {
    store.require()?;
    let Some(vcs) = Vcs::locate(config, store.root()) else {
        return Ok(None);
    };
    if vcs.run(&["add", "-A"]).is_none() {
        return Ok(None);
    }
    if vcs.run(&["commit", "--allow-empty", "-m", message]).is_none() {
        return Ok(None);
    }
    store.log_progress(&format!("Checkpoint commit: {message}"), None, None);
    mark_working_state(store, config)
}

/// Stash local changes and hard-reset to the last known-good commit.
///
/// `Ok(false)` when no commit has been marked or git failed.
pub fn rollback_to_checkpoint(store: &Store, config: &VcsConfig) -> Result<bool> {
    let wf = store.require()?;
    let Some(commit) = wf.last_working_commit else {
        return Ok(false);
    };
    let Some(vcs) = Vcs::locate(config, store.root()) else {
        return Ok(false);
    };

    if vcs
        .run(&["stash", "push", "-m", ROLLBACK_STASH_MESSAGE])
        .is_none()
    {
        debug!("nothing stashed before rollback");
    }
    if vcs.run(&["reset", "--hard", &commit]).is_none() {
        return Ok(false);
    }
    store.log_progress(&format!("ROLLBACK to {}", short(&commit)), None, None);
    Ok(true)
}

fn short(commit: &str) -> &str {
    commit.get(..8).unwrap_or(commit)
}
