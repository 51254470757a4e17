//! Launch dispatcher: classify, pre-flight, execute, report.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::LaunchError;
use crate::classify::{LaunchKind, Platform, classify};
use crate::launcher::{ProcessLauncher, SystemLauncher};

/// Result of a launch attempt.
///
/// Success means the handler or process was started, not that the game
/// ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub success: bool,
    pub message: String,
}

impl LaunchOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for LaunchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.success { "OK" } else { "FAIL" };
        write!(f, "{tag}: {}", self.message)
    }
}

/// Classifies launch targets and runs them through a [`ProcessLauncher`].
///
/// Never panics or returns an error: every failure becomes a
/// [`LaunchOutcome`] with `success = false`.
pub struct LaunchDispatcher<L: ProcessLauncher = SystemLauncher> {
    launcher: L,
    platform: Platform,
    extra_protocols: Vec<String>,
}

impl LaunchDispatcher<SystemLauncher> {
    /// Dispatcher for the current platform using real OS facilities.
    pub fn system() -> Self {
        Self::new(SystemLauncher, Platform::current())
    }
}

impl<L: ProcessLauncher> LaunchDispatcher<L> {
    pub fn new(launcher: L, platform: Platform) -> Self {
        Self {
            launcher,
            platform,
            extra_protocols: Vec::new(),
        }
    }

    /// Adds schemes treated as protocols on top of the built-in list.
    pub fn with_protocols(mut self, protocols: Vec<String>) -> Self {
        self.extra_protocols = protocols;
        self
    }

    /// Returns the underlying launcher.
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Classifies `target` for this dispatcher's platform.
    pub fn classify(&self, target: &str, args: &[String]) -> LaunchKind {
        classify(target, args, self.platform, &self.extra_protocols)
    }

    /// Launches `target`.
    ///
    /// `work_dir` applies to direct execution only; when absent or empty
    /// the target's parent directory is used and created if missing.
    pub fn launch(&self, target: &str, work_dir: Option<&str>, args: &[String]) -> LaunchOutcome {
        if target.trim().is_empty() {
            return LaunchOutcome::failed("game_path not found");
        }

        let kind = self.classify(target, args);
        match self.execute(kind, target, work_dir, args) {
            Ok(message) => {
                info!(game = target, ?kind, "launched");
                LaunchOutcome::ok(message)
            }
            Err(e) => {
                warn!(game = target, ?kind, error = %e, "launch failed");
                LaunchOutcome::failed(e.to_string())
            }
        }
    }

    /// Opens a folder or file in the OS file manager or associated editor.
    pub fn reveal(&self, path: &Path) -> LaunchOutcome {
        if !path.exists() {
            return LaunchOutcome::failed(format!("{} does not exist", path.display()));
        }
        match self.launcher.shell_open(path) {
            Ok(()) => LaunchOutcome::ok(format!("Opened {}", path.display())),
            Err(e) => LaunchOutcome::failed(format!("{}: {e}", path.display())),
        }
    }

    fn execute(
        &self,
        kind: LaunchKind,
        target: &str,
        work_dir: Option<&str>,
        args: &[String],
    ) -> Result<String, LaunchError> {
        match kind {
            LaunchKind::Protocol => {
                self.launcher.open_uri(target)?;
                Ok("Opened URL/protocol".into())
            }
            LaunchKind::ShellOpen => {
                let path = existing_path(target)?;
                self.launcher.shell_open(&path)?;
                Ok("Launched via Shell".into())
            }
            LaunchKind::DirectExec => {
                let path = existing_path(target)?;
                let cwd = resolve_work_dir(&path, work_dir);
                std::fs::create_dir_all(&cwd)?;
                let pid = self.launcher.spawn(&path, args, &cwd)?;
                Ok(format!("Launched (pid {pid})"))
            }
        }
    }
}

fn existing_path(target: &str) -> Result<PathBuf, LaunchError> {
    let path = PathBuf::from(target);
    if path.exists() {
        Ok(path)
    } else {
        Err(LaunchError::MissingTarget(target.to_string()))
    }
}

fn resolve_work_dir(target: &Path, work_dir: Option<&str>) -> PathBuf {
    match work_dir {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    }
}
