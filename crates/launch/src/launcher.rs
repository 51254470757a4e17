//! Platform launch mechanisms behind a trait seam.

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::LaunchError;

/// The OS-facing half of launching.
///
/// [`SystemLauncher`] is the real implementation; tests provide one that
/// records calls instead of starting processes.
pub trait ProcessLauncher: Send + Sync {
    /// Hands a URL or protocol URI to the default handler.
    fn open_uri(&self, uri: &str) -> Result<(), LaunchError>;

    /// Asks the OS shell to open a file or folder with its associated program.
    fn shell_open(&self, path: &Path) -> Result<(), LaunchError>;

    /// Spawns `program` with `args` in `cwd` without waiting for it.
    ///
    /// Returns the child's process id.
    fn spawn(&self, program: &Path, args: &[String], cwd: &Path) -> Result<u32, LaunchError>;
}

/// Launches through the real OS facilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn open_uri(&self, uri: &str) -> Result<(), LaunchError> {
        open::that_detached(uri).map_err(|e| LaunchError::Open {
            target: uri.to_string(),
            reason: e.to_string(),
        })
    }

    fn shell_open(&self, path: &Path) -> Result<(), LaunchError> {
        open::that_detached(path).map_err(|e| LaunchError::Open {
            target: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn spawn(&self, program: &Path, args: &[String], cwd: &Path) -> Result<u32, LaunchError> {
        let mut child = Command::new(program).args(args).current_dir(cwd).spawn()?;
        let pid = child.id();

        // The game outlives this call; a detached thread reaps it on exit.
        let reaper = std::thread::Builder::new()
            .name(format!("reap-{pid}"))
            .spawn(move || match child.wait() {
                Ok(status) => debug!(pid, %status, "game exited"),
                Err(e) => warn!(pid, error = %e, "failed to wait for game"),
            });
        if let Err(e) = reaper {
            warn!(pid, error = %e, "could not start reaper thread");
        }
        Ok(pid)
    }
}
