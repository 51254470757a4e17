//! Launch target classification and dispatch.
//!
//! A launch target is a URL/custom protocol, a shell-resolved shortcut, or
//! a plain executable. [`classify`] decides which; [`LaunchDispatcher`]
//! executes the decision through an injected [`ProcessLauncher`] so the
//! platform side can be swapped out in tests.

mod classify;
mod dispatch;
mod launcher;

pub use classify::{DEFAULT_PROTOCOLS, LaunchKind, Platform, SHELL_EXTENSIONS, classify};
pub use dispatch::{LaunchDispatcher, LaunchOutcome};
pub use launcher::{ProcessLauncher, SystemLauncher};

/// Errors produced by a [`ProcessLauncher`].
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("game_path not found: {0}")]
    MissingTarget(String),

    #[error("failed to open {target}: {reason}")]
    Open { target: String, reason: String },
}
