//! Pure launch target classification.

use std::path::Path;

/// Scheme prefixes handed to the OS default handler.
pub const DEFAULT_PROTOCOLS: &[&str] = &["http://", "https://", "steam://", "epic://"];

/// Extensions the Windows shell resolves itself (shortcuts and scripts).
pub const SHELL_EXTENSIONS: &[&str] = &["lnk", "url", "bat", "cmd"];

/// How a launch target is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    /// URL or registered custom protocol, opened by the default handler.
    Protocol,
    /// Shortcut or batch script opened by the OS shell.
    ShellOpen,
    /// Executable spawned as a child process.
    DirectExec,
}

/// Platform family, as far as launching is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

/// Classifies `target` in priority order: protocol, shell open, direct exec.
///
/// `extra_protocols` are checked alongside [`DEFAULT_PROTOCOLS`]; entries
/// may be given with or without the `://` suffix. Shell open only applies
/// on Windows and only when there are no arguments, because the shell
/// cannot forward them.
pub fn classify(
    target: &str,
    args: &[String],
    platform: Platform,
    extra_protocols: &[String],
) -> LaunchKind {
    if is_protocol(target, extra_protocols) {
        return LaunchKind::Protocol;
    }

    if platform == Platform::Windows && args.is_empty() && is_shell_resolved(target) {
        return LaunchKind::ShellOpen;
    }

    LaunchKind::DirectExec
}

/// Returns `true` if `target` starts with a known scheme.
pub(crate) fn is_protocol(target: &str, extra_protocols: &[String]) -> bool {
    let lower = target.to_ascii_lowercase();
    DEFAULT_PROTOCOLS.iter().any(|p| lower.starts_with(p))
        || extra_protocols.iter().any(|p| {
            let p = p.to_ascii_lowercase();
            if p.ends_with("://") {
                lower.starts_with(&p)
            } else {
                lower.starts_with(&format!("{p}://"))
            }
        })
}

fn is_shell_resolved(target: &str) -> bool {
    Path::new(target)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            SHELL_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s))
        })
        .unwrap_or(false)
}
