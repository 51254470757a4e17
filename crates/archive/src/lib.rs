//! Zip extraction into a user-chosen install directory.
//!
//! Every entry is resolved against the canonical destination before
//! anything is written for it. Absolute names, drive or UNC prefixes,
//! `..` components that climb out, and pre-existing symlinks that point
//! outside the destination all abort the extraction ("zip-slip").
//!
//! Extraction is not transactional: entries written before a rejected
//! one stay on disk.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

/// File suffix recognized as an extractable update archive.
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// Errors produced while extracting an archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("unsafe path in zip: {entry} ({reason})")]
    UnsafePath { entry: String, reason: &'static str },
}

/// Counts of what an extraction wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub dirs: usize,
    pub bytes: u64,
}

/// Returns `true` if `path` names a zip archive (case-insensitive).
pub fn is_archive(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(ARCHIVE_SUFFIX)
}

/// Extracts `archive_path` into `dest_dir`, creating it if needed.
///
/// Stops at the first unsafe entry and returns [`ArchiveError::UnsafePath`].
pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<ExtractSummary, ArchiveError> {
    std::fs::create_dir_all(dest_dir)?;
    let base = std::fs::canonicalize(dest_dir)?;

    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut summary = ExtractSummary::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        let out = resolve_entry(&base, &name)
            .and_then(|out| ensure_no_escape(&base, out, &name))
            .inspect_err(|e| warn!(archive = %archive_path.display(), error = %e, "rejected entry"))?;

        if entry.is_dir() {
            std::fs::create_dir_all(&out)?;
            summary.dirs += 1;
            continue;
        }

        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut target = File::create(&out)?;
        summary.bytes += std::io::copy(&mut entry, &mut target)?;
        summary.files += 1;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode().map(|m| m & 0o777).filter(|m| *m != 0) {
                std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode))?;
            }
        }

        debug!(entry = %name, "extracted");
    }

    info!(
        archive = %archive_path.display(),
        dest = %base.display(),
        files = summary.files,
        dirs = summary.dirs,
        "archive extracted"
    );
    Ok(summary)
}

/// Joins an entry name onto `base` lexically, refusing anything that
/// would leave it.
///
/// Backslashes are treated as separators so archives built on Windows
/// cannot smuggle `..\` past the check.
fn resolve_entry(base: &Path, name: &str) -> Result<PathBuf, ArchiveError> {
    let unsafe_path = |reason| ArchiveError::UnsafePath {
        entry: name.to_string(),
        reason,
    };

    if is_absolute_name(name) {
        return Err(unsafe_path("absolute path"));
    }

    let normalized = name.replace('\\', "/");
    let mut out = base.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(unsafe_path("path traversal"));
                }
                out.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path("absolute path"));
            }
        }
    }

    if !out.starts_with(base) {
        return Err(unsafe_path("path traversal"));
    }
    Ok(out)
}

/// Canonicalizes the deepest part of `out` that already exists and checks
/// it is still under `base`, catching symlinks planted in the destination.
fn ensure_no_escape(base: &Path, out: PathBuf, name: &str) -> Result<PathBuf, ArchiveError> {
    let existing = out
        .ancestors()
        .find(|p| p.symlink_metadata().is_ok())
        .unwrap_or(base);

    let resolved = std::fs::canonicalize(existing).map_err(|_| ArchiveError::UnsafePath {
        entry: name.to_string(),
        reason: "unresolvable link",
    })?;

    if resolved.starts_with(base) {
        Ok(out)
    } else {
        Err(ArchiveError::UnsafePath {
            entry: name.to_string(),
            reason: "path traversal",
        })
    }
}

/// Leading slash, leading backslash, or a `C:` style drive prefix.
fn is_absolute_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    name.starts_with('/')
        || name.starts_with('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    enum Entry<'a> {
        File(&'a str, &'a [u8]),
        Dir(&'a str),
    }

    fn build_zip(path: &Path, entries: &[Entry<'_>]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        for entry in entries {
            match entry {
                Entry::File(name, data) => {
                    zip.start_file(*name, options).unwrap();
                    zip.write_all(data).unwrap();
                }
                Entry::Dir(name) => zip.add_directory(*name, options).unwrap(),
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_nested_file() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("update.zip");
        build_zip(
            &archive,
            &[Entry::Dir("a/"), Entry::File("a/b/ok.txt", b"hello world")],
        );

        let dest = tmp.path().join("install");
        let summary = extract(&archive, &dest).unwrap();

        assert_eq!(
            std::fs::read(dest.join("a").join("b").join("ok.txt")).unwrap(),
            b"hello world"
        );
        assert_eq!(summary.files, 1);
        assert_eq!(summary.dirs, 1);
        assert_eq!(summary.bytes, 11);
    }

    #[test]
    fn rejects_traversal_before_writing_outside() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("evil.zip");
        build_zip(
            &archive,
            &[
                Entry::File("first.txt", b"fine"),
                Entry::File("../../evil.txt", b"pwned"),
                Entry::File("after.txt", b"never"),
            ],
        );

        let dest = tmp.path().join("x").join("y").join("dest");
        let err = extract(&archive, &dest).unwrap_err();

        assert!(matches!(err, ArchiveError::UnsafePath { .. }), "{err}");
        assert!(!tmp.path().join("x").join("evil.txt").exists());
        assert!(!tmp.path().join("evil.txt").exists());
        // Earlier entries are kept, later ones never reached.
        assert!(dest.join("first.txt").exists());
        assert!(!dest.join("after.txt").exists());
    }

    #[test]
    fn rejects_absolute_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("abs.zip");
        build_zip(&archive, &[Entry::File("/abs.txt", b"x")]);

        let err = extract(&archive, &tmp.path().join("dest")).unwrap_err();
        match err {
            ArchiveError::UnsafePath { entry, reason } => {
                assert_eq!(entry, "/abs.txt");
                assert_eq!(reason, "absolute path");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn not_a_zip_is_zip_error() {
        let tmp = tempfile::tempdir().unwrap();
        let bogus = tmp.path().join("bogus.zip");
        std::fs::write(&bogus, "definitely not a zip").unwrap();

        let err = extract(&bogus, &tmp.path().join("dest")).unwrap_err();
        assert!(matches!(err, ArchiveError::Zip(_)));
    }

    #[test]
    fn resolve_allows_inner_parent_dirs() {
        let base = Path::new("/srv/install");
        assert_eq!(
            resolve_entry(base, "a/../b.txt").unwrap(),
            PathBuf::from("/srv/install/b.txt")
        );
        assert_eq!(
            resolve_entry(base, "./c/d.txt").unwrap(),
            PathBuf::from("/srv/install/c/d.txt")
        );
    }

    #[test]
    fn resolve_rejects_escapes() {
        let base = Path::new("/srv/install");
        for name in [
            "../evil.txt",
            "a/../../evil.txt",
            "..\\evil.txt",
            "a\\..\\..\\evil.txt",
            "/etc/passwd",
            "\\windows\\system32",
            "C:\\evil.txt",
            "c:/evil.txt",
            "\\\\server\\share\\x",
        ] {
            assert!(
                resolve_entry(base, name).is_err(),
                "expected {name} to be rejected"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_escape() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tmp.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        let dest = tmp.path().join("dest");
        std::fs::create_dir_all(&dest).unwrap();
        std::os::unix::fs::symlink(&outside, dest.join("link")).unwrap();

        let archive = tmp.path().join("link.zip");
        build_zip(&archive, &[Entry::File("link/pwn.txt", b"x")]);

        let err = extract(&archive, &dest).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsafePath { .. }));
        assert!(!outside.join("pwn.txt").exists());
    }

    #[test]
    fn archive_suffix_is_case_insensitive() {
        assert!(is_archive("/tmp/update.zip"));
        assert!(is_archive("C:\\dl\\PATCH.ZIP"));
        assert!(!is_archive("/tmp/update.zip.part"));
        assert!(!is_archive("/tmp/setup.exe"));
    }
}
