//! Directory-backed catalog store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::RECORD_EXTENSION;
use crate::error::CatalogError;
use crate::record::GameRecord;

/// Loads and saves [`GameRecord`]s, one JSON file each, in a fixed directory.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    dir: PathBuf,
}

impl CatalogStore {
    /// Creates a store rooted at `dir`. Nothing is touched until the first call.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the catalog directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads every record in the catalog, ordered by file name.
    ///
    /// Malformed files are logged and skipped. If nothing usable is found,
    /// a sample record is written and returned so the catalog is never empty.
    pub fn load(&self) -> Result<Vec<GameRecord>, CatalogError> {
        std::fs::create_dir_all(&self.dir)?;

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && has_record_extension(p))
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let cwd = current_dir();
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(paths.len());

        for path in paths {
            match read_record(&path, &cwd) {
                Ok(mut record) => {
                    if !seen.insert(record.id.clone()) {
                        let unique = unique_id(&record.id, &seen);
                        warn!(
                            path = %path.display(),
                            id = %record.id,
                            renamed = %unique,
                            "duplicate record id, renaming in memory"
                        );
                        record.id = unique.clone();
                        seen.insert(unique);
                    }
                    records.push(record);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping bad game file");
                }
            }
        }

        if records.is_empty() {
            let mut sample = GameRecord::sample(&cwd);
            self.save(&mut sample)?;
            info!(path = ?sample.meta_path, "catalog empty, seeded sample record");
            records.push(sample);
        }

        debug!(count = records.len(), dir = %self.dir.display(), "catalog loaded");
        Ok(records)
    }

    /// Writes `record` to its backing file and returns the path written.
    ///
    /// Uses `meta_path` when set; otherwise derives `<slug>.json` from the
    /// id, name, or `"game"`. Sets `meta_path` on success.
    pub fn save(&self, record: &mut GameRecord) -> Result<PathBuf, CatalogError> {
        let path = match &record.meta_path {
            Some(p) => p.clone(),
            None => self.unit_path(&slugify(fallback_key(record))),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Derived; never persisted, even when a stale copy sits in `extra`.
        record.extra.shift_remove(META_PATH_KEY);
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)?;

        debug!(id = %record.id, path = %path.display(), "record saved");
        record.meta_path = Some(path.clone());
        Ok(path)
    }

    /// Saves every record, logging failures instead of stopping.
    ///
    /// Returns the number of records that could not be written.
    pub fn save_all(&self, records: &mut [GameRecord]) -> usize {
        let mut failed = 0;
        for record in records.iter_mut() {
            if let Err(e) = self.save(record) {
                let id = if record.id.is_empty() {
                    "(no id)"
                } else {
                    record.id.as_str()
                };
                warn!(id, error = %e, "save failed");
                failed += 1;
            }
        }
        failed
    }

    /// Path of the storage unit for `id` inside the catalog directory.
    pub fn unit_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    /// First of `base`, `base_1`, `base_2`, … with no file on disk.
    pub fn next_free_id(&self, base: &str) -> String {
        let mut id = base.to_string();
        let mut n = 1u32;
        while self.unit_path(&id).exists() {
            id = format!("{base}_{n}");
            n += 1;
        }
        id
    }

    /// Adds a record for `executable` and persists it.
    ///
    /// The id is derived from the file stem and suffixed until it no longer
    /// collides with an existing file, so no record is ever overwritten.
    pub fn quick_add(&self, executable: &Path) -> Result<GameRecord, CatalogError> {
        let stem = executable
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CatalogError::InvalidRecord {
                path: executable.display().to_string(),
                reason: "executable has no file name".into(),
            })?;

        std::fs::create_dir_all(&self.dir)?;
        let id = self.next_free_id(&slugify(&stem));
        let mut record = GameRecord::for_executable(id, executable);
        record.meta_path = Some(self.unit_path(&record.id));
        self.save(&mut record)?;

        info!(id = %record.id, name = %record.name, "game added");
        Ok(record)
    }
}

/// Lower-cases `raw` and replaces spaces with underscores.
pub fn slugify(raw: &str) -> String {
    raw.to_lowercase().replace(' ', "_")
}

fn fallback_key(record: &GameRecord) -> &str {
    if !record.id.is_empty() {
        &record.id
    } else if !record.name.is_empty() {
        &record.name
    } else {
        "game"
    }
}

fn has_record_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(RECORD_EXTENSION))
        .unwrap_or(false)
}

/// Derived field that must never be persisted.
const META_PATH_KEY: &str = "meta_path";

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Parses one record file and fills in the derived fields.
fn read_record(path: &Path, cwd: &Path) -> Result<GameRecord, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    let mut record: GameRecord = serde_json::from_str(&content)?;
    record.extra.shift_remove(META_PATH_KEY);

    if record.id.is_empty() {
        record.id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CatalogError::InvalidRecord {
                path: path.display().to_string(),
                reason: "cannot derive id from file name".into(),
            })?;
    }
    if record.name.is_empty() {
        record.name = record.id.clone();
    }
    if record.work_dir.is_empty() {
        record.work_dir = derive_work_dir(&record.game_path, cwd)
            .display()
            .to_string();
    }
    record.meta_path = Some(path.to_path_buf());
    Ok(record)
}

/// Parent of `game_path` when it exists on disk, else `cwd`.
fn derive_work_dir(game_path: &str, cwd: &Path) -> PathBuf {
    if game_path.is_empty() {
        return cwd.to_path_buf();
    }
    let path = Path::new(game_path);
    match path.parent() {
        Some(parent) if path.exists() => parent.to_path_buf(),
        _ => cwd.to_path_buf(),
    }
}

fn unique_id(base: &str, seen: &HashSet<String>) -> String {
    let mut n = 1u32;
    loop {
        let candidate = format!("{base}_{n}");
        if !seen.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
