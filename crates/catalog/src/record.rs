//! Catalog record types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder icon shipped with the launcher assets.
pub const PLACEHOLDER_ICON: &str = "assets/empty_icon.png";

/// Placeholder cover shipped with the launcher assets.
pub const PLACEHOLDER_COVER: &str = "assets/empty_background.jpg";

/// Bulletin source used by the seeded sample record.
const SAMPLE_NEWS_URL: &str = "https://raw.githubusercontent.com/github/markup/master/README.md";

/// Where an update archive comes from and where it goes.
///
/// An empty `url` or `dest` disables the update; an empty `extract_to`
/// keeps the download but skips unpacking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub dest: String,
    #[serde(default, deserialize_with = "nullable")]
    pub extract_to: String,
}

impl UpdateDescriptor {
    /// Returns `true` when both a source and a destination are set.
    pub fn is_actionable(&self) -> bool {
        !self.url.is_empty() && !self.dest.is_empty()
    }
}

/// One entry in the catalog.
///
/// Field order here is the order fields are written to disk. Keys that
/// the launcher does not know about are kept in `extra` so an overwrite
/// does not drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub game_path: String,
    #[serde(default, deserialize_with = "nullable")]
    pub work_dir: String,
    #[serde(default, deserialize_with = "nullable")]
    pub args: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub news_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub icon: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cover: String,
    #[serde(default, deserialize_with = "nullable")]
    pub update: UpdateDescriptor,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,

    /// Backing file of this record. Set by the store, never persisted.
    #[serde(skip)]
    pub meta_path: Option<PathBuf>,
}

impl GameRecord {
    /// The record seeded into an empty catalog.
    pub fn sample(cwd: &Path) -> Self {
        Self {
            id: "sample".into(),
            name: "Sample Game".into(),
            game_path: cwd.join("SampleGame.exe").display().to_string(),
            work_dir: cwd.display().to_string(),
            args: Vec::new(),
            news_url: SAMPLE_NEWS_URL.into(),
            icon: PLACEHOLDER_ICON.into(),
            cover: PLACEHOLDER_COVER.into(),
            update: UpdateDescriptor {
                url: String::new(),
                dest: cwd.join("sample_update.zip").display().to_string(),
                extract_to: cwd.display().to_string(),
            },
            extra: serde_json::Map::new(),
            meta_path: None,
        }
    }

    /// A fresh record for a user-picked executable.
    ///
    /// News and update source are left empty; updates unpack next to the
    /// executable once a source is filled in.
    pub fn for_executable(id: impl Into<String>, executable: &Path) -> Self {
        let parent = executable
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let name = executable
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            id: id.into(),
            name,
            game_path: executable.display().to_string(),
            work_dir: parent.clone(),
            args: Vec::new(),
            news_url: String::new(),
            icon: PLACEHOLDER_ICON.into(),
            cover: PLACEHOLDER_COVER.into(),
            update: UpdateDescriptor {
                url: String::new(),
                dest: String::new(),
                extract_to: parent,
            },
            extra: serde_json::Map::new(),
            meta_path: None,
        }
    }

    /// Display label: `name`, falling back to `id`.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Treats an explicit JSON `null` like a missing key.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let rec: GameRecord = serde_json::from_str(r#"{"game_path": "/g/run.sh"}"#).unwrap();
        assert!(rec.id.is_empty());
        assert!(rec.args.is_empty());
        assert_eq!(rec.update, UpdateDescriptor::default());
        assert!(rec.meta_path.is_none());
    }

    #[test]
    fn null_fields_are_tolerated() {
        let rec: GameRecord =
            serde_json::from_str(r#"{"id": "x", "news_url": null, "update": null}"#).unwrap();
        assert_eq!(rec.id, "x");
        assert!(rec.news_url.is_empty());
        assert!(!rec.update.is_actionable());
    }

    #[test]
    fn unknown_keys_survive_roundtrip() {
        let json = r#"{"id": "x", "playtime": 42, "tags": ["rpg"]}"#;
        let rec: GameRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.extra.get("playtime"), Some(&serde_json::json!(42)));

        let out = serde_json::to_value(&rec).unwrap();
        assert_eq!(out["tags"], serde_json::json!(["rpg"]));
    }

    #[test]
    fn meta_path_is_not_serialized() {
        let mut rec = GameRecord::sample(Path::new("/tmp"));
        rec.meta_path = Some(PathBuf::from("/tmp/games/sample.json"));
        let out = serde_json::to_string(&rec).unwrap();
        assert!(!out.contains("meta_path"));
    }

    #[test]
    fn for_executable_seeds_empty_update() {
        let rec = GameRecord::for_executable("doom", Path::new("/opt/doom/Doom.exe"));
        assert_eq!(rec.name, "Doom");
        assert_eq!(rec.work_dir, "/opt/doom");
        assert!(rec.news_url.is_empty());
        assert!(rec.update.url.is_empty());
        assert!(rec.update.dest.is_empty());
        assert_eq!(rec.update.extract_to, "/opt/doom");
    }

    #[test]
    fn actionable_needs_url_and_dest() {
        let mut up = UpdateDescriptor {
            url: "https://x/u.zip".into(),
            ..Default::default()
        };
        assert!(!up.is_actionable());
        up.dest = "/tmp/u.zip".into();
        assert!(up.is_actionable());
    }

    #[test]
    fn label_falls_back_to_id() {
        let rec = GameRecord {
            id: "quake".into(),
            ..Default::default()
        };
        assert_eq!(rec.label(), "quake");
    }
}
