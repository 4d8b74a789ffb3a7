// Playlist save file format: the queue plus where to pick up again

use super::PlaylistStore;
use crate::error::{PlaylistError, Result};
use crate::media::{Item, ReservedName};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Literal `type` tag every save document carries
pub const SAVE_FILE_TYPE: &str = "Fredriks playlist save file";

/// Where `save` writes when no path is given
pub const DEFAULT_SAVE_FILE: &str = ReservedName::SAVED_PLAYLIST;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub fullpath: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub dirname: String,
    #[serde(default)]
    pub relpath: String,
    #[serde(default)]
    pub mime: String,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            fullpath: item.fullpath().to_string_lossy().into_owned(),
            filename: item.filename().to_string(),
            dirname: item.dirname().to_string_lossy().into_owned(),
            relpath: item.relpath().to_string_lossy().into_owned(),
            mime: item.mime().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub next_to_play: usize,
    pub next_filename: String,
    pub data: Vec<ItemRecord>,
}

impl SaveDocument {
    /// Snapshot of the store. With nothing left to play, the last item is the resume point.
    pub fn from_store(store: &PlaylistStore) -> Self {
        let next_to_play = match store.next() {
            Some(_) => store.cursor(),
            None => store.len().saturating_sub(1),
        };

        Self {
            kind: SAVE_FILE_TYPE.to_string(),
            next_to_play,
            next_filename: store
                .next()
                .map(|item| item.filename().to_string())
                .unwrap_or_default(),
            data: store.items().iter().map(ItemRecord::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What a save file boils down to on load: paths to re-resolve and a resume index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPlaylist {
    pub paths: Vec<PathBuf>,
    pub resume_index: usize,
}

// Loose mirror of SaveDocument so missing keys become our own errors
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "type")]
    kind: Option<String>,
    next_to_play: Option<i64>,
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    fullpath: Option<String>,
}

/// Write the store to `path`. Goes through a temp file in the same directory
/// and a rename, so a crash mid-write leaves the old file intact.
pub fn save(store: &PlaylistStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = SaveDocument::from_store(store).to_json()?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| PlaylistError::io(&dir, e))?;
    if let Err(e) = write_synced(&mut tmp, json.as_bytes()) {
        return Err(PlaylistError::io(tmp.path(), e));
    }
    tmp.persist(path).map_err(|e| PlaylistError::io(path, e.error))?;

    info!(path = %path.display(), entries = store.len(), cursor = store.cursor(), "saved playlist");
    Ok(())
}

fn write_synced(tmp: &mut NamedTempFile, bytes: &[u8]) -> std::io::Result<()> {
    tmp.write_all(bytes)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()
}

pub fn load(path: impl AsRef<Path>) -> Result<LoadedPlaylist> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| PlaylistError::io(path, e))?;
    parse(&content, path)
}

/// Parse save file text; `origin` only shows up in error messages
pub fn parse(content: &str, origin: &Path) -> Result<LoadedPlaylist> {
    let raw: RawDocument = serde_json::from_str(content)
        .map_err(|e| PlaylistError::malformed(origin, format!("not a JSON object: {}", e)))?;

    match raw.kind.as_deref() {
        Some(SAVE_FILE_TYPE) => {}
        Some(other) => {
            return Err(PlaylistError::malformed(origin, format!("unexpected type tag '{}'", other)))
        }
        None => return Err(PlaylistError::malformed(origin, "missing 'type'")),
    }

    let resume_index = match raw.next_to_play {
        None => 0,
        Some(n) if n < 0 => {
            return Err(PlaylistError::malformed(origin, format!("negative next_to_play {}", n)))
        }
        Some(n) => usize::try_from(n)
            .map_err(|_| PlaylistError::malformed(origin, "next_to_play too large"))?,
    };

    let entries = match raw.data {
        Some(serde_json::Value::Array(entries)) => entries,
        Some(_) => return Err(PlaylistError::malformed(origin, "'data' is not a list")),
        None => return Err(PlaylistError::malformed(origin, "missing 'data'")),
    };

    let mut paths = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let record: RawRecord = serde_json::from_value(entry)
            .map_err(|e| PlaylistError::malformed(origin, format!("entry {}: {}", idx, e)))?;
        let fullpath = record
            .fullpath
            .ok_or_else(|| PlaylistError::malformed(origin, format!("entry {} has no 'fullpath'", idx)))?;
        paths.push(PathBuf::from(fullpath));
    }

    Ok(LoadedPlaylist {
        paths,
        resume_index,
    })
}
