pub mod catalog;
pub mod classify;

pub use catalog::ItemCatalog;
pub use classify::{Classifier, SniffClassifier};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Fallback classification when nothing better is known
pub const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
    Image,
    Text,
    Other,
}

impl MediaKind {
    pub fn from_major(major: &str) -> Self {
        match major.to_ascii_lowercase().as_str() {
            "audio" => MediaKind::Audio,
            "video" => MediaKind::Video,
            "image" => MediaKind::Image,
            "text" => MediaKind::Text,
            _ => MediaKind::Other,
        }
    }
}

/// Mime-like "<major>/<minor>" string as handed out by a classifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Classification(String);

impl Classification {
    /// Empty or slash-less answers collapse to octet-stream
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        match trimmed.split_once('/') {
            Some((major, minor)) if !major.is_empty() && !minor.is_empty() => {
                Self(trimmed.to_string())
            }
            _ => Self(OCTET_STREAM.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn major(&self) -> &str {
        self.0.split_once('/').map(|(major, _)| major).unwrap_or(&self.0)
    }

    pub fn minor(&self) -> &str {
        self.0.split_once('/').map(|(_, minor)| minor).unwrap_or("")
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_major(self.major())
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File names that steer the builder instead of being played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedName {
    /// `__pl.json` - a saved playlist, expanded in place
    SavedPlaylist,
    /// `__savefile` - reserved, always skipped
    SaveSlot,
}

impl ReservedName {
    pub const SAVED_PLAYLIST: &'static str = "__pl.json";
    pub const SAVE_SLOT: &'static str = "__savefile";

    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            Self::SAVED_PLAYLIST => Some(ReservedName::SavedPlaylist),
            Self::SAVE_SLOT => Some(ReservedName::SaveSlot),
            _ => None,
        }
    }
}

/// A resolved, classified file. Never changes once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    fullpath: PathBuf,
    filename: String,
    dirname: PathBuf,
    relpath: PathBuf,
    mime: Classification,
}

impl Item {
    pub(crate) fn new(fullpath: PathBuf, relpath: PathBuf, mime: Classification) -> Self {
        let filename = fullpath
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dirname = fullpath
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            fullpath,
            filename,
            dirname,
            relpath,
            mime,
        }
    }

    /// Canonical absolute path, also the item's identity
    pub fn fullpath(&self) -> &Path {
        &self.fullpath
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    /// Relative to the working directory the catalog was created in
    pub fn relpath(&self) -> &Path {
        &self.relpath
    }

    pub fn mime(&self) -> &Classification {
        &self.mime
    }

    pub fn kind(&self) -> MediaKind {
        self.mime.kind()
    }

    pub fn reserved_name(&self) -> Option<ReservedName> {
        ReservedName::from_file_name(&self.filename)
    }

    pub fn is_same_file(&self, other: &Item) -> bool {
        self.fullpath == other.fullpath
    }
}
