use super::{Classification, Classifier, Item};
use crate::error::{PlaylistError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Turns raw paths into `Item`s. Read-only: a stat, a canonicalize and a classification call.
pub struct ItemCatalog<C> {
    classifier: C,
    base_dir: PathBuf,
}

impl<C: Classifier> ItemCatalog<C> {
    /// Relative paths are computed against the current working directory
    pub fn new(classifier: C) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| PlaylistError::io(".", e))?;
        Ok(Self::with_base_dir(classifier, cwd))
    }

    pub fn with_base_dir(classifier: C, base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let base_dir = fs::canonicalize(&base_dir).unwrap_or(base_dir);
        Self {
            classifier,
            base_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<Item> {
        let path = path.as_ref();

        let metadata = fs::metadata(path).map_err(|e| PlaylistError::PathRejected {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(PlaylistError::PathRejected {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }

        let fullpath = fs::canonicalize(path).map_err(|e| PlaylistError::PathRejected {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let relpath = relative_path(&fullpath, &self.base_dir);
        let mime = Classification::new(self.classifier.classify(&fullpath));

        debug!(path = %fullpath.display(), mime = %mime, "resolved");
        Ok(Item::new(fullpath, relpath, mime))
    }
}

/// `target` relative to `base`, walking up with `..` where they diverge.
/// Both are expected to be absolute.
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}
