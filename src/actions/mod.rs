// File actions on "the file we're talking about right now": sort it into a
// directory or send it to the delete pile. Whatever leaves its place also
// leaves the playlist.

use crate::config::ActionConfig;
use crate::playlist::PlaylistStore;
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use xxhash_rust::xxh64::Xxh64;

const NOT_SAME_SUFFIX: &str = ".notsame";
// Gives up on finding a free ".notsameN" name after this many tries
const MAX_RENAME_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: PathBuf, to: PathBuf },
    /// An identical copy already sat in the delete dir, so the file itself went away
    Deleted { path: PathBuf },
    NothingToMove,
    DeleteDisabled,
}

pub struct FileActions {
    config: ActionConfig,
    nodelete: bool,
}

impl FileActions {
    pub fn new(config: ActionConfig, nodelete: bool) -> Self {
        Self { config, nodelete }
    }

    pub fn config(&self) -> &ActionConfig {
        &self.config
    }

    /// Move into `dest_dir`, or the configured default move dir
    pub fn move_current(&self, store: &mut PlaylistStore, dest_dir: Option<&Path>) -> Result<MoveOutcome> {
        let dest_dir = dest_dir.unwrap_or(&self.config.move_dir).to_path_buf();
        self.relocate(store, &dest_dir)
    }

    pub fn delete_current(&self, store: &mut PlaylistStore) -> Result<MoveOutcome> {
        if self.nodelete {
            debug!("delete requested but disabled");
            return Ok(MoveOutcome::DeleteDisabled);
        }
        let delete_dir = self.config.delete_dir.clone();
        self.relocate(store, &delete_dir)
    }

    pub fn keep_current(&self, store: &mut PlaylistStore) -> Result<MoveOutcome> {
        let keep_dir = self.config.keep_dir.clone();
        self.relocate(store, &keep_dir)
    }

    pub fn reject_current(&self, store: &mut PlaylistStore) -> Result<MoveOutcome> {
        let reject_dir = self.config.reject_dir.clone();
        self.relocate(store, &reject_dir)
    }

    fn relocate(&self, store: &mut PlaylistStore, dest_dir: &Path) -> Result<MoveOutcome> {
        let Some(current) = store.current() else {
            return Ok(MoveOutcome::NothingToMove);
        };
        let src = current.fullpath().to_path_buf();
        let filename = current.filename().to_string();

        let outcome = self.place(&src, &filename, dest_dir)?;
        store.remove_current();
        Ok(outcome)
    }

    fn place(&self, src: &Path, filename: &str, dest_dir: &Path) -> Result<MoveOutcome> {
        if dest_dir.exists() && !dest_dir.is_dir() {
            bail!("{} already exists and is not a directory", dest_dir.display());
        }
        fs::create_dir_all(dest_dir)
            .with_context(|| format!("creating {}", dest_dir.display()))?;

        for attempt in 0..MAX_RENAME_ATTEMPTS {
            let name = match attempt {
                0 => filename.to_string(),
                1 => format!("{}{}", filename, NOT_SAME_SUFFIX),
                n => format!("{}{}{}", filename, NOT_SAME_SUFFIX, n),
            };
            let dest = dest_dir.join(&name);

            if !dest.exists() {
                move_file(src, &dest)?;
                info!(from = %src.display(), to = %dest.display(), "moved");
                return Ok(MoveOutcome::Moved {
                    from: src.to_path_buf(),
                    to: dest,
                });
            }

            if same_content(src, &dest)? {
                if is_same_dir(dest_dir, &self.config.delete_dir) {
                    fs::remove_file(src).with_context(|| format!("removing {}", src.display()))?;
                    info!(path = %src.display(), "identical copy already in delete dir, removed");
                    return Ok(MoveOutcome::Deleted {
                        path: src.to_path_buf(),
                    });
                }
                info!(path = %src.display(), existing = %dest.display(), "same file already there, moving to delete dir");
                let delete_dir = self.config.delete_dir.clone();
                return self.place(src, filename, &delete_dir);
            }

            debug!(dest = %dest.display(), "different file with that name, trying another");
        }

        bail!("no free name for {} in {}", filename, dest_dir.display())
    }
}

fn is_same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn move_file(src: &Path, dest: &Path) -> Result<()> {
    if let Err(e) = fs::rename(src, dest) {
        // Probably another filesystem; copy and remove instead
        warn!(from = %src.display(), to = %dest.display(), error = %e, "rename failed, copying");
        fs::copy(src, dest).with_context(|| format!("copying {} to {}", src.display(), dest.display()))?;
        fs::remove_file(src).with_context(|| format!("removing {}", src.display()))?;
    }
    Ok(())
}

/// Size check first, then a full-content xxh64 comparison
pub fn same_content(a: &Path, b: &Path) -> Result<bool> {
    let (meta_a, meta_b) = (fs::metadata(a)?, fs::metadata(b)?);
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(compute_content_hash(a)? == compute_content_hash(b)?)
}

pub fn compute_content_hash(path: &Path) -> Result<u64> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Xxh64::new(0);
    let mut buffer = [0u8; 65536];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.digest())
}
