use super::{codec, PlaylistStore};
use crate::config::PlaylistConfig;
use crate::error::{PlaylistError, Result};
use crate::media::{Classifier, Item, ItemCatalog, MediaKind, ReservedName};
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub randomize: bool,
    /// Explicit start position; beats anything a save file says
    pub start_at: Option<usize>,
}

/// Why a path didn't make it into the playlist (or what happened to it instead)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Rejected { path: PathBuf, reason: String },
    Text { path: PathBuf },
    Reserved { path: PathBuf },
    NotPlayable { path: PathBuf, mime: String },
    Duplicate { path: PathBuf },
    Expanded { path: PathBuf, entries: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Rejected { path, reason } => {
                write!(f, "skipped '{}': {}", path.display(), reason)
            }
            Diagnostic::Text { path } => write!(f, "skipped text file '{}'", path.display()),
            Diagnostic::Reserved { path } => write!(f, "skipped reserved file '{}'", path.display()),
            Diagnostic::NotPlayable { path, mime } => {
                write!(f, "skipped '{}' ({})", path.display(), mime)
            }
            Diagnostic::Duplicate { path } => {
                write!(f, "'{}' already in playlist", path.display())
            }
            Diagnostic::Expanded { path, entries } => {
                write!(f, "expanded playlist file '{}' ({} entries)", path.display(), entries)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub items: Vec<Item>,
    pub resume_index: usize,
    /// Still true only if no saved playlist was expanded
    pub randomize: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutcome {
    /// Shuffle once if still asked to (which drops the resume point), otherwise
    /// park the cursor on the resume index.
    pub fn into_store<R: Rng + ?Sized>(self, rng: &mut R) -> Result<PlaylistStore> {
        if self.randomize {
            let mut store = PlaylistStore::new(self.items);
            store.shuffle_with(rng);
            return Ok(store);
        }
        PlaylistStore::with_cursor(self.items, self.resume_index)
    }
}

// Running state of one build call, shared by every nesting level
#[derive(Default)]
struct Expansion {
    items: Vec<Item>,
    seen: HashSet<PathBuf>,
    chain: Vec<PathBuf>,
    resume: Option<ResumePoint>,
    start_at_given: bool,
    randomize: bool,
    diagnostics: Vec<Diagnostic>,
}

// The entry a save file wanted to play next, plus its raw index
struct ResumePoint {
    target: Option<PathBuf>,
    index: usize,
}

impl ResumePoint {
    /// Where the saved next entry ended up after dedup and filtering.
    /// Falls back to the saved index when the entry didn't make it in.
    fn locate(&self, items: &[Item]) -> usize {
        self.target
            .as_deref()
            .and_then(|target| items.iter().position(|item| item.fullpath() == target))
            .unwrap_or(self.index)
    }
}

pub struct PlaylistBuilder<C> {
    catalog: ItemCatalog<C>,
    playable: Vec<MediaKind>,
    max_depth: usize,
}

impl<C: Classifier> PlaylistBuilder<C> {
    pub fn new(catalog: ItemCatalog<C>) -> Self {
        Self::with_config(catalog, &PlaylistConfig::default())
    }

    pub fn with_config(catalog: ItemCatalog<C>, config: &PlaylistConfig) -> Self {
        Self {
            catalog,
            playable: config.playable_kinds.clone(),
            max_depth: config.max_nesting_depth,
        }
    }

    pub fn catalog(&self) -> &ItemCatalog<C> {
        &self.catalog
    }

    /// Resolve, filter and dedup `raw_paths`, splicing saved playlists in where they appear.
    pub fn build<P: AsRef<Path>>(&self, raw_paths: &[P], options: BuildOptions) -> Result<BuildOutcome> {
        let mut state = Expansion {
            randomize: options.randomize,
            start_at_given: options.start_at.is_some(),
            ..Default::default()
        };

        self.expand(raw_paths.iter().map(|p| p.as_ref().to_path_buf()), &mut state, 0)?;

        let resume = state.resume.as_ref().map(|point| point.locate(&state.items));
        let resume_index = options.start_at.or(resume).unwrap_or(0);
        info!(
            items = state.items.len(),
            resume_index,
            randomize = state.randomize,
            skipped = state.diagnostics.len(),
            "playlist built"
        );

        Ok(BuildOutcome {
            items: state.items,
            resume_index,
            randomize: state.randomize,
            diagnostics: state.diagnostics,
        })
    }

    fn expand<I>(&self, paths: I, state: &mut Expansion, depth: usize) -> Result<()>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for raw in paths {
            let item = match self.catalog.resolve(&raw) {
                Ok(item) => item,
                Err(PlaylistError::PathRejected { path, reason }) => {
                    debug!(path = %path.display(), %reason, "rejected");
                    state.diagnostics.push(Diagnostic::Rejected { path, reason });
                    continue;
                }
                Err(e) => return Err(e),
            };

            match item.reserved_name() {
                Some(ReservedName::SaveSlot) => {
                    debug!(path = %item.fullpath().display(), "reserved name, skipping");
                    state.diagnostics.push(Diagnostic::Reserved {
                        path: item.fullpath().to_path_buf(),
                    });
                    continue;
                }
                Some(ReservedName::SavedPlaylist) => {
                    self.expand_save_file(&item, state, depth)?;
                    continue;
                }
                None => {}
            }

            let kind = item.kind();
            if kind == MediaKind::Text {
                state.diagnostics.push(Diagnostic::Text {
                    path: item.fullpath().to_path_buf(),
                });
                continue;
            }
            if !self.playable.contains(&kind) {
                debug!(path = %item.fullpath().display(), mime = %item.mime(), "not playable");
                state.diagnostics.push(Diagnostic::NotPlayable {
                    path: item.fullpath().to_path_buf(),
                    mime: item.mime().to_string(),
                });
                continue;
            }
            if !state.seen.insert(item.fullpath().to_path_buf()) {
                info!(path = %item.fullpath().display(), "already in playlist");
                state.diagnostics.push(Diagnostic::Duplicate {
                    path: item.fullpath().to_path_buf(),
                });
                continue;
            }

            state.items.push(item);
        }

        Ok(())
    }

    fn expand_save_file(&self, item: &Item, state: &mut Expansion, depth: usize) -> Result<()> {
        let path = item.fullpath().to_path_buf();

        if state.chain.contains(&path) {
            return Err(PlaylistError::SaveFileCycle { path });
        }
        if depth >= self.max_depth {
            return Err(PlaylistError::NestingTooDeep {
                path,
                limit: self.max_depth,
            });
        }

        let loaded = codec::load(&path)?;
        info!(path = %path.display(), entries = loaded.paths.len(), "expanding saved playlist");

        if state.resume.is_none() && !state.start_at_given {
            let target = loaded
                .paths
                .get(loaded.resume_index)
                .map(|p| fs::canonicalize(p).unwrap_or_else(|_| p.clone()));
            state.resume = Some(ResumePoint {
                target,
                index: loaded.resume_index,
            });
        }
        // A saved playlist carries its own order
        state.randomize = false;

        let entries = loaded.paths.len();
        state.chain.push(path.clone());
        let expanded = self.expand(loaded.paths, state, depth + 1);
        state.chain.pop();
        expanded?;

        state.diagnostics.push(Diagnostic::Expanded { path, entries });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::codec::SAVE_FILE_TYPE;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    // Classify by extension only, no sniffing, so empty fixture files work
    fn by_extension(path: &Path) -> String {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mp3") => "audio/mpeg",
            Some("mp4") => "video/mp4",
            Some("jpg") => "image/jpeg",
            Some("json") => "application/json",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
        .to_string()
    }

    fn builder(dir: &TempDir) -> PlaylistBuilder<fn(&Path) -> String> {
        let classify: fn(&Path) -> String = by_extension;
        PlaylistBuilder::new(ItemCatalog::with_base_dir(classify, dir.path()))
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    fn save_file(dir: &Path, entries: &[&Path], next_to_play: usize) -> PathBuf {
        let data: Vec<_> = entries
            .iter()
            .map(|p| serde_json::json!({ "fullpath": p.to_string_lossy() }))
            .collect();
        let doc = serde_json::json!({
            "type": SAVE_FILE_TYPE,
            "next_to_play": next_to_play,
            "next_filename": "",
            "data": data,
        });
        let path = dir.join("__pl.json");
        fs::write(&path, doc.to_string()).unwrap();
        path
    }

    fn names(outcome: &BuildOutcome) -> Vec<&str> {
        outcome.items.iter().map(|item| item.filename()).collect()
    }

    #[test]
    fn test_dedup_first_occurrence_wins() {
        let dir = tempdir().unwrap();
        let a = touch(dir.path(), "a.mp3");
        let b = touch(dir.path(), "b.mp3");

        let outcome = builder(&dir)
            .build(&[a.clone(), b, a], BuildOptions::default())
            .unwrap();
        assert_eq!(names(&outcome), vec!["a.mp3", "b.mp3"]);
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::Duplicate { .. })));
    }

    #[test]
    fn test_filters_text_reserved_and_unplayable() {
        let dir = tempdir().unwrap();
        let paths = vec![
            touch(dir.path(), "notes.txt"),
            touch(dir.path(), "__savefile"),
            touch(dir.path(), "blob.bin"),
            touch(dir.path(), "cover.jpg"),
            touch(dir.path(), "clip.mp4"),
            dir.path().join("missing.mp3"),
        ];

        let outcome = builder(&dir).build(&paths, BuildOptions::default()).unwrap();
        assert_eq!(names(&outcome), vec!["cover.jpg", "clip.mp4"]);
        assert_eq!(outcome.diagnostics.len(), 4);
    }

    #[test]
    fn test_empty_input() {
        let dir = tempdir().unwrap();
        let none: Vec<PathBuf> = Vec::new();
        let outcome = builder(&dir).build(&none, BuildOptions { randomize: true, start_at: None }).unwrap();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.resume_index, 0);

        let store = outcome.into_store(&mut StdRng::seed_from_u64(1)).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.cursor(), 0);
    }

    #[test]
    fn test_nested_save_file_expands_in_place() {
        let dir = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let c = touch(elsewhere.path(), "c.mp4");
        let listing = vec![save_file(dir.path(), &[c.as_path()], 0), touch(dir.path(), "d.mp3")];

        let outcome = builder(&dir)
            .build(&listing, BuildOptions { randomize: true, start_at: None })
            .unwrap();
        assert_eq!(names(&outcome), vec!["c.mp4", "d.mp3"]);
        assert!(!outcome.randomize);
    }

    #[test]
    fn test_resume_index_from_save_file() {
        let dir = tempdir().unwrap();
        let nested = tempdir().unwrap();
        let x = touch(dir.path(), "x.mp3");
        let a = touch(nested.path(), "a.mp3");
        let b = touch(nested.path(), "b.mp3");
        let saved = save_file(nested.path(), &[a.as_path(), b.as_path()], 1);

        // b lands after the item that precedes the save file
        let outcome = builder(&dir)
            .build(&[x.clone(), saved.clone()], BuildOptions::default())
            .unwrap();
        assert_eq!(outcome.resume_index, 2);

        let explicit = builder(&dir)
            .build(&[x, saved], BuildOptions { randomize: false, start_at: Some(0) })
            .unwrap();
        assert_eq!(explicit.resume_index, 0);
    }

    #[test]
    fn test_resume_follows_entry_through_dedup() {
        let dir = tempdir().unwrap();
        let nested = tempdir().unwrap();
        let a = touch(dir.path(), "a.mp3");
        let b = touch(dir.path(), "b.mp3");
        let c = touch(dir.path(), "c.mp3");
        let saved = save_file(nested.path(), &[a.as_path(), b.as_path(), c.as_path()], 1);

        // a and b are already in when the save file repeats them
        let outcome = builder(&dir)
            .build(&[a, b, saved], BuildOptions::default())
            .unwrap();
        assert_eq!(names(&outcome), vec!["a.mp3", "b.mp3", "c.mp3"]);
        assert_eq!(outcome.resume_index, 1);

        let store = outcome.into_store(&mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(store.next().unwrap().filename(), "b.mp3");
    }

    #[test]
    fn test_resume_skips_rejected_entries() {
        let dir = tempdir().unwrap();
        let nested = tempdir().unwrap();
        let gone = nested.path().join("gone.mp3");
        let notes = touch(nested.path(), "notes.txt");
        let d = touch(nested.path(), "d.mp3");
        let saved = save_file(nested.path(), &[gone.as_path(), notes.as_path(), d.as_path()], 2);

        let outcome = builder(&dir).build(&[saved], BuildOptions::default()).unwrap();
        assert_eq!(names(&outcome), vec!["d.mp3"]);
        assert_eq!(outcome.resume_index, 0);
    }

    #[test]
    fn test_resume_falls_back_to_saved_index() {
        let dir = tempdir().unwrap();
        let nested = tempdir().unwrap();
        let a = touch(nested.path(), "a.mp3");
        let b = touch(nested.path(), "b.mp3");
        let gone = nested.path().join("gone.mp3");
        let saved = save_file(nested.path(), &[a.as_path(), b.as_path(), gone.as_path()], 2);

        // The entry to resume at no longer exists
        let outcome = builder(&dir).build(&[saved], BuildOptions::default()).unwrap();
        assert_eq!(outcome.resume_index, 2);
        assert_eq!(outcome.into_store(&mut StdRng::seed_from_u64(1)).unwrap().cursor(), 2);
    }

    #[test]
    fn test_self_referencing_save_file_is_an_error() {
        let dir = tempdir().unwrap();
        let pl = dir.path().join("__pl.json");
        save_file(dir.path(), &[pl.as_path()], 0);

        let err = builder(&dir).build(&[pl], BuildOptions::default()).unwrap_err();
        assert!(matches!(err, PlaylistError::SaveFileCycle { .. }));
    }

    #[test]
    fn test_mutual_recursion_is_an_error() {
        let one = tempdir().unwrap();
        let two = tempdir().unwrap();
        let first = one.path().join("__pl.json");
        let second = two.path().join("__pl.json");
        save_file(one.path(), &[second.as_path()], 0);
        save_file(two.path(), &[first.as_path()], 0);

        let err = builder(&one).build(&[first], BuildOptions::default()).unwrap_err();
        assert!(err.is_malformed_document());
    }

    #[test]
    fn test_nesting_depth_limit() {
        let dir = tempdir().unwrap();
        let inner = tempdir().unwrap();
        let song = touch(inner.path(), "song.mp3");
        let pl = save_file(inner.path(), &[song.as_path()], 0);

        let config = PlaylistConfig {
            max_nesting_depth: 0,
            ..Default::default()
        };
        let catalog = ItemCatalog::with_base_dir(by_extension as fn(&Path) -> String, dir.path());
        let err = PlaylistBuilder::with_config(catalog, &config)
            .build(&[pl], BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, PlaylistError::NestingTooDeep { limit: 0, .. }));
    }

    #[test]
    fn test_malformed_save_file_propagates() {
        let dir = tempdir().unwrap();
        let pl = dir.path().join("__pl.json");
        fs::write(&pl, r#"{"data": []}"#).unwrap();

        let err = builder(&dir).build(&[pl], BuildOptions::default()).unwrap_err();
        assert!(matches!(err, PlaylistError::MalformedSaveDocument { .. }));
    }

    #[test]
    fn test_into_store_positions_cursor() {
        let dir = tempdir().unwrap();
        let paths = vec![touch(dir.path(), "a.mp3"), touch(dir.path(), "b.mp3")];
        let mut rng = StdRng::seed_from_u64(3);

        let store = builder(&dir)
            .build(&paths, BuildOptions { randomize: false, start_at: Some(1) })
            .unwrap()
            .into_store(&mut rng)
            .unwrap();
        assert_eq!(store.cursor(), 1);
        assert_eq!(store.next().unwrap().filename(), "b.mp3");

        let shuffled = builder(&dir)
            .build(&paths, BuildOptions { randomize: true, start_at: Some(1) })
            .unwrap()
            .into_store(&mut rng)
            .unwrap();
        assert_eq!(shuffled.cursor(), 0);

        let too_far = builder(&dir)
            .build(&paths, BuildOptions { randomize: false, start_at: Some(5) })
            .unwrap()
            .into_store(&mut rng);
        assert!(matches!(too_far, Err(PlaylistError::IndexOutOfRange { index: 5, len: 2 })));
    }
}
