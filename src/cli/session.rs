use super::command::{After, Command, Destination};
use crate::actions::{FileActions, MoveOutcome};
use crate::media::Item;
use crate::player::MediaPlayer;
use crate::playlist::{codec, PlaylistStore, DEFAULT_SAVE_FILE};
use anyhow::Result;
use fuzzy_matcher::{clangd::ClangdMatcher, FuzzyMatcher};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

const PROMPT: &str = "Do? ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Play everything back to back without prompting
    pub continuous: bool,
    pub autostart: bool,
    /// Default action on an empty line / exit: move the current file
    pub move_files: bool,
    /// Default action on an empty line / exit: delete the current file
    pub move_delete: bool,
    pub save_playlist: bool,
    pub move_dir: Option<PathBuf>,
    pub save_path: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            continuous: false,
            autostart: true,
            move_files: false,
            move_delete: false,
            save_playlist: false,
            move_dir: None,
            save_path: PathBuf::from(DEFAULT_SAVE_FILE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One run of the prompt. Owns the playlist for as long as it lives.
pub struct Session<P> {
    store: PlaylistStore,
    player: P,
    actions: FileActions,
    settings: SessionSettings,
    save_on_exit: bool,
    move_on_exit: bool,
    matcher: ClangdMatcher,
}

impl<P: MediaPlayer> Session<P> {
    pub fn new(store: PlaylistStore, player: P, actions: FileActions, settings: SessionSettings) -> Self {
        Self {
            store,
            player,
            actions,
            settings,
            save_on_exit: true,
            move_on_exit: true,
            matcher: ClangdMatcher::default(),
        }
    }

    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Read commands from `input` until one of them quits or input runs dry
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        if self.store.is_empty() {
            println!("No files to play!");
            return Ok(());
        }
        if self.settings.save_playlist {
            self.save(None)?;
        }

        if self.settings.continuous {
            while self.play_next().await == Flow::Continue {}
            self.finish();
            return Ok(());
        }

        if self.settings.autostart {
            self.play_next().await;
        }

        let mut lines = input.lines();
        loop {
            print!("{}", PROMPT);
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                // EOF: leave files and save file alone
                self.save_on_exit = false;
                self.move_on_exit = false;
                println!();
                break;
            };

            match self.execute(Command::parse(&line)).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("{:#}", e),
            }
        }

        self.finish();
        Ok(())
    }

    pub async fn execute(&mut self, command: Command) -> Result<Flow> {
        debug!(?command, "executing");

        match command {
            Command::List => {
                self.print_list();
                Ok(Flow::Continue)
            }
            Command::Search(query) => {
                let width = self.index_width();
                for (idx, item) in self.search(&query) {
                    println!(" {:>width$} : {}", idx, item.filename(), width = width);
                }
                Ok(Flow::Continue)
            }
            Command::ToggleSound => {
                self.player.toggle_sound();
                Ok(Flow::Continue)
            }
            Command::Quit { save, move_current } => Ok(self.quit(save, move_current)),
            Command::Delete(after) => {
                let outcome = self.actions.delete_current(&mut self.store)?;
                report(&outcome);
                Ok(self.then(after).await)
            }
            Command::Replay => {
                if self.store.replay().is_none() {
                    println!("Nothing to replay");
                    return Ok(Flow::Continue);
                }
                Ok(self.play_next().await)
            }
            Command::Shuffle => {
                self.store.shuffle();
                println!("Playlist shuffled");
                Ok(Flow::Continue)
            }
            Command::Save { path, then_quit } => {
                self.save(path)?;
                if then_quit {
                    return Ok(self.quit(false, true));
                }
                Ok(Flow::Continue)
            }
            Command::PlayerOptions => {
                for (key, value) in self.player.describe() {
                    println!("{:<10}{}", key, value);
                }
                Ok(Flow::Continue)
            }
            Command::Move { dest, after } => {
                let outcome = match dest {
                    Destination::Default => self
                        .actions
                        .move_current(&mut self.store, self.settings.move_dir.as_deref())?,
                    Destination::Dir(dir) => self.actions.move_current(&mut self.store, Some(dir.as_path()))?,
                    Destination::Keep => self.actions.keep_current(&mut self.store)?,
                    Destination::Reject => self.actions.reject_current(&mut self.store)?,
                };
                report(&outcome);
                Ok(self.then(after).await)
            }
            Command::Next => Ok(self.play_next().await),
            Command::Sort => {
                self.store.sort();
                Ok(Flow::Continue)
            }
            Command::Details => {
                match self.store.current() {
                    Some(item) => println!("{}", details(item)?),
                    None => println!("Nothing selected"),
                }
                Ok(Flow::Continue)
            }
            Command::Jump { index, play } => {
                // Only real entries; jumping to the end would leave nothing to play
                let jumped = usize::try_from(index)
                    .ok()
                    .filter(|&idx| idx < self.store.len())
                    .map(|idx| self.store.jump_to(idx).is_ok())
                    .unwrap_or(false);
                if !jumped {
                    println!("No such index in playlist: {}", index);
                    return Ok(Flow::Continue);
                }
                if play {
                    return Ok(self.play_next().await);
                }
                Ok(Flow::Continue)
            }
            Command::Empty => self.default_action().await,
            Command::Unknown(line) => {
                println!("No such command: {}", line);
                Ok(Flow::Continue)
            }
        }
    }

    /// Hand the next file to the player. `Quit` once the playlist is used up.
    pub async fn play_next(&mut self) -> Flow {
        let (path, name) = match self.store.advance() {
            Some(item) => (item.fullpath().to_path_buf(), item.filename().to_string()),
            None => {
                println!("No more files to play!");
                return Flow::Quit;
            }
        };
        let index = self.store.cursor() - 1;

        println!("Playing #{}, \"{}\"", index, name);
        println!();
        info!(index, file = %path.display(), "playing");

        if let Err(e) = self.player.play(&path).await {
            warn!(file = %path.display(), error = %e, "player failed");
            eprintln!("{:#}", e);
        }
        if self.settings.save_playlist {
            if let Err(e) = self.save(None) {
                eprintln!("{:#}", e);
            }
        }
        Flow::Continue
    }

    /// Entries whose file name fuzzily matches `query`, in playlist order
    pub fn search(&self, query: &str) -> Vec<(usize, &Item)> {
        self.store
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| self.matcher.fuzzy_match(item.filename(), query).is_some())
            .collect()
    }

    /// Exit hooks: default move/delete of the current file, then saving
    pub fn finish(&mut self) {
        if self.move_on_exit {
            let result = if self.settings.move_delete {
                Some(self.actions.delete_current(&mut self.store))
            } else if self.settings.move_files {
                Some(self.actions.move_current(&mut self.store, self.settings.move_dir.as_deref()))
            } else {
                None
            };
            match result {
                Some(Ok(outcome)) => report(&outcome),
                Some(Err(e)) => warn!(error = %e, "exit action failed"),
                None => {}
            }
        }
        if self.settings.save_playlist && self.save_on_exit {
            if let Err(e) = self.save(None) {
                eprintln!("{:#}", e);
            }
        }
        println!("Bye Bye!");
    }

    fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let path = path.unwrap_or_else(|| self.settings.save_path.clone());
        println!("Saving playlist file.");
        codec::save(&self.store, &path)?;
        Ok(())
    }

    fn quit(&mut self, save: bool, move_current: bool) -> Flow {
        if !save {
            self.save_on_exit = false;
        }
        if !move_current {
            self.move_on_exit = false;
        }
        Flow::Quit
    }

    async fn then(&mut self, after: After) -> Flow {
        match after {
            After::PlayNext => self.play_next().await,
            After::Quit { save, move_current } => self.quit(save, move_current),
        }
    }

    async fn default_action(&mut self) -> Result<Flow> {
        if self.settings.move_delete {
            report(&self.actions.delete_current(&mut self.store)?);
        } else if self.settings.move_files {
            let outcome = self
                .actions
                .move_current(&mut self.store, self.settings.move_dir.as_deref())?;
            report(&outcome);
        }

        if self.store.current().is_some() {
            Ok(self.play_next().await)
        } else {
            self.save_on_exit = false;
            self.move_on_exit = false;
            Ok(Flow::Quit)
        }
    }

    fn index_width(&self) -> usize {
        self.store.len().to_string().len()
    }

    fn print_list(&self) {
        let width = self.index_width();
        for (idx, item) in self.store.items().iter().enumerate() {
            let marker = if idx == self.store.cursor() { '*' } else { ' ' };
            println!("{}{:>width$} : {}", marker, idx, item.filename(), width = width);
        }
    }
}

fn report(outcome: &MoveOutcome) {
    match outcome {
        MoveOutcome::Moved { from, to } => {
            println!("Moving {} -> {}", from.display(), to.display());
            println!("-----------");
        }
        MoveOutcome::Deleted { path } => {
            println!("File already exists and is the same! Removed {}", path.display());
        }
        MoveOutcome::NothingToMove => println!("No current file"),
        MoveOutcome::DeleteDisabled => println!("Not deleting, --nodelete is set"),
    }
}

fn details(item: &Item) -> Result<String> {
    let details = serde_json::json!({
        "Fullpath": item.fullpath().to_string_lossy(),
        "Filename": item.filename(),
        "Directory": item.dirname().to_string_lossy(),
        "Path relative to CWD": item.relpath().to_string_lossy(),
        "Mime-type": item.mime().as_str(),
    });
    Ok(serde_json::to_string_pretty(&details)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionConfig;
    use crate::media::ItemCatalog;
    use crate::playlist::{BuildOptions, PlaylistBuilder};
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct RecordingPlayer {
        played: Vec<String>,
        toggles: usize,
    }

    impl MediaPlayer for RecordingPlayer {
        async fn play(&mut self, path: &Path) -> Result<()> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.played.push(name);
            Ok(())
        }

        fn toggle_sound(&mut self) {
            self.toggles += 1;
        }
    }

    fn session(dir: &TempDir, names: &[&str], settings: SessionSettings) -> Session<RecordingPlayer> {
        let paths: Vec<PathBuf> = names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                fs::write(&path, name.as_bytes()).unwrap();
                path
            })
            .collect();
        let catalog = ItemCatalog::with_base_dir(|_: &Path| "audio/mpeg".to_string(), dir.path());
        let store = PlaylistBuilder::new(catalog)
            .build(&paths, BuildOptions::default())
            .unwrap()
            .into_store(&mut rand::thread_rng())
            .unwrap();

        let actions = ActionConfig {
            move_dir: dir.path().join("sett"),
            delete_dir: dir.path().join(".delete"),
            keep_dir: dir.path().join("_gg"),
            reject_dir: dir.path().join("ngg"),
        };
        let settings = SessionSettings {
            save_path: dir.path().join(DEFAULT_SAVE_FILE),
            ..settings
        };
        Session::new(store, RecordingPlayer::default(), FileActions::new(actions, false), settings)
    }

    #[tokio::test]
    async fn test_next_replay_quit() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, &["a.mp3", "b.mp3", "c.mp3"], SessionSettings::default());

        session.run(&b"nm\nr\nnosound\nq\n"[..]).await.unwrap();

        assert_eq!(session.player().played, vec!["a.mp3", "b.mp3", "b.mp3"]);
        assert_eq!(session.player().toggles, 1);
        assert_eq!(session.store().cursor(), 2);
    }

    #[tokio::test]
    async fn test_continuous_plays_everything() {
        let dir = tempdir().unwrap();
        let settings = SessionSettings {
            continuous: true,
            ..Default::default()
        };
        let mut session = session(&dir, &["a.mp3", "b.mp3"], settings);

        session.run(&b""[..]).await.unwrap();
        assert_eq!(session.player().played, vec!["a.mp3", "b.mp3"]);
        assert!(session.store().next().is_none());
    }

    #[tokio::test]
    async fn test_delete_moves_file_and_plays_next() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, &["a.mp3", "b.mp3"], SessionSettings::default());

        session.run(&b"y\nx\n"[..]).await.unwrap();

        assert_eq!(session.player().played, vec!["a.mp3", "b.mp3"]);
        assert!(dir.path().join(".delete").join("a.mp3").exists());
        assert_eq!(session.store().len(), 1);
    }

    #[tokio::test]
    async fn test_save_playlist_on_exit() {
        let dir = tempdir().unwrap();
        let settings = SessionSettings {
            save_playlist: true,
            ..Default::default()
        };
        let mut session = session(&dir, &["a.mp3", "b.mp3", "c.mp3"], settings);

        session.run(&b"nm\nq\n"[..]).await.unwrap();

        let loaded = codec::load(dir.path().join(DEFAULT_SAVE_FILE)).unwrap();
        assert_eq!(loaded.resume_index, 2);
        assert_eq!(loaded.paths.len(), 3);
    }

    #[tokio::test]
    async fn test_jump_and_play() {
        let dir = tempdir().unwrap();
        let settings = SessionSettings {
            autostart: false,
            ..Default::default()
        };
        let mut session = session(&dir, &["a.mp3", "b.mp3", "c.mp3"], settings);

        session.run(&b"9\n-1\n2 p\nnmx\n"[..]).await.unwrap();
        assert_eq!(session.player().played, vec!["c.mp3"]);
        assert_eq!(session.store().cursor(), 3);
    }

    #[tokio::test]
    async fn test_jump_past_last_entry_is_refused() {
        let dir = tempdir().unwrap();
        let settings = SessionSettings {
            autostart: false,
            move_files: true,
            ..Default::default()
        };
        let mut session = session(&dir, &["a.mp3", "b.mp3"], settings);

        // "2 p" must not end the session and move b on the way out
        session.run(&b"2 p
1
nmx
"[..]).await.unwrap();

        assert!(session.player().played.is_empty());
        assert_eq!(session.store().cursor(), 1);
        assert!(dir.path().join("b.mp3").exists());
        assert!(!dir.path().join("sett").join("b.mp3").exists());
    }

    #[tokio::test]
    async fn test_empty_line_moves_with_default_action() {
        let dir = tempdir().unwrap();
        let settings = SessionSettings {
            move_files: true,
            ..Default::default()
        };
        let mut session = session(&dir, &["a.mp3", "b.mp3"], settings);

        // a plays, empty line moves a and plays b, EOF leaves b where it is
        session.run(&b"\n"[..]).await.unwrap();

        assert_eq!(session.player().played, vec!["a.mp3", "b.mp3"]);
        assert!(dir.path().join("sett").join("a.mp3").exists());
        assert!(dir.path().join("b.mp3").exists());
    }

    #[tokio::test]
    async fn test_search_is_fuzzy() {
        let dir = tempdir().unwrap();
        let session = session(
            &dir,
            &["live_at_home.mp3", "studio_take.mp3", "live_encore.mp3"],
            SessionSettings::default(),
        );

        let found: Vec<usize> = session.search("live").into_iter().map(|(idx, _)| idx).collect();
        assert_eq!(found, vec![0, 2]);
    }

    #[tokio::test]
    async fn test_empty_playlist_returns_early() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, &[], SessionSettings::default());
        session.run(&b"nm\n"[..]).await.unwrap();
        assert!(session.player().played.is_empty());
    }
}
