// Command-line driver: argument parsing, collecting input paths and the
// interactive prompt that steers the playlist

pub mod command;
pub mod inputs;
pub mod session;

pub use command::{After, Command, Destination};
pub use session::{Flow, Session, SessionSettings};

use crate::player::PlayerOptions;
use crate::playlist::{BuildOptions, DEFAULT_SAVE_FILE};
use clap::Parser;
use std::path::PathBuf;

/// Play media files one after another, remembering where you stopped
#[derive(Parser, Debug)]
#[command(name = "cuepipe", version, about)]
pub struct Args {
    /// Play files without sound
    #[arg(short = 'n', long)]
    pub nosound: bool,

    /// Shuffle the playlist (ignored when a saved playlist is loaded)
    #[arg(short = 'z', long)]
    pub randomize: bool,

    /// Save the playlist to disk while playing
    #[arg(short = 'x', long)]
    pub save_playlist: bool,

    /// Move files to the delete dir after playing by default
    #[arg(short = 'd', long)]
    pub move_delete: bool,

    /// Move files to the move dir after playing by default
    #[arg(short = 'm', long)]
    pub move_files: bool,

    /// Directory files are moved to after playing
    #[arg(short = 'M', long, value_name = "DIR")]
    pub move_file_dir: Option<PathBuf>,

    /// Never delete files, even when asked to
    #[arg(short = 'D', long)]
    pub nodelete: bool,

    /// Player cache size in kBytes
    #[arg(short = 'c', long, value_name = "KBYTES")]
    pub cache: Option<u32>,

    /// Don't wait for commands between files
    #[arg(short = 'q', long)]
    pub continuous: bool,

    /// Force stereo output
    #[arg(short = 's', long)]
    pub stereo: bool,

    /// Make the player more verbose
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Start playing at this position
    #[arg(short = '#', long, value_name = "INDEX")]
    pub start_at: Option<usize>,

    /// Arguments are UTF-8 text files listing one file per line
    #[arg(short = 't', long)]
    pub textfile: bool,

    /// Subtitle language
    #[arg(short = 'j', long, value_name = "LANG")]
    pub subtitle_language: Option<String>,

    /// Subtitle track id
    #[arg(short = 'J', long, value_name = "ID")]
    pub subtitle_id: Option<u32>,

    /// Audio language
    #[arg(short = 'l', long, value_name = "LANG")]
    pub audio_language: Option<String>,

    /// Audio track id
    #[arg(short = 'L', long, value_name = "ID")]
    pub audio_id: Option<u32>,

    /// Don't start playing right away
    #[arg(short = 'a', long)]
    pub no_autostart: bool,

    /// Config file (defaults to the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Media files, directories or saved playlists
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

impl Args {
    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            nosound: self.nosound,
            verbose: self.verbose,
            stereo: self.stereo,
            cache: self.cache,
            audio_language: self.audio_language.clone(),
            subtitle_language: self.subtitle_language.clone(),
            audio_id: self.audio_id,
            subtitle_id: self.subtitle_id,
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            randomize: self.randomize,
            start_at: self.start_at,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            continuous: self.continuous,
            autostart: !self.no_autostart,
            move_files: self.move_files,
            move_delete: self.move_delete,
            save_playlist: self.save_playlist,
            move_dir: self.move_file_dir.clone(),
            save_path: PathBuf::from(DEFAULT_SAVE_FILE),
        }
    }
}
