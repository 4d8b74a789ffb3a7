// External player - we only launch it and wait for it to exit.
// Playback control (pause, seek, volume) lives in the player itself.

use crate::config::PlayerConfig;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Something that can play one file to completion
#[allow(async_fn_in_trait)]
pub trait MediaPlayer {
    async fn play(&mut self, path: &Path) -> Result<()>;

    /// Flip audio on/off for subsequent files
    fn toggle_sound(&mut self) {}

    /// Current settings, for display
    fn describe(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Per-run switches, mostly straight from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerOptions {
    pub nosound: bool,
    pub verbose: bool,
    pub stereo: bool,
    /// Cache size in kBytes
    pub cache: Option<u32>,
    pub audio_language: Option<String>,
    pub subtitle_language: Option<String>,
    pub audio_id: Option<u32>,
    pub subtitle_id: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct MpvPlayer {
    program: String,
    fullscreen: bool,
    extra_args: Vec<String>,
    options: PlayerOptions,
}

impl MpvPlayer {
    pub fn new(config: &PlayerConfig, options: PlayerOptions) -> Self {
        Self {
            program: config.program.clone(),
            fullscreen: config.fullscreen,
            extra_args: config.extra_args.clone(),
            options,
        }
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    /// Arguments for playing `path`, program name excluded
    pub fn command_args(&self, path: &Path) -> Vec<OsString> {
        let opts = &self.options;
        let mut args: Vec<OsString> = Vec::new();

        if self.fullscreen {
            args.push("-fs".into());
        }
        if opts.nosound {
            args.push("--no-audio".into());
        }
        if opts.verbose {
            args.push("-v".into());
        }
        if opts.stereo {
            args.push("--audio-channels=stereo".into());
        }
        if let Some(kb) = opts.cache {
            args.push(format!("--cache={}", kb).into());
        }
        if let Some(lang) = &opts.audio_language {
            args.push(format!("--alang={}", lang).into());
        }
        if let Some(lang) = &opts.subtitle_language {
            args.push(format!("--slang={}", lang).into());
        }
        if let Some(id) = opts.audio_id {
            args.push(format!("--aid={}", id).into());
        }
        if let Some(id) = opts.subtitle_id {
            args.push(format!("--sid={}", id).into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(path.as_os_str().to_owned());

        args
    }
}

impl MediaPlayer for MpvPlayer {
    async fn play(&mut self, path: &Path) -> Result<()> {
        let args = self.command_args(path);
        debug!(program = %self.program, ?args, "launching player");

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .await
            .with_context(|| format!("failed to launch '{}'", self.program))?;

        if !status.success() {
            warn!(program = %self.program, file = %path.display(), %status, "player exited with failure");
        }
        Ok(())
    }

    fn toggle_sound(&mut self) {
        self.options.nosound = !self.options.nosound;
    }

    fn describe(&self) -> Vec<(String, String)> {
        let opts = &self.options;
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        let show_num = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());

        vec![
            ("program".to_string(), self.program.clone()),
            ("nosound".to_string(), opts.nosound.to_string()),
            ("verbose".to_string(), opts.verbose.to_string()),
            ("stereo".to_string(), opts.stereo.to_string()),
            ("cache".to_string(), show_num(opts.cache)),
            ("alang".to_string(), show(&opts.audio_language)),
            ("slang".to_string(), show(&opts.subtitle_language)),
            ("aid".to_string(), show_num(opts.audio_id)),
            ("sid".to_string(), show_num(opts.subtitle_id)),
        ]
    }
}
