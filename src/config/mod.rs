// Configuration management for cuepipe
// Handles loading/saving settings, with sensible defaults when config is missing

use crate::media::MediaKind;
use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub player: PlayerConfig,
    pub playlist: PlaylistConfig,
    pub actions: ActionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub program: String,
    pub fullscreen: bool,
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Kinds that make it into the playlist
    pub playable_kinds: Vec<MediaKind>,
    /// How many saved playlists may nest inside each other
    pub max_nesting_depth: usize,
    /// How deep directory arguments are walked (1 = only the directory itself)
    pub directory_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    pub move_dir: PathBuf,
    pub delete_dir: PathBuf,
    pub keep_dir: PathBuf,
    pub reject_dir: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "mpv".to_string(),
            fullscreen: true,
            extra_args: Vec::new(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            playable_kinds: vec![MediaKind::Audio, MediaKind::Video, MediaKind::Image],
            max_nesting_depth: 16,
            directory_depth: 1,
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            move_dir: PathBuf::from("sett"),
            delete_dir: PathBuf::from(".delete"),
            keep_dir: PathBuf::from("_gg"),
            reject_dir: PathBuf::from("ngg"),
        }
    }
}

impl Config {
    /// Load from the default location, writing the defaults there on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)
            .with_context(|| format!("writing {}", config_path.display()))?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("cuepipe");

        Ok(config_dir.join("config.toml"))
    }
}
