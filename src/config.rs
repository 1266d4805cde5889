use crate::app_dirs::AppDirs;
use crate::opponent::OpponentConfig;
use crate::session::{Mode, SessionOptions};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where round text comes from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TextSource {
    /// built-in library of paragraphs
    #[default]
    Library,
    /// freshly generated sentences
    Sentences,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub opponent_wpm: f64,
    pub opponent_accuracy: f64,
    pub time_limit_secs: Option<u64>,
    /// Unset means the mode picks: generated sentences for exercises, the
    /// library otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<TextSource>,
    pub sentences: usize,
}

impl Default for Config {
    fn default() -> Self {
        let opponent = OpponentConfig::default();
        Self {
            mode: Mode::Practice,
            opponent_wpm: opponent.speed_wpm,
            opponent_accuracy: opponent.accuracy_percent,
            time_limit_secs: None,
            source: None,
            sentences: 2,
        }
    }
}

impl Config {
    /// Validated opponent settings: speed and accuracy are clamped to usable ranges.
    pub fn opponent(&self) -> OpponentConfig {
        OpponentConfig::new(self.opponent_wpm, self.opponent_accuracy)
    }

    pub fn text_source(&self) -> TextSource {
        self.source.unwrap_or(match self.mode {
            Mode::Exercise => TextSource::Sentences,
            Mode::Practice | Mode::Race => TextSource::Library,
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            mode: self.mode,
            opponent: (self.mode == Mode::Race).then(|| self.opponent()),
            opponent_seed: None,
            time_limit_secs: self.time_limit_secs,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> crate::error::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("typeduel_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("ignoring malformed config at {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> crate::error::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
