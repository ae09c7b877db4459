//! Configuration loading and persisted settings

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Lowest opacity the window may be persisted or driven to
pub const MIN_OPACITY: f64 = 0.1;
/// Fully opaque
pub const MAX_OPACITY: f64 = 1.0;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Persisted user settings
    pub settings_path: PathBuf,

    /// Root of the screenshot queues
    pub screenshot_dir: PathBuf,

    /// Capture command; `{path}` is replaced with the target file
    pub capture_command: Vec<String>,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os("OVERLAY_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = std::env::var("HOME")?;
                PathBuf::from(&home)
                    .join(".local")
                    .join("share")
                    .join("overlay-daemon")
            }
        };

        let capture_command = std::env::var("OVERLAY_CAPTURE_CMD")
            .ok()
            .map(|cmd| parse_command(&cmd))
            .filter(|cmd| !cmd.is_empty())
            .unwrap_or_else(default_capture_command);

        Ok(Self::with_data_dir(data_dir, capture_command))
    }

    fn with_data_dir(data_dir: PathBuf, capture_command: Vec<String>) -> Self {
        Self {
            socket_path: data_dir.join("daemon.sock"),
            settings_path: data_dir.join("settings.json"),
            screenshot_dir: data_dir.join("screenshots"),
            data_dir,
            capture_command,
        }
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.screenshot_dir)?;
        Ok(())
    }
}

fn parse_command(cmd: &str) -> Vec<String> {
    cmd.split_whitespace().map(str::to_string).collect()
}

fn default_capture_command() -> Vec<String> {
    if cfg!(target_os = "macos") {
        parse_command("screencapture -x {path}")
    } else {
        parse_command("grim {path}")
    }
}

/// Errors writing persisted settings
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted configuration collaborator
pub trait ConfigStore: Send + Sync {
    fn set_opacity(&self, opacity: f64) -> Result<(), PersistenceError>;
}

/// User settings kept across restarts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub opacity: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self { opacity: MAX_OPACITY }
    }
}

/// JSON-file backed settings
pub struct SettingsStore {
    path: PathBuf,
    current: std::sync::Mutex<Settings>,
}

impl SettingsStore {
    /// Open the settings file, falling back to defaults when it is missing
    /// or unreadable
    pub fn open(path: &Path) -> Self {
        let mut settings = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice::<Settings>(&bytes).unwrap_or_else(|e| {
                warn!(?path, ?e, "settings file is corrupt, using defaults");
                Settings::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => {
                warn!(?path, ?e, "failed to read settings, using defaults");
                Settings::default()
            }
        };
        settings.opacity = settings.opacity.max(MIN_OPACITY).min(MAX_OPACITY);

        Self {
            path: path.to_owned(),
            current: std::sync::Mutex::new(settings),
        }
    }

    pub fn settings(&self) -> Settings {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Settings> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self, settings: &Settings) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(settings)?;
        std::fs::write(&self.path, bytes)?;
        debug!(path = ?self.path, "settings saved");
        Ok(())
    }
}

impl ConfigStore for SettingsStore {
    fn set_opacity(&self, opacity: f64) -> Result<(), PersistenceError> {
        let mut current = self.lock();
        current.opacity = opacity;
        self.save(&current)
    }
}
