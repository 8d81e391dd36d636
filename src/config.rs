//! Configuration persistence.
//!
//! Settings live as pretty-printed JSON in the per-user data directory
//! (%APPDATA%/DeskToggle/config.json on Windows). Loading is tolerant:
//! a missing or unreadable file yields defaults, an unrecognized `mode`
//! string falls back to [`Mode::Hotkey`], and fields this version does not
//! know about are kept in `extras` and written back verbatim on save.

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_HOTKEY: &str = "Ctrl+Alt+F1";

/// Fullscreen tolerance is clamped to this range (pixels).
pub const MAX_FULLSCREEN_TOLERANCE: i32 = 64;

/// Active toggle-detection mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Hotkey,
    DesktopDoubleClick,
}

impl<'de> Deserialize<'de> for Mode {
    // Stored values from older or foreign versions must never fail the whole
    // config parse; anything unrecognized normalizes to Hotkey.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "DesktopDoubleClick" => Mode::DesktopDoubleClick,
            "Hotkey" => Mode::Hotkey,
            other => {
                warn!(mode = %other, "unrecognized mode in config, using Hotkey");
                Mode::Hotkey
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub hotkey: String,
    pub suppress_in_fullscreen: bool,
    pub show_tray_icon: bool,
    pub auto_start: bool,
    pub check_updates: bool,
    pub fullscreen_tolerance: i32,
    pub show_toggle_toast: bool,
    pub show_first_run_guide: bool,
    /// Fields we do not recognize; preserved across load/save round trips.
    #[serde(flatten)]
    pub extras: serde_json::Map<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: Mode::Hotkey,
            hotkey: DEFAULT_HOTKEY.to_string(),
            suppress_in_fullscreen: true,
            show_tray_icon: true,
            auto_start: false,
            check_updates: true,
            fullscreen_tolerance: 3,
            show_toggle_toast: true,
            show_first_run_guide: true,
            extras: serde_json::Map::new(),
        }
    }
}

impl Config {
    /// Clamp and default fields so downstream code never sees unsafe values.
    pub fn normalize(&mut self) {
        let trimmed = self.hotkey.trim();
        self.hotkey = if trimmed.is_empty() {
            DEFAULT_HOTKEY.to_string()
        } else {
            trimmed.to_string()
        };
        self.fullscreen_tolerance = self.fullscreen_tolerance.clamp(0, MAX_FULLSCREEN_TOLERANCE);
    }

    /// Load from the default location, falling back to defaults on any error.
    pub fn load() -> Config {
        let Ok(path) = config_path() else {
            return Config::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Config {
        if !path.exists() {
            return Config::default();
        }
        let mut cfg = match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(error = %e, "config file is malformed, using defaults");
                Config::default()
            }),
            Err(e) => {
                warn!(error = %e, "failed to read config file, using defaults");
                Config::default()
            }
        };
        cfg.normalize();
        cfg
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// The application's data directory, created on first use.
pub fn data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "DeskToggle")
        .ok_or_else(|| anyhow!("failed to determine user data directory"))?;
    let dir = dirs.data_dir().to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.mode, Mode::Hotkey);
        assert_eq!(cfg.hotkey, DEFAULT_HOTKEY);
        assert!(cfg.suppress_in_fullscreen);
        assert_eq!(cfg.fullscreen_tolerance, 3);
        assert!(cfg.show_first_run_guide);
    }

    #[test]
    fn unknown_mode_normalizes_to_hotkey() {
        let cfg: Config = serde_json::from_str(r#"{"mode":"WaveHands"}"#).unwrap();
        assert_eq!(cfg.mode, Mode::Hotkey);
    }

    #[test]
    fn double_click_mode_round_trips() {
        let cfg: Config = serde_json::from_str(r#"{"mode":"DesktopDoubleClick"}"#).unwrap();
        assert_eq!(cfg.mode, Mode::DesktopDoubleClick);
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"DesktopDoubleClick\""));
    }

    #[test]
    fn normalize_clamps_tolerance_and_defaults_empty_hotkey() {
        let mut cfg = Config::default();
        cfg.fullscreen_tolerance = 500;
        cfg.hotkey = "   ".into();
        cfg.normalize();
        assert_eq!(cfg.fullscreen_tolerance, MAX_FULLSCREEN_TOLERANCE);
        assert_eq!(cfg.hotkey, DEFAULT_HOTKEY);

        cfg.fullscreen_tolerance = -7;
        cfg.normalize();
        assert_eq!(cfg.fullscreen_tolerance, 0);
    }

    #[test]
    fn extras_survive_round_trip() {
        let json = r#"{"hotkey":"Ctrl+F2","future_flag":true,"nested":{"a":1}}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.hotkey, "Ctrl+F2");
        assert_eq!(cfg.extras["future_flag"], serde_json::json!(true));

        let out = serde_json::to_string(&cfg).unwrap();
        let reparsed: Config = serde_json::from_str(&out).unwrap();
        assert_eq!(reparsed.extras["nested"], serde_json::json!({"a": 1}));
    }

    #[test]
    fn load_from_missing_and_malformed_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(Config::load_from(&path).hotkey, DEFAULT_HOTKEY);

        fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path).mode, Mode::Hotkey);
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.json");
        let mut cfg = Config::default();
        cfg.mode = Mode::DesktopDoubleClick;
        cfg.show_toggle_toast = false;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.mode, Mode::DesktopDoubleClick);
        assert!(!loaded.show_toggle_toast);
    }
}
