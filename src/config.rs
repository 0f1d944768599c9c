use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calibration::EdgeCalibration;
use crate::pet::{MoveTuning, Tuning};

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "PETVIEWER_CONFIG";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted application settings. Every field has a default so older or
/// hand-trimmed files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub version: String,
    pub is_dance_enabled: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// Relative paths resolve against the config file's directory.
    pub assets_directory: String,
    pub use_calibration: bool,
    pub edge_calibration: EdgeCalibration,
    pub timing: TimingConfig,
    pub behavior: BehaviorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            is_dance_enabled: true,
            window_width: 300,
            window_height: 300,
            assets_directory: "Assets".to_string(),
            use_calibration: false,
            edge_calibration: EdgeCalibration::default(),
            timing: TimingConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

/// All intervals in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingConfig {
    pub frame_interval_ms: u64,
    pub idle_min_ms: u64,
    pub idle_max_ms: u64,
    pub press_debounce_ms: u64,
    pub move_interval_ms: u64,
    pub dance_min_ms: u64,
    pub dance_retry_ms: u64,
    pub dance_stop_grace_ms: u64,
    pub audio_poll_ms: u64,
    pub cache_cleanup_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 200,
            idle_min_ms: 5000,
            idle_max_ms: 15000,
            press_debounce_ms: 500,
            move_interval_ms: 50,
            dance_min_ms: 3000,
            dance_retry_ms: 1000,
            dance_stop_grace_ms: 1000,
            audio_poll_ms: 100,
            cache_cleanup_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BehaviorConfig {
    pub move_speed: f32,
    pub move_chance: f32,
    pub horizontal_chance: f32,
    pub drag_threshold_px: f32,
    pub edge_margin: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            move_chance: 0.3,
            horizontal_chance: 0.7,
            drag_threshold_px: 5.0,
            edge_margin: 5.0,
        }
    }
}

impl AppConfig {
    pub fn tuning(&self) -> Tuning {
        let t = &self.timing;
        let b = &self.behavior;
        // Zero-length tickers would spin the event loop.
        let tick = |v: u64| Duration::from_millis(v.max(1));
        let idle_min = Duration::from_millis(t.idle_min_ms);
        Tuning {
            frame_interval: tick(t.frame_interval_ms),
            idle_min,
            idle_max: Duration::from_millis(t.idle_max_ms).max(idle_min),
            press_debounce: Duration::from_millis(t.press_debounce_ms),
            move_interval: tick(t.move_interval_ms),
            dance_min: Duration::from_millis(t.dance_min_ms),
            dance_retry: tick(t.dance_retry_ms),
            dance_stop_grace: Duration::from_millis(t.dance_stop_grace_ms),
            cache_cleanup: tick(t.cache_cleanup_ms),
            drag_threshold: b.drag_threshold_px,
            movement: MoveTuning {
                speed: b.move_speed,
                move_chance: b.move_chance.clamp(0.0, 1.0),
                horizontal_chance: b.horizontal_chance.clamp(0.0, 1.0),
                edge_margin: b.edge_margin,
            },
        }
    }

    pub fn audio_poll(&self) -> Duration {
        Duration::from_millis(self.timing.audio_poll_ms.max(1))
    }

    pub fn window_size(&self) -> Vec2 {
        Vec2::new(self.window_width as f32, self.window_height as f32)
    }

    /// Asset root for a config loaded from `config_path`.
    pub fn assets_root(&self, config_path: &Path) -> PathBuf {
        let dir = Path::new(&self.assets_directory);
        if dir.is_absolute() {
            return dir.to_path_buf();
        }
        config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(dir)
    }
}

/// `$PETVIEWER_CONFIG` if set, otherwise `config.json` next to the executable.
pub fn config_path() -> PathBuf {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(p);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join(CONFIG_FILE)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

/// Load settings, falling back to defaults on any problem.
pub fn load(path: &Path) -> AppConfig {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return AppConfig::default();
    }
    match try_load(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("{e}; using defaults");
            AppConfig::default()
        }
    }
}

fn try_load(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Write to a sibling temp file, then rename over the target.
pub fn save_atomic(path: &Path, cfg: &AppConfig) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(cfg)?;
    fs::write(&tmp, data).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

/// Reload, flip the dance flag and save. Returns the saved config.
pub fn set_dance_enabled(path: &Path, enabled: bool) -> Result<AppConfig, ConfigError> {
    let mut cfg = load(path);
    cfg.is_dance_enabled = enabled;
    save_atomic(path, &cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(&dir.path().join("config.json"));
        assert_eq!(cfg, AppConfig::default());
        assert!(cfg.is_dance_enabled);
        assert_eq!(cfg.timing.idle_max_ms, 15000);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "isDanceEnabled": false, "windowWidth": 200, "timing": { "danceMinMs": 5000 } }"#,
        )
        .unwrap();
        let cfg = load(&path);
        assert!(!cfg.is_dance_enabled);
        assert_eq!(cfg.window_width, 200);
        assert_eq!(cfg.window_height, 300);
        assert_eq!(cfg.timing.dance_min_ms, 5000);
        assert_eq!(cfg.timing.frame_interval_ms, 200);
        assert_eq!(cfg.behavior, BehaviorConfig::default());
    }

    #[test]
    fn corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load(&path), AppConfig::default());
        assert!(matches!(try_load(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn dance_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let saved = set_dance_enabled(&path, false).unwrap();
        assert!(!saved.is_dance_enabled);
        assert!(!load(&path).is_dance_enabled);
        assert!(!path.with_extension("json.tmp").exists());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"isDanceEnabled\": false"));
        assert!(text.contains("\"edgeCalibration\""));
    }

    #[test]
    fn save_into_missing_dir_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("config.json");
        let err = save_atomic(&path, &AppConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn tuning_mirrors_config() {
        let mut cfg = AppConfig::default();
        cfg.timing.idle_min_ms = 8000;
        cfg.timing.idle_max_ms = 4000;
        cfg.timing.frame_interval_ms = 0;
        cfg.behavior.move_chance = 2.0;
        let t = cfg.tuning();
        assert_eq!(t.idle_min, Duration::from_millis(8000));
        assert_eq!(t.idle_max, t.idle_min);
        assert_eq!(t.frame_interval, Duration::from_millis(1));
        assert_eq!(t.movement.move_chance, 1.0);
        assert_eq!(t.press_debounce, Duration::from_millis(500));
    }

    #[test]
    fn assets_resolve_next_to_config() {
        let cfg = AppConfig::default();
        let root = cfg.assets_root(Path::new("/opt/pet/config.json"));
        assert_eq!(root, PathBuf::from("/opt/pet/Assets"));

        let abs = AppConfig {
            assets_directory: "/srv/art".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(abs.assets_root(Path::new("config.json")), PathBuf::from("/srv/art"));
    }
}
