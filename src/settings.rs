use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{LazyLock, RwLock};

use crate::heatmap::HeatmapStyle;
use crate::select::OverlapPolicy;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "studylens";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Minimum width and height (document units) for a committed selection.
    #[serde(default = "default_min_selection_size")]
    pub min_selection_size: f32,

    #[serde(default)]
    pub overlap_policy: OverlapPolicy,

    /// Heatmap cell edge, in canvas pixels.
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,

    #[serde(default)]
    pub heatmap_style: HeatmapStyle,

    #[serde(default = "default_analysis_workers")]
    pub analysis_workers: usize,

    #[serde(default = "default_page_cache_size")]
    pub page_cache_size: usize,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_min_selection_size() -> f32 {
    10.0
}

fn default_grid_size() -> u32 {
    crate::heatmap::DEFAULT_CELL_SIZE
}

fn default_analysis_workers() -> usize {
    crate::analysis::DEFAULT_ANALYSIS_WORKERS
}

fn default_page_cache_size() -> usize {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            min_selection_size: default_min_selection_size(),
            overlap_policy: OverlapPolicy::default(),
            grid_size: default_grid_size(),
            heatmap_style: HeatmapStyle::default(),
            analysis_workers: default_analysis_workers(),
            page_cache_size: default_page_cache_size(),
        }
    }
}

impl Settings {
    /// Reader tunables derived from these settings.
    #[must_use]
    pub fn reader_config(&self) -> crate::reader::ReaderConfig {
        crate::reader::ReaderConfig {
            min_selection_size: self.min_selection_size,
            overlap_policy: self.overlap_policy,
            page_cache_size: self.page_cache_size,
            analysis_workers: self.analysis_workers,
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the config file, creating it with defaults on first run.
pub fn load_settings() {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

fn load_settings_from_path(path: &PathBuf) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    settings.version = CURRENT_VERSION;
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                warn!("Failed to parse settings file {path:?}: {e}, using defaults");
            }
        },
        Err(e) => {
            warn!("Failed to read settings file {path:?}: {e}, using defaults");
        }
    }
}

fn save_settings_to_file(settings: &Settings, path: &PathBuf) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory {parent:?}: {e}");
            return;
        }
    }

    match serde_yaml::to_string(settings) {
        Ok(content) => {
            if let Err(e) = fs::write(path, content) {
                warn!("Failed to write settings to {path:?}: {e}");
            }
        }
        Err(e) => warn!("Failed to serialize settings: {e}"),
    }
}

/// Snapshot of the current settings.
#[must_use]
pub fn settings() -> Settings {
    SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_else(|_| Settings::default())
}

/// Replace the global settings (used by embedders and tests).
pub fn update_settings(new_settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = new_settings;
    }
}
