use crate::error::{CoreError, Result};
use crate::interval::MIN_CLIP_LEN;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_EXTENSION: &str = "cutline.json";

/// Tunables for an editing session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    /// Minimum clip length; trims and splits never go below it.
    pub min_clip_len: TimeUs,
    pub skip_step: TimeUs,
    pub snap_threshold: TimeUs,
    pub history_depth: usize,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub tick_interval_ms: u64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            min_clip_len: MIN_CLIP_LEN,
            skip_step: TimeUs::from_seconds(5.0),
            snap_threshold: TimeUs::from_millis(100),
            history_depth: 100,
            zoom_min: 0.1,
            zoom_max: 10.0,
            tick_interval_ms: 16,
        }
    }
}

impl EditorSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Reject settings that would break the editing rules.
    pub fn validate(&self) -> Result<()> {
        if self.min_clip_len <= TimeUs::ZERO {
            return Err(CoreError::InvalidDuration(format!(
                "min_clip_len {} must be positive",
                self.min_clip_len
            )));
        }
        if self.skip_step < TimeUs::ZERO || self.snap_threshold < TimeUs::ZERO {
            return Err(CoreError::OutOfRange(
                "skip_step and snap_threshold must not be negative".into(),
            ));
        }
        if !(self.zoom_min > 0.0 && self.zoom_min <= self.zoom_max && self.zoom_max.is_finite()) {
            return Err(CoreError::OutOfRange(format!(
                "zoom range {}..{} is invalid",
                self.zoom_min, self.zoom_max
            )));
        }
        Ok(())
    }

    /// Save settings to a file as pretty-printed JSON.
    /// Automatically appends `.cutline.json` if not present.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let settings: EditorSettings = serde_json::from_str(&data)?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Fine-grained editing: short skips, tight snapping, deep history.
pub fn preset_precise() -> EditorSettings {
    EditorSettings {
        skip_step: TimeUs::from_seconds(1.0),
        snap_threshold: TimeUs::from_millis(40),
        history_depth: 500,
        zoom_max: 50.0,
        ..EditorSettings::default()
    }
}

/// Long-form rough cuts: large skips and loose snapping.
pub fn preset_rough_cut() -> EditorSettings {
    EditorSettings {
        skip_step: TimeUs::from_seconds(30.0),
        snap_threshold: TimeUs::from_millis(500),
        zoom_min: 0.01,
        ..EditorSettings::default()
    }
}

/// Low-power playback at roughly 30 ticks per second.
pub fn preset_low_power() -> EditorSettings {
    EditorSettings {
        tick_interval_ms: 33,
        history_depth: 20,
        ..EditorSettings::default()
    }
}

fn ensure_extension(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.ends_with(&format!(".{SETTINGS_EXTENSION}")) {
        path.to_path_buf()
    } else {
        path.with_file_name(format!("{name}.{SETTINGS_EXTENSION}"))
    }
}
