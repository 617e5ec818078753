use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub frame_count: usize,
    pub path_prefix: String,
    pub pad_width: usize,
    pub extension: String,
    /// Directory frame paths are resolved against.
    pub asset_root: PathBuf,
    /// Loads in flight at once after frame 1.
    pub concurrency: usize,
    pub max_pixel_ratio: f64,
    pub pixels_per_frame: PixelsPerFrame,
    /// Caps the nearest-neighbor search; `None` searches the whole set.
    pub max_fallback_radius: Option<usize>,
    pub warning_duration_ms: u64,
    pub terminal: TerminalConfig,
}

/// Scroll distance per frame, tiered by viewport width.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelsPerFrame {
    pub wide_min_width: f64,
    pub wide: f64,
    pub medium_min_width: f64,
    pub medium: f64,
    pub narrow: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Backing-store pixels per half-block pixel, before clamping.
    pub pixel_ratio: f64,
    /// Virtual pixels scrolled per wheel notch or arrow key.
    pub scroll_step: f64,
    /// Animation-frame interval.
    pub tick_ms: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        SequenceConfig {
            frame_count: 240,
            path_prefix: "assets/sequens/ezgif-frame-".into(),
            pad_width: 3,
            extension: ".jpg".into(),
            asset_root: PathBuf::from("."),
            concurrency: 12,
            max_pixel_ratio: 2.0,
            pixels_per_frame: PixelsPerFrame::default(),
            max_fallback_radius: None,
            warning_duration_ms: 6000,
            terminal: TerminalConfig::default(),
        }
    }
}

impl Default for PixelsPerFrame {
    fn default() -> Self {
        PixelsPerFrame {
            wide_min_width: 1280.0,
            wide: 9.0,
            medium_min_width: 768.0,
            medium: 7.0,
            narrow: 5.5,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            pixel_ratio: 1.0,
            scroll_step: 24.0,
            tick_ms: 16,
        }
    }
}

impl PixelsPerFrame {
    pub fn for_width(&self, viewport_width: f64) -> f64 {
        if viewport_width >= self.wide_min_width {
            self.wide
        } else if viewport_width >= self.medium_min_width {
            self.medium
        } else {
            self.narrow
        }
    }
}

impl SequenceConfig {
    /// Read and validate a JSON config. Absent fields take defaults.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SequenceConfig =
            serde_json::from_str(&json).map_err(|source| EngineError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load`, but falls back to defaults when `path` is `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, EngineError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                if !config.asset_root.join(config.frame_path(0)).exists() {
                    warn!(
                        "no config given and {} is missing; frames will fail to load",
                        config.frame_path(0)
                    );
                }
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.frame_count == 0 {
            return Err(EngineError::Config("frame_count must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(EngineError::Config("concurrency must be at least 1".into()));
        }
        if self.pad_width == 0 {
            return Err(EngineError::Config("pad_width must be at least 1".into()));
        }
        if !(self.max_pixel_ratio > 0.0) {
            return Err(EngineError::Config("max_pixel_ratio must be positive".into()));
        }
        let tiers = &self.pixels_per_frame;
        if !(tiers.wide > 0.0 && tiers.medium > 0.0 && tiers.narrow > 0.0) {
            return Err(EngineError::Config("pixels_per_frame tiers must be positive".into()));
        }
        if !(self.terminal.pixel_ratio > 0.0 && self.terminal.scroll_step > 0.0) {
            return Err(EngineError::Config(
                "terminal pixel_ratio and scroll_step must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Asset path of the zero-based frame `index` (frame number `index + 1`).
    pub fn frame_path(&self, index: usize) -> String {
        format!(
            "{}{:0width$}{}",
            self.path_prefix,
            index + 1,
            self.extension,
            width = self.pad_width,
        )
    }

    pub fn warning_duration(&self) -> Duration {
        Duration::from_millis(self.warning_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_paths_are_one_based_and_padded() {
        let config = SequenceConfig::default();
        assert_eq!(config.frame_path(0), "assets/sequens/ezgif-frame-001.jpg");
        assert_eq!(config.frame_path(239), "assets/sequens/ezgif-frame-240.jpg");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SequenceConfig =
            serde_json::from_str(r#"{"frame_count": 10, "terminal": {"scroll_step": 8}}"#).unwrap();
        assert_eq!(config.frame_count, 10);
        assert_eq!(config.concurrency, 12);
        assert_eq!(config.terminal.scroll_step, 8.0);
        assert_eq!(config.terminal.tick_ms, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tiers_follow_viewport_width() {
        let tiers = PixelsPerFrame::default();
        assert_eq!(tiers.for_width(1920.0), 9.0);
        assert_eq!(tiers.for_width(1280.0), 9.0);
        assert_eq!(tiers.for_width(1024.0), 7.0);
        assert_eq!(tiers.for_width(375.0), 5.5);
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let config = SequenceConfig {
            concurrency: 0,
            ..SequenceConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reel.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SequenceConfig::load(&path),
            Err(EngineError::ConfigParse { .. })
        ));
    }
}
