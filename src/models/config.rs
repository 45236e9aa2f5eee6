//! Session configuration (session config JSON).
//! schemaVersion: 1

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::trials::TrialId;

pub const SCHEMA_VERSION: u32 = 1;
/// Largest viewport side; each flat render holds RGBA plus depth per pixel.
pub const MAX_VIEWPORT_SIDE: u32 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Mouse,
    Kinect,
    Wand,
}

impl InputMode {
    /// Upper-case tag used in session directory names.
    pub fn tag(self) -> &'static str {
        match self {
            InputMode::Mouse => "MOUSE",
            InputMode::Kinect => "KINECT",
            InputMode::Wand => "WAND",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 1280,
            height: 720,
        }
    }
}

impl Viewport {
    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_username() -> String {
    "DefUser".to_string()
}

fn default_cursor_area() -> u32 {
    75
}

fn default_point_capacity() -> usize {
    8
}

fn default_edge_inset() -> f64 {
    20.0
}

fn default_seed() -> u64 {
    1
}

fn default_log_settle_secs() -> f64 {
    1.0 / 6.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub input_mode: InputMode,
    #[serde(default)]
    pub viewport: Viewport,
    /// Side of the square hit-test window in pixels.
    #[serde(default = "default_cursor_area")]
    pub cursor_area: u32,
    /// Moving-average window length.
    #[serde(default = "default_point_capacity")]
    pub point_capacity: usize,
    #[serde(default = "default_edge_inset")]
    pub edge_inset: f64,
    /// Trial names, e.g. `["P1", "G1"]`. Falls back to the per-mode default.
    #[serde(default)]
    pub trial_order: Option<Vec<String>>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_log_settle_secs")]
    pub log_settle_secs: f64,
    #[serde(default)]
    pub autostart: bool,
    #[serde(default)]
    pub output_root: Option<PathBuf>,
    #[serde(default)]
    pub custom_titles: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            schema_version: SCHEMA_VERSION,
            username: default_username(),
            input_mode: InputMode::default(),
            viewport: Viewport::default(),
            cursor_area: default_cursor_area(),
            point_capacity: default_point_capacity(),
            edge_inset: default_edge_inset(),
            trial_order: None,
            seed: default_seed(),
            log_settle_secs: default_log_settle_secs(),
            autostart: false,
            output_root: None,
            custom_titles: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Parsed trial order, or the default order for the input mode.
    pub fn resolved_trial_order(&self) -> Result<Vec<TrialId>, ConfigError> {
        match &self.trial_order {
            Some(names) => names
                .iter()
                .map(|name| {
                    name.parse::<TrialId>()
                        .map_err(|_| ConfigError::UnknownTrial(name.clone()))
                })
                .collect(),
            None => Ok(TrialId::default_order(self.input_mode)),
        }
    }

    /// `{Documents}/pointlab` unless `outputRoot` is set.
    pub fn output_root(&self) -> Option<PathBuf> {
        match &self.output_root {
            Some(path) if !path.as_os_str().is_empty() => Some(path.clone()),
            _ => dirs::document_dir()
                .or_else(dirs::home_dir)
                .map(|dir| dir.join("pointlab")),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::SchemaVersion {
                expected: SCHEMA_VERSION,
                actual: self.schema_version,
            });
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "username",
                reason: "must not be empty".to_string(),
            });
        }
        let inset2 = self.edge_inset * 2.0;
        if self.viewport.width == 0
            || self.viewport.height == 0
            || inset2 >= self.viewport.width as f64
            || inset2 >= self.viewport.height as f64
        {
            return Err(ConfigError::Invalid {
                field: "viewport",
                reason: format!(
                    "{}x{} leaves no room inside a {} px inset",
                    self.viewport.width, self.viewport.height, self.edge_inset
                ),
            });
        }
        if self.viewport.width > MAX_VIEWPORT_SIDE || self.viewport.height > MAX_VIEWPORT_SIDE {
            return Err(ConfigError::Invalid {
                field: "viewport",
                reason: format!(
                    "{}x{} exceeds the {} px limit per side",
                    self.viewport.width, self.viewport.height, MAX_VIEWPORT_SIDE
                ),
            });
        }
        if !self.edge_inset.is_finite() || self.edge_inset < 0.0 {
            return Err(ConfigError::Invalid {
                field: "edgeInset",
                reason: format!("{} is not a non-negative number", self.edge_inset),
            });
        }
        if self.cursor_area == 0 {
            return Err(ConfigError::Invalid {
                field: "cursorArea",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.point_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "pointCapacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.log_settle_secs.is_finite() || self.log_settle_secs < 0.0 {
            return Err(ConfigError::Invalid {
                field: "logSettleSecs",
                reason: format!("{} is not a non-negative number", self.log_settle_secs),
            });
        }
        self.resolved_trial_order()?;
        Ok(())
    }
}

pub fn parse_config(raw: &str) -> Result<SessionConfig, ConfigError> {
    let config: SessionConfig = serde_json::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Loads and validates a session config file.
pub fn load_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    log::info!("load_config: path={}", path.display());
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_config("{}").expect("parse empty config");
        assert_eq!(config.username, "DefUser");
        assert_eq!(config.input_mode, InputMode::Mouse);
        assert_eq!(config.viewport, Viewport::default());
        assert_eq!(config.cursor_area, 75);
        assert_eq!(config.point_capacity, 8);
        assert_eq!(config.edge_inset, 20.0);
        assert!((config.log_settle_secs - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(
            config.resolved_trial_order().expect("default order"),
            vec![TrialId::Ghosts, TrialId::Keys, TrialId::Fireflies]
        );
    }

    #[test]
    fn only_skeletal_mode_starts_with_calibration() {
        let config = parse_config(r#"{"inputMode":"kinect"}"#).expect("parse kinect config");
        assert_eq!(
            config.resolved_trial_order().expect("default order"),
            vec![
                TrialId::Calibration,
                TrialId::Ghosts,
                TrialId::Keys,
                TrialId::Fireflies
            ]
        );
        let config = parse_config(r#"{"inputMode":"wand"}"#).expect("parse wand config");
        assert_eq!(
            config.resolved_trial_order().expect("default order"),
            vec![TrialId::Ghosts, TrialId::Keys, TrialId::Fireflies]
        );
    }

    #[test]
    fn explicit_trial_order_is_parsed_by_name() {
        let config =
            parse_config(r#"{"trialOrder":["P3","D1"]}"#).expect("parse explicit trial order");
        assert_eq!(
            config.resolved_trial_order().expect("explicit order"),
            vec![TrialId::Warlocks, TrialId::Fireflies]
        );
    }

    #[test]
    fn unknown_trial_fails_at_load() {
        let err = parse_config(r#"{"trialOrder":["P1","P9"]}"#).expect_err("unknown trial");
        assert!(matches!(err, ConfigError::UnknownTrial(name) if name == "P9"));
    }

    #[test]
    fn rejects_unsupported_schema_version() {
        let err = parse_config(r#"{"schemaVersion":2}"#).expect_err("schema version");
        assert!(matches!(
            err,
            ConfigError::SchemaVersion {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn rejects_viewport_smaller_than_inset() {
        let err = parse_config(r#"{"viewport":{"width":30,"height":720}}"#)
            .expect_err("tiny viewport");
        assert!(matches!(err, ConfigError::Invalid { field: "viewport", .. }));
    }

    #[test]
    fn rejects_oversized_viewport() {
        let err = parse_config(r#"{"viewport":{"width":100000,"height":100000}}"#)
            .expect_err("huge viewport");
        assert!(matches!(err, ConfigError::Invalid { field: "viewport", .. }));
        assert!(parse_config(r#"{"viewport":{"width":8192,"height":4320}}"#).is_ok());
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let err = parse_config("{ not json").expect_err("bad json");
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let path = std::env::temp_dir().join("pointlab-missing-config-does-not-exist.json");
        let err = load_config(&path).expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
