//! Session manifest (session.json).
//! schemaVersion: 1

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::hand_ray::Calibration;
use crate::error::SessionError;
use crate::models::config::{InputMode, Viewport};
use crate::trials::TrialId;

pub const SCHEMA_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionManifest {
    pub schema_version: u32,
    pub session_id: String,
    pub username: String,
    pub input_mode: InputMode,
    pub viewport: Viewport,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub trial_order: Vec<TrialId>,
    #[serde(default)]
    pub trials_completed: Vec<TrialId>,
    /// File names of the exported flat renders, in capture order.
    #[serde(default)]
    pub renders: Vec<String>,
    pub log_file: String,
    pub calibration: Calibration,
}

impl SessionManifest {
    pub fn save(&self, dir: &Path) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(MANIFEST_FILE), json)?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self, SessionError> {
        let raw = std::fs::read_to_string(dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&raw)?)
    }
}
