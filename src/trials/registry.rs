//! Trial identifiers, their factory and the ordered sequence.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SessionError};
use crate::models::config::{InputMode, Viewport};
use crate::trials::calibration::CalibrationTrial;
use crate::trials::fireflies::FirefliesTrial;
use crate::trials::ghosts::GhostsTrial;
use crate::trials::keys::KeysTrial;
use crate::trials::warlocks::WarlocksTrial;
use crate::trials::{CursorOverlay, Trial};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrialId {
    #[serde(rename = "KCalibration")]
    Calibration,
    #[serde(rename = "P1")]
    Ghosts,
    #[serde(rename = "G1")]
    Keys,
    #[serde(rename = "D1")]
    Fireflies,
    #[serde(rename = "P3")]
    Warlocks,
}

impl TrialId {
    pub const ALL: [TrialId; 5] = [
        TrialId::Calibration,
        TrialId::Ghosts,
        TrialId::Keys,
        TrialId::Fireflies,
        TrialId::Warlocks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TrialId::Calibration => "KCalibration",
            TrialId::Ghosts => "P1",
            TrialId::Keys => "G1",
            TrialId::Fireflies => "D1",
            TrialId::Warlocks => "P3",
        }
    }

    /// Number row shortcut that launches a trial directly.
    pub fn from_debug_key(key: u8) -> Option<Self> {
        match key {
            0 => Some(TrialId::Calibration),
            1 => Some(TrialId::Ghosts),
            2 => Some(TrialId::Keys),
            3 => Some(TrialId::Fireflies),
            7 => Some(TrialId::Warlocks),
            _ => None,
        }
    }

    pub fn default_order(mode: InputMode) -> Vec<TrialId> {
        match mode {
            InputMode::Mouse | InputMode::Wand => {
                vec![TrialId::Ghosts, TrialId::Keys, TrialId::Fireflies]
            }
            InputMode::Kinect => vec![
                TrialId::Calibration,
                TrialId::Ghosts,
                TrialId::Keys,
                TrialId::Fireflies,
            ],
        }
    }
}

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrialId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        TrialId::ALL
            .into_iter()
            .find(|id| id.name() == trimmed)
            .ok_or_else(|| ConfigError::UnknownTrial(trimmed.to_string()))
    }
}

/// Inputs a trial factory may use.
pub struct TrialSetup<'a> {
    pub viewport: Viewport,
    pub input_mode: InputMode,
    pub rng: &'a mut StdRng,
    pub overlay: &'a mut CursorOverlay,
}

pub fn create_trial(id: TrialId, setup: TrialSetup<'_>) -> Result<Box<dyn Trial>, SessionError> {
    if setup.viewport.width == 0 || setup.viewport.height == 0 {
        return Err(SessionError::TrialConstruction {
            trial: id.name().to_string(),
            reason: format!(
                "viewport {}x{} has no area",
                setup.viewport.width, setup.viewport.height
            ),
        });
    }

    log::info!("create_trial: trial={} mode={}", id, setup.input_mode);
    let trial: Box<dyn Trial> = match id {
        TrialId::Calibration => Box::new(CalibrationTrial::new(setup.viewport, setup.input_mode)),
        TrialId::Ghosts => Box::new(GhostsTrial::new(setup.viewport, setup.overlay)),
        TrialId::Keys => Box::new(KeysTrial::new(setup.viewport, setup.overlay)),
        TrialId::Fireflies => Box::new(FirefliesTrial::new(setup.viewport, setup.rng, setup.overlay)),
        TrialId::Warlocks => Box::new(WarlocksTrial::new(setup.viewport)),
    };
    Ok(trial)
}

/// Ordered list of trials walked one after another.
#[derive(Debug, Clone)]
pub struct TrialSequence {
    order: Vec<TrialId>,
    position: Option<usize>,
}

impl TrialSequence {
    pub fn new(order: Vec<TrialId>) -> Self {
        Self {
            order,
            position: None,
        }
    }

    pub fn order(&self) -> &[TrialId] {
        &self.order
    }

    pub fn is_started(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// First trial of the sequence. Returns `None` once already started.
    pub fn start(&mut self) -> Option<TrialId> {
        if self.position.is_some() {
            return None;
        }
        self.position = Some(0);
        self.order.first().copied()
    }

    /// Next trial, or `None` once the list is exhausted.
    pub fn advance(&mut self) -> Option<TrialId> {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next);
        self.order.get(next).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.position.is_some_and(|p| p >= self.order.len())
    }
}
