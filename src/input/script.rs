//! Headless playback of recorded or hand-written input frames.
//!
//! A script is a JSON array of frames. Each frame takes the `FrameInput`
//! fields plus an optional `repeat` count that holds it for several frames:
//!
//! ```json
//! [
//!   { "mouse": { "x": 640, "y": 360, "right": true } },
//!   { "mouse": { "x": 640, "y": 360 }, "keys": { "acknowledge": true } },
//!   { "mouse": { "x": 700, "y": 300 }, "repeat": 30 }
//! ]
//! ```

use std::collections::VecDeque;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ScriptError, SessionError};
use crate::input::InputSource;
use crate::models::input::FrameInput;

/// Ten minutes of frames at 60 Hz.
pub const MAX_REPEAT: u32 = 36_000;

fn default_repeat() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct ScriptFrame {
    #[serde(flatten)]
    frame: FrameInput,
    #[serde(default = "default_repeat")]
    repeat: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<FrameInput>,
    pointer_requests: Vec<(f64, f64)>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = FrameInput>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            pointer_requests: Vec::new(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ScriptError> {
        let script: Vec<ScriptFrame> = serde_json::from_str(raw)?;
        if let Some((index, entry)) = script.iter().enumerate().find(|(_, e)| e.repeat > MAX_REPEAT) {
            return Err(ScriptError::RepeatTooLarge {
                index,
                repeat: entry.repeat,
                max: MAX_REPEAT,
            });
        }
        let frames = script
            .into_iter()
            .flat_map(|entry| std::iter::repeat(entry.frame).take(entry.repeat as usize));
        Ok(Self::new(frames))
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let script = std::fs::read_to_string(path)
            .map_err(ScriptError::from)
            .and_then(|raw| Self::from_json(&raw))
            .map_err(|source| SessionError::InputScript {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!(
            "load_input_script: path={} frames={}",
            path.display(),
            script.remaining()
        );
        Ok(script)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// Pointer moves the session asked for, oldest first.
    pub fn pointer_requests(&self) -> &[(f64, f64)] {
        &self.pointer_requests
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Option<FrameInput> {
        self.frames.pop_front()
    }

    fn set_pointer(&mut self, x: f64, y: f64) {
        self.pointer_requests.push((x, y));
    }
}
