//! Per-frame device snapshots consumed by the session loop.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MouseSnapshot {
    pub x: f64,
    pub y: f64,
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JointTracking {
    #[default]
    NotTracked,
    Inferred,
    Tracked,
}

/// A skeletal joint in sensor space (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JointSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub tracking: JointTracking,
}

impl JointSample {
    pub fn is_usable(&self) -> bool {
        self.tracking != JointTracking::NotTracked
    }

    pub fn position(&self) -> glam::Vec3 {
        glam::Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkeletonSnapshot {
    pub elbow_right: JointSample,
    pub hand_right: JointSample,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WandSnapshot {
    /// IR point in screen pixels.
    pub ir_x: f64,
    pub ir_y: f64,
    pub ir_found: bool,
    pub a: bool,
    pub b: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyboardSnapshot {
    /// Enter.
    pub acknowledge: bool,
    pub escape: bool,
    /// Number key pressed this frame, if any.
    pub debug_trial: Option<u8>,
}

/// Everything the loop reads from the outside world in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub dt: f64,
    pub mouse: Option<MouseSnapshot>,
    pub skeleton: Option<SkeletonSnapshot>,
    pub wand: Option<WandSnapshot>,
    pub keys: KeyboardSnapshot,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            mouse: None,
            skeleton: None,
            wand: None,
            keys: KeyboardSnapshot::default(),
        }
    }
}

impl FrameInput {
    pub fn with_mouse(mouse: MouseSnapshot) -> Self {
        Self {
            mouse: Some(mouse),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sparse_frame_json_with_defaults() {
        let frame: FrameInput =
            serde_json::from_str(r#"{"mouse":{"x":10,"y":20,"left":true},"keys":{"debugTrial":1}}"#)
                .expect("parse frame");

        let mouse = frame.mouse.expect("mouse snapshot");
        assert_eq!(mouse.x, 10.0);
        assert!(mouse.left);
        assert!(!mouse.right);
        assert_eq!(frame.keys.debug_trial, Some(1));
        assert!(frame.skeleton.is_none());
        assert!((frame.dt - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn inferred_joints_are_usable() {
        let joint = JointSample {
            tracking: JointTracking::Inferred,
            ..JointSample::default()
        };
        assert!(joint.is_usable());
        assert!(!JointSample::default().is_usable());
    }
}
