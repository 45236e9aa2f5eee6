//! Four-corner calibration of the hand ray against the display.

use glam::{Vec2, Vec3};

use crate::algorithm::hand_ray::Calibration;
use crate::models::config::{InputMode, Viewport};
use crate::scene::camera::Camera;
use crate::trials::{Trial, TrialContext, TrialCore, TrialId, TrialKind, TrialPhase};

/// Screen corner the participant is asked to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPrompt {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl CalibrationPrompt {
    pub const ORDER: [CalibrationPrompt; 4] = [
        CalibrationPrompt::TopLeft,
        CalibrationPrompt::TopRight,
        CalibrationPrompt::BottomRight,
        CalibrationPrompt::BottomLeft,
    ];

    pub fn instruction(self) -> &'static str {
        match self {
            CalibrationPrompt::TopLeft => "Point to the top left corner of the screen and select",
            CalibrationPrompt::TopRight => "Point to the top right corner of the screen and select",
            CalibrationPrompt::BottomRight => {
                "Point to the bottom right corner of the screen and select"
            }
            CalibrationPrompt::BottomLeft => "Point to the bottom left corner of the screen and select",
        }
    }
}

pub struct CalibrationTrial {
    core: TrialCore,
    prompts: Vec<CalibrationPrompt>,
    corners: Vec<Vec2>,
    result: Option<Calibration>,
}

impl CalibrationTrial {
    pub fn new(viewport: Viewport, input_mode: InputMode) -> Self {
        let camera = Camera::new(Vec3::ZERO, 0.0, viewport);
        let mut core = TrialCore::new(TrialId::Calibration, TrialKind::Select, camera);
        core.phase = TrialPhase::Interaction;

        // Only the skeletal cursor is mapped through the calibration.
        let prompts = match input_mode {
            InputMode::Kinect => CalibrationPrompt::ORDER.to_vec(),
            InputMode::Mouse | InputMode::Wand => Vec::new(),
        };
        if prompts.is_empty() {
            log::info!("calibration: nothing to calibrate in {} mode", input_mode);
            core.finish();
        }

        Self {
            core,
            prompts,
            corners: Vec::with_capacity(4),
            result: None,
        }
    }

    /// The corner currently being asked for.
    pub fn prompt(&self) -> Option<CalibrationPrompt> {
        self.prompts.get(self.corners.len()).copied()
    }

    pub fn corners(&self) -> &[Vec2] {
        &self.corners
    }
}

impl Trial for CalibrationTrial {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn update(&mut self, ctx: &mut TrialContext<'_>) {
        if self.core.complete || !ctx.gesture.select_only_pressed() {
            return;
        }
        let Some(prompt) = self.prompt() else {
            return;
        };
        let Some(point) = ctx.bone_ray else {
            log::warn!("calibration: no tracked hand for {:?}", prompt);
            return;
        };

        self.corners.push(point.truncate());
        log::info!(
            "calibration: {:?} recorded at ({:.4}, {:.4})",
            prompt,
            point.x,
            point.y
        );

        if let [tl, tr, br, bl] = self.corners[..] {
            self.result = Some(Calibration::from_corners([tl, tr, br, bl]));
            self.core.finish();
        }
    }

    fn take_calibration(&mut self) -> Option<Calibration> {
        self.result.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::ManipulationMode;
    use crate::trials::test_support::Harness;

    fn select(harness: &mut Harness, trial: &mut CalibrationTrial, bone_ray: Option<Vec3>) {
        harness.gesture(ManipulationMode::None);
        harness.gesture(ManipulationMode::Select);
        harness.tick(trial, (0.0, 0.0), false, bone_ray);
    }

    #[test]
    fn pointer_modes_complete_without_publishing() {
        for mode in [InputMode::Mouse, InputMode::Wand] {
            let mut trial = CalibrationTrial::new(Viewport::default(), mode);
            assert!(trial.is_complete(), "{mode} should not prompt");
            assert_eq!(trial.prompt(), None);
            assert!(trial.take_calibration().is_none());
        }
    }

    #[test]
    fn four_corners_publish_a_calibration() {
        let mut harness = Harness::new();
        harness.input_mode = InputMode::Kinect;
        let mut trial = CalibrationTrial::new(Viewport::default(), InputMode::Kinect);
        let points = [
            Vec3::new(-0.2, 1.6, 0.0),
            Vec3::new(0.3, 1.6, 0.0),
            Vec3::new(0.3, 1.0, 0.0),
            Vec3::new(-0.2, 1.0, 0.0),
        ];

        for (i, point) in points.iter().enumerate() {
            assert_eq!(trial.prompt(), Some(CalibrationPrompt::ORDER[i]));
            assert!(!trial.is_complete());
            select(&mut harness, &mut trial, Some(*point));
        }

        assert!(trial.is_complete());
        let calibration = trial.take_calibration().expect("calibration published");
        assert_eq!(calibration.top_left, Vec2::new(-0.2, 1.6));
        assert_eq!(calibration.bottom_right, Vec2::new(0.3, 1.0));
        assert!(trial.take_calibration().is_none());
    }

    #[test]
    fn untracked_hand_does_not_advance() {
        let mut harness = Harness::new();
        harness.input_mode = InputMode::Kinect;
        let mut trial = CalibrationTrial::new(Viewport::default(), InputMode::Kinect);
        select(&mut harness, &mut trial, None);
        assert_eq!(trial.prompt(), Some(CalibrationPrompt::TopLeft));
        assert!(trial.corners().is_empty());
    }

    #[test]
    fn select_grab_is_not_a_calibration_press() {
        let mut harness = Harness::new();
        let mut trial = CalibrationTrial::new(Viewport::default(), InputMode::Kinect);
        harness.gesture(ManipulationMode::None);
        harness.gesture(ManipulationMode::SelectGrab);
        harness.tick(&mut trial, (0.0, 0.0), false, Some(Vec3::new(0.1, 1.2, 0.0)));
        assert!(trial.corners().is_empty());
    }
}
