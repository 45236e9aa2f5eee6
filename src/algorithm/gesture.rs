//! Maps per-device button signals into one `ManipulationMode` per frame.

use crate::models::config::InputMode;
use crate::models::events::ManipulationMode;
use crate::models::input::{FrameInput, MouseSnapshot, WandSnapshot};

/// IR presence is held for this long after the sensor loses its point.
pub const IR_HOLD_MS: u64 = 200;

/// Current and previous frame's manipulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureState {
    pub current: ManipulationMode,
    pub last: ManipulationMode,
}

impl GestureState {
    pub fn new(current: ManipulationMode, last: ManipulationMode) -> Self {
        Self { current, last }
    }

    /// SELECT or SELECTGRAB right after NONE.
    pub fn select_pressed(&self) -> bool {
        self.current.is_selecting() && self.last == ManipulationMode::None
    }

    /// Strict SELECT right after NONE.
    pub fn select_only_pressed(&self) -> bool {
        self.current == ManipulationMode::Select && self.last == ManipulationMode::None
    }

    /// NONE right after GRAB or SELECTGRAB.
    pub fn grab_released(&self) -> bool {
        self.current == ManipulationMode::None && self.last.is_grabbing()
    }

    /// NONE right after anything else.
    pub fn released(&self) -> bool {
        self.current == ManipulationMode::None && self.last != ManipulationMode::None
    }

    pub fn is_grabbing(&self) -> bool {
        self.current.is_grabbing()
    }
}

/// Outcome of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub state: GestureState,
    /// Middle click: the cursor and system pointer snap to the viewport centre.
    pub recenter: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct IrPresence {
    on: bool,
    changed_at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct GestureClassifier {
    mode: InputMode,
    state: GestureState,
    last_a: bool,
    ir: IrPresence,
}

impl GestureClassifier {
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            state: GestureState::default(),
            last_a: false,
            ir: IrPresence::default(),
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Classifies one frame. `now_ms` is session time.
    ///
    /// A frame without data for the active device repeats the previous mode.
    pub fn classify(&mut self, input: &FrameInput, now_ms: u64) -> Classification {
        let previous = self.state.current;
        let mut recenter = false;

        let current = match self.mode {
            InputMode::Mouse => match input.mouse {
                Some(mouse) => {
                    recenter = mouse.middle;
                    classify_mouse(&mouse)
                }
                None => previous,
            },
            InputMode::Kinect => input.mouse.map(|m| classify_skeletal(&m)).unwrap_or(previous),
            InputMode::Wand => match input.wand {
                Some(wand) => self.classify_wand(&wand, now_ms),
                None => previous,
            },
        };

        self.state = GestureState::new(current, previous);
        Classification {
            state: self.state,
            recenter,
        }
    }

    fn classify_wand(&mut self, wand: &WandSnapshot, now_ms: u64) -> ManipulationMode {
        if wand.ir_found != self.ir.on {
            self.ir = IrPresence {
                on: wand.ir_found,
                changed_at_ms: now_ms,
            };
        }

        let select_edge = wand.a && !self.last_a;
        self.last_a = wand.a;

        if select_edge {
            ManipulationMode::Select
        } else if wand.b {
            ManipulationMode::Grab
        } else {
            ManipulationMode::None
        }
    }

    /// True while the wand sees an IR point, and shortly after losing it.
    pub fn point_detected(&self, now_ms: u64) -> bool {
        self.ir.on || now_ms.saturating_sub(self.ir.changed_at_ms) < IR_HOLD_MS
    }
}

/// Left = SELECT, right = GRAB, both = SELECTGRAB. Middle forces SELECT.
pub fn classify_mouse(mouse: &MouseSnapshot) -> ManipulationMode {
    if mouse.middle {
        return ManipulationMode::Select;
    }
    match (mouse.left, mouse.right) {
        (true, true) => ManipulationMode::SelectGrab,
        (true, false) => ManipulationMode::Select,
        (false, true) => ManipulationMode::Grab,
        (false, false) => ManipulationMode::None,
    }
}

/// Skeletal mode reads mouse buttons: left+right grabs, left alone selects.
pub fn classify_skeletal(mouse: &MouseSnapshot) -> ManipulationMode {
    match (mouse.left, mouse.right) {
        (true, true) => ManipulationMode::Grab,
        (true, false) => ManipulationMode::Select,
        _ => ManipulationMode::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse(left: bool, right: bool, middle: bool) -> MouseSnapshot {
        MouseSnapshot {
            x: 100.0,
            y: 100.0,
            left,
            right,
            middle,
        }
    }

    fn wand(a: bool, b: bool, ir_found: bool) -> FrameInput {
        FrameInput {
            wand: Some(WandSnapshot {
                ir_x: 0.0,
                ir_y: 0.0,
                ir_found,
                a,
                b,
            }),
            ..FrameInput::default()
        }
    }

    #[test]
    fn mouse_truth_table() {
        let table = [
            (false, false, false, ManipulationMode::None),
            (true, false, false, ManipulationMode::Select),
            (false, true, false, ManipulationMode::Grab),
            (true, true, false, ManipulationMode::SelectGrab),
            (false, false, true, ManipulationMode::Select),
            (true, true, true, ManipulationMode::Select),
        ];
        for (left, right, middle, expected) in table {
            assert_eq!(
                classify_mouse(&mouse(left, right, middle)),
                expected,
                "left={left} right={right} middle={middle}"
            );
        }
    }

    #[test]
    fn middle_click_requests_recentre() {
        let mut classifier = GestureClassifier::new(InputMode::Mouse);
        let out = classifier.classify(&FrameInput::with_mouse(mouse(false, false, true)), 0);
        assert!(out.recenter);
        assert_eq!(out.state.current, ManipulationMode::Select);
    }

    #[test]
    fn skeletal_mode_maps_both_buttons_to_grab() {
        assert_eq!(classify_skeletal(&mouse(true, true, false)), ManipulationMode::Grab);
        assert_eq!(classify_skeletal(&mouse(true, false, false)), ManipulationMode::Select);
        assert_eq!(classify_skeletal(&mouse(false, true, false)), ManipulationMode::None);
    }

    #[test]
    fn edges_track_previous_frame() {
        let mut classifier = GestureClassifier::new(InputMode::Mouse);
        let press = classifier.classify(&FrameInput::with_mouse(mouse(true, false, false)), 0);
        assert!(press.state.select_pressed());

        let hold = classifier.classify(&FrameInput::with_mouse(mouse(true, false, false)), 16);
        assert!(!hold.state.select_pressed());

        classifier.classify(&FrameInput::with_mouse(mouse(false, true, false)), 32);
        let release = classifier.classify(&FrameInput::with_mouse(mouse(false, false, false)), 48);
        assert!(release.state.grab_released());
        assert!(release.state.released());
    }

    #[test]
    fn frame_without_device_data_repeats_mode() {
        let mut classifier = GestureClassifier::new(InputMode::Mouse);
        classifier.classify(&FrameInput::with_mouse(mouse(true, false, false)), 0);
        let out = classifier.classify(&FrameInput::default(), 16);
        assert_eq!(out.state.current, ManipulationMode::Select);
        assert!(!out.state.select_pressed());
    }

    #[test]
    fn wand_select_fires_only_on_rising_edge_of_a() {
        let mut classifier = GestureClassifier::new(InputMode::Wand);
        assert_eq!(
            classifier.classify(&wand(true, false, true), 0).state.current,
            ManipulationMode::Select
        );
        assert_eq!(
            classifier.classify(&wand(true, false, true), 16).state.current,
            ManipulationMode::None
        );
        assert_eq!(
            classifier.classify(&wand(true, true, true), 32).state.current,
            ManipulationMode::Grab
        );
    }

    #[test]
    fn wand_ir_presence_is_held_for_200ms() {
        let mut classifier = GestureClassifier::new(InputMode::Wand);
        classifier.classify(&wand(false, false, true), 1_000);
        assert!(classifier.point_detected(1_000));

        classifier.classify(&wand(false, false, false), 2_000);
        assert!(classifier.point_detected(2_150));
        assert!(!classifier.point_detected(2_200));
    }
}
