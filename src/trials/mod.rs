//! Trial state machine: shared core, per-frame context and the concrete trials.

pub mod calibration;
pub mod fireflies;
pub mod ghosts;
pub mod keys;
pub mod registry;
pub mod warlocks;

use glam::Vec3;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::algorithm::gesture::GestureState;
use crate::algorithm::hand_ray::Calibration;
use crate::models::config::InputMode;
use crate::models::events::LoggingEnvironment;
use crate::render::flat_buffer::FlatRenderBuffer;
use crate::render::hit_test::HitTester;
use crate::scene::camera::Camera;
use crate::scene::geometry::Ray;
use crate::scene::roles::RoleLists;

pub use registry::{create_trial, TrialId, TrialSequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialPhase {
    /// Waiting for the acknowledge key.
    Pre,
    Interaction,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialKind {
    Select,
    Grab,
    DragDrop,
}

/// Handle to the on-screen cursor widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorOverlay {
    /// Show the idle trail even when no gesture is held.
    pub displaying_without_gesture: bool,
}

/// State every trial carries.
#[derive(Debug, Clone)]
pub struct TrialCore {
    pub id: TrialId,
    pub kind: TrialKind,
    pub phase: TrialPhase,
    pub camera: Camera,
    pub roles: RoleLists,
    pub render_requested: bool,
    pub complete: bool,
}

impl TrialCore {
    pub fn new(id: TrialId, kind: TrialKind, camera: Camera) -> Self {
        Self {
            id,
            kind,
            phase: TrialPhase::Pre,
            camera,
            roles: RoleLists::default(),
            render_requested: false,
            complete: false,
        }
    }

    pub fn finish(&mut self) {
        self.complete = true;
        self.phase = TrialPhase::Post;
    }
}

/// Everything a trial may read or touch during one update.
pub struct TrialContext<'a> {
    pub cursor: (f64, f64),
    pub gesture: GestureState,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Acknowledge key held this frame.
    pub acknowledge: bool,
    pub input_mode: InputMode,
    /// Elbow→hand ray point on the interaction plane, when tracked.
    pub bone_ray: Option<Vec3>,
    /// Latest flat render produced for this trial.
    pub flat: Option<&'a FlatRenderBuffer>,
    pub hit_tester: &'a HitTester,
    pub rng: &'a mut StdRng,
    pub environment: &'a mut LoggingEnvironment,
    pub overlay: &'a mut CursorOverlay,
}

impl TrialContext<'_> {
    /// Window probe at the cursor; `None` when no sample could be taken.
    pub fn probe_window(&self) -> Option<bool> {
        let Some(flat) = self.flat else {
            log::warn!("probe_window: no flat render available yet");
            return None;
        };
        match self.hit_tester.probe_window(flat, self.cursor.0, self.cursor.1) {
            Ok(hit) => Some(hit),
            Err(e) => {
                log::warn!("click outside bounds: {e}");
                None
            }
        }
    }

    /// Single-pixel probe at the truncated cursor.
    pub fn probe_pixel(&self) -> Option<bool> {
        let Some(flat) = self.flat else {
            log::warn!("probe_pixel: no flat render available yet");
            return None;
        };
        match self.hit_tester.probe_pixel(flat, self.cursor.0, self.cursor.1) {
            Ok(hit) => Some(hit),
            Err(e) => {
                log::warn!("click outside bounds: {e}");
                None
            }
        }
    }

    pub fn cursor_ray(&self, camera: &Camera) -> Option<Ray> {
        camera.cursor_ray(self.cursor.0, self.cursor.1)
    }

    pub fn set_environment(&mut self, environment: LoggingEnvironment) {
        *self.environment = environment;
    }
}

pub trait Trial {
    fn core(&self) -> &TrialCore;
    fn core_mut(&mut self) -> &mut TrialCore;

    /// Trial-specific logic for one frame.
    fn update(&mut self, ctx: &mut TrialContext<'_>);

    /// Calibration produced by this trial, taken once.
    fn take_calibration(&mut self) -> Option<Calibration> {
        None
    }

    /// Runs the trial logic, then advances entity animations.
    fn tick(&mut self, ctx: &mut TrialContext<'_>) {
        self.update(ctx);
        self.core_mut().roles.advance(ctx.dt);
    }

    fn id(&self) -> TrialId {
        self.core().id
    }

    fn kind(&self) -> TrialKind {
        self.core().kind
    }

    fn phase(&self) -> TrialPhase {
        self.core().phase
    }

    fn camera(&self) -> &Camera {
        &self.core().camera
    }

    fn roles(&self) -> &RoleLists {
        &self.core().roles
    }

    fn render_requested(&self) -> bool {
        self.core().render_requested
    }

    /// Called once a requested flat render has been produced.
    fn accept_flat_render(&mut self) {
        self.core_mut().render_requested = false;
    }

    fn is_complete(&self) -> bool {
        self.core().complete
    }
}

/// Depth ratio used to keep a dragged entity at its grab distance.
pub(crate) fn drag_ratio(ray: &Ray, position: Vec3, axis_component: f32) -> f32 {
    let distance = ray.origin.distance(position);
    if axis_component.abs() <= f32::EPSILON {
        return distance;
    }
    distance / axis_component.abs()
}

/// Eases `position` toward the point `ratio` along the cursor ray.
pub(crate) fn ease_toward(position: Vec3, ray: &Ray, ratio: f32, dt: f32) -> Vec3 {
    let target = ray.at(ratio);
    position.lerp(target, (dt * 8.0).clamp(0.0, 1.0))
}

#[cfg(test)]
pub(crate) mod test_support {
    use rand::SeedableRng;

    use super::*;
    use crate::models::config::Viewport;
    use crate::models::events::ManipulationMode;
    use crate::render::flat_buffer::{BufferSize, FlatRenderBuffer, Rgba};

    /// Owns everything a `TrialContext` borrows.
    pub struct Harness {
        pub rng: StdRng,
        pub environment: LoggingEnvironment,
        pub overlay: CursorOverlay,
        pub hit_tester: HitTester,
        pub flat: Option<FlatRenderBuffer>,
        pub gesture: GestureState,
        pub input_mode: InputMode,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                rng: StdRng::seed_from_u64(7),
                environment: LoggingEnvironment::NoGesture,
                overlay: CursorOverlay::default(),
                hit_tester: HitTester::new(75),
                flat: None,
                gesture: GestureState::default(),
                input_mode: InputMode::Mouse,
            }
        }

        /// Pushes one gesture into the edge tracker.
        pub fn gesture(&mut self, mode: ManipulationMode) {
            self.gesture = GestureState::new(mode, self.gesture.current);
        }

        /// Produces a flat render the way the session does.
        pub fn render(&mut self, trial: &mut dyn Trial) {
            let viewport = Viewport::default();
            let mut buffer = FlatRenderBuffer::new(
                BufferSize::new(viewport.width, viewport.height),
                self.hit_tester.colors().background,
            );
            trial
                .roles()
                .render_flat(trial.camera(), &mut buffer, &self.hit_tester.colors());
            self.flat = Some(buffer);
            trial.accept_flat_render();
        }

        pub fn tick(&mut self, trial: &mut dyn Trial, cursor: (f64, f64), acknowledge: bool, bone_ray: Option<Vec3>) {
            let mut ctx = TrialContext {
                cursor,
                gesture: self.gesture,
                dt: 1.0 / 60.0,
                acknowledge,
                input_mode: self.input_mode,
                bone_ray,
                flat: self.flat.as_ref(),
                hit_tester: &self.hit_tester,
                rng: &mut self.rng,
                environment: &mut self.environment,
                overlay: &mut self.overlay,
            };
            trial.tick(&mut ctx);
            self.gesture = GestureState::new(self.gesture.current, self.gesture.current);
            if trial.render_requested() {
                self.render(trial);
            }
        }

        /// Screen position of the current target's centre.
        pub fn target_on_screen(trial: &dyn Trial) -> (f64, f64) {
            let target = trial.roles().target().expect("trial has a target");
            let screen = trial
                .camera()
                .project(target.position)
                .expect("target in front of camera");
            (screen.x as f64, screen.y as f64)
        }
    }

    pub fn count_color_pixels(buffer: &FlatRenderBuffer, color: Rgba) -> usize {
        buffer
            .frame()
            .chunks_exact(4)
            .filter(|px| *px == color.0)
            .count()
    }
}
