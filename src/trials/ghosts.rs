//! P1: click on ghosts as they appear, one at a time.

use std::f32::consts::PI;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

use crate::models::config::Viewport;
use crate::models::events::LoggingEnvironment;
use crate::scene::camera::Camera;
use crate::scene::entity::Entity;
use crate::trials::{CursorOverlay, Trial, TrialContext, TrialCore, TrialId, TrialKind, TrialPhase};

const GHOST_COUNT: i32 = 18;

pub struct GhostsTrial {
    core: TrialCore,
    ghosts_left: i32,
}

impl GhostsTrial {
    pub fn new(viewport: Viewport, overlay: &mut CursorOverlay) -> Self {
        let camera = Camera::new(Vec3::new(32.0, 50.0, -120.0), PI, viewport);
        overlay.displaying_without_gesture = true;
        Self {
            core: TrialCore::new(TrialId::Ghosts, TrialKind::Select, camera),
            ghosts_left: GHOST_COUNT,
        }
    }

    pub fn ghosts_left(&self) -> i32 {
        self.ghosts_left
    }

    /// Spawns the next ghost. Returns true once the supply is exhausted.
    fn add_ghost(&mut self, rng: &mut StdRng) -> bool {
        self.ghosts_left -= 1;
        if self.ghosts_left < 0 {
            return true;
        }

        let position = Vec3::new(
            rng.random_range(-75.0..120.0),
            rng.random_range(20.0..90.0),
            rng.random_range(-300.0..-275.0),
        );
        let scale = rng.random_range(5..20) as f32;
        let clockwise = rng.random_bool(0.5);
        self.core
            .roles
            .selectable
            .insert(0, Entity::ghost(position, scale, clockwise));
        log::debug!(
            "add_ghost: left={} pos=({:.1}, {:.1}, {:.1}) scale={}",
            self.ghosts_left,
            position.x,
            position.y,
            position.z,
            scale
        );
        false
    }
}

impl Trial for GhostsTrial {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn update(&mut self, ctx: &mut TrialContext<'_>) {
        match self.core.phase {
            TrialPhase::Pre => {
                if ctx.acknowledge {
                    self.core.phase = TrialPhase::Interaction;
                    self.add_ghost(ctx.rng);
                    self.core.render_requested = true;
                    ctx.overlay.displaying_without_gesture = false;
                }
            }
            TrialPhase::Interaction => {
                if !ctx.gesture.select_pressed() {
                    return;
                }
                match ctx.probe_window() {
                    Some(true) => {
                        if !self.core.roles.selectable.is_empty() {
                            self.core.roles.selectable.remove(0);
                        }
                        if self.add_ghost(ctx.rng) {
                            log::info!("ghosts: all ghosts caught");
                            self.core.finish();
                        }
                        self.core.render_requested = true;
                        ctx.set_environment(LoggingEnvironment::YesSelect);
                    }
                    Some(false) => ctx.set_environment(LoggingEnvironment::NoSelect),
                    None => {}
                }
            }
            TrialPhase::Post => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::ManipulationMode;
    use crate::trials::test_support::Harness;

    fn started() -> (GhostsTrial, Harness) {
        let mut harness = Harness::new();
        let mut trial = GhostsTrial::new(Viewport::default(), &mut harness.overlay);
        assert!(harness.overlay.displaying_without_gesture);
        harness.tick(&mut trial, (640.0, 360.0), true, None);
        (trial, harness)
    }

    fn click(harness: &mut Harness, trial: &mut GhostsTrial, cursor: (f64, f64)) {
        harness.gesture(ManipulationMode::None);
        harness.gesture(ManipulationMode::Select);
        harness.tick(trial, cursor, false, None);
    }

    #[test]
    fn waits_for_acknowledge_before_spawning() {
        let mut harness = Harness::new();
        let mut trial = GhostsTrial::new(Viewport::default(), &mut harness.overlay);
        harness.tick(&mut trial, (640.0, 360.0), false, None);
        assert_eq!(trial.phase(), TrialPhase::Pre);
        assert!(trial.roles().selectable.is_empty());

        harness.tick(&mut trial, (640.0, 360.0), true, None);
        assert_eq!(trial.phase(), TrialPhase::Interaction);
        assert_eq!(trial.roles().selectable.len(), 1);
        assert_eq!(trial.ghosts_left(), GHOST_COUNT - 1);
        assert!(!harness.overlay.displaying_without_gesture);
        assert!(harness.flat.is_some());
    }

    #[test]
    fn spawned_ghosts_stay_inside_the_spawn_volume() {
        let (mut trial, mut harness) = started();
        for _ in 0..10 {
            let ghost = &trial.roles().selectable[0];
            assert!((-75.0..120.0).contains(&ghost.position.x));
            assert!((20.0..90.0).contains(&ghost.position.y));
            assert!((-300.0..-275.0).contains(&ghost.position.z));
            assert!((5.0..20.0).contains(&ghost.scale));
            let cursor = Harness::target_on_screen(&trial);
            click(&mut harness, &mut trial, cursor);
        }
    }

    #[test]
    fn miss_logs_noselect_and_keeps_target() {
        let (mut trial, mut harness) = started();
        let before = trial.roles().selectable[0].position;
        let (tx, ty) = Harness::target_on_screen(&trial);
        let far = (if tx < 640.0 { 1200.0 } else { 60.0 }, if ty < 360.0 { 660.0 } else { 60.0 });

        click(&mut harness, &mut trial, far);
        assert_eq!(harness.environment, LoggingEnvironment::NoSelect);
        assert_eq!(trial.roles().selectable[0].position, before);
    }

    #[test]
    fn out_of_bounds_click_changes_nothing() {
        let (mut trial, mut harness) = started();
        harness.environment = LoggingEnvironment::NoGesture;
        click(&mut harness, &mut trial, (2.0, 2.0));
        assert_eq!(harness.environment, LoggingEnvironment::NoGesture);
        assert_eq!(trial.ghosts_left(), GHOST_COUNT - 1);
    }

    #[test]
    fn eighteen_hits_after_first_spawn_complete_the_trial() {
        let (mut trial, mut harness) = started();
        for hit in 1..=GHOST_COUNT {
            let cursor = Harness::target_on_screen(&trial);
            click(&mut harness, &mut trial, cursor);
            assert_eq!(harness.environment, LoggingEnvironment::YesSelect);
            if hit < GHOST_COUNT {
                assert!(!trial.is_complete(), "completed early at hit {hit}");
                assert_eq!(trial.roles().selectable.len(), 1);
            }
        }
        assert!(trial.is_complete());
        assert_eq!(trial.phase(), TrialPhase::Post);
        assert!(trial.roles().selectable.is_empty());
    }
}
