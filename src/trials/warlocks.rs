//! P3: point at warlocks with single-pixel precision.

use std::f32::consts::PI;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

use crate::models::config::Viewport;
use crate::scene::camera::Camera;
use crate::scene::entity::{Entity, EntityKind};
use crate::trials::{Trial, TrialContext, TrialCore, TrialId, TrialKind, TrialPhase};

const WARLOCK_COUNT: i32 = 9;
const WARLOCK_SCALE: f32 = 12.0;
const FIRST_WARLOCK: Vec3 = Vec3::new(500.0, 120.0, 120.0);
const GROUND_Y: f32 = 120.0;

pub struct WarlocksTrial {
    core: TrialCore,
    warlocks_left: i32,
}

impl WarlocksTrial {
    pub fn new(viewport: Viewport) -> Self {
        let camera = Camera::new(Vec3::new(329.0, 150.0, -23.0), PI / 5.0, viewport);
        let mut trial = Self {
            core: TrialCore::new(TrialId::Warlocks, TrialKind::Select, camera),
            warlocks_left: WARLOCK_COUNT,
        };
        trial.add_warlock(FIRST_WARLOCK);
        trial.core.phase = TrialPhase::Interaction;
        trial.core.render_requested = true;
        trial
    }

    pub fn warlocks_left(&self) -> i32 {
        self.warlocks_left
    }

    /// Places the next warlock facing the camera. Returns true once none are left.
    fn add_warlock(&mut self, position: Vec3) -> bool {
        self.warlocks_left -= 1;
        if self.warlocks_left < 0 {
            return true;
        }

        let eye = self.core.camera.position;
        let mut warlock = Entity::new(EntityKind::Warlock, position, WARLOCK_SCALE);
        warlock.yaw = (eye.x - position.x).atan2(eye.z - position.z);
        self.core.roles.selectable.insert(0, warlock);
        log::debug!(
            "add_warlock: left={} pos=({:.1}, {:.1}, {:.1})",
            self.warlocks_left,
            position.x,
            position.y,
            position.z
        );
        false
    }
}

/// Picks one of the placement areas around the courtyard.
fn spawn_position(rng: &mut StdRng) -> Vec3 {
    match rng.random_range(1..5) {
        1 | 2 => Vec3::new(
            rng.random_range(329.0..455.0),
            GROUND_Y,
            rng.random_range(10.0..144.0),
        ),
        3 => Vec3::new(
            rng.random_range(315.0..515.0),
            GROUND_Y,
            rng.random_range(84.0..145.0),
        ),
        _ => Vec3::new(
            rng.random_range(315.0..515.0),
            GROUND_Y,
            rng.random_range(5.0..85.0),
        ),
    }
}

impl Trial for WarlocksTrial {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn update(&mut self, ctx: &mut TrialContext<'_>) {
        if self.core.phase != TrialPhase::Interaction || !ctx.gesture.select_pressed() {
            return;
        }
        if ctx.probe_pixel() != Some(true) {
            return;
        }

        if !self.core.roles.selectable.is_empty() {
            self.core.roles.selectable.remove(0);
        }
        if self.add_warlock(spawn_position(ctx.rng)) {
            log::info!("warlocks: all warlocks hit");
            self.core.finish();
        }
        self.core.render_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::models::events::{LoggingEnvironment, ManipulationMode};
    use crate::scene::entity::SphereCollidable;
    use crate::trials::test_support::Harness;

    fn click(harness: &mut Harness, trial: &mut WarlocksTrial, cursor: (f64, f64)) {
        harness.gesture(ManipulationMode::None);
        harness.gesture(ManipulationMode::Select);
        harness.tick(trial, cursor, false, None);
    }

    #[test]
    fn first_warlock_faces_the_camera() {
        let trial = WarlocksTrial::new(Viewport::default());
        assert_eq!(trial.phase(), TrialPhase::Interaction);
        assert!(trial.render_requested());
        assert_eq!(trial.warlocks_left(), WARLOCK_COUNT - 1);

        let warlock = trial.roles().target().expect("warlock");
        assert_eq!(warlock.position, FIRST_WARLOCK);
        let to_eye = trial.camera().position - warlock.position;
        let facing = Vec3::new(warlock.yaw.sin(), 0.0, warlock.yaw.cos());
        assert!(facing.dot(to_eye.with_y(0.0).normalize()) > 0.999);
    }

    #[test]
    fn spawn_positions_fall_in_placement_areas() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let p = spawn_position(&mut rng);
            assert_eq!(p.y, GROUND_Y);
            assert!((315.0..515.0).contains(&p.x));
            assert!((5.0..145.0).contains(&p.z));
        }
    }

    #[test]
    fn only_exact_pixel_hits_count() {
        let mut harness = Harness::new();
        let mut trial = WarlocksTrial::new(Viewport::default());
        harness.render(&mut trial);

        let (x, y) = Harness::target_on_screen(&trial);
        let sphere = trial.roles().target().expect("warlock").bounding_sphere();
        let depth = trial.camera().project(sphere.center).expect("visible").depth;
        let radius = trial.camera().projected_radius(sphere.radius, depth) as f64;
        click(&mut harness, &mut trial, (x + radius + 4.0, y));
        assert_eq!(trial.warlocks_left(), WARLOCK_COUNT - 1);

        click(&mut harness, &mut trial, (x, y));
        assert_eq!(trial.warlocks_left(), WARLOCK_COUNT - 2);
        assert_eq!(harness.environment, LoggingEnvironment::NoGesture);
    }

    #[test]
    fn nine_hits_complete_the_trial() {
        let mut harness = Harness::new();
        let mut trial = WarlocksTrial::new(Viewport::default());
        for hit in 1..=WARLOCK_COUNT {
            assert!(!trial.is_complete(), "completed early at hit {hit}");
            trial.core_mut().roles.selectable[0].position = FIRST_WARLOCK;
            harness.render(&mut trial);
            let cursor = Harness::target_on_screen(&trial);
            click(&mut harness, &mut trial, cursor);
        }
        assert!(trial.is_complete());
        assert!(trial.roles().selectable.is_empty());
    }
}
