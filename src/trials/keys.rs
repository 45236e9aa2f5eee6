//! G1: carry a key from the table to the highlighted lock.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

use crate::models::config::Viewport;
use crate::models::events::LoggingEnvironment;
use crate::render::flat_buffer::Rgba;
use crate::scene::camera::Camera;
use crate::scene::entity::{Entity, EntityKind, RenderState, SphereCollidable};
use crate::scene::geometry::Ray;
use crate::trials::{
    drag_ratio, ease_toward, CursorOverlay, Trial, TrialContext, TrialCore, TrialId, TrialKind,
    TrialPhase,
};

const KEY_COUNT: u32 = 6;
const KEY_SCALE: f32 = 2.0;
const KEY_REST: Vec3 = Vec3::new(10.0, 25.0, 65.0);
const KEY_MIN_Y: f32 = 23.0;
const KEY_MAX_Y: f32 = 80.0;

// Table-top lanes used when re-placing the key.
const RIGHT_EDGE: f32 = -30.0;
const MIDDLE: f32 = -10.0;
const LEFT_EDGE: f32 = 15.0;

pub struct KeysTrial {
    core: TrialCore,
    keys_left: u32,
    drag_ratio: f32,
}

impl KeysTrial {
    pub fn new(viewport: Viewport, overlay: &mut CursorOverlay) -> Self {
        let camera = Camera::new(Vec3::new(-8.0, 37.5, 30.0), 0.0, viewport);
        let mut core = TrialCore::new(TrialId::Keys, TrialKind::Grab, camera);

        core.roles.draggable.push(Entity::new(
            EntityKind::Lock,
            Vec3::new(-62.5, 55.75, 185.5),
            10.0,
        ));
        core.roles.draggable.push(Entity::new(
            EntityKind::Lock,
            Vec3::new(46.0, 55.75, 185.5),
            10.0,
        ));
        core.roles.scenery.push(Entity::new(
            EntityKind::Door,
            Vec3::new(-47.5, 5.75, 185.5),
            10.0,
        ));
        core.roles.scenery.push(Entity::new(
            EntityKind::Door,
            Vec3::new(31.0, 5.75, 185.5),
            10.0,
        ));
        core.roles.scenery.insert(
            0,
            Entity::new(EntityKind::Table, Vec3::new(-20.0, 5.0, 75.0), 3.0),
        );

        overlay.displaying_without_gesture = true;
        Self {
            core,
            keys_left: KEY_COUNT,
            drag_ratio: 0.0,
        }
    }

    pub fn keys_left(&self) -> u32 {
        self.keys_left
    }

    fn key_selected(&self) -> bool {
        self.core.roles.target().is_some_and(|key| key.selected)
    }

    /// Ray from the eye to the lock that currently accepts the key.
    fn lock_ray(&self) -> Option<Ray> {
        let lock = self.core.roles.draggable.first()?;
        Ray::towards(self.core.camera.position, lock.position)
    }

    fn begin(&mut self, ctx: &mut TrialContext<'_>) {
        self.core.phase = TrialPhase::Interaction;
        self.core.render_requested = true;

        let key = Entity::new(EntityKind::Key, KEY_REST, KEY_SCALE).with_render(RenderState {
            standard: None,
            selected: Some(Rgba::YELLOW),
        });
        self.core.roles.selectable.insert(0, key);
        if let Some(lock) = self.core.roles.draggable.first_mut() {
            lock.render.standard = Some(Rgba::RED);
        }
        ctx.overlay.displaying_without_gesture = false;
        log::info!("keys: interaction started, keys_left={}", self.keys_left);
    }

    fn drag(&mut self, ctx: &mut TrialContext<'_>) {
        let Some(ray) = ctx.cursor_ray(&self.core.camera) else {
            return;
        };
        let ratio = self.drag_ratio;
        let Some(key) = self.core.roles.target_mut() else {
            return;
        };
        let fixed_z = key.position.z;
        let mut next = ease_toward(key.position, &ray, ratio, ctx.dt);
        next.y = next.y.clamp(KEY_MIN_Y, KEY_MAX_Y);
        next.z = fixed_z;
        key.position = next;

        let reached = self
            .lock_ray()
            .zip(self.core.roles.target())
            .is_some_and(|(lock_ray, key)| key.intersects_ray(&lock_ray));
        if reached {
            self.key_delivered(ctx);
        }
    }

    fn key_delivered(&mut self, ctx: &mut TrialContext<'_>) {
        if let Some(key) = self.core.roles.target_mut() {
            key.selected = false;
            key.position = Vec3::new(replacement_x(key.position.x, ctx.rng), KEY_REST.y, KEY_REST.z);
            key.yaw = 0.0;
        }

        let locks = &mut self.core.roles.draggable;
        if let Some(lock) = locks.first_mut() {
            lock.render.standard = None;
        }
        if locks.len() > 1 {
            let next = locks.remove(1);
            locks.insert(0, next);
        }
        if let Some(lock) = locks.first_mut() {
            lock.render.standard = Some(Rgba::RED);
        }

        ctx.set_environment(LoggingEnvironment::YesDrag);
        self.core.render_requested = true;
        self.keys_left = self.keys_left.saturating_sub(1);
        log::debug!("keys: key delivered, keys_left={}", self.keys_left);
        if self.keys_left == 0 {
            log::info!("keys: all keys delivered");
            self.core.finish();
        }
    }
}

/// New key x on the table half matching where the key was delivered.
fn replacement_x(current: f32, rng: &mut StdRng) -> f32 {
    if current < MIDDLE {
        rng.random_range(RIGHT_EDGE..MIDDLE - 1.0)
    } else {
        rng.random_range(MIDDLE + 1.0..LEFT_EDGE)
    }
}

impl Trial for KeysTrial {
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
                    self.begin(ctx);
                }
            }
            TrialPhase::Interaction => {
                if ctx.gesture.select_pressed() {
                    match ctx.probe_window() {
                        Some(true) => {
                            let ray = ctx.cursor_ray(&self.core.camera);
                            if let (Some(ray), Some(key)) = (ray, self.core.roles.target_mut()) {
                                key.selected = true;
                                self.drag_ratio = drag_ratio(&ray, key.position, ray.direction.z);
                            }
                            self.core.render_requested = true;
                            ctx.set_environment(LoggingEnvironment::YesSelect);
                        }
                        Some(false) => ctx.set_environment(LoggingEnvironment::NoSelect),
                        None => {}
                    }
                }

                if ctx.gesture.is_grabbing() && self.key_selected() {
                    self.drag(ctx);
                }

                if ctx.gesture.grab_released() {
                    self.core.render_requested = true;
                    if self.key_selected() {
                        ctx.set_environment(LoggingEnvironment::NoDrop);
                    }
                }
            }
            TrialPhase::Post => {}
        }
    }
}
