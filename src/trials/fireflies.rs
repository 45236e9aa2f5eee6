//! D1: catch fireflies one at a time and drop them into the cage.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

use crate::models::config::Viewport;
use crate::models::events::LoggingEnvironment;
use crate::render::flat_buffer::Rgba;
use crate::scene::camera::Camera;
use crate::scene::entity::{Entity, EntityKind, RenderState, SphereCollidable};
use crate::trials::{
    drag_ratio, ease_toward, CursorOverlay, Trial, TrialContext, TrialCore, TrialId, TrialKind,
    TrialPhase,
};

const FIREFLY_COUNT: usize = 6;
const FIREFLY_SCALE: f32 = 4.0;
/// Fireflies live on this plane, facing the camera.
const PLANE_X: f32 = -476.0;
const MIN_Y: f32 = 120.0;
const MAX_Y: f32 = 180.0;
const MIN_Z: f32 = 320.0;
const MAX_Z: f32 = 375.0;

pub struct FirefliesTrial {
    core: TrialCore,
    drag_ratio: f32,
}

impl FirefliesTrial {
    pub fn new(viewport: Viewport, rng: &mut StdRng, overlay: &mut CursorOverlay) -> Self {
        let camera = Camera::new(Vec3::new(-391.0, 140.0, 345.0), -FRAC_PI_2, viewport);
        let mut core = TrialCore::new(TrialId::Fireflies, TrialKind::DragDrop, camera);

        core.roles.draggable.push(Entity::new(
            EntityKind::Cage,
            Vec3::new(PLANE_X, 116.0, 326.5),
            1.0,
        ));
        for i in 0..FIREFLY_COUNT {
            let position = Vec3::new(
                PLANE_X,
                rng.random_range(MIN_Y..MAX_Y),
                rng.random_range(MIN_Z..MAX_Z),
            );
            let mut firefly = Entity::firefly(position, rng.random_range(-FRAC_PI_2..FRAC_PI_2))
                .with_render(RenderState {
                    standard: Some(if i == 0 { Rgba::ORANGE } else { Rgba::YELLOW }),
                    selected: Some(Rgba::RED),
                });
            firefly.scale = FIREFLY_SCALE;
            core.roles.selectable.push(firefly);
        }

        core.phase = TrialPhase::Interaction;
        core.render_requested = true;
        overlay.displaying_without_gesture = false;
        Self {
            core,
            drag_ratio: 0.0,
        }
    }

    pub fn fireflies_left(&self) -> usize {
        self.core.roles.selectable.len()
    }

    fn drag(&mut self, ctx: &TrialContext<'_>) {
        let Some(ray) = ctx.cursor_ray(&self.core.camera) else {
            return;
        };
        let ratio = self.drag_ratio;
        let Some(firefly) = self.core.roles.target_mut() else {
            return;
        };
        let mut next = ease_toward(firefly.position, &ray, ratio, ctx.dt);
        next.x = PLANE_X;
        next.y = next.y.clamp(MIN_Y, MAX_Y);
        next.z = next.z.clamp(MIN_Z, MAX_Z);
        firefly.position = next;
    }

    /// Drop check run on every release.
    fn release(&mut self, ctx: &mut TrialContext<'_>) {
        self.core.render_requested = true;

        let caged = match (self.core.roles.draggable.first(), self.core.roles.target()) {
            (Some(cage), Some(firefly)) => cage.contains_point(firefly.position),
            _ => false,
        };
        if !caged {
            ctx.set_environment(LoggingEnvironment::NoDrop);
            return;
        }

        let mut firefly = self.core.roles.selectable.remove(0);
        firefly.selected = false;
        firefly.render.standard = Some(Rgba::YELLOW);
        self.core.roles.scenery.insert(0, firefly);
        ctx.set_environment(LoggingEnvironment::YesDrop);
        log::debug!("fireflies: caged, left={}", self.fireflies_left());

        match self.core.roles.target_mut() {
            Some(next) => next.render.standard = Some(Rgba::ORANGE),
            None => {
                log::info!("fireflies: all fireflies caged");
                self.core.finish();
            }
        }
    }
}

impl Trial for FirefliesTrial {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn update(&mut self, ctx: &mut TrialContext<'_>) {
        if self.core.phase != TrialPhase::Interaction {
            return;
        }

        let selected = self.core.roles.target().is_some_and(|f| f.selected);
        if selected && ctx.gesture.is_grabbing() {
            self.drag(ctx);
        }

        if ctx.gesture.select_pressed() {
            match ctx.probe_window() {
                Some(true) => {
                    let ray = ctx.cursor_ray(&self.core.camera);
                    if let (Some(ray), Some(firefly)) = (ray, self.core.roles.target_mut()) {
                        firefly.selected = true;
                        self.drag_ratio = drag_ratio(&ray, firefly.position, ray.direction.x);
                    }
                    ctx.set_environment(LoggingEnvironment::YesSelect);
                }
                Some(false) => ctx.set_environment(LoggingEnvironment::NoSelect),
                None => {}
            }
        }

        if ctx.gesture.released() {
            self.release(ctx);
        }
    }
}
