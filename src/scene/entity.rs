//! Scene entities and their capabilities.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::render::flat_buffer::{FlatRenderBuffer, Rgba};
use crate::scene::camera::Camera;
use crate::scene::geometry::{Ray, Sphere};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Ghost,
    Key,
    Lock,
    Door,
    Table,
    Firefly,
    Cage,
    Warlock,
}

impl EntityKind {
    /// Bounding radius at scale 1.
    fn unit_radius(self) -> f32 {
        match self {
            EntityKind::Ghost => 0.8,
            EntityKind::Key => 1.5,
            EntityKind::Lock => 0.5,
            EntityKind::Door => 1.5,
            EntityKind::Table => 5.0,
            EntityKind::Firefly => 1.5,
            EntityKind::Cage => 7.5,
            EntityKind::Warlock => 0.8,
        }
    }

    fn sphere_offset(self) -> Vec3 {
        match self {
            EntityKind::Cage => Vec3::new(0.0, 7.2, 0.0),
            _ => Vec3::ZERO,
        }
    }
}

/// Presentation colors; the flat render ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub standard: Option<Rgba>,
    pub selected: Option<Rgba>,
}

impl RenderState {
    pub fn resolve(&self, is_selected: bool, default: Rgba) -> Rgba {
        let base = self.standard.unwrap_or(default);
        if is_selected {
            self.selected.unwrap_or(base)
        } else {
            base
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Still,
    /// Constant yaw rate in rad/s.
    Spin { rate: f32 },
    /// Turns towards -π/2 while selected.
    TurnWhenSelected,
    /// Wing flap phase oscillating in [-π/2, π/2].
    Flutter { phase: f32, direction: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub position: Vec3,
    pub yaw: f32,
    pub scale: f32,
    pub selected: bool,
    pub render: RenderState,
    motion: Motion,
}

impl Entity {
    pub fn new(kind: EntityKind, position: Vec3, scale: f32) -> Self {
        let motion = match kind {
            EntityKind::Key => Motion::TurnWhenSelected,
            _ => Motion::Still,
        };
        Self {
            kind,
            position,
            yaw: 0.0,
            scale,
            selected: false,
            render: RenderState::default(),
            motion,
        }
    }

    /// A ghost slowly spinning one way or the other.
    pub fn ghost(position: Vec3, scale: f32, clockwise: bool) -> Self {
        let mut ghost = Self::new(EntityKind::Ghost, position, scale);
        ghost.motion = Motion::Spin {
            rate: if clockwise { 1.0 } else { -1.0 },
        };
        ghost
    }

    pub fn firefly(position: Vec3, flutter_phase: f32) -> Self {
        let mut firefly = Self::new(EntityKind::Firefly, position, 1.0);
        firefly.motion = Motion::Flutter {
            phase: flutter_phase.clamp(-FRAC_PI_2, FRAC_PI_2),
            direction: 1.0,
        };
        firefly
    }

    pub fn with_render(mut self, render: RenderState) -> Self {
        self.render = render;
        self
    }

    pub fn display_color(&self) -> Rgba {
        self.render.resolve(self.selected, Rgba::WHITE)
    }

    pub fn flutter_phase(&self) -> Option<f32> {
        match self.motion {
            Motion::Flutter { phase, .. } => Some(phase),
            _ => None,
        }
    }
}

pub trait SphereCollidable {
    fn bounding_sphere(&self) -> Sphere;

    fn intersects_ray(&self, ray: &Ray) -> bool {
        ray.intersects_sphere(&self.bounding_sphere()).is_some()
    }

    fn contains_point(&self, point: Vec3) -> bool {
        self.bounding_sphere().contains(point)
    }
}

pub trait FlatRenderable {
    /// Draws the entity into the flat render in a single color.
    fn draw_flat(&self, camera: &Camera, buffer: &mut FlatRenderBuffer, color: Rgba);
}

pub trait Animated {
    fn advance(&mut self, dt: f32);
}

impl SphereCollidable for Entity {
    fn bounding_sphere(&self) -> Sphere {
        Sphere::new(
            self.position + self.kind.sphere_offset(),
            self.kind.unit_radius() * self.scale,
        )
    }
}

impl FlatRenderable for Entity {
    fn draw_flat(&self, camera: &Camera, buffer: &mut FlatRenderBuffer, color: Rgba) {
        let sphere = self.bounding_sphere();
        let Some(centre) = camera.project(sphere.center) else {
            return;
        };
        let radius = camera.projected_radius(sphere.radius, centre.depth);
        buffer.fill_disc(centre.x, centre.y, radius, centre.depth, color);
    }
}

impl Animated for Entity {
    fn advance(&mut self, dt: f32) {
        match &mut self.motion {
            Motion::Still => {}
            Motion::Spin { rate } => {
                self.yaw = (self.yaw + dt * *rate) % TAU;
            }
            Motion::TurnWhenSelected => {
                if self.selected && self.yaw > -FRAC_PI_2 {
                    self.yaw -= dt * 1.5;
                }
            }
            Motion::Flutter { phase, direction } => {
                *phase += dt * 18.0 * *direction;
                if *phase > FRAC_PI_2 {
                    *phase = FRAC_PI_2;
                    *direction = -1.0;
                } else if *phase < -FRAC_PI_2 {
                    *phase = -FRAC_PI_2;
                    *direction = 1.0;
                }
            }
        }
    }
}
