//! Fixed-pose pinhole camera used by every trial.

use glam::{Mat4, Vec3};

use crate::models::config::Viewport;
use crate::scene::geometry::Ray;

pub const FIELD_OF_VIEW: f32 = std::f32::consts::FRAC_PI_4;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 5_000.0;

/// A world point projected onto the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Distance along the view axis.
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation about +Y; yaw 0 looks down +Z.
    pub yaw: f32,
    pub viewport: Viewport,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, viewport: Viewport) -> Self {
        Self {
            position,
            yaw,
            viewport,
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        let aspect = self.viewport.width as f32 / self.viewport.height.max(1) as f32;
        Mat4::perspective_rh(FIELD_OF_VIEW, aspect, NEAR_PLANE, FAR_PLANE)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Projects a world point to pixels. Points behind the near plane yield `None`.
    pub fn project(&self, point: Vec3) -> Option<ScreenPoint> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w <= NEAR_PLANE {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let width = self.viewport.width as f32;
        let height = self.viewport.height as f32;
        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * width,
            y: (1.0 - ndc.y) * 0.5 * height,
            depth: clip.w,
        })
    }

    /// On-screen radius in pixels of a sphere at the given view depth.
    pub fn projected_radius(&self, radius: f32, depth: f32) -> f32 {
        if depth <= 0.0 {
            return 0.0;
        }
        let half_height = self.viewport.height as f32 * 0.5;
        radius * half_height / ((FIELD_OF_VIEW * 0.5).tan() * depth)
    }

    /// Ray from the near plane through the given pixel.
    pub fn cursor_ray(&self, x: f64, y: f64) -> Option<Ray> {
        let width = self.viewport.width as f32;
        let height = self.viewport.height.max(1) as f32;
        let ndc_x = 2.0 * x as f32 / width - 1.0;
        let ndc_y = 1.0 - 2.0 * y as f32 / height;

        let tan_half = (FIELD_OF_VIEW * 0.5).tan();
        let view_dir = Vec3::new(ndc_x * tan_half * (width / height), ndc_y * tan_half, -1.0);
        let to_world = self.view().inverse();
        let direction = to_world.transform_vector3(view_dir);
        Ray::new(self.position + direction * NEAR_PLANE, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(Vec3::new(32.0, 50.0, -120.0), std::f32::consts::PI, Viewport::default())
    }

    #[test]
    fn point_straight_ahead_lands_in_viewport_centre() {
        let camera = camera();
        let ahead = camera.position + camera.forward() * 100.0;
        let screen = camera.project(ahead).expect("visible");
        assert!((screen.x - 640.0).abs() < 0.5);
        assert!((screen.y - 360.0).abs() < 0.5);
        assert!((screen.depth - 100.0).abs() < 1e-2);
    }

    #[test]
    fn point_behind_camera_is_not_projected() {
        let camera = camera();
        let behind = camera.position - camera.forward() * 10.0;
        assert!(camera.project(behind).is_none());
    }

    #[test]
    fn cursor_ray_passes_through_projected_point() {
        let camera = camera();
        let target = Vec3::new(50.0, 60.0, -290.0);
        let screen = camera.project(target).expect("visible");
        let ray = camera
            .cursor_ray(screen.x as f64, screen.y as f64)
            .expect("ray");

        let distance = (target - ray.origin).dot(ray.direction);
        let closest = ray.at(distance);
        assert!(closest.distance(target) < 0.05, "{closest:?} vs {target:?}");
    }

    #[test]
    fn upper_screen_points_up() {
        let camera = camera();
        let ray = camera.cursor_ray(640.0, 0.0).expect("ray");
        assert!(ray.direction.y > 0.0);
    }
}
