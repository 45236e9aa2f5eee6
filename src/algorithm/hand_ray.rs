//! Skeletal pointing: elbow→hand ray against a fixed interaction plane.

use glam::{Vec2, Vec3};

use crate::models::config::Viewport;
use crate::models::input::SkeletonSnapshot;

pub const INNER_WALL: f32 = 0.0;
pub const OUTER_WALL: f32 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionPlane {
    pub origin: Vec3,
    pub normal: Vec3,
}

impl Default for InteractionPlane {
    fn default() -> Self {
        Self {
            origin: Vec3::new(0.0, 0.0, INNER_WALL),
            normal: Vec3::new(0.0, 0.0, OUTER_WALL - INNER_WALL).normalize(),
        }
    }
}

impl InteractionPlane {
    /// Point where the ray from `start` through `through` meets the plane.
    pub fn intersect(&self, start: Vec3, through: Vec3) -> Option<Vec3> {
        let direction = (through - start).try_normalize()?;
        let denom = self.normal.dot(direction);
        if denom.abs() <= f32::EPSILON {
            return None;
        }
        let distance = self.normal.dot(self.origin - start) / denom;
        Some(start + direction * distance)
    }

    /// The bone ray point for a skeleton, if both arm joints are usable.
    pub fn bone_ray(&self, skeleton: &SkeletonSnapshot) -> Option<Vec3> {
        if !skeleton.elbow_right.is_usable() || !skeleton.hand_right.is_usable() {
            return None;
        }
        self.intersect(skeleton.elbow_right.position(), skeleton.hand_right.position())
    }
}

/// Four plane-space corners that map onto the viewport.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    pub top_left: Vec2,
    pub top_right: Vec2,
    pub bottom_right: Vec2,
    pub bottom_left: Vec2,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            top_left: Vec2::new(-0.124_449_9, 1.502_441),
            top_right: Vec2::new(0.208_466, 1.502_441),
            bottom_right: Vec2::new(0.208_466, 1.082_321),
            bottom_left: Vec2::new(-0.124_449_9, 1.082_321),
        }
    }
}

impl Calibration {
    /// Corners in prompt order: top-left, top-right, bottom-right, bottom-left.
    pub fn from_corners(corners: [Vec2; 4]) -> Self {
        Self {
            top_left: corners[0],
            top_right: corners[1],
            bottom_right: corners[2],
            bottom_left: corners[3],
        }
    }

    /// Maps a plane point to screen pixels. Degenerate calibrations yield `None`.
    pub fn to_screen(&self, point: Vec2, viewport: Viewport) -> Option<(f64, f64)> {
        let span_x = self.top_right.x - self.top_left.x;
        let span_y = self.bottom_left.y - self.top_left.y;
        if span_x.abs() <= f32::EPSILON || span_y.abs() <= f32::EPSILON {
            return None;
        }
        let width = viewport.width as f64;
        let height = viewport.height as f64;
        let x = ((point.x - self.top_left.x) / span_x) as f64 * width;
        let y = ((point.y - self.bottom_left.y) / span_y) as f64 * height + height;
        Some((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::input::{JointSample, JointTracking};

    fn joint(x: f32, y: f32, z: f32, tracking: JointTracking) -> JointSample {
        JointSample { x, y, z, tracking }
    }

    #[test]
    fn ray_hits_plane_at_extrapolated_point() {
        let plane = InteractionPlane::default();
        let skeleton = SkeletonSnapshot {
            elbow_right: joint(0.0, 1.0, 2.0, JointTracking::Tracked),
            hand_right: joint(0.1, 1.1, 1.0, JointTracking::Inferred),
        };

        let point = plane.bone_ray(&skeleton).expect("bone ray");
        assert!(point.z.abs() < 1e-5);
        assert!((point.x - 0.2).abs() < 1e-5);
        assert!((point.y - 1.2).abs() < 1e-5);
    }

    #[test]
    fn untracked_joint_yields_no_point() {
        let plane = InteractionPlane::default();
        let skeleton = SkeletonSnapshot {
            elbow_right: joint(0.0, 1.0, 2.0, JointTracking::NotTracked),
            hand_right: joint(0.1, 1.1, 1.0, JointTracking::Tracked),
        };
        assert!(plane.bone_ray(&skeleton).is_none());
    }

    #[test]
    fn ray_parallel_to_plane_yields_no_point() {
        let plane = InteractionPlane::default();
        assert!(plane
            .intersect(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0))
            .is_none());
    }

    #[test]
    fn default_calibration_maps_corners_to_viewport_corners() {
        let calibration = Calibration::default();
        let viewport = Viewport::default();

        let (x, y) = calibration
            .to_screen(calibration.top_left, viewport)
            .expect("top left");
        assert!(x.abs() < 1e-3 && y.abs() < 1e-3, "({x}, {y})");

        let (x, y) = calibration
            .to_screen(calibration.bottom_right, viewport)
            .expect("bottom right");
        assert!((x - 1280.0).abs() < 1e-2 && (y - 720.0).abs() < 1e-2, "({x}, {y})");
    }

    #[test]
    fn degenerate_calibration_is_rejected() {
        let point = Vec2::new(0.5, 0.5);
        let calibration = Calibration::from_corners([point; 4]);
        assert!(calibration.to_screen(point, Viewport::default()).is_none());
    }
}
