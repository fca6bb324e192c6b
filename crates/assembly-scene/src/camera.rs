//! Perspective orbit camera and model framing

use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3, Vec4};
use tracing::debug;

use crate::geometry::{Aabb, Ray};

/// Extra room around a framed model
const FRAME_MARGIN: f32 = 1.2;

/// Perspective camera orbiting a target point
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub position: Vec3,
    /// Point the camera orbits around and looks at
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// User orbit/zoom input is ignored while false
    pub controls_enabled: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(1.0, 1.5, 0.9) * 3.0,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 10_000.0,
            controls_enabled: true,
        }
    }
}

impl OrbitCamera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// OpenGL-style clip space: visible depth maps to -1..1
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Clip-space coordinates of a world point
    pub fn clip(&self, point: Vec3) -> Vec4 {
        self.view_projection() * point.extend(1.0)
    }

    /// Ray from the camera through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let forward = (self.target - self.position).try_normalize().unwrap_or(Vec3::NEG_Z);
        Ray {
            origin: self.position,
            direction: (far - self.position).try_normalize().unwrap_or(forward),
        }
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Rotate around the target; angles in radians
    pub fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        if !self.controls_enabled {
            return;
        }
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let azimuth = offset.x.atan2(offset.z) - delta_azimuth;
        let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() - delta_elevation)
            .clamp(0.01, PI - 0.01);
        self.position = self.target
            + Vec3::new(
                radius * polar.sin() * azimuth.sin(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
            );
    }

    /// Scale the distance to the target; `factor > 1` moves away
    pub fn zoom(&mut self, factor: f32) {
        if !self.controls_enabled || factor <= 0.0 {
            return;
        }
        let offset = (self.position - self.target) * factor;
        if offset.length() > self.near * 2.0 {
            self.position = self.target + offset;
        }
    }

    /// Move so the whole box is visible, keeping the current viewing direction
    pub fn frame_bounds(&mut self, bounds: &Aabb) {
        let center = bounds.center();
        let max_size = bounds.max_dimension().max(f32::EPSILON);
        let half_fov = (self.fov_y.to_radians() * 0.5).tan();
        let fit_height = max_size / (2.0 * half_fov);
        let fit_width = fit_height / self.aspect.max(f32::EPSILON);
        let distance = FRAME_MARGIN * fit_height.max(fit_width);

        let direction = (self.position - center).try_normalize().unwrap_or(Vec3::Z);
        self.position = center + direction * distance;
        self.target = center;
        self.near = distance / 100.0;
        self.far = distance * 100.0;
        debug!(?center, distance, "Framed camera on bounds");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = OrbitCamera {
            position: Vec3::new(0.0, 0.0, 10.0),
            ..Default::default()
        };
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert_eq!(ray.origin, camera.position);
    }

    #[test]
    fn test_frame_bounds_uses_fov_and_margin() {
        let mut camera = OrbitCamera {
            position: Vec3::new(0.0, 0.0, 50.0),
            fov_y: 90.0,
            aspect: 2.0,
            ..Default::default()
        };
        camera.frame_bounds(&Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)));

        // tan(45°) = 1, so fit height = 2 / 2 = 1
        assert!((camera.distance() - 1.2).abs() < 1e-4);
        assert_eq!(camera.target, Vec3::ZERO);
        assert!((camera.near - 0.012).abs() < 1e-6);
        assert!((camera.far - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_orbit_ignored_while_disabled() {
        let mut camera = OrbitCamera::default();
        let before = camera.position;
        camera.controls_enabled = false;
        camera.orbit(0.5, 0.2);
        camera.zoom(2.0);
        assert_eq!(camera.position, before);

        camera.controls_enabled = true;
        camera.orbit(0.5, 0.0);
        assert!((camera.distance() - before.length()).abs() < 1e-3);
        assert_ne!(camera.position, before);
    }
}
