//! Eased camera moves onto a mesh

use std::time::Duration;

use glam::Vec3;
use tracing::debug;

use crate::camera::OrbitCamera;
use crate::geometry::Aabb;

pub const DEFAULT_FOCUS_DURATION: Duration = Duration::from_millis(750);
pub const DEFAULT_DISTANCE_FACTOR: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    QuadraticOut,
}

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticOut => t * (2.0 - t),
        }
    }
}

/// Interpolates one vector over a fixed duration
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: Vec3,
    to: Vec3,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl Tween {
    pub fn new(from: Vec3, to: Vec3, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        }
    }

    pub fn value(&self) -> Vec3 {
        self.from.lerp(self.to, self.easing.apply(self.progress()))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Step forward; returns the new value
    pub fn advance(&mut self, dt: Duration) -> Vec3 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }
}

/// Moves the orbit target and the camera onto a mesh's bounds
#[derive(Debug, Clone)]
pub struct CameraFocusAnimator {
    target_tween: Option<Tween>,
    position_tween: Option<Tween>,
    pub duration: Duration,
    pub distance_factor: f32,
}

impl Default for CameraFocusAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_FOCUS_DURATION, DEFAULT_DISTANCE_FACTOR)
    }
}

impl CameraFocusAnimator {
    pub fn new(duration: Duration, distance_factor: f32) -> Self {
        Self {
            target_tween: None,
            position_tween: None,
            duration,
            distance_factor,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.target_tween.is_some() || self.position_tween.is_some()
    }

    /// Start a focus move with the default duration
    pub fn focus(&mut self, camera: &mut OrbitCamera, bounds: &Aabb) {
        self.focus_with(camera, bounds, self.duration);
    }

    /// Start a focus move, replacing any move still in flight
    ///
    /// User controls stay disabled until the camera position arrives.
    pub fn focus_with(&mut self, camera: &mut OrbitCamera, bounds: &Aabb, duration: Duration) {
        let center = bounds.center();
        let distance = bounds.max_dimension() * self.distance_factor;
        let direction = (camera.position - camera.target)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        let destination = center + direction * distance;

        camera.controls_enabled = false;
        self.target_tween = Some(Tween::new(
            camera.target,
            center,
            duration,
            Easing::QuadraticOut,
        ));
        self.position_tween = Some(Tween::new(
            camera.position,
            destination,
            duration,
            Easing::QuadraticOut,
        ));
        debug!(?center, distance, "Focusing camera");
    }

    /// Advance both tweens by one frame
    pub fn tick(&mut self, camera: &mut OrbitCamera, dt: Duration) {
        if let Some(tween) = self.target_tween.as_mut() {
            camera.target = tween.advance(dt);
            if tween.is_finished() {
                self.target_tween = None;
            }
        }
        if let Some(tween) = self.position_tween.as_mut() {
            camera.position = tween.advance(dt);
            if tween.is_finished() {
                self.position_tween = None;
                camera.controls_enabled = true;
            }
        }
    }
}
