//! Keyboard navigation models for [`Camera`](crate::Camera).
//!
//! Two movement styles are supported and can be bound at the same time:
//!
//! - **Orbit**: the camera's offset from its target is rotated about a world
//!   axis, so the camera circles the target while still looking at it.
//! - **Zoom**: the offset is scaled toward or away from the target.
//!
//! Both are driven by elapsed seconds. Orbit speed is in degrees per second
//! and zoom is exponential (`offset * e^(-rate * dt)`), so the distance
//! covered per second does not depend on the frame rate.

use glam::{Mat3, Vec3};
use winit::keyboard::KeyCode;

use crate::error::CameraError;
use crate::input::HeldKeys;

/// Smallest angle, in degrees, allowed between the camera offset and the up
/// vector. Orbiting closer than this would make the look-at basis collapse.
const MIN_POLE_ANGLE: f32 = 1.0;

/// Rotates the camera about a world axis through the target while one of two
/// keys is held.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitBinding {
    /// World axis to rotate about.
    pub axis: Vec3,
    /// Key that rotates counterclockwise (right-hand rule) around `axis`.
    pub positive: KeyCode,
    /// Key that rotates clockwise around `axis`.
    pub negative: KeyCode,
    /// Rotation speed in degrees per second.
    pub degrees_per_second: f32,
}

/// Moves the camera toward or away from its target while one of two keys is
/// held.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomBinding {
    pub zoom_in: KeyCode,
    pub zoom_out: KeyCode,
    /// Exponential rate per second. At `1.0` holding zoom-in for one second
    /// shrinks the distance by a factor of `e`.
    pub rate: f32,
}

/// Key bindings and limits for camera navigation.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationConfig {
    pub orbits: Vec<OrbitBinding>,
    pub zoom: Option<ZoomBinding>,
    /// Minimum distance from the target.
    pub min_distance: f32,
    /// Maximum distance from the target.
    pub max_distance: f32,
}

impl Default for NavigationConfig {
    /// A/D orbit about world Y, W/S orbit about world X, V/B zoom in/out.
    fn default() -> Self {
        Self {
            orbits: vec![
                OrbitBinding {
                    axis: Vec3::Y,
                    positive: KeyCode::KeyD,
                    negative: KeyCode::KeyA,
                    degrees_per_second: 45.0,
                },
                OrbitBinding {
                    axis: Vec3::X,
                    positive: KeyCode::KeyS,
                    negative: KeyCode::KeyW,
                    degrees_per_second: 45.0,
                },
            ],
            zoom: Some(ZoomBinding {
                zoom_in: KeyCode::KeyV,
                zoom_out: KeyCode::KeyB,
                rate: 1.0,
            }),
            min_distance: 0.5,
            max_distance: 500.0,
        }
    }
}

impl NavigationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// No bindings; the camera stays where it is put.
    pub fn fixed() -> Self {
        Self {
            orbits: Vec::new(),
            zoom: None,
            ..Self::default()
        }
    }

    pub fn orbit(mut self, binding: OrbitBinding) -> Self {
        self.orbits.push(binding);
        self
    }

    pub fn zoom(mut self, binding: ZoomBinding) -> Self {
        self.zoom = Some(binding);
        self
    }

    /// Set the orbit speed of every orbit binding, in degrees per second.
    pub fn orbit_speed(mut self, degrees_per_second: f32) -> Self {
        for orbit in &mut self.orbits {
            orbit.degrees_per_second = degrees_per_second;
        }
        self
    }

    pub fn distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    /// Checks that the distance limits and speeds can drive a camera.
    pub fn validate(&self) -> Result<(), CameraError> {
        if !(self.min_distance.is_finite() && self.min_distance > 0.0) {
            return Err(CameraError::invalid(format!(
                "minimum distance must be positive, got {}",
                self.min_distance
            )));
        }
        if !(self.max_distance >= self.min_distance) {
            return Err(CameraError::invalid(format!(
                "maximum distance ({}) must not be below minimum distance ({})",
                self.max_distance, self.min_distance
            )));
        }
        if let Some(orbit) = self.orbits.iter().find(|o| !o.degrees_per_second.is_finite()) {
            return Err(CameraError::invalid(format!(
                "orbit speed must be finite, got {}",
                orbit.degrees_per_second
            )));
        }
        if let Some(zoom) = self.zoom.filter(|z| !z.rate.is_finite()) {
            return Err(CameraError::invalid(format!(
                "zoom rate must be finite, got {}",
                zoom.rate
            )));
        }
        Ok(())
    }

    /// Moves `position` according to the held keys and returns the new
    /// position. Orbits are applied in binding order, then zoom.
    ///
    /// An orbit that would carry the offset within one degree of the up
    /// vector stops on that boundary, so holding a key for one long tick
    /// ends where many short ticks do.
    pub fn apply<K: HeldKeys + ?Sized>(
        &self,
        position: Vec3,
        target: Vec3,
        up: Vec3,
        elapsed: f32,
        keys: &K,
    ) -> Vec3 {
        if elapsed <= 0.0 {
            return position;
        }

        let mut offset = position - target;

        for orbit in &self.orbits {
            let direction = keys.axis(orbit.positive, orbit.negative);
            let Some(axis) = orbit.axis.try_normalize() else {
                continue;
            };
            if direction == 0.0 {
                continue;
            }
            let angle = (orbit.degrees_per_second * elapsed * direction).to_radians();
            let allowed = pole_limited_angle(offset, axis, up, angle);
            if allowed != angle {
                log::trace!("orbit step clamped at the pole");
            }
            if allowed != 0.0 {
                offset = Mat3::from_axis_angle(axis, allowed) * offset;
            }
        }

        if let Some(zoom) = self.zoom {
            let direction = keys.axis(zoom.zoom_in, zoom.zoom_out);
            if direction != 0.0 {
                let distance = offset.length();
                let scaled = distance * (-zoom.rate * elapsed * direction).exp();
                let clamped = scaled.max(self.min_distance).min(self.max_distance);
                if distance > 0.0 {
                    offset *= clamped / distance;
                }
            }
        }

        target + offset
    }
}

/// Largest part of `angle` (radians, about the unit `axis`) that `offset`
/// can rotate through without entering the cone of half-angle
/// [`MIN_POLE_ANGLE`] around `up`.
///
/// Inside the cone, steps that start out toward the pole are refused and
/// every other step is allowed in full. Solved in `f64` because the cone is
/// usually met close to the top of the rotation circle, where the crossing
/// angle is badly conditioned.
fn pole_limited_angle(offset: Vec3, axis: Vec3, up: Vec3, angle: f32) -> f32 {
    let Some(up) = up.as_dvec3().try_normalize() else {
        return 0.0;
    };
    let offset = offset.as_dvec3();
    let axis = axis.as_dvec3();
    let length = offset.length();
    if length == 0.0 {
        return angle;
    }
    let limit = f64::from(MIN_POLE_ANGLE).to_radians().cos() * length;
    let sign = f64::from(angle.signum());
    let span = f64::from(angle.abs());

    // Rotating by t gives par + cos(t) * perp + sin(t) * (axis x offset), so
    // its height along `up` is a + b cos(t) + c sin(t).
    let parallel = axis * axis.dot(offset);
    let a = parallel.dot(up);
    let b = (offset - parallel).dot(up);
    let c = axis.cross(offset).dot(up);

    let start = a + b;
    if start.abs() > limit {
        let toward_pole = start.signum() * sign * c;
        return if toward_pole > 1e-9 * length { 0.0 } else { angle };
    }

    let radius = b.hypot(c);
    if radius <= 1e-12 * length {
        return angle;
    }
    let phase = c.atan2(b);

    // First point along the rotation where the height reaches +limit while
    // rising or -limit while falling.
    let mut first: Option<f64> = None;
    for boundary in [limit, -limit] {
        let ratio = (boundary - a) / radius;
        if ratio.abs() > 1.0 {
            continue;
        }
        let spread = ratio.acos();
        for t in [phase + spread, phase - spread] {
            let travel = (sign * t).rem_euclid(std::f64::consts::TAU);
            if travel > span {
                continue;
            }
            let t = sign * travel;
            let slope = sign * (c * t.cos() - b * t.sin());
            let entering = if boundary > 0.0 { slope > 0.0 } else { slope < 0.0 };
            if entering && first.is_none_or(|f| travel < f) {
                first = Some(travel);
            }
        }
    }

    match first {
        Some(travel) => (sign * travel) as f32,
        None => angle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_keeps_distance_to_target() {
        let nav = NavigationConfig::default();
        let start = Vec3::new(0.0, 0.0, 10.0);
        let moved = nav.apply(start, Vec3::ZERO, Vec3::Y, 1.0, &[KeyCode::KeyD]);

        assert!((moved.length() - 10.0).abs() < 1e-4);
        assert!(!moved.abs_diff_eq(start, 1e-3));
    }

    #[test]
    fn orbit_about_y_matches_speed() {
        let nav = NavigationConfig::default().orbit_speed(90.0);
        let moved = nav.apply(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y, 1.0, &[KeyCode::KeyD]);

        // 90 degrees counterclockwise about +Y takes +Z to +X.
        assert!(moved.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn zoom_is_exponential_and_clamped() {
        let nav = NavigationConfig::default().distance_limits(2.0, 20.0);
        let zoomed = nav.apply(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y, 1.0, &[KeyCode::KeyV]);
        assert!((zoomed.z - 10.0 / std::f32::consts::E).abs() < 1e-4);

        let far = nav.apply(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y, 10.0, &[KeyCode::KeyB]);
        assert!((far.length() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn orbit_stops_short_of_the_pole() {
        let nav = NavigationConfig::default().orbit_speed(90.0);
        let start = Vec3::new(0.0, 0.0, 10.0);
        let moved = nav.apply(start, Vec3::ZERO, Vec3::Y, 1.0, &[KeyCode::KeyW]);

        assert!((moved.length() - 10.0).abs() < 1e-4);
        let to_pole = moved.normalize().dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees();
        assert!((to_pole - MIN_POLE_ANGLE).abs() < 0.05, "{}", to_pole);

        // Holding on at the boundary keeps the camera there.
        let held = nav.apply(moved, Vec3::ZERO, Vec3::Y, 1.0, &[KeyCode::KeyW]);
        assert!(held.abs_diff_eq(moved, 1e-3));
    }

    #[test]
    fn orbit_near_the_pole_only_blocks_steps_toward_it() {
        let nav = NavigationConfig::default().orbit_speed(90.0);
        let start = Vec3::new(0.0, 10.0, 0.1);

        // About up, the angle to the pole does not change.
        let spun = nav.apply(start, Vec3::ZERO, Vec3::Y, 0.5, &[KeyCode::KeyD]);
        assert!(!spun.abs_diff_eq(start, 1e-3));
        assert!((spun.y - start.y).abs() < 1e-4);

        let away = nav.apply(start, Vec3::ZERO, Vec3::Y, 0.5, &[KeyCode::KeyS]);
        assert!(away.y < 9.0);
        let toward = nav.apply(start, Vec3::ZERO, Vec3::Y, 0.5, &[KeyCode::KeyW]);
        assert_eq!(toward, start);
    }

    #[test]
    fn rejects_bad_limits() {
        assert!(NavigationConfig::default().validate().is_ok());
        assert!(NavigationConfig::default().distance_limits(20.0, 2.0).validate().is_err());
        assert!(NavigationConfig::default().distance_limits(0.0, 2.0).validate().is_err());
        assert!(NavigationConfig::default().orbit_speed(f32::NAN).validate().is_err());
    }

    #[test]
    fn inverted_limits_do_not_panic_when_applied() {
        let nav = NavigationConfig::default().distance_limits(20.0, 2.0);
        let moved = nav.apply(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y, 0.1, &[KeyCode::KeyV]);
        assert!(moved.is_finite());
    }

    #[test]
    fn fixed_navigation_ignores_keys() {
        let nav = NavigationConfig::fixed();
        let start = Vec3::new(3.0, 4.0, 5.0);
        let moved = nav.apply(start, Vec3::ZERO, Vec3::Y, 1.0, &[KeyCode::KeyD, KeyCode::KeyV]);
        assert_eq!(moved, start);
    }
}
