use std::fmt;

use glam::Vec3;

use crate::error::CameraError;
use crate::input::HeldKeys;
use crate::matrix::Matrix4;
use crate::navigation::NavigationConfig;

/// Parameters for building a [`Camera`].
///
/// # Example
/// ```
/// use rasterkit::{Camera, CameraConfig};
///
/// let camera = Camera::new(
///     CameraConfig::new()
///         .at(0.0, 0.0, 10.0)
///         .looking_at(0.0, 0.0, 0.0)
///         .fov(45.0)
///         .size(960, 640)
///         .clip(0.1, 1000.0),
/// )
/// .unwrap();
/// # let _ = camera;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Width divided by height of the render target.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub navigation: NavigationConfig,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45.0,
            aspect: 1.5,
            near: 0.1,
            far: 1000.0,
            navigation: NavigationConfig::default(),
        }
    }
}

impl CameraConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn looking_at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.target = Vec3::new(x, y, z);
        self
    }

    pub fn up(mut self, up: impl Into<Vec3>) -> Self {
        self.up = up.into();
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees;
        self
    }

    pub fn aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Derive the aspect ratio from the render target size.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.aspect = if height == 0 {
            0.0
        } else {
            width as f32 / height as f32
        };
        self
    }

    /// Set the near and far clip distances.
    pub fn clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn navigation(mut self, navigation: NavigationConfig) -> Self {
        self.navigation = navigation;
        self
    }

    fn validate(&self) -> Result<(), CameraError> {
        validate_lens(self.fov, self.aspect, self.near, self.far)?;
        validate_pose(self.position, self.target, self.up)?;
        self.navigation.validate()
    }
}

fn validate_lens(fov: f32, aspect: f32, near: f32, far: f32) -> Result<(), CameraError> {
    if !(fov.is_finite() && fov > 0.0 && fov < 180.0) {
        return Err(CameraError::invalid(format!(
            "field of view must be in (0, 180) degrees, got {}",
            fov
        )));
    }
    if !(aspect.is_finite() && aspect > 0.0) {
        return Err(CameraError::invalid(format!(
            "aspect ratio must be positive, got {}",
            aspect
        )));
    }
    if !(near.is_finite() && near > 0.0) {
        return Err(CameraError::invalid(format!(
            "near plane must be positive, got {}",
            near
        )));
    }
    if !(far.is_finite() && far > near) {
        return Err(CameraError::invalid(format!(
            "far plane ({}) must be beyond near plane ({})",
            far, near
        )));
    }
    Ok(())
}

fn validate_pose(position: Vec3, target: Vec3, up: Vec3) -> Result<(), CameraError> {
    if !(position.is_finite() && target.is_finite() && up.is_finite()) {
        return Err(CameraError::invalid("position, target and up must be finite"));
    }
    let forward = target - position;
    if forward.length_squared() == 0.0 {
        return Err(CameraError::invalid("position and target coincide"));
    }
    if forward.cross(up).length_squared() <= f32::EPSILON * forward.length_squared() {
        return Err(CameraError::invalid(
            "up vector is zero or parallel to the viewing direction",
        ));
    }
    Ok(())
}

/// Uniform block layout for camera matrices.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    /// Combined projection * view matrix.
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// Camera position in world space, for specular lighting.
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

/// A perspective camera looking at a target point.
///
/// The view and projection matrices are cached. They are recomputed by
/// [`set`](Self::set), by the setters that change what they depend on, and by
/// [`handle_navigation`](Self::handle_navigation) when it moves the camera.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    navigation: NavigationConfig,
    view: Matrix4,
    projection: Matrix4,
}

impl Camera {
    /// Builds a camera, failing if the parameters would give a degenerate
    /// view or projection.
    pub fn new(config: CameraConfig) -> Result<Self, CameraError> {
        config.validate()?;
        let mut camera = Self {
            position: config.position,
            target: config.target,
            up: config.up,
            fov: config.fov,
            aspect: config.aspect,
            near: config.near,
            far: config.far,
            navigation: config.navigation,
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        };
        camera.set();
        Ok(camera)
    }

    /// Recomputes both matrices.
    pub fn set(&mut self) {
        self.compute_view_matrix();
        self.compute_projection_matrix();
    }

    /// Right-handed look-at from position, target and up.
    pub fn compute_view_matrix(&mut self) -> &Matrix4 {
        self.view.set_look_at(self.position, self.target, self.up);
        &self.view
    }

    /// Perspective projection with OpenGL depth range.
    pub fn compute_projection_matrix(&mut self) -> &Matrix4 {
        self.projection
            .set_perspective(self.fov, self.aspect, self.near, self.far);
        &self.projection
    }

    /// Moves the camera according to the held navigation keys.
    ///
    /// Movement is scaled by `elapsed` seconds. Returns true if the camera
    /// moved, in which case the view matrix has already been recomputed.
    pub fn handle_navigation<K: HeldKeys + ?Sized>(&mut self, elapsed: f32, keys: &K) -> bool {
        let moved = self
            .navigation
            .apply(self.position, self.target, self.up, elapsed, keys);
        if moved == self.position {
            return false;
        }
        self.position = moved;
        self.compute_view_matrix();
        true
    }

    /// Updates the aspect ratio after the render target was resized.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::invalid(format!(
                "render target size must be non-zero, got {}x{}",
                width, height
            )));
        }
        self.set_aspect(width as f32 / height as f32)
    }

    pub fn set_aspect(&mut self, aspect: f32) -> Result<(), CameraError> {
        validate_lens(self.fov, aspect, self.near, self.far)?;
        self.aspect = aspect;
        self.compute_projection_matrix();
        Ok(())
    }

    /// Set the field of view in degrees.
    pub fn set_fov(&mut self, fov: f32) -> Result<(), CameraError> {
        validate_lens(fov, self.aspect, self.near, self.far)?;
        self.fov = fov;
        self.compute_projection_matrix();
        Ok(())
    }

    pub fn set_clip(&mut self, near: f32, far: f32) -> Result<(), CameraError> {
        validate_lens(self.fov, self.aspect, near, far)?;
        self.near = near;
        self.far = far;
        self.compute_projection_matrix();
        Ok(())
    }

    pub fn set_position(&mut self, position: Vec3) -> Result<(), CameraError> {
        validate_pose(position, self.target, self.up)?;
        self.position = position;
        self.compute_view_matrix();
        Ok(())
    }

    pub fn set_target(&mut self, target: Vec3) -> Result<(), CameraError> {
        validate_pose(self.position, target, self.up)?;
        self.target = target;
        self.compute_view_matrix();
        Ok(())
    }

    pub fn view_matrix(&self) -> &Matrix4 {
        &self.view
    }

    pub fn projection_matrix(&self) -> &Matrix4 {
        &self.projection
    }

    /// `projection * view`.
    pub fn view_projection(&self) -> Matrix4 {
        self.projection * self.view
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn navigation(&self) -> &NavigationConfig {
        &self.navigation
    }

    /// Replaces the key bindings and distance limits.
    pub fn set_navigation(&mut self, navigation: NavigationConfig) -> Result<(), CameraError> {
        navigation.validate()?;
        self.navigation = navigation;
        Ok(())
    }

    pub fn uniforms(&self) -> CameraUniforms {
        CameraUniforms {
            view_proj: self.view_projection().to_cols_array_2d(),
            view: self.view.to_cols_array_2d(),
            proj: self.projection.to_cols_array_2d(),
            camera_pos: self.position.to_array(),
            _padding: 0.0,
        }
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}, {:.1}, {:.1}",
            self.position.x, self.position.y, self.position.z
        )
    }
}
