//! Column-major 4x4 transform with in-place composition.
//!
//! [`Matrix4`] stores its sixteen elements in the layout shaders expect for
//! `uniformMatrix4fv(location, false, elements)`. The builder methods mutate
//! in place and post-multiply, so a chain like
//!
//! ```
//! use rasterkit::Matrix4;
//!
//! let mut m = Matrix4::identity();
//! m.translate(0.0, 6.0, 0.0).rotate(45.0, 0.0, 0.0, 1.0).scale(2.0, 0.5, 1.0);
//! ```
//!
//! applies the scale first and the translation last to a vertex, reading
//! parent-to-child from top to bottom.

use std::ops::Mul;

use glam::{Mat4, Vec3, Vec4};

/// A 4x4 `f32` transform stored column-major.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Matrix4 {
    /// Column-major elements, ready for upload.
    pub elements: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4 {
    pub fn identity() -> Self {
        Self::from_mat4(Mat4::IDENTITY)
    }

    pub fn from_mat4(m: Mat4) -> Self {
        Self {
            elements: m.to_cols_array(),
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array(&self.elements)
    }

    pub fn elements(&self) -> &[f32; 16] {
        &self.elements
    }

    /// Raw bytes in upload order.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Columns as nested arrays, the layout used by uniform structs.
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        self.to_mat4().to_cols_array_2d()
    }

    pub fn set_identity(&mut self) -> &mut Self {
        *self = Self::identity();
        self
    }

    /// `self = self * other`.
    pub fn multiply(&mut self, other: &Matrix4) -> &mut Self {
        self.post(other.to_mat4())
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.post(Mat4::from_translation(Vec3::new(x, y, z)))
    }

    /// Rotates `angle` degrees about the axis `(x, y, z)`.
    ///
    /// The axis does not need to be normalized. A zero-length axis leaves the
    /// matrix unchanged.
    pub fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) -> &mut Self {
        let axis = Vec3::new(x, y, z);
        if axis.length_squared() == 0.0 || angle == 0.0 {
            return self;
        }
        self.post(Mat4::from_axis_angle(axis.normalize(), angle.to_radians()))
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.post(Mat4::from_scale(Vec3::new(x, y, z)))
    }

    /// Replaces the matrix with a right-handed look-at view transform.
    pub fn set_look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) -> &mut Self {
        *self = Self::from_mat4(Mat4::look_at_rh(eye, target, up));
        self
    }

    /// Replaces the matrix with a perspective projection using OpenGL clip
    /// conventions (depth in `[-1, 1]`).
    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) -> &mut Self {
        *self = Self::from_mat4(Mat4::perspective_rh_gl(fov_y.to_radians(), aspect, near, far));
        self
    }

    pub fn determinant(&self) -> f32 {
        self.to_mat4().determinant()
    }

    /// Transforms a point (`w = 1`) without the perspective divide.
    pub fn transform_point(&self, p: Vec3) -> Vec4 {
        self.to_mat4() * p.extend(1.0)
    }

    /// Translation component (fourth column).
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.elements[12], self.elements[13], self.elements[14])
    }

    pub fn abs_diff_eq(&self, other: &Matrix4, max_abs_diff: f32) -> bool {
        self.to_mat4().abs_diff_eq(other.to_mat4(), max_abs_diff)
    }

    fn post(&mut self, rhs: Mat4) -> &mut Self {
        *self = Self::from_mat4(self.to_mat4() * rhs);
        self
    }
}

impl From<Mat4> for Matrix4 {
    fn from(m: Mat4) -> Self {
        Self::from_mat4(m)
    }
}

impl From<Matrix4> for Mat4 {
    fn from(m: Matrix4) -> Self {
        m.to_mat4()
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        Matrix4::from_mat4(self.to_mat4() * rhs.to_mat4())
    }
}
