//! Composite figures built on the transform stack.
//!
//! Scene objects never talk to the backend themselves. They compose model
//! matrices with a [`TransformStack`](crate::TransformStack) and hand each
//! finished part to a [`PartSink`]: usually a [`MeshRenderer`], or a
//! [`DrawQueue`](crate::DrawQueue) when translucent parts need sorting first.

mod paper_man;
mod planets;
mod windmill;

pub use paper_man::PaperMan;
pub use planets::Planets;
pub use windmill::Windmill;

use std::collections::HashMap;

use crate::camera::Camera;
use crate::error::Error;
use crate::matrix::Matrix4;
use crate::render::{BufferId, RenderBackend, RenderState, ShaderProgram, Topology};

/// Mesh a part is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Unit square spanning `[-1, 1]` in x and y.
    Rectangle,
    Cube,
    Sphere,
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Rectangle => "rectangle",
            Shape::Cube => "cube",
            Shape::Sphere => "sphere",
        }
    }
}

/// Receives finished parts from scene objects.
pub trait PartSink {
    /// Draws `shape` with the given model matrix and RGBA color.
    fn draw_part(&mut self, shape: Shape, model: &Matrix4, color: [f32; 4]) -> Result<(), Error>;

    /// Sets fixed-function state for the parts that follow.
    fn set_state(&mut self, _state: RenderState) {}
}

/// Vertex range of an uploaded mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mesh {
    pub buffer: BufferId,
    pub topology: Topology,
    pub first: u32,
    pub count: u32,
}

/// Position data for the unit rectangle, two triangles.
pub const RECTANGLE_POSITIONS: [f32; 18] = [
    -1.0, 1.0, 0.0, //
    -1.0, -1.0, 0.0, //
    1.0, -1.0, 0.0, //
    1.0, -1.0, 0.0, //
    1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0, //
];

/// Meshes registered per [`Shape`].
#[derive(Clone, Debug, Default)]
pub struct MeshTable {
    meshes: HashMap<Shape, Mesh>,
}

impl MeshTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads xyz `positions` and registers them for `shape`.
    pub fn upload<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        shape: Shape,
        positions: &[f32],
        topology: Topology,
    ) -> Mesh {
        let buffer = backend.create_vertex_buffer(positions, 3);
        let mesh = Mesh {
            buffer,
            topology,
            first: 0,
            count: (positions.len() / 3) as u32,
        };
        self.meshes.insert(shape, mesh);
        log::debug!("registered {} ({} vertices)", shape.name(), mesh.count);
        mesh
    }

    /// Uploads the built-in unit rectangle.
    pub fn upload_rectangle<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Mesh {
        self.upload(
            backend,
            Shape::Rectangle,
            &RECTANGLE_POSITIONS,
            Topology::Triangles,
        )
    }

    pub fn insert(&mut self, shape: Shape, mesh: Mesh) {
        self.meshes.insert(shape, mesh);
    }

    pub fn get(&self, shape: Shape) -> Option<&Mesh> {
        self.meshes.get(&shape)
    }
}

/// Shader variable names used by [`MeshRenderer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformNames {
    pub position: String,
    pub model: String,
    pub view: String,
    pub projection: String,
    /// Optional: skipped when the program does not declare it.
    pub color: String,
}

impl Default for UniformNames {
    fn default() -> Self {
        Self {
            position: "aVertexPosition".to_string(),
            model: "uModelMatrix".to_string(),
            view: "uViewMatrix".to_string(),
            projection: "uProjectionMatrix".to_string(),
            color: "uFragmentColor".to_string(),
        }
    }
}

impl UniformNames {
    /// Attributes a program must declare for [`MeshRenderer`].
    pub fn attributes(&self) -> Vec<&str> {
        vec![self.position.as_str()]
    }

    /// Uniforms a program must declare for [`MeshRenderer`], color included.
    pub fn uniforms(&self) -> Vec<&str> {
        vec![
            self.model.as_str(),
            self.view.as_str(),
            self.projection.as_str(),
            self.color.as_str(),
        ]
    }
}

/// [`PartSink`] that draws through a [`RenderBackend`].
///
/// For every part it binds the mesh, uploads model, view and projection
/// matrices and the color, and issues the draw call. The camera is read as
/// is, so call [`Camera::set`] or [`Camera::handle_navigation`] before
/// drawing.
pub struct MeshRenderer<'a, B: RenderBackend + ?Sized> {
    backend: &'a mut B,
    program: &'a ShaderProgram,
    camera: &'a Camera,
    meshes: &'a MeshTable,
    names: &'a UniformNames,
}

impl<'a, B: RenderBackend + ?Sized> MeshRenderer<'a, B> {
    pub fn new(
        backend: &'a mut B,
        program: &'a ShaderProgram,
        camera: &'a Camera,
        meshes: &'a MeshTable,
        names: &'a UniformNames,
    ) -> Self {
        backend.use_program(program.id());
        Self {
            backend,
            program,
            camera,
            meshes,
            names,
        }
    }
}

impl<B: RenderBackend + ?Sized> PartSink for MeshRenderer<'_, B> {
    fn draw_part(&mut self, shape: Shape, model: &Matrix4, color: [f32; 4]) -> Result<(), Error> {
        let mesh = self
            .meshes
            .get(shape)
            .ok_or_else(|| Error::UnknownShape(shape.name().to_string()))?;

        let position = self.program.attribute(&self.names.position)?;
        self.backend.bind_attribute(position, mesh.buffer);

        let model_loc = self.program.uniform(&self.names.model)?;
        let view_loc = self.program.uniform(&self.names.view)?;
        let projection_loc = self.program.uniform(&self.names.projection)?;
        self.backend.set_uniform_matrix(model_loc, model);
        self.backend
            .set_uniform_matrix(view_loc, self.camera.view_matrix());
        self.backend
            .set_uniform_matrix(projection_loc, self.camera.projection_matrix());

        if self.program.has_uniform(&self.names.color) {
            let color_loc = self.program.uniform(&self.names.color)?;
            self.backend.set_uniform_vec4(color_loc, color);
        }

        self.backend
            .draw_arrays(mesh.topology, mesh.first, mesh.count);
        Ok(())
    }

    fn set_state(&mut self, state: RenderState) {
        self.backend.set_state(state);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::setup;
    use super::*;

    #[test]
    fn renderer_uploads_matrices_and_draws() {
        let (mut backend, program, meshes, camera) = setup();
        let names = UniformNames::default();
        let mut model = Matrix4::identity();
        model.translate(1.0, 2.0, 3.0);

        {
            let mut renderer = MeshRenderer::new(&mut backend, &program, &camera, &meshes, &names);
            renderer
                .draw_part(Shape::Rectangle, &model, [1.0, 0.0, 0.0, 1.0])
                .unwrap();
        }

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].count, 6);
        assert_eq!(draws[0].topology, Topology::Triangles);
        assert_eq!(draws[0].matrix("uModelMatrix"), Some(model));
        assert_eq!(draws[0].matrix("uViewMatrix"), Some(*camera.view_matrix()));
        assert_eq!(draws[0].vec4("uFragmentColor"), Some([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn unregistered_shape_is_an_error() {
        let (mut backend, program, _, camera) = setup();
        let names = UniformNames::default();
        let meshes = MeshTable::new();
        let mut renderer = MeshRenderer::new(&mut backend, &program, &camera, &meshes, &names);

        let err = renderer
            .draw_part(Shape::Sphere, &Matrix4::identity(), [1.0; 4])
            .unwrap_err();
        assert_eq!(err, Error::UnknownShape("sphere".to_string()));
    }
}
