//! Contract with the graphics API.
//!
//! The crate does not talk to WebGL or any GPU API directly. A host provides a
//! [`RenderBackend`] that compiles shader programs, uploads vertex data, sets
//! uniforms and issues draw calls. [`ShaderProgram`] sits on top of it and
//! resolves every attribute and uniform a program needs up front, so a name
//! mismatch between host code and shader source fails at startup instead of
//! silently sending data nowhere.

use std::collections::HashMap;

use crate::error::{ShaderError, VariableKind};
use crate::matrix::Matrix4;

/// Handle to a linked shader program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Handle to an uploaded vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Resolved location of a vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttribLocation(pub u32);

/// Resolved location of a uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Primitive assembly mode for a draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// How fragment colors combine with the framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Blending disabled.
    #[default]
    Opaque,
    /// `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` with `FUNC_ADD`.
    Alpha,
    /// `ONE, ONE_MINUS_SRC_ALPHA` for textures with premultiplied alpha.
    PremultipliedAlpha,
}

/// Which faces are discarded before rasterization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CullMode {
    #[default]
    None,
    Back,
    Front,
}

/// Fixed-function state set before a batch of draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderState {
    pub depth_test: bool,
    /// Whether draws write to the depth buffer (the depth mask).
    pub depth_write: bool,
    pub cull: CullMode,
    pub blend: BlendMode,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl RenderState {
    /// Depth tested and written, no blending.
    pub const OPAQUE: Self = Self {
        depth_test: true,
        depth_write: true,
        cull: CullMode::None,
        blend: BlendMode::Opaque,
    };

    /// Depth tested but not written, alpha blended, back faces culled so a
    /// closed translucent mesh blends its front faces only.
    pub const TRANSLUCENT: Self = Self {
        depth_test: true,
        depth_write: false,
        cull: CullMode::Back,
        blend: BlendMode::Alpha,
    };
}

/// Vertex and fragment source for one program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// Capabilities the host graphics API must provide.
pub trait RenderBackend {
    /// Compiles both stages and links them into a program.
    fn compile_program(&mut self, source: &ShaderSource) -> Result<ProgramId, ShaderError>;

    /// Location of an active attribute, `None` if the program has no such
    /// attribute.
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation>;

    /// Location of an active uniform, `None` if the program has no such
    /// uniform.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn use_program(&mut self, program: ProgramId);

    /// Uploads static vertex data with `components` floats per vertex.
    fn create_vertex_buffer(&mut self, data: &[f32], components: u32) -> BufferId;

    /// Binds `buffer` to the attribute at `location`.
    fn bind_attribute(&mut self, location: AttribLocation, buffer: BufferId);

    fn set_uniform_matrix(&mut self, location: UniformLocation, value: &Matrix4);
    fn set_uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]);
    fn set_uniform_vec3(&mut self, location: UniformLocation, value: [f32; 3]);
    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32);

    fn set_state(&mut self, state: RenderState);

    /// Clears color and depth.
    fn clear(&mut self, color: [f32; 4]);

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32);
}

/// A linked program with all of its variables resolved.
///
/// # Example
/// ```
/// use rasterkit::{HeadlessBackend, ShaderProgram, ShaderSource};
///
/// let mut backend = HeadlessBackend::new();
/// let source = ShaderSource::new(
///     "attribute vec3 aVertexPosition;\nuniform mat4 uModelMatrix;\nvoid main() {}",
///     "precision mediump float;\nuniform vec4 uFragmentColor;\nvoid main() {}",
/// );
/// let program = ShaderProgram::build(
///     &mut backend,
///     &source,
///     &["aVertexPosition"],
///     &["uModelMatrix", "uFragmentColor"],
/// )
/// .unwrap();
/// assert!(program.uniform("uModelMatrix").is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    attributes: HashMap<String, AttribLocation>,
    uniforms: HashMap<String, UniformLocation>,
}

impl ShaderProgram {
    /// Compiles `source` and resolves every listed attribute and uniform.
    pub fn build<B: RenderBackend + ?Sized>(
        backend: &mut B,
        source: &ShaderSource,
        attributes: &[&str],
        uniforms: &[&str],
    ) -> Result<Self, ShaderError> {
        let id = backend.compile_program(source).inspect_err(|e| {
            log::error!("{}", e);
        })?;

        let mut program = Self {
            id,
            attributes: HashMap::new(),
            uniforms: HashMap::new(),
        };

        for &name in attributes {
            let location = backend
                .attrib_location(id, name)
                .ok_or_else(|| missing(VariableKind::Attribute, name))?;
            program.attributes.insert(name.to_string(), location);
        }
        for &name in uniforms {
            let location = backend
                .uniform_location(id, name)
                .ok_or_else(|| missing(VariableKind::Uniform, name))?;
            program.uniforms.insert(name.to_string(), location);
        }

        log::debug!(
            "linked program {:?} ({} attributes, {} uniforms)",
            id,
            program.attributes.len(),
            program.uniforms.len()
        );
        Ok(program)
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn attribute(&self, name: &str) -> Result<AttribLocation, ShaderError> {
        self.attributes
            .get(name)
            .copied()
            .ok_or_else(|| missing(VariableKind::Attribute, name))
    }

    pub fn uniform(&self, name: &str) -> Result<UniformLocation, ShaderError> {
        self.uniforms
            .get(name)
            .copied()
            .ok_or_else(|| missing(VariableKind::Uniform, name))
    }

    /// Whether the program declared `name` as a uniform when it was built.
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }
}

fn missing(kind: VariableKind, name: &str) -> ShaderError {
    let err = ShaderError::MissingVariable {
        kind,
        name: name.to_string(),
    };
    log::error!("{}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeadlessBackend;

    fn source() -> ShaderSource {
        ShaderSource::new(
            "attribute vec3 aVertexPosition;\n\
             attribute vec4 aVertexColor;\n\
             uniform mat4 uModelMatrix;\n\
             uniform mat4 uViewMatrix;\n\
             void main() { gl_Position = uViewMatrix * uModelMatrix * vec4(aVertexPosition, 1.0); }",
            "precision mediump float;\nvoid main() { gl_FragColor = vec4(1.0); }",
        )
    }

    #[test]
    fn resolves_declared_variables() {
        let mut backend = HeadlessBackend::new();
        let program = ShaderProgram::build(
            &mut backend,
            &source(),
            &["aVertexPosition", "aVertexColor"],
            &["uModelMatrix", "uViewMatrix"],
        )
        .unwrap();

        assert_ne!(
            program.attribute("aVertexPosition").unwrap(),
            program.attribute("aVertexColor").unwrap()
        );
        assert!(program.has_uniform("uViewMatrix"));
    }

    #[test]
    fn missing_uniform_fails_fast() {
        let mut backend = HeadlessBackend::new();
        let err = ShaderProgram::build(
            &mut backend,
            &source(),
            &["aVertexPosition"],
            &["uProjectionMatrix"],
        )
        .unwrap_err();

        assert_eq!(
            err,
            ShaderError::MissingVariable {
                kind: VariableKind::Uniform,
                name: "uProjectionMatrix".to_string()
            }
        );
    }

    #[test]
    fn lookup_of_unlisted_name_fails() {
        let mut backend = HeadlessBackend::new();
        let program =
            ShaderProgram::build(&mut backend, &source(), &["aVertexPosition"], &[]).unwrap();

        assert!(matches!(
            program.attribute("aVertexNormal"),
            Err(ShaderError::MissingVariable {
                kind: VariableKind::Attribute,
                ..
            })
        ));
    }

    #[test]
    fn translucent_state_disables_depth_writes() {
        assert!(!RenderState::TRANSLUCENT.depth_write);
        assert_eq!(RenderState::TRANSLUCENT.blend, BlendMode::Alpha);
        assert_eq!(RenderState::default(), RenderState::OPAQUE);
    }
}
