//! In-memory [`RenderBackend`] that records what would have been drawn.
//!
//! `HeadlessBackend` "compiles" GLSL by scanning the declarations of each
//! stage, so attribute and uniform lookups behave like a real driver's: names
//! the source declares resolve, everything else does not. Every draw call is
//! recorded together with the uniform values bound at that moment, which is
//! what scene tests inspect.

use std::collections::HashMap;

use crate::error::{ShaderError, ShaderStage};
use crate::matrix::Matrix4;
use crate::render::{
    AttribLocation, BufferId, ProgramId, RenderBackend, RenderState, ShaderSource, Topology,
    UniformLocation,
};

/// A uniform value as last set by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Matrix(Matrix4),
    Vec4([f32; 4]),
    Vec3([f32; 3]),
    Float(f32),
}

/// One recorded `draw_arrays` call.
#[derive(Clone, Debug)]
pub struct DrawCall {
    pub program: ProgramId,
    pub topology: Topology,
    pub first: u32,
    pub count: u32,
    pub state: RenderState,
    /// Uniform values by name at the time of the draw.
    pub uniforms: HashMap<String, UniformValue>,
}

impl DrawCall {
    pub fn matrix(&self, name: &str) -> Option<Matrix4> {
        match self.uniforms.get(name) {
            Some(UniformValue::Matrix(m)) => Some(*m),
            _ => None,
        }
    }

    pub fn vec4(&self, name: &str) -> Option<[f32; 4]> {
        match self.uniforms.get(name) {
            Some(UniformValue::Vec4(v)) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Program {
    attributes: Vec<String>,
    uniforms: Vec<String>,
    values: HashMap<UniformLocation, UniformValue>,
}

#[derive(Debug)]
struct Buffer {
    bytes: Vec<u8>,
    components: u32,
}

impl Buffer {
    fn vertex_count(&self) -> u32 {
        let floats = (self.bytes.len() / std::mem::size_of::<f32>()) as u32;
        if self.components == 0 {
            0
        } else {
            floats / self.components
        }
    }
}

/// Recording backend with no GPU behind it.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    programs: Vec<Program>,
    buffers: Vec<Buffer>,
    bound: HashMap<AttribLocation, BufferId>,
    current: Option<ProgramId>,
    state: RenderState,
    clear_color: Option<[f32; 4]>,
    clears: usize,
    draws: Vec<DrawCall>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Removes and returns the recorded draws.
    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    pub fn clear_color(&self) -> Option<[f32; 4]> {
        self.clear_color
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Number of vertices in an uploaded buffer.
    pub fn buffer_len(&self, buffer: BufferId) -> Option<u32> {
        self.buffers
            .get(buffer.0 as usize)
            .map(Buffer::vertex_count)
    }

    fn program(&self, id: ProgramId) -> Option<&Program> {
        self.programs.get(id.0 as usize)
    }
}

impl RenderBackend for HeadlessBackend {
    fn compile_program(&mut self, source: &ShaderSource) -> Result<ProgramId, ShaderError> {
        let vertex = parse_stage(ShaderStage::Vertex, &source.vertex)?;
        let fragment = parse_stage(ShaderStage::Fragment, &source.fragment)?;

        for name in &fragment.varyings {
            if !vertex.varyings.contains(name) {
                return Err(ShaderError::Link {
                    log: format!(
                        "Varying '{}' is read by the fragment shader but not written by the vertex shader",
                        name
                    ),
                });
            }
        }

        let mut uniforms = vertex.uniforms;
        for name in fragment.uniforms {
            if !uniforms.contains(&name) {
                uniforms.push(name);
            }
        }

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(Program {
            attributes: vertex.attributes,
            uniforms,
            values: HashMap::new(),
        });
        Ok(id)
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        self.program(program)?
            .attributes
            .iter()
            .position(|a| a == name)
            .map(|i| AttribLocation(i as u32))
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.program(program)?
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn use_program(&mut self, program: ProgramId) {
        if self.program(program).is_none() {
            log::warn!("use_program called with unknown program {:?}", program);
            return;
        }
        self.current = Some(program);
    }

    fn create_vertex_buffer(&mut self, data: &[f32], components: u32) -> BufferId {
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(Buffer {
            bytes: bytemuck::cast_slice(data).to_vec(),
            components,
        });
        id
    }

    fn bind_attribute(&mut self, location: AttribLocation, buffer: BufferId) {
        self.bound.insert(location, buffer);
    }

    fn set_uniform_matrix(&mut self, location: UniformLocation, value: &Matrix4) {
        self.set_uniform(location, UniformValue::Matrix(*value));
    }

    fn set_uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]) {
        self.set_uniform(location, UniformValue::Vec4(value));
    }

    fn set_uniform_vec3(&mut self, location: UniformLocation, value: [f32; 3]) {
        self.set_uniform(location, UniformValue::Vec3(value));
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.set_uniform(location, UniformValue::Float(value));
    }

    fn set_state(&mut self, state: RenderState) {
        self.state = state;
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.clear_color = Some(color);
        self.clears += 1;
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) {
        let Some(id) = self.current else {
            log::warn!("draw_arrays without a program in use");
            return;
        };
        let Some(program) = self.program(id) else {
            return;
        };

        for (location, buffer) in &self.bound {
            let available = self.buffer_len(*buffer).unwrap_or(0);
            let end = first.saturating_add(count);
            if end > available {
                log::warn!(
                    "draw of {}..{} exceeds buffer {:?} at {:?} ({} vertices)",
                    first,
                    end,
                    buffer,
                    location,
                    available
                );
            }
        }

        let uniforms = program
            .values
            .iter()
            .filter_map(|(location, value)| {
                program
                    .uniforms
                    .get(location.0 as usize)
                    .map(|name| (name.clone(), *value))
            })
            .collect();

        self.draws.push(DrawCall {
            program: id,
            topology,
            first,
            count,
            state: self.state,
            uniforms,
        });
    }
}

impl HeadlessBackend {
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(id) = self.current else {
            log::warn!("uniform set without a program in use");
            return;
        };
        if let Some(program) = self.programs.get_mut(id.0 as usize) {
            program.values.insert(location, value);
        }
    }
}

#[derive(Debug, Default)]
struct StageDecls {
    attributes: Vec<String>,
    uniforms: Vec<String>,
    varyings: Vec<String>,
}

const PRECISIONS: [&str; 3] = ["lowp", "mediump", "highp"];

fn parse_stage(stage: ShaderStage, source: &str) -> Result<StageDecls, ShaderError> {
    if !source.contains("main") {
        return Err(ShaderError::Compile {
            stage,
            log: "'main' : function not defined".to_string(),
        });
    }

    let stripped: Vec<&str> = source
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|line| line.split("//").next().unwrap_or(""))
        .collect();
    let stripped = stripped.join("\n");

    let mut decls = StageDecls::default();
    for statement in stripped.split(';') {
        let statement = statement.trim();
        // `layout(location = 0) in vec3 aPos`
        let statement = match statement.strip_prefix("layout") {
            Some(rest) => rest.split_once(')').map_or("", |(_, tail)| tail.trim()),
            None => statement,
        };

        let mut tokens = statement.split_whitespace();
        let Some(qualifier) = tokens.next() else {
            continue;
        };
        let list = match (stage, qualifier) {
            (ShaderStage::Vertex, "attribute" | "in") => &mut decls.attributes,
            (_, "uniform") => &mut decls.uniforms,
            (ShaderStage::Vertex, "varying" | "out") => &mut decls.varyings,
            (ShaderStage::Fragment, "varying" | "in") => &mut decls.varyings,
            _ => continue,
        };

        let rest: Vec<&str> = tokens
            .skip_while(|t| PRECISIONS.contains(t))
            .skip(1) // type
            .collect();
        for name in rest.join(" ").split(',') {
            let name = name.split('[').next().unwrap_or("").trim();
            if !name.is_empty() {
                list.push(name.to_string());
            }
        }
    }
    Ok(decls)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "
        attribute vec3 aVertexPosition;
        attribute vec4 aVertexColor;
        uniform mat4 uModelMatrix, uViewMatrix;
        uniform highp mat4 uProjectionMatrix;
        varying lowp vec4 vColor;
        void main() {
            gl_Position = uProjectionMatrix * uViewMatrix * uModelMatrix * vec4(aVertexPosition, 1.0);
            vColor = aVertexColor;
        }";

    const FRAGMENT: &str = "
        precision mediump float;
        varying lowp vec4 vColor;
        uniform float uAlpha;
        void main() { gl_FragColor = vec4(vColor.rgb, uAlpha); }";

    #[test]
    fn parses_declarations() {
        let decls = parse_stage(ShaderStage::Vertex, VERTEX).unwrap();
        assert_eq!(decls.attributes, vec!["aVertexPosition", "aVertexColor"]);
        assert_eq!(
            decls.uniforms,
            vec!["uModelMatrix", "uViewMatrix", "uProjectionMatrix"]
        );
        assert_eq!(decls.varyings, vec!["vColor"]);
    }

    #[test]
    fn parses_glsl3_layout_inputs() {
        let src = "#version 300 es\nlayout(location = 0) in vec3 aPos;\nuniform mat4 uMvp[2];\nvoid main() {}";
        let decls = parse_stage(ShaderStage::Vertex, src).unwrap();
        assert_eq!(decls.attributes, vec!["aPos"]);
        assert_eq!(decls.uniforms, vec!["uMvp"]);
    }

    #[test]
    fn compile_requires_main() {
        let mut backend = HeadlessBackend::new();
        let err = backend
            .compile_program(&ShaderSource::new(VERTEX, "precision mediump float;"))
            .unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
    }

    #[test]
    fn link_checks_varyings() {
        let mut backend = HeadlessBackend::new();
        let fragment = "varying vec3 vNormal;\nvoid main() {}";
        let err = backend
            .compile_program(&ShaderSource::new(VERTEX, fragment))
            .unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
    }

    #[test]
    fn records_draws_with_bound_uniforms() {
        let mut backend = HeadlessBackend::new();
        let program = backend
            .compile_program(&ShaderSource::new(VERTEX, FRAGMENT))
            .unwrap();
        backend.use_program(program);

        let position = backend.attrib_location(program, "aVertexPosition").unwrap();
        let buffer = backend.create_vertex_buffer(&[0.0; 9], 3);
        backend.bind_attribute(position, buffer);
        assert_eq!(backend.buffer_len(buffer), Some(3));

        let model = backend.uniform_location(program, "uModelMatrix").unwrap();
        let alpha = backend.uniform_location(program, "uAlpha").unwrap();
        let mut m = Matrix4::identity();
        m.translate(1.0, 2.0, 3.0);
        backend.set_uniform_matrix(model, &m);
        backend.set_uniform_f32(alpha, 0.5);
        backend.draw_arrays(Topology::Triangles, 0, 3);

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].matrix("uModelMatrix"), Some(m));
        assert_eq!(
            draws[0].uniforms.get("uAlpha"),
            Some(&UniformValue::Float(0.5))
        );
    }

    #[test]
    fn out_of_range_draw_is_recorded_without_overflow() {
        let mut backend = HeadlessBackend::new();
        let program = backend
            .compile_program(&ShaderSource::new(VERTEX, FRAGMENT))
            .unwrap();
        backend.use_program(program);
        let position = backend.attrib_location(program, "aVertexPosition").unwrap();
        let buffer = backend.create_vertex_buffer(&[0.0; 9], 3);
        backend.bind_attribute(position, buffer);

        backend.draw_arrays(Topology::Triangles, u32::MAX, 3);

        assert_eq!(backend.draws().len(), 1);
        assert_eq!(backend.draws()[0].first, u32::MAX);
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        let mut backend = HeadlessBackend::new();
        let program = backend
            .compile_program(&ShaderSource::new(VERTEX, FRAGMENT))
            .unwrap();
        assert!(backend.uniform_location(program, "uNormalMatrix").is_none());
        assert!(backend.attrib_location(program, "uModelMatrix").is_none());
    }
}
