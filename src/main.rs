use std::process::ExitCode;

use rasterkit::*;

const VERTEX: &str = "
    attribute vec3 aVertexPosition;
    uniform mat4 uModelMatrix;
    uniform mat4 uViewMatrix;
    uniform mat4 uProjectionMatrix;
    void main() {
        gl_Position = uProjectionMatrix * uViewMatrix * uModelMatrix * vec4(aVertexPosition, 1.0);
    }";

const FRAGMENT: &str = "
    precision mediump float;
    uniform vec4 uFragmentColor;
    void main() {
        gl_FragColor = uFragmentColor;
    }";

/// Two triangles per face of the unit cube spanning `[-1, 1]`.
fn cube_positions() -> Vec<f32> {
    let mut positions = Vec::with_capacity(36 * 3);
    for axis in 0..3 {
        for sign in [1.0f32, -1.0] {
            let corner = |u: f32, v: f32| {
                let mut p = [0.0; 3];
                p[axis] = sign;
                p[(axis + 1) % 3] = u;
                p[(axis + 2) % 3] = v;
                p
            };
            for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                positions.extend_from_slice(&corner(u, v));
            }
        }
    }
    positions
}

/// Octahedron standing in for a sphere.
fn octahedron_positions() -> Vec<f32> {
    let mut positions = Vec::with_capacity(24 * 3);
    for y in [1.0f32, -1.0] {
        let ring = [[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [-1.0, 0.0, 0.0], [0.0, 0.0, -1.0]];
        for i in 0..4 {
            positions.extend_from_slice(&[0.0, y, 0.0]);
            positions.extend_from_slice(&ring[i]);
            positions.extend_from_slice(&ring[(i + 1) % 4]);
        }
    }
    positions
}

enum Model {
    PaperMan(PaperMan),
    Windmill(Windmill),
    Planets(Planets),
}

impl Model {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "paperman" => Some(Model::PaperMan(PaperMan::new())),
            "windmill" => Some(Model::Windmill(Windmill::new())),
            "planets" => Some(Model::Planets(Planets::new())),
            _ => None,
        }
    }

    fn update(&mut self, dt: f32, keys: &KeySnapshot) {
        match self {
            Model::PaperMan(man) => man.handle_keys(dt, keys),
            Model::Windmill(mill) => mill.update(dt),
            Model::Planets(planets) => planets.update(dt),
        }
    }

    fn draw<S: PartSink>(&self, stack: &mut TransformStack, sink: &mut S) -> Result<(), Error> {
        let parent = Matrix4::identity();
        match self {
            Model::PaperMan(man) => man.draw(stack, &parent, sink),
            Model::Windmill(mill) => mill.draw(stack, &parent, sink),
            Model::Planets(planets) => planets.draw(stack, &parent, sink),
        }
    }
}

fn main() -> ExitCode {
    init_logging(LoggingConfig::new());

    let name = std::env::args().nth(1).unwrap_or_else(|| "paperman".to_string());
    let Some(mut model) = Model::from_name(&name) else {
        log::error!("unknown model '{}', expected paperman, windmill or planets", name);
        return ExitCode::FAILURE;
    };

    let config = AppConfig::new()
        .title(name.as_str())
        .camera(CameraConfig::new().at(0.0, 0.0, 40.0));

    let mut backend = HeadlessBackend::new();
    let mut scheduler = ScriptedScheduler::at_rate(60.0, 3.0);
    let mut input = ScriptedInput::new()
        .hold(KeyCode::KeyD, 0.0, 1000.0)
        .hold(KeyCode::KeyF, 1000.0, 2000.0)
        .hold(KeyCode::KeyV, 2000.0, 2500.0);

    let result = run_with_config(config, &mut backend, &mut scheduler, &mut input, |ctx| {
        let names = UniformNames::default();
        let program = ShaderProgram::build(
            ctx.backend,
            &ShaderSource::new(VERTEX, FRAGMENT),
            &names.attributes(),
            &names.uniforms(),
        )?;

        let mut meshes = MeshTable::new();
        meshes.upload_rectangle(ctx.backend);
        meshes.upload(ctx.backend, Shape::Cube, &cube_positions(), Topology::Triangles);
        meshes.upload(ctx.backend, Shape::Sphere, &octahedron_positions(), Topology::Triangles);

        Ok(move |frame: &mut Frame<HeadlessBackend>| {
            model.update(frame.dt, frame.keys);

            let mut renderer =
                MeshRenderer::new(frame.backend, &program, frame.camera, &meshes, &names);
            model.draw(frame.stack, &mut renderer)?;

            if let Some(fps) = frame.fps() {
                log::debug!("frame {}: {} fps, camera at {}", frame.index, fps, frame.camera);
            }
            Ok(())
        })
    });

    match result {
        Ok(summary) => {
            log::info!(
                "{}: {} frames, {} draw calls, last fps {:?}",
                name,
                summary.frames,
                backend.draws().len(),
                summary.last_fps
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
