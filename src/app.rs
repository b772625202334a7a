use crate::animation::{AnimationLoop, FrameScheduler, RunSummary, StopToken};
use crate::camera::{Camera, CameraConfig};
use crate::error::Error;
use crate::input::{InputSource, KeySnapshot};
use crate::render::{RenderBackend, RenderState};
use crate::transform_stack::TransformStack;

/// Context provided during app setup.
pub struct SetupContext<'a, B: RenderBackend + ?Sized> {
    /// Backend for compiling programs and uploading meshes.
    pub backend: &'a mut B,
    /// Camera, already built from the app configuration.
    pub camera: &'a mut Camera,
    pub config: &'a AppConfig,
    stop: StopToken,
}

impl<B: RenderBackend + ?Sized> SetupContext<'_, B> {
    /// Token that ends the frame loop when stopped.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }
}

/// Per-frame context passed to the frame closure.
pub struct Frame<'a, B: RenderBackend + ?Sized> {
    pub backend: &'a mut B,
    /// Camera with navigation already applied for this frame.
    pub camera: &'a mut Camera,
    /// Keys held at the start of this frame.
    pub keys: &'a KeySnapshot,
    /// Scratch transform stack, emptied after every frame.
    pub stack: &'a mut TransformStack,
    /// Seconds since the first frame.
    pub time: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Zero-based frame number.
    pub index: u64,
    fps: Option<u32>,
    stop: &'a StopToken,
}

impl<B: RenderBackend + ?Sized> Frame<'_, B> {
    /// Frames counted over the last full second, if one has passed.
    pub fn fps(&self) -> Option<u32> {
        self.fps
    }

    /// Ends the loop after this frame.
    pub fn stop(&self) {
        self.stop.stop();
    }
}

/// Configuration for the app.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    /// Render target width in pixels.
    pub width: u32,
    /// Render target height in pixels.
    pub height: u32,
    pub clear_color: [f32; 4],
    /// Camera parameters. The aspect ratio is taken from `width / height`.
    pub camera: CameraConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "rasterkit".to_string(),
            width: 960,
            height: 640,
            clear_color: [0.9, 0.9, 0.9, 1.0],
            camera: CameraConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }
}

/// Run an app with the default configuration.
///
/// See [`run_with_config`].
pub fn run<B, Sch, In, S, F>(
    backend: &mut B,
    scheduler: &mut Sch,
    input: &mut In,
    setup: S,
) -> Result<RunSummary, Error>
where
    B: RenderBackend + ?Sized,
    Sch: FrameScheduler + ?Sized,
    In: InputSource + ?Sized,
    S: FnOnce(&mut SetupContext<B>) -> Result<F, Error>,
    F: FnMut(&mut Frame<B>) -> Result<(), Error>,
{
    run_with_config(AppConfig::default(), backend, scheduler, input, setup)
}

/// Run an app with setup and frame closures.
///
/// `setup` runs once and returns the frame closure. For each frame the runner
/// applies camera navigation for the held keys, recomputes the camera
/// matrices, clears the target, runs the frame closure and clears the scratch
/// stack. Setup errors (a shader that fails to compile, a bad camera) and
/// frame errors end the run and are returned.
///
/// # Example
/// ```
/// use rasterkit::*;
///
/// let mut backend = HeadlessBackend::new();
/// let mut scheduler = ScriptedScheduler::new(3, 16.0);
/// let mut input = ScriptedInput::new();
///
/// let summary = run_with_config(
///     AppConfig::new().title("paper man").size(960, 640),
///     &mut backend,
///     &mut scheduler,
///     &mut input,
///     |_ctx| {
///         let man = PaperMan::new();
///         Ok(move |frame: &mut Frame<HeadlessBackend>| {
///             let mut queue = DrawQueue::new();
///             man.draw(frame.stack, &Matrix4::identity(), &mut queue)
///         })
///     },
/// )
/// .unwrap();
/// assert_eq!(summary.frames, 3);
/// ```
pub fn run_with_config<B, Sch, In, S, F>(
    config: AppConfig,
    backend: &mut B,
    scheduler: &mut Sch,
    input: &mut In,
    setup: S,
) -> Result<RunSummary, Error>
where
    B: RenderBackend + ?Sized,
    Sch: FrameScheduler + ?Sized,
    In: InputSource + ?Sized,
    S: FnOnce(&mut SetupContext<B>) -> Result<F, Error>,
    F: FnMut(&mut Frame<B>) -> Result<(), Error>,
{
    log::info!(
        "starting '{}' ({}x{})",
        config.title,
        config.width,
        config.height
    );

    let mut camera = Camera::new(config.camera.clone().size(config.width, config.height))?;
    let mut animation = AnimationLoop::new();
    let stop = animation.stop_token();

    let mut draw = {
        let mut ctx = SetupContext {
            backend: &mut *backend,
            camera: &mut camera,
            config: &config,
            stop: stop.clone(),
        };
        setup(&mut ctx)?
    };

    let mut stack = TransformStack::new();

    animation.run(scheduler, input, |info| {
        camera.handle_navigation(info.dt, &info.keys);
        camera.set();

        backend.set_state(RenderState::OPAQUE);
        backend.clear(config.clear_color);

        let mut frame = Frame {
            backend: &mut *backend,
            camera: &mut camera,
            keys: &info.keys,
            stack: &mut stack,
            time: info.time,
            dt: info.dt,
            index: info.index,
            fps: info.fps,
            stop: &stop,
        };
        let result = draw(&mut frame);

        if !stack.is_empty() {
            log::warn!(
                "frame {} left {} entries on the transform stack",
                info.index,
                stack.len()
            );
            stack.clear();
        }
        result
    })
}
