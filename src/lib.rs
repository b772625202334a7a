//! # Rasterkit
//!
//! **Transform stacks, cameras and frame timing for small rasterization programs.**
//!
//! Build hierarchical models by pushing and popping matrices, look at them
//! through a keyboard-driven camera, and animate them with a frame loop whose
//! motion does not depend on the frame rate.
//!
//! ## Quick Start
//!
//! ```
//! use rasterkit::*;
//!
//! let mut backend = HeadlessBackend::new();
//! let mut scheduler = ScriptedScheduler::at_rate(60.0, 1.0);
//! let mut input = ScriptedInput::new().hold(KeyCode::KeyF, 0.0, 500.0);
//!
//! let summary = run_with_config(
//!     AppConfig::new().title("windmill"),
//!     &mut backend,
//!     &mut scheduler,
//!     &mut input,
//!     |_ctx| {
//!         let mut mill = Windmill::new().blades(6);
//!
//!         Ok(move |frame: &mut Frame<HeadlessBackend>| {
//!             mill.update(frame.dt);
//!             let mut queue = DrawQueue::new();
//!             mill.draw(frame.stack, &Matrix4::identity(), &mut queue)
//!         })
//!     },
//! )
//! .unwrap();
//! assert_eq!(summary.frames, 60);
//! ```
//!
//! ## Pieces
//!
//! - [`Matrix4`] and [`TransformStack`]: column-major matrices edited in place,
//!   and a stack that hands out copies so siblings never share state.
//! - [`Camera`]: look-at and perspective matrices, orbit and zoom navigation
//!   configured by [`NavigationConfig`].
//! - [`FrameClock`] and [`AnimationLoop`]: elapsed time per frame, FPS, and a
//!   loop driven by any [`FrameScheduler`].
//! - [`RenderBackend`]: the narrow surface a graphics API must provide.
//!   [`HeadlessBackend`] records draws for tests and tools.
//! - [`scene`]: the paper man, windmill and planets models.

mod animation;
mod app;
mod blend;
mod camera;
mod error;
mod frame_clock;
mod headless;
mod input;
mod logging;
mod matrix;
mod navigation;
mod render;
pub mod scene;
mod transform_stack;

pub use animation::{
    AnimatedAngle, AnimationLoop, FrameInfo, FrameScheduler, RunSummary, ScriptedScheduler,
    StopToken, Timestamps,
};
pub use app::{AppConfig, Frame, SetupContext, run, run_with_config};
pub use blend::{Batch, DrawItem, DrawQueue};
pub use camera::{Camera, CameraConfig, CameraUniforms};
pub use error::{CameraError, Error, ShaderError, ShaderStage, StackError, VariableKind};
pub use frame_clock::{FPS_WINDOW_MS, FrameClock};
pub use headless::{DrawCall, HeadlessBackend, UniformValue};
pub use input::{HeldKeys, Input, InputSource, KeySnapshot, ScriptedInput};
pub use logging::{LoggingConfig, init_logging};
pub use matrix::Matrix4;
pub use navigation::{NavigationConfig, OrbitBinding, ZoomBinding};
pub use render::{
    AttribLocation, BlendMode, BufferId, CullMode, ProgramId, RenderBackend, RenderState,
    ShaderProgram, ShaderSource, Topology, UniformLocation,
};
pub use scene::{
    Mesh, MeshRenderer, MeshTable, PaperMan, PartSink, Planets, Shape, UniformNames, Windmill,
};
pub use transform_stack::TransformStack;

pub use glam::{Mat4, Vec3, Vec4};
pub use winit::keyboard::KeyCode;
